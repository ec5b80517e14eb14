// store

mod refresh_token_store;

pub use refresh_token_store::*;

// system

mod clock;
mod entropy;

pub use clock::*;
pub use entropy::*;
