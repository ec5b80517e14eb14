mod manual_clock;
mod refresh_token_store_memory;

pub use manual_clock::*;
pub use refresh_token_store_memory::*;
