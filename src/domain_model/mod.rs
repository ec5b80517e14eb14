mod refresh_token;
mod subject;
mod token;

pub use refresh_token::*;
pub use subject::*;
pub use token::*;
