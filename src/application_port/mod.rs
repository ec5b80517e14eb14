mod auth_service;
mod crypto_service;

pub use auth_service::*;
pub use crypto_service::*;
