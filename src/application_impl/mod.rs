mod auth_service_impl;
mod crypto_service_impl;

pub use auth_service_impl::*;
pub use crypto_service_impl::*;
