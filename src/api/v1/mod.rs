mod error;
mod handler;
mod router;

pub use error::*;
pub use handler::{ApiResponse, LoginRequest, RefreshRequest};
pub use router::routes;
