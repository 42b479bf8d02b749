//! HTTP surface of the VaultGuard will registry service.

pub mod errors;
pub mod handlers;
pub mod server;
pub mod validation;

pub use errors::ApiError;
pub use server::{create_router, start_api_server, AppState};
