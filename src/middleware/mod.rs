mod auth;
mod client;
mod error_handler;

pub use auth::auth_middleware;
pub use client::ClientInfo;
pub use error_handler::log_errors;
