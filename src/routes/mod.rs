use axum::response::IntoResponse;

use crate::utils::{message_response, messages};

pub mod auth;
pub mod user;

pub async fn welcome() -> impl IntoResponse {
    message_response(messages::WELCOME)
}
