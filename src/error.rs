use axum::Json;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::utils::messages::GENDER_LIST;

/// 表单校验失败的字段
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub rule: &'static str,
}

/// 处理器层统一错误，响应体只暴露 message 键
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("username or password incorrect")]
    UsernameIncorrect,
    #[error("token missing or no longer valid")]
    TokenInvalid,
    #[error("password shorter than 5 characters")]
    PasswordInvalid,
    /// 旧接口对这种情况返回 username_exists，保持线上兼容
    #[error("authenticated account no longer exists")]
    AccountMissing,
    #[error("current password incorrect")]
    PasswordCurrentIncorrect,
    #[error("username already taken")]
    UsernameExists,
    #[error("gender not in allowed list")]
    GenderInvalid,
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("failed to create user: {0}")]
    InsertFailed(String),
    #[error("user to update not found")]
    UpdateTargetMissing,
    #[error("no field to change")]
    NoChange,
    #[error("malformed request body")]
    ParamError,
    #[error("user profile missing")]
    ProfileIncorrect,
    #[error("system error: {0}")]
    System(String),
}

impl AppError {
    pub fn system(cause: impl std::fmt::Display) -> Self {
        AppError::System(cause.to_string())
    }

    fn status_and_key(&self) -> (StatusCode, &'static str) {
        // 凭证类错误沿用旧接口的 501
        match self {
            AppError::UsernameIncorrect => (StatusCode::NOT_IMPLEMENTED, "username_incorrect"),
            AppError::TokenInvalid => (StatusCode::UNAUTHORIZED, "token_invalid"),
            AppError::PasswordInvalid => (StatusCode::NOT_IMPLEMENTED, "password_invalid"),
            AppError::AccountMissing => (StatusCode::NOT_IMPLEMENTED, "username_exists"),
            AppError::PasswordCurrentIncorrect => {
                (StatusCode::NOT_IMPLEMENTED, "password_current_incorrect")
            }
            AppError::UsernameExists => (StatusCode::NOT_IMPLEMENTED, "username_exists"),
            AppError::GenderInvalid => (StatusCode::NOT_IMPLEMENTED, "gender_invalid"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::InsertFailed(_) => (StatusCode::BAD_REQUEST, "insert_failed"),
            AppError::UpdateTargetMissing => (StatusCode::BAD_REQUEST, "user_exist"),
            AppError::NoChange => (StatusCode::BAD_REQUEST, "no_search_change"),
            AppError::ParamError => (StatusCode::NOT_IMPLEMENTED, "param_error"),
            AppError::ProfileIncorrect => (StatusCode::NOT_IMPLEMENTED, "user_profile_incorrect"),
            AppError::System(_) => (StatusCode::NOT_IMPLEMENTED, "system_error"),
        }
    }

    pub fn message_key(&self) -> &'static str {
        self.status_and_key().1
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_key();

        match &self {
            AppError::System(_) | AppError::InsertFailed(_) => {
                tracing::error!("request failed: {}", self)
            }
            _ => tracing::debug!("request rejected: {}", self),
        }

        let body = match self {
            AppError::GenderInvalid => json!({ "message": message, "gender_list": GENDER_LIST }),
            AppError::Validation(errors) => json!({ "message": message, "errors": errors }),
            _ => json!({ "message": message }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::system(err)
    }
}

impl From<crate::cache::SessionError> for AppError {
    fn from(err: crate::cache::SessionError) -> Self {
        AppError::system(err)
    }
}
