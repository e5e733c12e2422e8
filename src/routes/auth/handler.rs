use axum::{
    extract::{Extension, Json, State, rejection::JsonRejection},
    response::IntoResponse,
};

use crate::{
    AppState,
    error::AppError,
    middleware::ClientInfo,
    utils::{Claims, generate_access_token, message_response, messages, verify_password},
};

use super::model::{LoginRequest, LoginResponse};

/// 用户登录，覆盖该用户之前的会话
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    // 解析失败、用户不存在、密码错误对外都是同一个错误
    let Json(req) = payload.map_err(|e| {
        tracing::debug!("login body rejected: {}", e);
        AppError::UsernameIncorrect
    })?;

    let user = state
        .users
        .find_active_user(&req.username)
        .await?
        .filter(|user| user.lifecycle.is_active())
        .ok_or(AppError::UsernameIncorrect)?;

    match verify_password(&req.password, &user.password) {
        Ok(true) => {}
        Ok(false) => return Err(AppError::UsernameIncorrect),
        Err(e) => {
            tracing::warn!("stored hash unreadable for {}: {}", user.username, e);
            return Err(AppError::UsernameIncorrect);
        }
    }

    let token = generate_access_token(&user.username, &client.user_agent, &client.ip, &state.config)
        .map_err(AppError::system)?;

    state
        .sessions
        .set(&user.username, token.as_bytes(), state.config.session_ttl())
        .await?;

    tracing::info!("user {} logged in from {}", user.username, client.ip);
    Ok(Json(LoginResponse {
        message: messages::SUCCESS.into(),
        token,
    }))
}

/// 能走到这里说明中间件已经校验过令牌
#[axum::debug_handler]
pub async fn check_token(Extension(_claims): Extension<Claims>) -> impl IntoResponse {
    message_response(messages::TOKEN_CORRECT)
}

/// 删除当前用户的会话，会话不存在时同样成功
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    state.sessions.delete(&claims.username).await?;

    tracing::info!("user {} logged out", claims.username);
    Ok(message_response(messages::SUCCESS))
}
