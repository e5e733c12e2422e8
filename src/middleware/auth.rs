use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};

use crate::{AppState, error::AppError, utils::verify_token};

/// 旧客户端把令牌放在 token 请求头里
const TOKEN_HEADER: &str = "token";

fn extract_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| {
            headers
                .typed_get::<Authorization<Bearer>>()
                .map(|auth| auth.token().to_string())
        })
}

/// 校验令牌签名和有效期，并要求它仍是该用户在会话存储中的当前令牌
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_token(req.headers()).ok_or(AppError::TokenInvalid)?;

    let claims = verify_token(&token, &state.config).map_err(|e| {
        tracing::debug!("token rejected: {}", e);
        AppError::TokenInvalid
    })?;

    // 登出、删除账号、重新登录或过期后会话里不再是这个令牌
    match state.sessions.get(&claims.username).await? {
        Some(current) if current == token.as_bytes() => {}
        _ => {
            tracing::debug!("stale session token for {}", claims.username);
            return Err(AppError::TokenInvalid);
        }
    }

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
