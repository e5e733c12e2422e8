use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use axum_extra::headers::{HeaderMapExt, UserAgent};

/// 调用方的 User-Agent 和 IP，写入签发的令牌
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub user_agent: String,
    pub ip: String,
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .typed_get::<UserAgent>()
            .map(|ua| ua.as_str().to_string())
            .unwrap_or_default();

        // 连接信息中的原始 IP
        let remote_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ci| ci.0.ip().to_string());

        // 优先使用代理转发的 IP
        let ip = parts
            .headers
            .get("x-real-ip")
            .and_then(|h| h.to_str().ok())
            .or_else(|| {
                parts
                    .headers
                    .get("x-forwarded-for")
                    .and_then(|h| h.to_str().ok())
                    .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
            })
            .or(remote_ip.as_deref())
            .unwrap_or("unknown")
            .trim()
            .to_string();

        Ok(ClientInfo { user_agent, ip })
    }
}
