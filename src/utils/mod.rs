use axum::Json;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password.as_bytes(), cost)
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password.as_bytes(), hash)
}

/// 去掉用户名中所有非 ASCII 字母数字字符
pub fn normalize_username(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub user_agent: String,
    pub ip: String,
    pub iat: i64,
    pub exp: i64,
    /// 同一秒内多次登录也能得到不同的令牌
    pub jti: String,
}

pub fn generate_access_token(
    username: &str,
    user_agent: &str,
    ip: &str,
    config: &Config,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        username: username.to_string(),
        user_agent: user_agent.to_string(),
        ip: ip.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::minutes(config.jwt_expired_minutes as i64)).timestamp(),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, config: &Config) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn message_response(message: &str) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: message.into(),
    })
}

pub mod messages {
    pub const SUCCESS: &str = "success";
    pub const TOKEN_CORRECT: &str = "Token is correct";
    pub const WELCOME: &str = "Welcome";
    pub const GENDER_LIST: &str = "male, female, other, null";
}
