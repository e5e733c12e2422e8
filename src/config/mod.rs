use std::env;
use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    /// 未配置时使用进程内会话存储
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expired_minutes: u64,
    pub server_host: String,
    pub server_port: u16,
    pub avatar_dir: String,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        let jwt_expired_minutes = env::var("JWT_EXPIRED_TIME")
            .ok()
            .and_then(|v| v.trim_end_matches('m').parse::<u64>().ok())
            .unwrap_or(60);

        Ok(Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.is_empty()),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expired_minutes,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "::".into()),
            server_port: env::var("SERVER_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            avatar_dir: env::var("AVATAR_DIR")
                .unwrap_or_else(|_| "assets/images/profiles".into()),
            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(bcrypt::DEFAULT_COST),
        })
    }

    /// 会话和令牌的有效期
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.jwt_expired_minutes * 60)
    }
}
