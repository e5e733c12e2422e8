use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::{SessionError, SessionStore, keys::session_key};

/// 基于 Redis 的会话存储，过期交给 SET EX 处理
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: Arc<RedisClient>,
}

impl RedisSessionStore {
    pub fn new(redis: RedisClient) -> Self {
        Self {
            redis: Arc::new(redis),
        }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let result: Option<Vec<u8>> = conn.get(session_key(key)).await?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        // SET EX 不接受 0 秒
        let seconds = ttl.as_secs().max(1);
        let _: () = conn.set_ex(session_key(key), value, seconds).await?;

        tracing::debug!("session stored for {} ({}s)", key, seconds);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(session_key(key)).await?;
        Ok(())
    }
}
