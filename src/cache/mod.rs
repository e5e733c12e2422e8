// 会话缓存模块
// 每个用户名只保存一条当前有效的令牌

use std::time::Duration;

use async_trait::async_trait;

pub mod keys;
pub mod memory;
pub mod operations;

pub use memory::MemorySessionStore;
pub use operations::session::RedisSessionStore;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// 带过期时间的键值会话存储
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, SessionError>;

    /// 覆盖已有的值
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), SessionError>;

    /// 键不存在时同样返回成功
    async fn delete(&self, key: &str) -> Result<(), SessionError>;
}
