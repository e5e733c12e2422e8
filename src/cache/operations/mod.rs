/// 缓存操作
/// Redis 会话存储实现
pub mod session;

pub use session::RedisSessionStore;
