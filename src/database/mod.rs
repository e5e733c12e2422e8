// 数据库模块
// 包含数据库实体定义和存储库实现

pub mod memory;
pub mod models;
pub mod repositories;

pub use memory::MemoryUserStore;
pub use models::user::{Lifecycle, User, UserProfile};
pub use repositories::{PgUserRepository, UserStore};
