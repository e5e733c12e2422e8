// 存储库模块
// 处理器只依赖 UserStore，具体实现在启动时注入

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::database::models::user::{
    NewUser, NewUserProfile, User, UserFilter, UserProfile, UserWithProfile,
};

pub mod user;

pub use user::PgUserRepository;

/// 用户与档案的数据访问接口
#[async_trait]
pub trait UserStore: Send + Sync {
    /// 按用户名精确查找未删除的用户
    async fn find_active_user(&self, username: &str) -> Result<Option<User>, sqlx::Error>;

    async fn find_profile(&self, user_id: i64) -> Result<Option<UserProfile>, sqlx::Error>;

    /// 按用户名升序返回，附带档案
    async fn list_users(&self, filter: UserFilter) -> Result<Vec<UserWithProfile>, sqlx::Error>;

    /// 用户和档案同时写入，任一失败都不留下记录
    async fn create_user_with_profile(
        &self,
        user: NewUser,
        profile: NewUserProfile,
    ) -> Result<(User, UserProfile), sqlx::Error>;

    /// 写回密码和删除状态
    async fn save_user(&self, user: &User) -> Result<(), sqlx::Error>;

    /// 同时软删除用户和档案
    async fn soft_delete(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error>;

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), sqlx::Error>;
}
