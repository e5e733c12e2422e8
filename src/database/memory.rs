use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::database::models::user::{
    Lifecycle, NewUser, NewUserProfile, User, UserFilter, UserProfile, UserWithProfile,
};
use crate::database::repositories::UserStore;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    profiles: Vec<UserProfile>,
    next_user_id: i64,
    next_profile_id: i64,
}

/// 进程内用户存储，用于测试和无数据库的本地运行
#[derive(Default)]
pub struct MemoryUserStore {
    tables: RwLock<Tables>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_active_user(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.username == username && u.lifecycle.is_active())
            .cloned())
    }

    async fn find_profile(&self, user_id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
        let tables = self.tables.read().await;
        Ok(tables.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    async fn list_users(&self, filter: UserFilter) -> Result<Vec<UserWithProfile>, sqlx::Error> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .iter()
            .filter(|u| match &filter {
                UserFilter::Active => u.lifecycle.is_active(),
                UserFilter::Deleted => !u.lifecycle.is_active(),
                UserFilter::All => true,
                UserFilter::Username(name) => &u.username == name && u.lifecycle.is_active(),
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        if matches!(filter, UserFilter::Username(_)) {
            users.truncate(1);
        }

        Ok(users
            .into_iter()
            .map(|user| UserWithProfile {
                profile: tables.profiles.iter().find(|p| p.user_id == user.id).cloned(),
                user,
            })
            .collect())
    }

    async fn create_user_with_profile(
        &self,
        user: NewUser,
        profile: NewUserProfile,
    ) -> Result<(User, UserProfile), sqlx::Error> {
        // 持有同一把写锁，两行一起写入
        let mut tables = self.tables.write().await;
        // 与数据库的部分唯一索引保持一致
        if tables
            .users
            .iter()
            .any(|u| u.username == user.username && u.lifecycle.is_active())
        {
            return Err(sqlx::Error::Protocol(format!(
                "duplicate username: {}",
                user.username
            )));
        }

        let now = Utc::now();
        tables.next_user_id += 1;
        let created_user = User {
            id: tables.next_user_id,
            username: user.username,
            password: user.password_hash,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        };

        tables.next_profile_id += 1;
        let created_profile = UserProfile {
            id: tables.next_profile_id,
            user_id: created_user.id,
            name: profile.name,
            birthday: profile.birthday,
            phone: profile.phone,
            gender: profile.gender,
            email: profile.email,
            address: profile.address,
            date_join: profile.date_join,
            insurance_number: profile.insurance_number,
            id_card: profile.id_card,
            avatar: profile.avatar,
            lifecycle: Lifecycle::Active,
            created_at: now,
            updated_at: now,
        };

        tables.users.push(created_user.clone());
        tables.profiles.push(created_profile.clone());
        Ok((created_user, created_profile))
    }

    async fn save_user(&self, user: &User) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or(sqlx::Error::RowNotFound)?;
        stored.password = user.password.clone();
        stored.lifecycle = user.lifecycle;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .profiles
            .iter_mut()
            .find(|p| p.id == profile.id)
            .ok_or(sqlx::Error::RowNotFound)?;
        *stored = UserProfile {
            updated_at: Utc::now(),
            ..profile.clone()
        };
        Ok(())
    }

    async fn soft_delete(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == user_id && u.lifecycle.is_active())
            .ok_or(sqlx::Error::RowNotFound)?;
        user.lifecycle = Lifecycle::Deleted { at };
        user.updated_at = Utc::now();

        for profile in tables
            .profiles
            .iter_mut()
            .filter(|p| p.user_id == user_id && p.lifecycle.is_active())
        {
            profile.lifecycle = Lifecycle::Deleted { at };
            profile.updated_at = Utc::now();
        }
        Ok(())
    }
}
