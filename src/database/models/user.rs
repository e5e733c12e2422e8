use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// 软删除状态，对应 deleted_at 列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Active,
    Deleted { at: DateTime<Utc> },
}

impl Lifecycle {
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => Lifecycle::Deleted { at },
            None => Lifecycle::Active,
        }
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Lifecycle::Active => None,
            Lifecycle::Deleted { at } => Some(*at),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Lifecycle::Active)
    }
}

/// users 表的原始行
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// bcrypt 哈希
    pub password: String,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password: row.password,
            lifecycle: Lifecycle::from_deleted_at(row.deleted_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// user_profiles 表的原始行
#[derive(Debug, FromRow)]
pub struct UserProfileRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub birthday: String,
    pub phone: String,
    pub gender: String,
    pub email: String,
    pub address: String,
    pub date_join: String,
    pub insurance_number: String,
    pub id_card: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub birthday: String,
    pub phone: String,
    pub gender: String,
    pub email: String,
    pub address: String,
    pub date_join: String,
    pub insurance_number: String,
    pub id_card: String,
    pub avatar: String,
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserProfileRow> for UserProfile {
    fn from(row: UserProfileRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            birthday: row.birthday,
            phone: row.phone,
            gender: row.gender,
            email: row.email,
            address: row.address,
            date_join: row.date_join,
            insurance_number: row.insurance_number,
            id_card: row.id_card,
            avatar: row.avatar,
            lifecycle: Lifecycle::from_deleted_at(row.deleted_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// 新建用户时写入的字段
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}

/// 新建档案时写入的字段
#[derive(Debug, Clone, Default)]
pub struct NewUserProfile {
    pub name: String,
    pub birthday: String,
    pub phone: String,
    pub gender: String,
    pub email: String,
    pub address: String,
    pub date_join: String,
    pub insurance_number: String,
    pub id_card: String,
    pub avatar: String,
}

/// 列表查询的过滤条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserFilter {
    Active,
    Deleted,
    All,
    Username(String),
}

#[derive(Debug, Clone)]
pub struct UserWithProfile {
    pub user: User,
    pub profile: Option<UserProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_round_trips_deleted_at() {
        assert_eq!(Lifecycle::from_deleted_at(None), Lifecycle::Active);

        let at = Utc::now();
        let deleted = Lifecycle::from_deleted_at(Some(at));
        assert!(!deleted.is_active());
        assert_eq!(deleted.deleted_at(), Some(at));
    }
}
