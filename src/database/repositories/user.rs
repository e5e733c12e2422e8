use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::database::models::user::{
    NewUser, NewUserProfile, User, UserFilter, UserProfile, UserProfileRow, UserRow,
    UserWithProfile,
};
use crate::database::repositories::UserStore;

const USER_COLUMNS: &str = "id, username, password, created_at, updated_at, deleted_at";

const PROFILE_COLUMNS: &str = "id, user_id, name, birthday, phone, gender, email, address, \
     date_join, insurance_number, id_card, avatar, created_at, updated_at, deleted_at";

/// PostgreSQL 用户存储库实现
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn profiles_for(&self, user_ids: &[i64]) -> Result<HashMap<i64, UserProfile>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = ANY($1)"
        ))
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.user_id, UserProfile::from(row)))
            .collect())
    }
}

#[async_trait]
impl UserStore for PgUserRepository {
    async fn find_active_user(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND deleted_at IS NULL"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }

    async fn find_profile(&self, user_id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
        let row = sqlx::query_as::<_, UserProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM user_profiles WHERE user_id = $1 ORDER BY id LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(UserProfile::from))
    }

    async fn list_users(&self, filter: UserFilter) -> Result<Vec<UserWithProfile>, sqlx::Error> {
        let query = match &filter {
            UserFilter::Active => format!(
                "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL ORDER BY username ASC"
            ),
            UserFilter::Deleted => format!(
                "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NOT NULL ORDER BY username ASC"
            ),
            UserFilter::All => format!("SELECT {USER_COLUMNS} FROM users ORDER BY username ASC"),
            UserFilter::Username(_) => format!(
                "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND deleted_at IS NULL LIMIT 1"
            ),
        };

        let mut rows = sqlx::query_as::<_, UserRow>(&query);
        if let UserFilter::Username(username) = &filter {
            rows = rows.bind(username);
        }
        let users: Vec<User> = rows
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(User::from)
            .collect();

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let mut profiles = self.profiles_for(&ids).await?;

        Ok(users
            .into_iter()
            .map(|user| UserWithProfile {
                profile: profiles.remove(&user.id),
                user,
            })
            .collect())
    }

    async fn create_user_with_profile(
        &self,
        user: NewUser,
        profile: NewUserProfile,
    ) -> Result<(User, UserProfile), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let user_row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, password) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile_row = sqlx::query_as::<_, UserProfileRow>(&format!(
            r#"
            INSERT INTO user_profiles
                (user_id, name, birthday, phone, gender, email, address,
                 date_join, insurance_number, id_card, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_row.id)
        .bind(&profile.name)
        .bind(&profile.birthday)
        .bind(&profile.phone)
        .bind(&profile.gender)
        .bind(&profile.email)
        .bind(&profile.address)
        .bind(&profile.date_join)
        .bind(&profile.insurance_number)
        .bind(&profile.id_card)
        .bind(&profile.avatar)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!("Created user: {}", user_row.username);
        Ok((user_row.into(), profile_row.into()))
    }

    async fn save_user(&self, user: &User) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password = $1, deleted_at = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(&user.password)
        .bind(user.lifecycle.deleted_at())
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE user_profiles
            SET name = $1, birthday = $2, phone = $3, gender = $4, email = $5, address = $6,
                date_join = $7, insurance_number = $8, id_card = $9, avatar = $10,
                deleted_at = $11, updated_at = NOW()
            WHERE id = $12
            "#,
        )
        .bind(&profile.name)
        .bind(&profile.birthday)
        .bind(&profile.phone)
        .bind(&profile.gender)
        .bind(&profile.email)
        .bind(&profile.address)
        .bind(&profile.date_join)
        .bind(&profile.insurance_number)
        .bind(&profile.id_card)
        .bind(&profile.avatar)
        .bind(profile.lifecycle.deleted_at())
        .bind(profile.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }
        Ok(())
    }

    async fn soft_delete(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE users SET deleted_at = $1, updated_at = NOW() WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(sqlx::Error::RowNotFound);
        }

        sqlx::query(
            "UPDATE user_profiles SET deleted_at = $1, updated_at = NOW() WHERE user_id = $2 AND deleted_at IS NULL",
        )
        .bind(at)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
