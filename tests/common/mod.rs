#![allow(dead_code)]

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use school_backend::{
    AppState,
    cache::{MemorySessionStore, SessionStore},
    config::Config,
    create_router,
    database::{
        MemoryUserStore, User, UserProfile, UserStore,
        models::user::{NewUser, NewUserProfile, UserFilter, UserWithProfile},
    },
    utils::hash_password,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const BOUNDARY: &str = "X-SCHOOL-BACKEND-BOUNDARY";

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub sessions: Arc<MemorySessionStore>,
    pub config: Config,
    pub avatar_dir: TempDir,
}

pub fn test_config(avatar_dir: &TempDir) -> Config {
    Config {
        database_url: String::new(),
        redis_url: None,
        jwt_secret: "integration-test-secret".into(),
        jwt_expired_minutes: 60,
        server_host: "::1".into(),
        server_port: 0,
        avatar_dir: avatar_dir.path().to_string_lossy().into_owned(),
        bcrypt_cost: 4,
    }
}

impl TestApp {
    pub fn new() -> Self {
        let users = Arc::new(MemoryUserStore::new());
        Self::with_store(users.clone(), users)
    }

    /// users 用于准备和检查数据，store 注入到路由中
    pub fn with_store(users: Arc<MemoryUserStore>, store: Arc<dyn UserStore>) -> Self {
        let avatar_dir = tempfile::tempdir().unwrap();
        let config = test_config(&avatar_dir);
        let sessions = Arc::new(MemorySessionStore::new());
        let state = AppState::new(config.clone(), store, sessions.clone());

        Self {
            router: create_router(state),
            users,
            sessions,
            config,
            avatar_dir,
        }
    }

    /// 直接写入存储，绕过需要令牌的新增接口
    pub async fn seed_user(&self, username: &str, password: &str) {
        self.users
            .create_user_with_profile(
                NewUser {
                    username: username.into(),
                    password_hash: hash_password(password, 4).unwrap(),
                },
                NewUserProfile {
                    name: username.to_uppercase(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        let req = Request::post("/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::USER_AGENT, "integration-test")
            .header("x-real-ip", "127.0.0.1")
            .body(Body::from(
                json!({ "username": username, "password": password }).to_string(),
            ))
            .unwrap();
        self.send(req).await
    }

    pub async fn login_token(&self, username: &str, password: &str) -> String {
        let (status, body) = self.login(username, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn check_token(&self, token: &str) -> (StatusCode, Value) {
        let req = Request::post("/user/check-token")
            .header("token", token)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    pub async fn session_of(&self, username: &str) -> Option<String> {
        self.sessions
            .get(username)
            .await
            .unwrap()
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }
}

/// 构造 multipart 请求体，files 为 (字段名, 文件名, 内容)
pub fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    for (name, file_name, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(
    method: &str,
    uri: &str,
    token: &str,
    fields: &[(&str, &str)],
    files: &[(&str, &str, &[u8])],
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("token", token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(fields, files)))
        .unwrap()
}

pub fn change_password_request(token: &str, current: &str, new: &str) -> Request<Body> {
    Request::put("/users/user/change-password")
        .header("token", token)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!(
            "password_current={current}&password_new={new}"
        )))
        .unwrap()
}

pub fn delete_request(token: &str, username: &str) -> Request<Body> {
    Request::delete("/users/user/delete")
        .header("token", token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "username": username }).to_string()))
        .unwrap()
}

/// 包装内存存储，可按开关让部分操作失败
#[derive(Default)]
pub struct FaultyUserStore {
    pub inner: Arc<MemoryUserStore>,
    pub fail_create: AtomicBool,
    pub fail_soft_delete: AtomicBool,
    pub hide_profiles: AtomicBool,
}

impl FaultyUserStore {
    pub fn wrap(inner: Arc<MemoryUserStore>) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }
}

#[async_trait]
impl UserStore for FaultyUserStore {
    async fn find_active_user(&self, username: &str) -> Result<Option<User>, sqlx::Error> {
        self.inner.find_active_user(username).await
    }

    async fn find_profile(&self, user_id: i64) -> Result<Option<UserProfile>, sqlx::Error> {
        if self.hide_profiles.load(Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_profile(user_id).await
    }

    async fn list_users(&self, filter: UserFilter) -> Result<Vec<UserWithProfile>, sqlx::Error> {
        self.inner.list_users(filter).await
    }

    async fn create_user_with_profile(
        &self,
        user: NewUser,
        profile: NewUserProfile,
    ) -> Result<(User, UserProfile), sqlx::Error> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.inner.create_user_with_profile(user, profile).await
    }

    async fn save_user(&self, user: &User) -> Result<(), sqlx::Error> {
        self.inner.save_user(user).await
    }

    async fn save_profile(&self, profile: &UserProfile) -> Result<(), sqlx::Error> {
        self.inner.save_profile(profile).await
    }

    async fn soft_delete(&self, user_id: i64, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        if self.fail_soft_delete.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        self.inner.soft_delete(user_id, at).await
    }
}
