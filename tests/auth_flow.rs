mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::{TestApp, change_password_request, delete_request, multipart_request};
use school_backend::{cache::SessionStore, utils::verify_token};

#[tokio::test]
async fn login_returns_token_and_stores_session() {
    let app = TestApp::new();
    app.seed_user("alice", "secret1").await;

    let (status, body) = app.login("alice", "secret1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "success");
    let token = body["token"].as_str().unwrap();
    assert!(!token.is_empty());
    assert_eq!(app.session_of("alice").await.as_deref(), Some(token));

    let claims = verify_token(token, &app.config).unwrap();
    assert_eq!(claims.username, "alice");
    assert_eq!(claims.user_agent, "integration-test");
    assert_eq!(claims.ip, "127.0.0.1");
}

#[tokio::test]
async fn login_failures_share_one_message() {
    let app = TestApp::new();
    app.seed_user("alice", "secret1").await;

    let (status, body) = app.login("alice", "wrong-password").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "username_incorrect");

    let (status, body) = app.login("nobody", "secret1").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "username_incorrect");

    let malformed = Request::post("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(malformed).await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "username_incorrect");

    assert!(app.session_of("alice").await.is_none());
}

#[tokio::test]
async fn check_token_accepts_live_session() {
    let app = TestApp::new();
    app.seed_user("alice", "secret1").await;
    let token = app.login_token("alice", "secret1").await;

    let (status, body) = app.check_token(&token).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Token is correct");
}

#[tokio::test]
async fn bearer_header_is_accepted() {
    let app = TestApp::new();
    app.seed_user("alice", "secret1").await;
    let token = app.login_token("alice", "secret1").await;

    let req = Request::post("/user/check-token")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn protected_routes_reject_missing_or_forged_tokens() {
    let app = TestApp::new();

    let req = Request::post("/user/check-token").body(Body::empty()).unwrap();
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "token_invalid");

    let (status, _) = app.check_token("not.a.jwt").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_removes_session_and_revokes_token() {
    let app = TestApp::new();
    app.seed_user("alice", "secret1").await;
    let token = app.login_token("alice", "secret1").await;

    let req = Request::post("/user/logout")
        .header("token", &token)
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "success");
    assert!(app.session_of("alice").await.is_none());

    let (status, _) = app.check_token(&token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn second_login_supersedes_first_token() {
    let app = TestApp::new();
    app.seed_user("alice", "secret1").await;

    let first = app.login_token("alice", "secret1").await;
    let second = app.login_token("alice", "secret1").await;
    assert_ne!(first, second);

    let (status, _) = app.check_token(&first).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.check_token(&second).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn soft_delete_revokes_session_and_blocks_login() {
    let app = TestApp::new();
    app.seed_user("admin", "adminpass").await;
    app.seed_user("bob", "bobpass1").await;
    let admin = app.login_token("admin", "adminpass").await;
    let bob = app.login_token("bob", "bobpass1").await;

    let (status, body) = app.send(delete_request(&admin, "bob")).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    assert!(app.session_of("bob").await.is_none());
    let (status, _) = app.check_token(&bob).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.login("bob", "bobpass1").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "username_incorrect");
}

#[tokio::test]
async fn change_password_rejects_short_passwords() {
    let app = TestApp::new();
    app.seed_user("alice", "secret1").await;
    let token = app.login_token("alice", "secret1").await;

    let (status, body) = app
        .send(change_password_request(&token, "secret1", "1234"))
        .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "password_invalid");

    let (status, body) = app
        .send(change_password_request(&token, "abc", "secret2"))
        .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "password_invalid");
}

#[tokio::test]
async fn change_password_requires_current_password() {
    let app = TestApp::new();
    app.seed_user("alice", "secret1").await;
    let token = app.login_token("alice", "secret1").await;

    let (status, body) = app
        .send(change_password_request(&token, "wrong12", "secret2"))
        .await;

    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "password_current_incorrect");
}

#[tokio::test]
async fn change_password_on_vanished_account_reports_username_exists() {
    let app = TestApp::new();
    app.seed_user("admin", "adminpass").await;
    app.seed_user("alice", "secret1").await;
    let admin = app.login_token("admin", "adminpass").await;
    let alice = app.login_token("alice", "secret1").await;

    // 删除后重新写入会话，模拟删除与请求之间的竞争
    app.send(delete_request(&admin, "alice")).await;
    app.sessions
        .set("alice", alice.as_bytes(), std::time::Duration::from_secs(60))
        .await
        .unwrap();

    let (status, body) = app
        .send(change_password_request(&alice, "secret1", "secret2"))
        .await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "username_exists");
}

#[tokio::test]
async fn insert_change_password_then_login_scenario() {
    let app = TestApp::new();
    app.seed_user("admin", "adminpass").await;
    let admin = app.login_token("admin", "adminpass").await;

    let (status, body) = app
        .send(multipart_request(
            "POST",
            "/users/user/insert",
            &admin,
            &[("username", "alice"), ("password", "secret1")],
            &[],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let alice = app.login_token("alice", "secret1").await;

    let (status, body) = app
        .send(change_password_request(&alice, "secret1", "secret2"))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "success");

    // 修改密码不会轮换会话
    let (status, _) = app.check_token(&alice).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.login("alice", "secret1").await;
    assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
    assert_eq!(body["message"], "username_incorrect");

    let (status, _) = app.login("alice", "secret2").await;
    assert_eq!(status, StatusCode::OK);
}
