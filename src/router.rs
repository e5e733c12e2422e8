use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::{
    AppState,
    middleware::{auth_middleware, log_errors},
    routes,
};

/// 组装全部路由，/login 和 / 之外都需要令牌
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(routes::welcome))
        .route("/login", post(routes::auth::login));

    let protected_routes = Router::new()
        .route("/user/check-token", post(routes::auth::check_token))
        .route("/user/logout", post(routes::auth::logout))
        .route("/users/user", get(routes::user::get_users))
        .route("/users/user/insert", post(routes::user::insert_user))
        .route("/users/user/update", put(routes::user::update_user))
        .route("/users/user/delete", delete(routes::user::delete_user))
        .route(
            "/users/user/change-password",
            put(routes::user::change_password),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum::middleware::from_fn(log_errors))
        .with_state(state)
}
