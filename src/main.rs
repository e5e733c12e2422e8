use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use school_backend::{
    AppState,
    cache::{MemorySessionStore, RedisSessionStore, SessionStore},
    config::Config,
    create_router,
    database::PgUserRepository,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'school_backend';")
                    .await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // 会话存储：配置了 Redis 就用 Redis，否则用进程内存储
    let sessions: Arc<dyn SessionStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str()).expect("Failed to create Redis client");
            tracing::info!("Using Redis session store");
            Arc::new(RedisSessionStore::new(client))
        }
        None => {
            tracing::warn!("REDIS_URL not set, sessions are kept in process memory");
            let store = Arc::new(MemorySessionStore::new());
            let sweeper = store.clone();
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                loop {
                    interval.tick().await;
                    let purged = sweeper.purge_expired().await;
                    if purged > 0 {
                        tracing::debug!("purged {} expired sessions", purged);
                    }
                }
            });
            store
        }
    };

    let state = AppState::new(
        config.clone(),
        Arc::new(PgUserRepository::new(pool)),
        sessions,
    );

    let router = create_router(state);

    // 开发模式下允许所有来源
    #[cfg(debug_assertions)]
    let router = {
        tracing::debug!("Adding CORS layer for development mode");
        router.layer(tower_http::cors::CorsLayer::permissive())
    };

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
