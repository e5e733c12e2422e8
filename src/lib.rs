use std::sync::Arc;

use cache::SessionStore;
use config::Config;
use database::UserStore;
use storage::AvatarStorage;

pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod storage;
pub mod utils;

pub use router::create_router;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub users: Arc<dyn UserStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub avatars: AvatarStorage,
}

impl AppState {
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let avatars = AvatarStorage::new(&config.avatar_dir);
        Self {
            config,
            users,
            sessions,
            avatars,
        }
    }
}
