pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod validation;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;
use std::time::Instant;

use auth::SessionManager;
use config::AppConfig;
use repositories::{SqliteUserRepository, UserRepository};
use services::{AuthService, UserService};

pub use routes::create_router;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub sessions: Arc<SessionManager>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub pool: sqlx::SqlitePool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, pool: sqlx::SqlitePool) -> Self {
        let user_repository: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(pool.clone()));
        Self::with_repository(config, pool, user_repository)
    }

    pub fn with_repository(
        config: AppConfig,
        pool: sqlx::SqlitePool,
        user_repository: Arc<dyn UserRepository>,
    ) -> Self {
        let sessions = Arc::new(SessionManager::new(&config));
        let auth_service = Arc::new(AuthService::new(
            user_repository.clone(),
            sessions.clone(),
        ));
        let user_service = Arc::new(UserService::new(user_repository, sessions.clone()));

        Self {
            config: Arc::new(config),
            sessions,
            auth_service,
            user_service,
            pool,
            started_at: Instant::now(),
        }
    }
}
