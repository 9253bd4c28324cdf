pub mod test_helpers {
    use crate::config::{AppConfig, Environment, JwtConfig, SessionCookieConfig};
    use crate::models::user::UserRole;
    use crate::AppState;
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

    pub const TEST_JWT_SECRET: &[u8] = b"test-signing-secret-test-signing-secret!!";

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Development-mode config with a fixed signing secret.
    pub fn test_config() -> AppConfig {
        test_config_for(Environment::Test)
    }

    pub fn test_config_for(environment: Environment) -> AppConfig {
        AppConfig {
            environment,
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_vec(),
                ttl: chrono::Duration::days(1),
            },
            cookie: SessionCookieConfig::for_environment(environment, 15),
        }
    }

    /// Application state over a fresh in-memory database.
    pub async fn create_test_state() -> Result<AppState, sqlx::Error> {
        let pool = create_test_db().await?;
        Ok(AppState::new(test_config(), pool))
    }

    /// Insert a test user with hashed password
    pub async fn insert_test_user(
        pool: &SqlitePool,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<i64, sqlx::Error> {
        let password_hash = crate::auth::password::hash_password(password).map_err(|e| {
            sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
        })?;

        let result =
            sqlx::query("INSERT INTO users (email, password_hash, role) VALUES (?, ?, ?)")
                .bind(email)
                .bind(password_hash)
                .bind(role)
                .execute(pool)
                .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn count_users(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}
