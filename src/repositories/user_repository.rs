use crate::models::user::{User, UserRole, UserUpdate};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("User not found")]
    NotFound,
    #[error("User already exists")]
    AlreadyExists,
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at, updated_at";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> RepositoryResult<User>;
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    async fn update_user(&self, id: i64, changes: &UserUpdate) -> RepositoryResult<User>;
    async fn update_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()>;
    async fn delete_user(&self, id: i64) -> RepositoryResult<()>;
    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    let unique = e
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);

    if unique {
        RepositoryError::AlreadyExists
    } else {
        RepositoryError::Database(e)
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> RepositoryResult<User> {
        let result = sqlx::query("INSERT INTO users (email, password_hash, role) VALUES (?, ?, ?)")
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        let id = result.last_insert_rowid();
        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: &UserUpdate) -> RepositoryResult<User> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = COALESCE(?, email),
                role = COALESCE(?, role),
                updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
            WHERE id = ?
            "#,
        )
        .bind(changes.email.as_deref())
        .bind(changes.role)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?,
                updated_at = strftime('%Y-%m-%dT%H:%M:%SZ', 'now')
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn delete_user(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>> {
        let limit = limit.unwrap_or(100);
        let offset = offset.unwrap_or(0);

        let sql = format!(
            "SELECT {} FROM users ORDER BY id ASC LIMIT ? OFFSET ?",
            USER_COLUMNS
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_pool;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = SqliteUserRepository::new(create_test_pool().await);

        let created = repo
            .create_user("buyer@example.com", "hash", UserRole::User)
            .await
            .unwrap();
        assert_eq!(created.email, "buyer@example.com");
        assert_eq!(created.role, UserRole::User);

        let by_email = repo.find_by_email("buyer@example.com").await.unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(created.id));

        let by_id = repo.find_by_id(created.id).await.unwrap();
        assert_eq!(by_id.map(|u| u.email), Some("buyer@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let repo = SqliteUserRepository::new(create_test_pool().await);
        repo.create_user("mixed@example.com", "hash", UserRole::User)
            .await
            .unwrap();

        let found = repo.find_by_email("MIXED@Example.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_already_exists() {
        let repo = SqliteUserRepository::new(create_test_pool().await);
        repo.create_user("dup@example.com", "hash", UserRole::User)
            .await
            .unwrap();

        let result = repo
            .create_user("DUP@example.com", "other", UserRole::Admin)
            .await;
        assert!(matches!(result, Err(RepositoryError::AlreadyExists)));

        let users = repo.list_users(None, None).await.unwrap();
        assert_eq!(users.len(), 1);
    }

    #[tokio::test]
    async fn test_update_user_changes_only_given_fields() {
        let repo = SqliteUserRepository::new(create_test_pool().await);
        let user = repo
            .create_user("before@example.com", "hash", UserRole::User)
            .await
            .unwrap();

        let changes = UserUpdate {
            email: None,
            role: Some(UserRole::Admin),
        };
        let updated = repo.update_user(user.id, &changes).await.unwrap();
        assert_eq!(updated.email, "before@example.com");
        assert_eq!(updated.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_update_missing_user_is_not_found() {
        let repo = SqliteUserRepository::new(create_test_pool().await);
        let changes = UserUpdate {
            email: Some("x@example.com".to_string()),
            role: None,
        };

        let result = repo.update_user(404, &changes).await;
        assert!(matches!(result, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let repo = SqliteUserRepository::new(create_test_pool().await);
        let user = repo
            .create_user("gone@example.com", "hash", UserRole::User)
            .await
            .unwrap();

        repo.delete_user(user.id).await.unwrap();
        assert!(repo.find_by_id(user.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_user(user.id).await,
            Err(RepositoryError::NotFound)
        ));
    }
}
