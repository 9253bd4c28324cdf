use crate::auth::manager::SessionManager;
use crate::auth::password::HashingError;
use crate::auth::token::Claims;
use crate::models::user::{User, UserRole, UserUpdate};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::validation::{normalize_email, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("User not found")]
    UserNotFound,
    #[error("Email already registered")]
    EmailTaken,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("Password must be between 6 and 128 characters")]
    InvalidPassword,
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct UserService {
    repository: Arc<dyn UserRepository>,
    sessions: Arc<SessionManager>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>, sessions: Arc<SessionManager>) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    pub async fn list_users(
        &self,
        actor: &Claims,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        if !actor.is_admin() {
            return Err(UserServiceError::Forbidden);
        }
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn get_user(&self, actor: &Claims, id: i64) -> Result<User, UserServiceError> {
        if !actor.can_access_user(id) {
            return Err(UserServiceError::Forbidden);
        }
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(UserServiceError::UserNotFound)
    }

    pub async fn update_user(
        &self,
        actor: &Claims,
        id: i64,
        changes: UserUpdate,
    ) -> Result<User, UserServiceError> {
        if !actor.can_access_user(id) {
            return Err(UserServiceError::Forbidden);
        }
        // Only admins may change roles, including their own.
        if changes.role.is_some() && !actor.is_admin() {
            return Err(UserServiceError::Forbidden);
        }

        if let Some(ref email) = changes.email {
            if let Some(existing) = self.repository.find_by_email(email).await? {
                if existing.id != id {
                    return Err(UserServiceError::EmailTaken);
                }
            }
        }

        let user = match self.repository.update_user(id, &changes).await {
            Ok(user) => user,
            Err(RepositoryError::NotFound) => return Err(UserServiceError::UserNotFound),
            Err(RepositoryError::AlreadyExists) => return Err(UserServiceError::EmailTaken),
            Err(e) => return Err(UserServiceError::RepositoryError(e)),
        };

        info!(user_id = id, actor_id = actor.user_id, "User updated");
        Ok(user)
    }

    pub async fn delete_user(&self, actor: &Claims, id: i64) -> Result<(), UserServiceError> {
        if !actor.can_access_user(id) {
            return Err(UserServiceError::Forbidden);
        }
        self.remove_user(id).await?;

        info!(user_id = id, actor_id = actor.user_id, "User deleted");
        Ok(())
    }

    /// Operator entry points used by the admin CLI; no session is involved.
    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.repository.find_by_email(&normalize_email(email)).await?)
    }

    pub async fn all_users(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.repository.list_users(limit, offset).await?)
    }

    pub async fn remove_user(&self, id: i64) -> Result<(), UserServiceError> {
        match self.repository.delete_user(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn set_role(&self, id: i64, role: UserRole) -> Result<User, UserServiceError> {
        let changes = UserUpdate {
            email: None,
            role: Some(role),
        };
        match self.repository.update_user(id, &changes).await {
            Ok(user) => Ok(user),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn set_password(&self, id: i64, new_password: &str) -> Result<(), UserServiceError> {
        let length = new_password.chars().count();
        if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&length) {
            return Err(UserServiceError::InvalidPassword);
        }

        let password_hash = self
            .sessions
            .hash_password(new_password.to_string())
            .await?;

        match self.repository.update_password(id, &password_hash).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }
}
