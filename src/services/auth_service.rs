use crate::auth::manager::SessionManager;
use crate::auth::password::HashingError;
use crate::auth::token::{Claims, TokenError};
use crate::models::user::{User, UserRole};
use crate::repositories::user_repository::{RepositoryError, UserRepository};
use crate::validation::{SignInInput, SignUpInput};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    UserNotFound,
    #[error(transparent)]
    Hashing(#[from] HashingError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

/// A user together with the freshly issued session token.
#[derive(Debug, Clone)]
pub struct SignedInUser {
    pub user: User,
    pub token: String,
}

pub struct AuthService {
    user_repository: Arc<dyn UserRepository>,
    sessions: Arc<SessionManager>,
}

impl AuthService {
    pub fn new(user_repository: Arc<dyn UserRepository>, sessions: Arc<SessionManager>) -> Self {
        Self {
            user_repository,
            sessions,
        }
    }

    /// Creates the user row without opening a session.
    pub async fn register(
        &self,
        input: SignUpInput,
        role: UserRole,
    ) -> Result<User, AuthServiceError> {
        if self
            .user_repository
            .find_by_email(&input.email)
            .await?
            .is_some()
        {
            return Err(AuthServiceError::EmailTaken);
        }

        let password_hash = self.sessions.hash_password(input.password).await?;

        // The unique index still guards against a concurrent sign-up for the same email.
        match self
            .user_repository
            .create_user(&input.email, &password_hash, role)
            .await
        {
            Ok(user) => Ok(user),
            Err(RepositoryError::AlreadyExists) => Err(AuthServiceError::EmailTaken),
            Err(e) => Err(AuthServiceError::RepositoryError(e)),
        }
    }

    pub async fn sign_up(&self, input: SignUpInput) -> Result<SignedInUser, AuthServiceError> {
        let user = self.register(input, UserRole::User).await?;
        let token = self.sessions.issue_token(&user)?;

        info!(user_id = user.id, "User registered");
        Ok(SignedInUser { user, token })
    }

    pub async fn sign_in(&self, input: SignInInput) -> Result<SignedInUser, AuthServiceError> {
        let user = self
            .user_repository
            .find_by_email(&input.email)
            .await?
            .ok_or(AuthServiceError::InvalidCredentials)?;

        let matches = self
            .sessions
            .verify_password(input.password, user.password_hash.clone())
            .await?;
        if !matches {
            return Err(AuthServiceError::InvalidCredentials);
        }

        let token = self.sessions.issue_token(&user)?;

        info!(user_id = user.id, "User signed in");
        Ok(SignedInUser { user, token })
    }

    /// Loads the user behind a verified session.
    pub async fn current_user(&self, claims: &Claims) -> Result<User, AuthServiceError> {
        self.user_repository
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AuthServiceError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::repositories::user_repository::MockUserRepository;
    use crate::test_utils::test_helpers::test_config;
    use mockall::predicate::*;

    fn stored_user(password: &str) -> User {
        User {
            id: 1,
            email: "test@example.com".to_string(),
            password_hash: hash_password(password).unwrap(),
            role: UserRole::User,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    fn service(mock_repo: MockUserRepository) -> (AuthService, Arc<SessionManager>) {
        let sessions = Arc::new(SessionManager::new(&test_config()));
        (AuthService::new(Arc::new(mock_repo), sessions.clone()), sessions)
    }

    fn sign_up_input() -> SignUpInput {
        SignUpInput {
            email: "test@example.com".to_string(),
            password: "Secret123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_success() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("test@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        mock_repo
            .expect_create_user()
            .with(eq("test@example.com"), always(), eq(UserRole::User))
            .times(1)
            .returning(|email, password_hash, role| {
                let user = User {
                    id: 1,
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                    role,
                    created_at: "2025-01-01T00:00:00Z".to_string(),
                    updated_at: "2025-01-01T00:00:00Z".to_string(),
                };
                Box::pin(async move { Ok(user) })
            });

        let (service, sessions) = service(mock_repo);
        let signed_in = service.sign_up(sign_up_input()).await.unwrap();

        assert_ne!(signed_in.user.password_hash, "Secret123");
        let claims = sessions.verify_token(&signed_in.token).unwrap();
        assert_eq!(claims.user_id, 1);
        assert_eq!(claims.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_sign_up_existing_email_is_conflict() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .times(1)
            .returning(|_| Box::pin(async move { Ok(Some(stored_user("whatever1"))) }));
        mock_repo.expect_create_user().times(0);

        let (service, _) = service(mock_repo);
        let result = service.sign_up(sign_up_input()).await;
        assert!(matches!(result, Err(AuthServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_sign_up_insert_race_is_conflict() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .returning(|_| Box::pin(async move { Ok(None) }));
        mock_repo
            .expect_create_user()
            .returning(|_, _, _| Box::pin(async move { Err(RepositoryError::AlreadyExists) }));

        let (service, _) = service(mock_repo);
        let result = service.sign_up(sign_up_input()).await;
        assert!(matches!(result, Err(AuthServiceError::EmailTaken)));
    }

    #[tokio::test]
    async fn test_sign_up_propagates_storage_failure() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo.expect_find_by_email().returning(|_| {
            Box::pin(async move { Err(RepositoryError::Database(sqlx::Error::PoolTimedOut)) })
        });

        let (service, _) = service(mock_repo);
        let result = service.sign_up(sign_up_input()).await;
        assert!(matches!(
            result,
            Err(AuthServiceError::RepositoryError(RepositoryError::Database(_)))
        ));
    }

    #[tokio::test]
    async fn test_sign_in_unknown_email_is_generic() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_email()
            .with(eq("nobody@example.com"))
            .times(1)
            .returning(|_| Box::pin(async move { Ok(None) }));

        let (service, _) = service(mock_repo);
        let result = service
            .sign_in(SignInInput {
                email: "nobody@example.com".to_string(),
                password: "Secret123".to_string(),
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, AuthServiceError::InvalidCredentials));
        assert_eq!(err.to_string(), "Invalid email or password");
    }

    #[tokio::test]
    async fn test_sign_in_wrong_password_is_same_error() {
        let mut mock_repo = MockUserRepository::new();
        let user = stored_user("Secret123");

        mock_repo
            .expect_find_by_email()
            .times(1)
            .returning(move |_| {
                let user = user.clone();
                Box::pin(async move { Ok(Some(user)) })
            });

        let (service, _) = service(mock_repo);
        let result = service
            .sign_in(SignInInput {
                email: "test@example.com".to_string(),
                password: "WrongPass1".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AuthServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_sign_in_success_issues_token() {
        let mut mock_repo = MockUserRepository::new();
        let user = stored_user("Secret123");

        mock_repo.expect_find_by_email().returning(move |_| {
            let user = user.clone();
            Box::pin(async move { Ok(Some(user)) })
        });

        let (service, sessions) = service(mock_repo);
        let signed_in = service
            .sign_in(SignInInput {
                email: "test@example.com".to_string(),
                password: "Secret123".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(sessions.verify_token(&signed_in.token).unwrap().user_id, 1);
    }

    #[tokio::test]
    async fn test_current_user_missing_row() {
        let mut mock_repo = MockUserRepository::new();

        mock_repo
            .expect_find_by_id()
            .with(eq(9))
            .returning(|_| Box::pin(async move { Ok(None) }));

        let (service, _) = service(mock_repo);
        let now = chrono::Utc::now();
        let claims = Claims {
            user_id: 9,
            role: UserRole::User,
            issued_at: now,
            expires_at: now,
        };

        let result = service.current_user(&claims).await;
        assert!(matches!(result, Err(AuthServiceError::UserNotFound)));
    }
}
