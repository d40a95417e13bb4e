//! User service.

use lostsons_common::{AppError, AppResult, IdGenerator};
use lostsons_db::{entities::user, repositories::UserRepository};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Input for registering a user.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserInput {
    #[validate(length(min = 1, max = 35), custom(function = "validate_username"))]
    pub username: String,

    #[validate(email, length(max = 60))]
    pub email: String,
}

/// Usernames end up in comma-separated form fields.
fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().any(|c| c == ',' || c.is_whitespace()) {
        return Err(ValidationError::new("username_charset"));
    }
    Ok(())
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self {
            user_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a user. Usernames and emails are unique.
    pub async fn create(&self, input: CreateUserInput) -> AppResult<user::Model> {
        input.validate()?;

        if self.user_repo.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::Conflict("Username already taken".to_string()));
        }
        if self.user_repo.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let user = self
            .user_repo
            .create(self.id_gen.generate(), input.username, input.email)
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "Registered user");
        Ok(user)
    }

    /// List users alphabetically.
    pub async fn list(&self, limit: u64, offset: u64) -> AppResult<Vec<user::Model>> {
        self.user_repo.list(limit, offset).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn existing(username: &str, email: &str) -> user::Model {
        user::Model {
            id: "u1".to_string(),
            username: username.to_string(),
            email: email.to_string(),
        }
    }

    fn input(username: &str, email: &str) -> CreateUserInput {
        CreateUserInput {
            username: username.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[existing("kaz", "kaz@lostsons.tv")]])
            .into_connection();
        let service = UserService::new(UserRepository::new(Arc::new(db)));

        let user = service.create(input("kaz", "kaz@lostsons.tv")).await.unwrap();
        assert_eq!(user.username, "kaz");
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing("kaz", "other@lostsons.tv")]])
            .into_connection();
        let service = UserService::new(UserRepository::new(Arc::new(db)));

        let result = service.create(input("kaz", "kaz@lostsons.tv")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .append_query_results([[existing("someone", "kaz@lostsons.tv")]])
            .into_connection();
        let service = UserService::new(UserRepository::new(Arc::new(db)));

        let result = service.create(input("kaz", "kaz@lostsons.tv")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_queries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = UserService::new(UserRepository::new(Arc::new(db)));

        for bad in [
            input("", "kaz@lostsons.tv"),
            input("kaz,mo", "kaz@lostsons.tv"),
            input("kaz mo", "kaz@lostsons.tv"),
            input(&"k".repeat(36), "kaz@lostsons.tv"),
            input("kaz", "not-an-email"),
        ] {
            assert!(matches!(
                service.create(bad).await,
                Err(AppError::Validation(_))
            ));
        }
    }
}
