use sqlx::SqlitePool;
use tracing::{error, info};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::User;
use crate::services::password;

pub const MIN_PASSWORD_LEN: usize = 8;

fn validate_registration(username: &str, password: &str, confirmation: &str) -> Result<(), AppError> {
    if username.trim().is_empty() {
        return Err(AppError::Validation("must provide username".into()));
    }
    if username.trim() != username {
        return Err(AppError::Validation(
            "username must not start or end with whitespace".into(),
        ));
    }
    if password.is_empty() {
        return Err(AppError::Validation("must provide password".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    if password != confirmation {
        return Err(AppError::Validation("Passwords don't match".into()));
    }
    Ok(())
}

/// Creates an account with the starting cash balance and returns its id.
pub async fn register(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    confirmation: &str,
) -> Result<Uuid, AppError> {
    validate_registration(username, password, confirmation)?;

    if db::user_queries::fetch_by_username(pool, username).await?.is_some() {
        return Err(AppError::Conflict("Username already exists".into()));
    }

    let hash = password::hash(password.to_string()).await?;
    let user = User::new(username.to_string(), hash);

    match db::user_queries::create(pool, &user).await {
        Ok(()) => {
            info!("Registered user {} ({})", user.username, user.id);
            Ok(user.id)
        }
        // Lost a race with a concurrent registration of the same name.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(AppError::Conflict("Username already exists".into()))
        }
        Err(e) => {
            error!("Failed to create user {}: {:?}", username, e);
            Err(AppError::Db(e))
        }
    }
}

/// Verifies credentials and returns the user id to bind to the session.
pub async fn login(pool: &SqlitePool, username: &str, password: &str) -> Result<Uuid, AppError> {
    if username.is_empty() {
        return Err(AppError::Validation("must provide username".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("must provide password".into()));
    }

    // Exact, case-sensitive match.
    let Some(user) = db::user_queries::fetch_by_username(pool, username).await? else {
        return Err(AppError::Auth);
    };

    if !password::verify(password.to_string(), user.hash).await? {
        return Err(AppError::Auth);
    }

    info!("User {} logged in", user.id);
    Ok(user.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn user_count(pool: &SqlitePool) -> i64 {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_register_then_login_returns_same_id() {
        let pool = db::memory_pool().await.unwrap();

        let id = register(&pool, "alice", "hunter2hunter2", "hunter2hunter2").await.unwrap();
        let logged_in = login(&pool, "alice", "hunter2hunter2").await.unwrap();

        assert_eq!(id, logged_in);
        let user = db::user_queries::fetch_one(&pool, id).await.unwrap().unwrap();
        assert_eq!(user.cash, crate::models::STARTING_CASH);
        assert_ne!(user.hash, "hunter2hunter2");
    }

    #[tokio::test]
    async fn test_short_passwords_create_no_user() {
        let pool = db::memory_pool().await.unwrap();

        for password in ["a", "1234567", "short"] {
            let result = register(&pool, "bob", password, password).await;
            assert!(matches!(result, Err(AppError::Validation(_))), "{} accepted", password);
        }
        assert_eq!(user_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_registration_validation_order() {
        let pool = db::memory_pool().await.unwrap();

        let cases = [
            ("", "password1", "password1", "must provide username"),
            ("   ", "password1", "password1", "must provide username"),
            (" carol", "password1", "password1", "username must not start or end with whitespace"),
            ("carol\t", "password1", "password1", "username must not start or end with whitespace"),
            ("carol", "", "", "must provide password"),
            ("carol", "short", "short", "password must be at least 8 characters long"),
            ("carol", "short", "other", "password must be at least 8 characters long"),
            ("carol", "password1", "password2", "Passwords don't match"),
        ];
        for (username, password, confirmation, expected) in cases {
            match register(&pool, username, password, confirmation).await {
                Err(AppError::Validation(msg)) => assert_eq!(msg, expected),
                other => panic!("expected validation error, got {:?}", other),
            }
        }
        assert_eq!(user_count(&pool).await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let pool = db::memory_pool().await.unwrap();

        register(&pool, "dave", "password1", "password1").await.unwrap();
        let again = register(&pool, "dave", "password2", "password2").await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        // Usernames are case-sensitive.
        register(&pool, "Dave", "password1", "password1").await.unwrap();
        assert_eq!(user_count(&pool).await, 2);
    }

    #[tokio::test]
    async fn test_login_matches_username_exactly() {
        let pool = db::memory_pool().await.unwrap();
        register(&pool, "frank", "password1", "password1").await.unwrap();

        assert!(matches!(login(&pool, " frank", "password1").await, Err(AppError::Auth)));
        assert!(matches!(login(&pool, "frank ", "password1").await, Err(AppError::Auth)));
        assert!(matches!(login(&pool, "Frank", "password1").await, Err(AppError::Auth)));
        assert!(login(&pool, "frank", "password1").await.is_ok());
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let pool = db::memory_pool().await.unwrap();
        register(&pool, "erin", "password1", "password1").await.unwrap();

        assert!(matches!(login(&pool, "erin", "password2").await, Err(AppError::Auth)));
        assert!(matches!(login(&pool, "nobody", "password1").await, Err(AppError::Auth)));
        assert!(matches!(login(&pool, "", "password1").await, Err(AppError::Validation(_))));
        assert!(matches!(login(&pool, "erin", "").await, Err(AppError::Validation(_))));
    }
}
