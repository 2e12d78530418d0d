use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;
use tracing::error;

use crate::external::price_provider::PriceProviderError;
use crate::views;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("invalid username and/or password")]
    Auth,
    #[error("login required")]
    AuthRequired,
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("You don't have enough cash")]
    InsufficientFunds,
    #[error("You don't have enough shares")]
    InsufficientShares,
    #[error("External error: {0}")]
    External(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth => StatusCode::FORBIDDEN,
            AppError::AuthRequired => StatusCode::SEE_OTHER,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InsufficientFunds | AppError::InsufficientShares => StatusCode::BAD_REQUEST,
            AppError::External(_) => StatusCode::BAD_GATEWAY,
            AppError::Db(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the user.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) | AppError::Conflict(msg) | AppError::NotFound(msg) => msg.clone(),
            AppError::External(_) => "price lookup is unavailable, try again later".to_string(),
            AppError::Db(_) | AppError::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::AuthRequired = self {
            return Redirect::to("/login").into_response();
        }

        let status = self.status();
        match &self {
            AppError::Db(e) => error!("Database error: {:?}", e),
            AppError::Internal(msg) => error!("Internal error: {}", msg),
            AppError::External(msg) => error!("Price provider error: {}", msg),
            _ => {}
        }

        (status, views::apology(status, &self.public_message())).into_response()
    }
}

impl From<PriceProviderError> for AppError {
    fn from(value: PriceProviderError) -> Self {
        match value {
            PriceProviderError::NotFound(symbol) => {
                AppError::NotFound(format!("Can't find stock symbol {}", symbol))
            }
            other => AppError::External(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(value: tokio::task::JoinError) -> Self {
        AppError::Internal(value.to_string())
    }
}
