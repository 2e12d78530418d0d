pub(crate) mod auth;
pub(crate) mod health;
pub(crate) mod portfolio;
pub(crate) mod quote;
pub(crate) mod trade;

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Form;
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// URL-encoded form body whose rejection renders the apology page instead of
/// axum's plain-text error.
pub struct HtmlForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for HtmlForm<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(HtmlForm(value))
    }
}
