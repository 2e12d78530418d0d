use axum::{
    extract::State,
    response::Html,
    routing::get,
    Router,
};
use tracing::{error, info};

use crate::errors::AppError;
use crate::services::portfolio_service;
use crate::session::AuthUser;
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/history", get(history))
}

async fn index(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Html<String>, AppError> {
    info!("GET / - portfolio for user {}", user_id);

    let portfolio = portfolio_service::portfolio(
        &state.pool,
        state.price_provider.as_ref(),
        &state.failure_cache,
        user_id,
    )
    .await
    .map_err(|e| {
        error!("Failed to build portfolio for user {}: {}", user_id, e);
        e
    })?;

    Ok(views::index(&portfolio))
}

async fn history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Html<String>, AppError> {
    info!("GET /history - user {}", user_id);

    let entries = portfolio_service::history(&state.pool, user_id)
        .await
        .map_err(|e| {
            error!("Failed to load history for user {}: {}", user_id, e);
            e
        })?;

    Ok(views::history(&entries))
}
