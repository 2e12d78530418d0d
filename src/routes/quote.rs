use axum::{
    extract::State,
    response::Html,
    routing::get,
    Router,
};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::QuoteForm;
use crate::routes::HtmlForm;
use crate::services::trading_service;
use crate::session::AuthUser;
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quote", get(quote_form).post(quote))
}

async fn quote_form(AuthUser(user_id): AuthUser) -> Html<String> {
    info!("GET /quote - user {}", user_id);
    views::quote_form()
}

async fn quote(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    HtmlForm(form): HtmlForm<QuoteForm>,
) -> Result<Html<String>, AppError> {
    info!("POST /quote - user {} asks for {:?}", user_id, form.symbol);

    let quote = trading_service::quote(state.price_provider.as_ref(), &state.failure_cache, &form.symbol)
        .await
        .map_err(|e| {
            warn!("Quote for {:?} failed: {}", form.symbol, e);
            e
        })?;

    Ok(views::quoted(&quote))
}
