use axum::{
    extract::State,
    response::{Html, Redirect},
    routing::get,
    Router,
};
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::TradeForm;
use crate::routes::HtmlForm;
use crate::services::{portfolio_service, trading_service};
use crate::session::AuthUser;
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/buy", get(buy_form).post(buy))
        .route("/sell", get(sell_form).post(sell))
}

async fn buy_form(AuthUser(user_id): AuthUser) -> Html<String> {
    info!("GET /buy - user {}", user_id);
    views::buy_form()
}

async fn buy(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    HtmlForm(form): HtmlForm<TradeForm>,
) -> Result<Redirect, AppError> {
    info!("POST /buy - user {} buys {:?} x {:?}", user_id, form.symbol, form.shares);

    trading_service::buy(
        &state.pool,
        state.price_provider.as_ref(),
        &state.failure_cache,
        user_id,
        &form.symbol,
        &form.shares,
    )
    .await
    .map_err(|e| {
        error!("Buy for user {} failed: {}", user_id, e);
        e
    })?;

    Ok(Redirect::to("/"))
}

async fn sell_form(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Html<String>, AppError> {
    info!("GET /sell - user {}", user_id);
    let symbols = portfolio_service::held_symbols(&state.pool, user_id).await?;
    Ok(views::sell_form(&symbols))
}

async fn sell(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    HtmlForm(form): HtmlForm<TradeForm>,
) -> Result<Redirect, AppError> {
    info!("POST /sell - user {} sells {:?} x {:?}", user_id, form.symbol, form.shares);

    trading_service::sell(
        &state.pool,
        state.price_provider.as_ref(),
        &state.failure_cache,
        user_id,
        &form.symbol,
        &form.shares,
    )
    .await
    .map_err(|e| {
        error!("Sell for user {} failed: {}", user_id, e);
        e
    })?;

    Ok(Redirect::to("/"))
}
