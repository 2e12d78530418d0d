use std::any::Any;

use axum::{
    http::{
        header::{CACHE_CONTROL, CONTENT_TYPE, EXPIRES, PRAGMA},
        HeaderValue, StatusCode,
    },
    middleware,
    response::{IntoResponse, Response},
    Router,
};
use tower_http::{catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::errors::AppError;
use crate::routes::{auth, health, portfolio, quote, trade};
use crate::state::AppState;
use crate::views;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .merge(auth::router())
        .merge(quote::router())
        .merge(trade::router())
        .merge(portfolio::router())
        .fallback(not_found)
        .layer(middleware::map_response(render_bare_errors))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(EXPIRES, HeaderValue::from_static("0")))
        .layer(SetResponseHeaderLayer::overriding(PRAGMA, HeaderValue::from_static("no-cache")))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("Page not found".into())
}

// Framework-generated errors (405 and friends) carry no body; give them the
// apology page too.
async fn render_bare_errors(response: Response) -> Response {
    let status = response.status();
    let is_error = status.is_client_error() || status.is_server_error();
    if !is_error || response.headers().contains_key(CONTENT_TYPE) {
        return response;
    }
    let message = status.canonical_reason().unwrap_or("Something went wrong");
    (status, views::apology(status, message)).into_response()
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!("Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        views::apology(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    )
        .into_response()
}
