use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{LoginForm, RegisterForm};
use crate::routes::HtmlForm;
use crate::services::account_service;
use crate::session::{clear_session_cookie, session_cookie, RequestContext};
use crate::state::AppState;
use crate::views;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
}

/// Visiting either credential form ends whatever session the browser had.
async fn register_form(State(state): State<AppState>, ctx: RequestContext) -> Response {
    info!("GET /register");
    ctx.clear(&state.sessions);
    signed_out(views::register_form())
}

async fn register(
    State(state): State<AppState>,
    ctx: RequestContext,
    HtmlForm(form): HtmlForm<RegisterForm>,
) -> Result<Response, AppError> {
    info!("POST /register - Registering {:?}", form.username);
    ctx.clear(&state.sessions);

    let user_id = account_service::register(&state.pool, &form.username, &form.password, &form.confirmation)
        .await
        .map_err(|e| {
            warn!("Registration of {:?} failed: {}", form.username, e);
            e
        })?;

    start_session(&state, user_id)
}

async fn login_form(State(state): State<AppState>, ctx: RequestContext) -> Response {
    info!("GET /login");
    ctx.clear(&state.sessions);
    signed_out(views::login_form())
}

async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    HtmlForm(form): HtmlForm<LoginForm>,
) -> Result<Response, AppError> {
    info!("POST /login - {:?}", form.username);
    ctx.clear(&state.sessions);

    let user_id = account_service::login(&state.pool, &form.username, &form.password)
        .await
        .map_err(|e| {
            warn!("Login for {:?} failed: {}", form.username, e);
            e
        })?;

    start_session(&state, user_id)
}

async fn logout(State(state): State<AppState>, ctx: RequestContext) -> Response {
    info!("GET /logout - user {:?}", ctx.user_id);
    ctx.clear(&state.sessions);
    ([(SET_COOKIE, clear_session_cookie())], Redirect::to("/login")).into_response()
}

fn start_session(state: &AppState, user_id: uuid::Uuid) -> Result<Response, AppError> {
    let token = state.sessions.create(user_id)?;
    Ok(([(SET_COOKIE, session_cookie(&token))], Redirect::to("/")).into_response())
}

fn signed_out(page: Html<String>) -> Response {
    ([(SET_COOKIE, clear_session_cookie())], page).into_response()
}
