use std::sync::Arc;
use sqlx::SqlitePool;
use crate::external::price_provider::PriceProvider;
use crate::services::failure_cache::FailureCache;
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub price_provider: Arc<dyn PriceProvider>,
    pub failure_cache: FailureCache,
    pub sessions: SessionStore,
}
