use futures::future::join_all;
use sqlx::SqlitePool;
use tracing::warn;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{HistoryEntry, Portfolio, PortfolioLine, Usd};
use crate::services::failure_cache::FailureCache;
use crate::services::price_service;

/// Values every holding at its current quote. Lookups run concurrently, one
/// per holding; a holding that cannot be quoted is listed without a value.
pub async fn portfolio(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    user_id: Uuid,
) -> Result<Portfolio, AppError> {
    // Cash and holdings come from one snapshot so a trade committing in
    // between cannot be counted twice. Quotes are fetched after it closes.
    let mut tx = pool.begin().await?;
    let user = db::user_queries::fetch_one(&mut *tx, user_id)
        .await?
        .ok_or(AppError::AuthRequired)?;
    let holdings = db::holding_queries::fetch_all(&mut *tx, user_id).await?;
    tx.commit().await?;

    let quotes = join_all(
        holdings
            .iter()
            .map(|h| price_service::lookup(provider, failure_cache, &h.stock)),
    )
    .await;

    let mut lines = Vec::with_capacity(holdings.len());
    for (holding, quote) in holdings.into_iter().zip(quotes) {
        let line = match quote {
            Ok(quote) => PortfolioLine {
                value: quote.price.checked_mul_shares(holding.shares),
                price: Some(quote.price),
                name: quote.name,
                symbol: holding.stock,
                shares: holding.shares,
            },
            Err(e) => {
                warn!("Could not value {} for user {}: {}", holding.stock, user_id, e);
                PortfolioLine {
                    name: holding.stock.clone(),
                    symbol: holding.stock,
                    shares: holding.shares,
                    price: None,
                    value: None,
                }
            }
        };
        lines.push(line);
    }

    let total = lines
        .iter()
        .filter_map(|l| l.value)
        .try_fold(user.cash, Usd::checked_add)
        .ok_or_else(|| AppError::Internal(format!("portfolio total overflow for {}", user_id)))?;

    Ok(Portfolio {
        username: user.username,
        cash: user.cash,
        lines,
        total,
    })
}

/// Every transaction for the user, most recent first.
pub async fn history(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<HistoryEntry>, AppError> {
    Ok(db::history_queries::fetch_by_user(pool, user_id).await?)
}

/// Symbols with a non-zero holding, for the sell form.
pub async fn held_symbols(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<String>, AppError> {
    let holdings = db::holding_queries::fetch_all(pool, user_id).await?;
    Ok(holdings.into_iter().map(|h| h.stock).collect())
}
