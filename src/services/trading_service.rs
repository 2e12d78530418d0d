use std::future::Future;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::{Quote, Side, TradeReceipt, Usd};
use crate::services::failure_cache::FailureCache;
use crate::services::price_service;

/// Parses the share count typed into the buy/sell form.
pub fn parse_shares(raw: &str) -> Result<i64, AppError> {
    match raw.trim().parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::Validation("please insert a positive integer".into())),
    }
}

fn trade_amount(price: Usd, shares: i64) -> Result<Usd, AppError> {
    price
        .checked_mul_shares(shares)
        .ok_or_else(|| AppError::Validation("order is too large".into()))
}

/// Runs a ledger transaction, retrying once if the database reports lock
/// contention. A second failure is returned as-is.
async fn with_retry<T, F, Fut>(operation: &str, mut run: F) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    match run().await {
        Err(AppError::Db(e)) if db::is_transient(&e) => {
            warn!("{} hit lock contention, retrying once: {}", operation, e);
            run().await
        }
        other => other,
    }
}

pub async fn quote(
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    raw_symbol: &str,
) -> Result<Quote, AppError> {
    let symbol = price_service::normalize_symbol(raw_symbol)?;
    price_service::lookup(provider, failure_cache, &symbol).await
}

pub async fn buy(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    user_id: Uuid,
    raw_symbol: &str,
    raw_shares: &str,
) -> Result<TradeReceipt, AppError> {
    let shares = parse_shares(raw_shares)?;
    let symbol = price_service::normalize_symbol(raw_symbol)?;
    let quote = price_service::lookup(provider, failure_cache, &symbol).await?;
    let cost = trade_amount(quote.price, shares)?;

    let receipt = with_retry("buy", || execute_buy(pool, user_id, &symbol, quote.price, shares, cost)).await?;
    info!(
        "User {} bought {} {} at {} (cash now {})",
        user_id, shares, symbol, quote.price, receipt.cash_after
    );
    Ok(receipt)
}

async fn execute_buy(
    pool: &SqlitePool,
    user_id: Uuid,
    symbol: &str,
    price: Usd,
    shares: i64,
    cost: Usd,
) -> Result<TradeReceipt, AppError> {
    let mut tx = pool.begin().await?;

    // The guarded debit comes first so the write lock is held before any
    // dependent read.
    let Some(cash_after) = db::user_queries::debit_cash(&mut *tx, user_id, cost).await? else {
        return Err(match db::user_queries::fetch_one(&mut *tx, user_id).await? {
            Some(_) => AppError::InsufficientFunds,
            None => AppError::AuthRequired,
        });
    };

    db::holding_queries::add_shares(&mut *tx, user_id, symbol, shares).await?;
    db::history_queries::append(&mut *tx, user_id, symbol, Side::Buy.signed(shares), price, Utc::now())
        .await?;

    tx.commit().await?;

    Ok(TradeReceipt {
        side: Side::Buy,
        symbol: symbol.to_string(),
        shares,
        price,
        amount: cost,
        cash_after,
    })
}

pub async fn sell(
    pool: &SqlitePool,
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    user_id: Uuid,
    raw_symbol: &str,
    raw_shares: &str,
) -> Result<TradeReceipt, AppError> {
    let shares = parse_shares(raw_shares)?;
    let symbol = price_service::normalize_symbol(raw_symbol)?;
    let quote = price_service::lookup(provider, failure_cache, &symbol).await?;
    let proceeds = trade_amount(quote.price, shares)?;

    let receipt =
        with_retry("sell", || execute_sell(pool, user_id, &symbol, quote.price, shares, proceeds)).await?;
    info!(
        "User {} sold {} {} at {} (cash now {})",
        user_id, shares, symbol, quote.price, receipt.cash_after
    );
    Ok(receipt)
}

async fn execute_sell(
    pool: &SqlitePool,
    user_id: Uuid,
    symbol: &str,
    price: Usd,
    shares: i64,
    proceeds: Usd,
) -> Result<TradeReceipt, AppError> {
    let mut tx = pool.begin().await?;

    // A missing holding counts as zero shares.
    let Some(remaining) = db::holding_queries::remove_shares(&mut *tx, user_id, symbol, shares).await?
    else {
        return Err(AppError::InsufficientShares);
    };

    let Some(cash_after) = db::user_queries::credit_cash(&mut *tx, user_id, proceeds).await? else {
        return Err(AppError::AuthRequired);
    };

    db::history_queries::append(&mut *tx, user_id, symbol, Side::Sell.signed(shares), price, Utc::now())
        .await?;

    if remaining == 0 {
        db::holding_queries::delete_if_empty(&mut *tx, user_id, symbol).await?;
    }

    tx.commit().await?;

    Ok(TradeReceipt {
        side: Side::Sell,
        symbol: symbol.to_string(),
        shares,
        price,
        amount: proceeds,
        cash_after,
    })
}
