use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Usd;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// Signed share delta as recorded in the history log.
    pub fn signed(self, shares: i64) -> i64 {
        match self {
            Side::Buy => shares,
            Side::Sell => -shares,
        }
    }
}

// One immutable row of the audit log. `shares` is positive for buys and
// negative for sells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: Uuid,
    pub stock: String,
    pub shares: i64,
    pub price: Usd,
    pub time: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn side(&self) -> Side {
        if self.shares < 0 {
            Side::Sell
        } else {
            Side::Buy
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TradeForm {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub shares: String,
}

/// Outcome of a committed buy or sell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeReceipt {
    pub side: Side,
    pub symbol: String,
    pub shares: i64,
    pub price: Usd,
    pub amount: Usd,
    pub cash_after: Usd,
}
