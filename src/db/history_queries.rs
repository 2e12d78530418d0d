use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::models::{HistoryEntry, Usd};

pub async fn append(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    stock: &str,
    signed_shares: i64,
    price: Usd,
    time: DateTime<Utc>,
) -> Result<HistoryEntry, sqlx::Error> {
    sqlx::query_as::<_, HistoryEntry>(
        "INSERT INTO history (user_id, stock, shares, price, time)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING id, user_id, stock, shares, price, time",
    )
    .bind(user_id)
    .bind(stock)
    .bind(signed_shares)
    .bind(price)
    .bind(time)
    .fetch_one(conn)
    .await
}

/// All transactions for a user, most recent first.
pub async fn fetch_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<HistoryEntry>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, HistoryEntry>(
        "SELECT id, user_id, stock, shares, price, time
         FROM history
         WHERE user_id = $1
         ORDER BY time DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}
