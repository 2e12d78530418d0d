use sqlx::{Executor, Sqlite, SqliteConnection};
use uuid::Uuid;

use crate::models::Holding;

/// Non-empty holdings for a user, alphabetically by symbol.
pub async fn fetch_all<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Holding>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Holding>(
        "SELECT user_id, stock, shares FROM holdings
         WHERE user_id = $1 AND shares > 0
         ORDER BY stock",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub async fn fetch_one<'e, E>(
    executor: E,
    user_id: Uuid,
    stock: &str,
) -> Result<Option<Holding>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Holding>(
        "SELECT user_id, stock, shares FROM holdings WHERE user_id = $1 AND stock = $2",
    )
    .bind(user_id)
    .bind(stock)
    .fetch_optional(executor)
    .await
}

/// Inserts the holding or adds to it in place. Returns the new share count.
pub async fn add_shares(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    stock: &str,
    shares: i64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO holdings (user_id, stock, shares) VALUES ($1, $2, $3)
         ON CONFLICT (user_id, stock) DO UPDATE SET shares = shares + excluded.shares
         RETURNING shares",
    )
    .bind(user_id)
    .bind(stock)
    .bind(shares)
    .fetch_one(conn)
    .await
}

/// Removes `shares` only if that many are held. Returns the remaining count,
/// or `None` when the holding is missing or too small.
pub async fn remove_shares(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    stock: &str,
    shares: i64,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "UPDATE holdings SET shares = shares - $3
         WHERE user_id = $1 AND stock = $2 AND shares >= $3
         RETURNING shares",
    )
    .bind(user_id)
    .bind(stock)
    .bind(shares)
    .fetch_optional(conn)
    .await
}

pub async fn delete_if_empty(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    stock: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM holdings WHERE user_id = $1 AND stock = $2 AND shares = 0")
        .bind(user_id)
        .bind(stock)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
