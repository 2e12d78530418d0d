use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::models::{Usd, User};

pub async fn create(pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO users (id, username, hash, cash) VALUES ($1, $2, $3, $4)")
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.hash)
        .bind(user.cash)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn fetch_one<'e, E>(executor: E, id: Uuid) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>("SELECT id, username, hash, cash FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
}

pub async fn fetch_by_username<'e, E>(executor: E, username: &str) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, User>("SELECT id, username, hash, cash FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(executor)
        .await
}

/// Debits `amount` only if the balance covers it. Returns the new balance,
/// or `None` when the user is missing or short of cash.
pub async fn debit_cash(
    conn: &mut SqliteConnection,
    id: Uuid,
    amount: Usd,
) -> Result<Option<Usd>, sqlx::Error> {
    sqlx::query_scalar::<_, Usd>(
        "UPDATE users SET cash = cash - $2
         WHERE id = $1 AND cash >= $2
         RETURNING cash",
    )
    .bind(id)
    .bind(amount)
    .fetch_optional(conn)
    .await
}

pub async fn credit_cash(
    conn: &mut SqliteConnection,
    id: Uuid,
    amount: Usd,
) -> Result<Option<Usd>, sqlx::Error> {
    sqlx::query_scalar::<_, Usd>("UPDATE users SET cash = cash + $2 WHERE id = $1 RETURNING cash")
        .bind(id)
        .bind(amount)
        .fetch_optional(conn)
        .await
}
