pub mod history_queries;
pub mod holding_queries;
pub mod user_queries;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use tracing::info;

/// Opens the ledger database. File databases run in WAL mode so readers do
/// not block the single writer.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let mut options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
    if !in_memory {
        options = options.journal_mode(SqliteJournalMode::Wal);
    }

    info!("Opening ledger at {}", database_url);
    SqlitePoolOptions::new()
        .max_connections(if in_memory { 1 } else { max_connections })
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
}

/// Single-connection in-memory ledger with the schema applied.
pub async fn memory_pool() -> Result<SqlitePool, sqlx::Error> {
    let pool = connect("sqlite::memory:", 1).await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// On-disk ledger in the temp directory, removed when dropped. Unlike
/// [`memory_pool`] it serves several connections at once.
#[cfg(test)]
pub(crate) struct TempLedger {
    pub pool: SqlitePool,
    path: std::path::PathBuf,
}

#[cfg(test)]
impl TempLedger {
    pub async fn open(max_connections: u32) -> Result<Self, sqlx::Error> {
        let path = std::env::temp_dir().join(format!("finance-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = connect(&url, max_connections).await?;
        migrate(&pool).await?;
        Ok(Self { pool, path })
    }
}

#[cfg(test)]
impl Drop for TempLedger {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Lock contention that is worth one more attempt.
pub fn is_transient(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => matches!(
            db.code().as_deref(),
            // SQLITE_BUSY, SQLITE_LOCKED, SQLITE_BUSY_SNAPSHOT, SQLITE_LOCKED_SHAREDCACHE,
            // and the postgres serialization/deadlock codes
            Some("5") | Some("6") | Some("517") | Some("262") | Some("40001") | Some("40P01")
        ),
        sqlx::Error::PoolTimedOut => true,
        _ => false,
    }
}
