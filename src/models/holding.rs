use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// A user's current share count in one symbol. One row per (user, stock).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Holding {
    pub user_id: Uuid,
    pub stock: String,
    pub shares: i64,
}
