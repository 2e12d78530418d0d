use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::Usd;

/// Cash credited to every new account.
pub const STARTING_CASH: Usd = Usd::from_dollars(10_000);

// A registered trader and their uninvested cash.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub hash: String,
    pub cash: Usd,
}

impl User {
    pub fn new(username: String, hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            hash,
            cash: STARTING_CASH,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}
