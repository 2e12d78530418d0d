use serde::{Deserialize, Serialize};

use crate::models::Usd;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: Usd,
}

#[derive(Debug, Deserialize)]
pub struct QuoteForm {
    #[serde(default)]
    pub symbol: String,
}
