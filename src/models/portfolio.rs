use serde::Serialize;

use crate::models::Usd;

// One holding valued at the current quote. `price`/`value` are absent when
// the symbol could not be quoted for this request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioLine {
    pub symbol: String,
    pub name: String,
    pub shares: i64,
    pub price: Option<Usd>,
    pub value: Option<Usd>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Portfolio {
    pub username: String,
    pub cash: Usd,
    pub lines: Vec<PortfolioLine>,
    pub total: Usd,
}

impl Portfolio {
    pub fn holdings_value(&self) -> Usd {
        self.lines.iter().filter_map(|l| l.value).sum()
    }
}
