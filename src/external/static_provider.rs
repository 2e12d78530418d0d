use crate::external::price_provider::{quote_from_text, PriceProvider, PriceProviderError};
use crate::models::{Quote, Usd};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Fixed quote table for offline development and tests.
///
/// Configured from `STATIC_QUOTES`, e.g. `AAPL:Apple Inc:189.98,IBM:IBM:151.23`.
/// Clones share the same table, so prices can be moved while the server runs.
#[derive(Clone, Default)]
pub struct StaticProvider {
    quotes: Arc<DashMap<String, Quote>>,
    lookups: Arc<AtomicUsize>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self, PriceProviderError> {
        let table = std::env::var("STATIC_QUOTES").unwrap_or_default();
        Self::parse(&table)
    }

    pub fn parse(table: &str) -> Result<Self, PriceProviderError> {
        let provider = Self::new();
        for entry in table.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.splitn(3, ':');
            let (Some(symbol), Some(name), Some(price)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(PriceProviderError::Parse(format!(
                    "expected SYMBOL:Name:price, got {:?}",
                    entry
                )));
            };
            let symbol = symbol.trim().to_uppercase();
            let quote = quote_from_text(&symbol, name.trim(), price)?;
            provider.quotes.insert(symbol, quote);
        }
        Ok(provider)
    }

    pub fn set_quote(&self, symbol: &str, name: &str, price: Usd) {
        let symbol = symbol.to_uppercase();
        self.quotes.insert(
            symbol.clone(),
            Quote {
                symbol,
                name: name.to_string(),
                price,
            },
        );
    }

    pub fn set_price(&self, symbol: &str, price: Usd) {
        if let Some(mut quote) = self.quotes.get_mut(&symbol.to_uppercase()) {
            quote.price = price;
        }
    }

    pub fn remove(&self, symbol: &str) {
        self.quotes.remove(&symbol.to_uppercase());
    }

    /// Number of lookups served so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PriceProvider for StaticProvider {
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.quotes
            .get(&symbol.to_uppercase())
            .map(|q| q.value().clone())
            .ok_or_else(|| PriceProviderError::NotFound(symbol.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_parse_quote_table() {
        let provider = StaticProvider::parse("aapl:Apple Inc:189.98, IBM:International Business Machines:151.2").unwrap();

        let apple = provider.lookup("AAPL").await.unwrap();
        assert_eq!(apple.symbol, "AAPL");
        assert_eq!(apple.name, "Apple Inc");
        assert_eq!(apple.price, Usd::from_cents(18998));

        let ibm = provider.lookup("ibm").await.unwrap();
        assert_eq!(ibm.price, Usd::from_cents(15120));
        assert_eq!(provider.lookups(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_entry() {
        assert!(StaticProvider::parse("AAPL:189.98").is_err());
        assert!(StaticProvider::parse("").is_ok());
    }

    #[tokio::test]
    async fn test_clones_share_prices() {
        let provider = StaticProvider::new();
        provider.set_quote("NFLX", "Netflix", Usd::from_dollars(100));
        let handle = provider.clone();
        handle.set_price("NFLX", Usd::from_dollars(150));

        assert_eq!(provider.lookup("NFLX").await.unwrap().price, Usd::from_dollars(150));
        handle.remove("NFLX");
        assert!(matches!(provider.lookup("NFLX").await, Err(PriceProviderError::NotFound(_))));
    }
}
