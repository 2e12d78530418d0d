use async_trait::async_trait;
use bigdecimal::BigDecimal;
use thiserror::Error;

use crate::models::{Quote, Usd};

#[derive(Debug, Error)]
pub enum PriceProviderError {
    #[error("unknown symbol: {0}")]
    NotFound(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Current quote for `symbol`. Symbols are passed upper-cased.
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError>;
}

/// Builds a `Quote` from a provider's decimal price text.
pub(crate) fn quote_from_text(
    symbol: &str,
    name: &str,
    price: &str,
) -> Result<Quote, PriceProviderError> {
    let decimal = price
        .trim()
        .parse::<BigDecimal>()
        .map_err(|e| PriceProviderError::Parse(format!("price {:?}: {}", price, e)))?;
    let price = Usd::from_decimal(&decimal)
        .ok_or_else(|| PriceProviderError::Parse(format!("price out of range: {}", price)))?;

    Ok(Quote {
        symbol: symbol.to_string(),
        name: if name.trim().is_empty() { symbol.to_string() } else { name.to_string() },
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_from_text_rounds_price() {
        let quote = quote_from_text("AAPL", "Apple Inc", "189.9871").unwrap();
        assert_eq!(quote.price, Usd::from_cents(18999));
        assert_eq!(quote.name, "Apple Inc");
    }

    #[test]
    fn test_quote_from_text_falls_back_to_symbol_name() {
        let quote = quote_from_text("IBM", "  ", "150").unwrap();
        assert_eq!(quote.name, "IBM");
    }

    #[test]
    fn test_quote_from_text_rejects_garbage() {
        assert!(matches!(
            quote_from_text("IBM", "IBM", "n/a"),
            Err(PriceProviderError::Parse(_))
        ));
        assert!(matches!(
            quote_from_text("IBM", "IBM", "-3"),
            Err(PriceProviderError::Parse(_))
        ));
    }
}
