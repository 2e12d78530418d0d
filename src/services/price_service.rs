use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::external::price_provider::PriceProvider;
use crate::models::Quote;
use crate::services::failure_cache::{FailureCache, FailureType};

fn symbol_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9][A-Z0-9.\-]{0,9}$").expect("valid symbol regex"))
}

/// Trims and upper-cases a ticker typed into a form.
pub fn normalize_symbol(raw: &str) -> Result<String, AppError> {
    let symbol = raw.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AppError::Validation("must provide symbol".into()));
    }
    if !symbol_pattern().is_match(&symbol) {
        return Err(AppError::NotFound(format!("Can't find stock symbol {}", symbol)));
    }
    Ok(symbol)
}

/// Fetches a fresh quote, consulting the failure cache first.
pub async fn lookup(
    provider: &dyn PriceProvider,
    failure_cache: &FailureCache,
    symbol: &str,
) -> Result<Quote, AppError> {
    if let Some(failure) = failure_cache.recent_failure(symbol) {
        info!("⚠️ Skipping lookup for {} - failed recently ({:?})", symbol, failure.kind);
        return Err(match failure.kind {
            FailureType::NotFound => AppError::NotFound(format!("Can't find stock symbol {}", symbol)),
            other => AppError::External(format!("{} recently failed ({:?})", symbol, other)),
        });
    }

    match provider.lookup(symbol).await {
        Ok(quote) => {
            failure_cache.clear(symbol);
            Ok(quote)
        }
        Err(e) => {
            warn!("Quote lookup failed for {}: {}", symbol, e);
            failure_cache.record(symbol, FailureType::of(&e));
            Err(AppError::from(e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::static_provider::StaticProvider;
    use crate::models::Usd;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk.b").unwrap(), "BRK.B");
        assert!(matches!(normalize_symbol("   "), Err(AppError::Validation(_))));
        assert!(matches!(normalize_symbol("not a ticker"), Err(AppError::NotFound(_))));
        assert!(matches!(normalize_symbol("ABCDEFGHIJK"), Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unknown_symbol_is_cached() {
        let provider = StaticProvider::new();
        let cache = FailureCache::new();

        assert!(matches!(lookup(&provider, &cache, "ZZZZ").await, Err(AppError::NotFound(_))));
        assert!(matches!(lookup(&provider, &cache, "ZZZZ").await, Err(AppError::NotFound(_))));
        assert_eq!(provider.lookups(), 1);
    }

    #[tokio::test]
    async fn test_successful_lookup_is_never_cached() {
        let provider = StaticProvider::new();
        provider.set_quote("IBM", "IBM", Usd::from_dollars(100));
        let cache = FailureCache::new();

        assert_eq!(lookup(&provider, &cache, "IBM").await.unwrap().price, Usd::from_dollars(100));
        provider.set_price("IBM", Usd::from_dollars(101));
        assert_eq!(lookup(&provider, &cache, "IBM").await.unwrap().price, Usd::from_dollars(101));
        assert_eq!(provider.lookups(), 2);
        assert!(cache.is_empty());
    }
}
