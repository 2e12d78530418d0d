use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::models::Quote;
use async_trait::async_trait;
use tracing::{info, warn};

/// MultiProvider asks the primary provider first and falls back to the
/// secondary one when the primary cannot answer.
///
/// A symbol is only reported unknown when both providers say so; any other
/// failure from both sides surfaces the fallback's error.
pub struct MultiProvider {
    primary: Box<dyn PriceProvider>,
    fallback: Box<dyn PriceProvider>,
}

impl MultiProvider {
    pub fn new(primary: Box<dyn PriceProvider>, fallback: Box<dyn PriceProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PriceProvider for MultiProvider {
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
        let primary_not_found = match self.primary.lookup(symbol).await {
            Ok(quote) => return Ok(quote),
            Err(PriceProviderError::NotFound(_)) => {
                info!("Symbol {} unknown to primary provider, trying fallback", symbol);
                true
            }
            Err(PriceProviderError::RateLimited) => {
                info!("⚠️ Primary provider rate limited, trying fallback");
                false
            }
            Err(e) => {
                warn!("Primary provider error for {}: {}", symbol, e);
                false
            }
        };

        match self.fallback.lookup(symbol).await {
            Ok(quote) => {
                info!("✓ Quoted {} from fallback provider", symbol);
                Ok(quote)
            }
            Err(PriceProviderError::NotFound(s)) => Err(PriceProviderError::NotFound(s)),
            Err(e) if primary_not_found => {
                warn!("Fallback provider failed for {}: {}", symbol, e);
                Err(PriceProviderError::NotFound(symbol.to_string()))
            }
            Err(e) => {
                warn!("Fallback provider failed for {}: {}", symbol, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::static_provider::StaticProvider;
    use crate::models::Usd;

    struct Failing;

    #[async_trait]
    impl PriceProvider for Failing {
        async fn lookup(&self, _symbol: &str) -> Result<Quote, PriceProviderError> {
            Err(PriceProviderError::Network("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_errors() {
        let fallback = StaticProvider::new();
        fallback.set_quote("IBM", "IBM", Usd::from_dollars(150));
        let multi = MultiProvider::new(Box::new(Failing), Box::new(fallback));

        let quote = multi.lookup("IBM").await.unwrap();
        assert_eq!(quote.price, Usd::from_dollars(150));
    }

    #[tokio::test]
    async fn test_not_found_when_both_miss() {
        let multi = MultiProvider::new(Box::new(StaticProvider::new()), Box::new(StaticProvider::new()));
        assert!(matches!(
            multi.lookup("ZZZZ").await,
            Err(PriceProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_primary_miss_and_fallback_outage_is_not_found() {
        let multi = MultiProvider::new(Box::new(StaticProvider::new()), Box::new(Failing));
        assert!(matches!(
            multi.lookup("ZZZZ").await,
            Err(PriceProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_both_down_is_not_not_found() {
        let multi = MultiProvider::new(Box::new(Failing), Box::new(Failing));
        assert!(matches!(
            multi.lookup("IBM").await,
            Err(PriceProviderError::Network(_))
        ));
    }
}
