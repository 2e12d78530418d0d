pub mod alphavantage;
pub mod multi_provider;
pub mod price_provider;
pub mod static_provider;
pub mod twelvedata;

use std::sync::Arc;

use tracing::info;

use crate::config::ProviderKind;
use crate::external::alphavantage::AlphaVantageProvider;
use crate::external::multi_provider::MultiProvider;
use crate::external::price_provider::{PriceProvider, PriceProviderError};
use crate::external::static_provider::StaticProvider;
use crate::external::twelvedata::TwelveDataProvider;

/// Builds the configured quote source from its environment settings.
pub fn provider_from_env(kind: ProviderKind) -> Result<Arc<dyn PriceProvider>, PriceProviderError> {
    let provider: Arc<dyn PriceProvider> = match kind {
        ProviderKind::AlphaVantage => {
            info!("📊 Using price provider: Alpha Vantage only");
            Arc::new(AlphaVantageProvider::from_env()?)
        }
        ProviderKind::TwelveData => {
            info!("📊 Using price provider: Twelve Data only");
            Arc::new(TwelveDataProvider::from_env()?)
        }
        ProviderKind::Multi => {
            info!("📊 Using price provider: Multi-provider (Twelve Data + Alpha Vantage fallback)");
            let primary = Box::new(TwelveDataProvider::from_env()?);
            let fallback = Box::new(AlphaVantageProvider::from_env()?);
            Arc::new(MultiProvider::new(primary, fallback))
        }
        ProviderKind::Static => {
            info!("📊 Using price provider: static quotes from STATIC_QUOTES");
            Arc::new(StaticProvider::from_env()?)
        }
    };
    Ok(provider)
}
