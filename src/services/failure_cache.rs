use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::external::price_provider::PriceProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    NotFound,
    RateLimited,
    ApiError,
}

impl FailureType {
    pub fn of(error: &PriceProviderError) -> Self {
        match error {
            PriceProviderError::NotFound(_) => FailureType::NotFound,
            PriceProviderError::RateLimited => FailureType::RateLimited,
            PriceProviderError::Network(_)
            | PriceProviderError::BadResponse(_)
            | PriceProviderError::Parse(_) => FailureType::ApiError,
        }
    }

    /// How long a failure of this kind short-circuits further lookups.
    pub fn ttl(self) -> Duration {
        match self {
            FailureType::NotFound => Duration::hours(1),
            FailureType::RateLimited => Duration::minutes(1),
            FailureType::ApiError => Duration::minutes(5),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LookupFailure {
    pub kind: FailureType,
    pub failed_at: DateTime<Utc>,
}

impl LookupFailure {
    fn live_at(&self, now: DateTime<Utc>) -> bool {
        now < self.failed_at + self.kind.ttl()
    }
}

/// Symbols whose last quote lookup failed, shared across requests.
/// Successful quotes are never stored here.
#[derive(Clone, Default)]
pub struct FailureCache {
    entries: Arc<DashMap<String, LookupFailure>>,
}

impl FailureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The unexpired failure recorded for `symbol`, if any.
    pub fn recent_failure(&self, symbol: &str) -> Option<LookupFailure> {
        self.recent_failure_at(symbol, Utc::now())
    }

    fn recent_failure_at(&self, symbol: &str, now: DateTime<Utc>) -> Option<LookupFailure> {
        let failure = *self.entries.get(symbol)?;
        if failure.live_at(now) {
            return Some(failure);
        }
        self.entries.remove_if(symbol, |_, f| !f.live_at(now));
        None
    }

    pub fn record(&self, symbol: &str, kind: FailureType) {
        self.entries.insert(
            symbol.to_string(),
            LookupFailure {
                kind,
                failed_at: Utc::now(),
            },
        );
    }

    /// Drops every entry whose TTL has run out.
    pub fn purge_expired(&self) {
        self.purge_expired_at(Utc::now());
    }

    fn purge_expired_at(&self, now: DateTime<Utc>) {
        self.entries.retain(|_, failure| failure.live_at(now));
    }

    pub fn clear(&self, symbol: &str) {
        self.entries.remove(symbol);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_and_clears() {
        let cache = FailureCache::new();
        cache.record("ZZZZ", FailureType::NotFound);

        let failure = cache.recent_failure("ZZZZ").unwrap();
        assert_eq!(failure.kind, FailureType::NotFound);
        assert!(cache.recent_failure("AAPL").is_none());

        cache.clear("ZZZZ");
        assert!(cache.recent_failure("ZZZZ").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ttl_by_kind() {
        assert_eq!(FailureType::NotFound.ttl(), Duration::hours(1));
        assert_eq!(FailureType::RateLimited.ttl(), Duration::minutes(1));
        assert_eq!(FailureType::ApiError.ttl(), Duration::minutes(5));
        assert_eq!(
            FailureType::of(&PriceProviderError::Network("reset".into())),
            FailureType::ApiError
        );
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache = FailureCache::new();
        cache.record("SLOW", FailureType::RateLimited);

        let later = Utc::now() + Duration::minutes(2);
        assert!(cache.recent_failure_at("SLOW", later).is_none());
        assert_eq!(cache.len(), 0);

        cache.record("GONE", FailureType::NotFound);
        assert!(cache.recent_failure_at("GONE", later).is_some());
    }

    #[test]
    fn test_purge_drops_only_expired_entries() {
        let cache = FailureCache::new();
        for i in 0..1000 {
            cache.record(&format!("R{}", i), FailureType::RateLimited);
        }
        for i in 0..10 {
            cache.record(&format!("E{}", i), FailureType::ApiError);
        }
        cache.record("ZZZZ", FailureType::NotFound);

        cache.purge_expired();
        assert_eq!(cache.len(), 1011);

        cache.purge_expired_at(Utc::now() + Duration::minutes(2));
        assert_eq!(cache.len(), 11);

        cache.purge_expired_at(Utc::now() + Duration::minutes(6));
        assert_eq!(cache.len(), 1);

        cache.purge_expired_at(Utc::now() + Duration::hours(2));
        assert_eq!(cache.len(), 0);
    }
}
