use std::net::SocketAddr;

use chrono::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    TwelveData,
    AlphaVantage,
    Multi,
    Static,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Result<Self, String> {
        match name.trim().to_lowercase().as_str() {
            "twelvedata" => Ok(ProviderKind::TwelveData),
            "alphavantage" => Ok(ProviderKind::AlphaVantage),
            "multi" => Ok(ProviderKind::Multi),
            "static" => Ok(ProviderKind::Static),
            other => Err(format!(
                "Invalid PRICE_PROVIDER: {}. Must be 'twelvedata', 'alphavantage', 'multi' or 'static'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub bind_addr: String,
    pub session_secret: Option<String>,
    pub session_ttl_minutes: i64,
    pub price_provider: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://finance.db?mode=rwc".to_string()),
            database_max_connections: std::env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            session_secret: std::env::var("SESSION_SECRET").ok().filter(|s| !s.is_empty()),
            session_ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            price_provider: std::env::var("PRICE_PROVIDER").unwrap_or_else(|_| "multi".to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database_url.trim().is_empty() {
            return Err("DATABASE_URL is empty".to_string());
        }
        if self.database_max_connections == 0 {
            return Err("DATABASE_MAX_CONNECTIONS must be at least 1".to_string());
        }
        self.bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| format!("BIND_ADDR {:?} is not a socket address: {}", self.bind_addr, e))?;
        if let Some(secret) = &self.session_secret {
            if secret.len() < 32 {
                return Err("SESSION_SECRET must be at least 32 bytes".to_string());
            }
        }
        if self.session_ttl_minutes <= 0 {
            return Err("SESSION_TTL_MINUTES must be positive".to_string());
        }
        ProviderKind::parse(&self.price_provider)?;
        Ok(())
    }

    pub fn provider_kind(&self) -> Result<ProviderKind, String> {
        ProviderKind::parse(&self.price_provider)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::minutes(self.session_ttl_minutes)
    }

    /// Configured secret, or a random per-process one (sessions then do not
    /// survive a restart).
    pub fn session_secret_bytes(&self) -> Vec<u8> {
        match &self.session_secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                tracing::warn!("SESSION_SECRET not set, using a random secret for this process");
                rand::random::<[u8; 32]>().to_vec()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".to_string(),
            database_max_connections: 1,
            bind_addr: "127.0.0.1:3000".to_string(),
            session_secret: None,
            session_ttl_minutes: 120,
            price_provider: "static".to_string(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
        assert_eq!(config().provider_kind(), Ok(ProviderKind::Static));
    }

    #[test]
    fn test_rejects_short_secret() {
        let mut c = config();
        c.session_secret = Some("short".to_string());
        assert!(c.validate().is_err());
        c.session_secret = Some("x".repeat(32));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut c = config();
        c.bind_addr = "localhost".to_string();
        assert!(c.validate().is_err());

        let mut c = config();
        c.price_provider = "iex".to_string();
        assert!(c.validate().is_err());

        let mut c = config();
        c.session_ttl_minutes = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_provider_names_are_case_insensitive() {
        assert_eq!(ProviderKind::parse("TwelveData"), Ok(ProviderKind::TwelveData));
        assert_eq!(ProviderKind::parse(" MULTI "), Ok(ProviderKind::Multi));
    }

    #[test]
    fn test_random_secret_when_unset() {
        let c = config();
        assert_eq!(c.session_secret_bytes().len(), 32);
    }
}
