use crate::external::price_provider::{quote_from_text, PriceProvider, PriceProviderError};
use crate::models::Quote;
use async_trait::async_trait;
use serde::Deserialize;

pub struct TwelveDataProvider {
    client: reqwest::Client,
    api_key: String,
}

impl TwelveDataProvider {
    pub fn from_env() -> Result<Self, PriceProviderError> {
        let api_key = std::env::var("TWELVEDATA_API_KEY")
            .map_err(|_| PriceProviderError::BadResponse("TWELVEDATA_API_KEY not set".into()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

// Success and error payloads share the endpoint; every field is optional.
#[derive(Debug, Deserialize)]
struct TwelveDataQuoteResponse {
    symbol: Option<String>,
    name: Option<String>,
    close: Option<String>,

    status: Option<String>,
    code: Option<u32>,
    message: Option<String>,
}

fn classify_error(symbol: &str, code: Option<u32>, message: Option<String>) -> PriceProviderError {
    let message = message.unwrap_or_default();
    match code {
        Some(404) | Some(400) => PriceProviderError::NotFound(symbol.to_string()),
        Some(429) => PriceProviderError::RateLimited,
        _ if message.contains("API rate limit") || message.contains("credits") => {
            PriceProviderError::RateLimited
        }
        _ if message.contains("not found") => PriceProviderError::NotFound(symbol.to_string()),
        _ => PriceProviderError::BadResponse(message),
    }
}

#[async_trait]
impl PriceProvider for TwelveDataProvider {
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
        let url = "https://api.twelvedata.com/quote";

        let resp = self
            .client
            .get(url)
            .query(&[("symbol", symbol), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(PriceProviderError::RateLimited);
        }

        let body: TwelveDataQuoteResponse = resp
            .json()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        if body.status.as_deref() == Some("error") {
            return Err(classify_error(symbol, body.code, body.message));
        }

        let close = body
            .close
            .ok_or_else(|| PriceProviderError::BadResponse("missing close in quote".into()))?;
        let returned_symbol = body.symbol.unwrap_or_else(|| symbol.to_string());

        quote_from_text(&returned_symbol, body.name.as_deref().unwrap_or_default(), &close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_payload() {
        let body: TwelveDataQuoteResponse = serde_json::from_str(
            r#"{"code":404,"message":"**symbol** not found: ZZZZ","status":"error"}"#,
        )
        .unwrap();
        assert!(matches!(
            classify_error("ZZZZ", body.code, body.message),
            PriceProviderError::NotFound(s) if s == "ZZZZ"
        ));
    }

    #[test]
    fn test_rate_limit_message() {
        let err = classify_error(
            "AAPL",
            Some(200),
            Some("You have run out of API credits for the current minute".into()),
        );
        assert!(matches!(err, PriceProviderError::RateLimited));
    }

    #[test]
    fn test_parse_success_payload() {
        let body: TwelveDataQuoteResponse = serde_json::from_str(
            r#"{"symbol":"AAPL","name":"Apple Inc","exchange":"NASDAQ","close":"189.98000","is_market_open":false}"#,
        )
        .unwrap();
        assert_eq!(body.status, None);
        let quote = quote_from_text(
            body.symbol.as_deref().unwrap(),
            body.name.as_deref().unwrap(),
            body.close.as_deref().unwrap(),
        )
        .unwrap();
        assert_eq!(quote.price.cents(), 18998);
    }
}
