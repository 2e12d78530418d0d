use crate::external::price_provider::{quote_from_text, PriceProvider, PriceProviderError};
use crate::models::Quote;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

pub struct AlphaVantageProvider {
    client: reqwest::Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn from_env() -> Result<Self, PriceProviderError> {
        let api_key = std::env::var("ALPHAVANTAGE_API_KEY")
            .map_err(|_| PriceProviderError::BadResponse("ALPHAVANTAGE_API_KEY not set".into()))?;

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct AvGlobalQuoteResponse {
    // Unknown symbols come back as an empty object: { "Global Quote": {} }
    #[serde(rename = "Global Quote")]
    global_quote: Option<HashMap<String, String>>,

    // When rate-limited Alpha Vantage returns:
    // { "Note": "Thank you for using Alpha Vantage! ... 5 calls per minute ..." }
    #[serde(rename = "Note")]
    note: Option<String>,

    #[serde(rename = "Information")]
    information: Option<String>,

    // When invalid:
    // { "Error Message": "Invalid API call. ..." }
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
}

fn quote_from_body(symbol: &str, body: AvGlobalQuoteResponse) -> Result<Quote, PriceProviderError> {
    if body.note.is_some() || body.information.is_some() {
        return Err(PriceProviderError::RateLimited);
    }

    if body.error_message.is_some() {
        return Err(PriceProviderError::NotFound(symbol.to_string()));
    }

    let fields = body
        .global_quote
        .ok_or_else(|| PriceProviderError::BadResponse("missing Global Quote".into()))?;
    if fields.is_empty() {
        return Err(PriceProviderError::NotFound(symbol.to_string()));
    }

    let price = fields
        .get("05. price")
        .ok_or_else(|| PriceProviderError::BadResponse("missing price".into()))?;
    let returned_symbol = fields
        .get("01. symbol")
        .map(String::as_str)
        .unwrap_or(symbol);

    // GLOBAL_QUOTE carries no company name.
    quote_from_text(returned_symbol, returned_symbol, price)
}

#[async_trait]
impl PriceProvider for AlphaVantageProvider {
    async fn lookup(&self, symbol: &str) -> Result<Quote, PriceProviderError> {
        let url = "https://www.alphavantage.co/query";

        let resp = self
            .client
            .get(url)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PriceProviderError::Network(e.to_string()))?;

        let body = resp
            .json::<AvGlobalQuoteResponse>()
            .await
            .map_err(|e| PriceProviderError::Parse(e.to_string()))?;

        quote_from_body(symbol, body)
    }
}
