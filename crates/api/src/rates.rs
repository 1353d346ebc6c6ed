//! BitPay exchange rate source.
//!
//! `GET {api_url}{currency}` returns `{"data": {"code": "USD", "rate": 61234.5, ...}}`.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use coinvault_core::rates::{RateError, RateSource};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::debug;

const ACCEPT_VERSION: &str = "x-accept-version";

/// Fetches BTC rates from the BitPay REST API.
#[derive(Debug, Clone)]
pub struct BitpayRateSource {
    client: reqwest::Client,
    api_url: String,
}

impl BitpayRateSource {
    /// Creates a source rooted at `api_url` (e.g. `https://bitpay.com/rates/BTC/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_VERSION, HeaderValue::from_static("2.0.0"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }

    fn url_for(&self, currency: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), currency)
    }
}

#[async_trait]
impl RateSource for BitpayRateSource {
    async fn fetch_rate(&self, currency: &str) -> Result<Decimal, RateError> {
        let url = self.url_for(currency);
        debug!(%url, "Fetching BTC rate");

        let body: Value = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| RateError::Request(e.to_string()))?
            .json()
            .await
            .map_err(|e| RateError::InvalidResponse(e.to_string()))?;

        parse_rate(&body)
    }
}

/// Reads `data.rate` without going through a float.
pub(crate) fn parse_rate(body: &Value) -> Result<Decimal, RateError> {
    let rate = body
        .get("data")
        .and_then(|data| data.get("rate"))
        .ok_or_else(|| RateError::InvalidResponse("missing data.rate".to_string()))?;

    let text = match rate {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => {
            return Err(RateError::InvalidResponse(format!(
                "rate is not a number: {other}"
            )));
        }
    };

    let rate = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|e| RateError::InvalidResponse(format!("{text}: {e}")))?;

    if rate.is_sign_negative() || rate.is_zero() {
        return Err(RateError::InvalidResponse(format!("non-positive rate {rate}")));
    }
    Ok(rate)
}
