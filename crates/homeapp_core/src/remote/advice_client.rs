//! Daily advice client.
//!
//! # Responsibility
//! - Fetch one advice text with a single unauthenticated GET.
//! - Decode `{ "slip": { "id": number, "advice": string } }`, keeping only
//!   `advice`.
//!
//! # Invariants
//! - Exactly one round trip per call; no retry and no caching.

use crate::model::advice::Advice;
use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Default public advice endpoint base.
pub const DEFAULT_ADVICE_BASE_URL: &str = "https://api.adviceslip.com/";

/// Errors surfaced by an advice fetch.
#[derive(Debug, thiserror::Error)]
pub enum AdviceError {
    #[error("advice request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("advice endpoint returned status {0}")]
    Status(u16),
    #[error("advice payload could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Source of daily advice.
#[async_trait]
pub trait AdviceSource: Send + Sync {
    async fn fetch_advice(&self) -> Result<Advice, AdviceError>;
}

#[derive(Debug, Deserialize)]
struct AdviceDto {
    slip: SlipDto,
}

#[derive(Debug, Deserialize)]
struct SlipDto {
    #[allow(dead_code)]
    id: i64,
    advice: String,
}

/// `reqwest`-backed advice source.
pub struct HttpAdviceClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpAdviceClient {
    /// Creates a client for `{base_url}advice` with a request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AdviceError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, http_client))
    }

    /// Creates a client from an existing `reqwest` client.
    pub fn with_client(base_url: &str, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            endpoint: advice_endpoint(base_url),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl AdviceSource for HttpAdviceClient {
    async fn fetch_advice(&self) -> Result<Advice, AdviceError> {
        let started_at = Instant::now();
        let result = fetch_once(&self.http_client, &self.endpoint).await;
        match &result {
            Ok(_) => info!(
                "event=advice_fetch module=remote status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=advice_fetch module=remote status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

async fn fetch_once(client: &reqwest::Client, endpoint: &str) -> Result<Advice, AdviceError> {
    let response = client.get(endpoint).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(AdviceError::Status(status.as_u16()));
    }
    // The public endpoint serves JSON as text/html, so decode from text.
    let body = response.text().await?;
    parse_advice(&body)
}

/// Decodes the advice payload body.
pub fn parse_advice(body: &str) -> Result<Advice, AdviceError> {
    let dto: AdviceDto = serde_json::from_str(body)?;
    Ok(Advice::new(dto.slip.advice))
}

fn advice_endpoint(base_url: &str) -> String {
    format!("{}/advice", base_url.trim().trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::{advice_endpoint, parse_advice, AdviceError};

    #[test]
    fn endpoint_joins_base_with_and_without_trailing_slash() {
        assert_eq!(
            advice_endpoint("https://api.adviceslip.com/"),
            "https://api.adviceslip.com/advice"
        );
        assert_eq!(
            advice_endpoint("http://127.0.0.1:9000"),
            "http://127.0.0.1:9000/advice"
        );
    }

    #[test]
    fn parse_advice_keeps_only_advice_text() {
        let advice =
            parse_advice(r#"{"slip": {"id": 117, "advice": "Never regret."}}"#).expect("valid");
        assert_eq!(advice.text, "Never regret.");
    }

    #[test]
    fn parse_advice_rejects_missing_slip() {
        let err = parse_advice(r#"{"message": "nope"}"#).expect_err("must fail");
        assert!(matches!(err, AdviceError::Decode(_)));
    }
}
