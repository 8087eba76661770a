//! Live feed clients
//!
//! HTTP clients for the dashboard backend (prices, multi-source analysis,
//! COT) and CoinGecko (market table, global stats, charts). Each polled
//! endpoint is exposed as a [`FeedSource`].

mod backend;
mod coingecko;
mod types;

pub use backend::{AnalysisFeed, BackendClient, BackendConfig, CotFeed, PricesFeed, BACKEND_URL};
pub use coingecko::{
    ChartFeed, CoinGeckoClient, CoinGeckoConfig, CoinsFeed, GlobalFeed, COINGECKO_API_URL,
};
pub use types::{
    canonical_symbol, display_name, ChartSeries, CoinCharts, CoinMarket, CotPositioning, CotReport,
    GlobalStats, MarketSnapshot, MultiSourceAnalysis, Quote, VixReading,
};

use async_trait::async_trait;
use std::time::Duration;

/// Feed fetch failure
///
/// None of these reach callers of the scheduler; the poller maps every
/// variant onto the fallback path.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("failed to decode payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl FeedError {
    /// Short label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Status { .. } => "status",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::MalformedPayload(_) => "malformed",
        }
    }
}

impl FeedError {
    /// Classify a reqwest failure; `timeout` is the limit the client was
    /// built with, since reqwest does not report it
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Transport(err)
        }
    }
}

/// A pollable upstream endpoint
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    type Snapshot: Clone + Send + Sync + 'static;

    /// Stable name used in logs and metric labels
    fn name(&self) -> &str;

    /// Fetch one snapshot
    async fn fetch(&self) -> Result<Self::Snapshot, FeedError>;
}

/// GET `url` and return the body, mapping non-success statuses to errors
pub(crate) async fn get_text(
    client: &reqwest::Client,
    timeout: Duration,
    url: &str,
    query: &[(&str, &str)],
) -> Result<String, FeedError> {
    tracing::debug!(url = %url, "Fetching feed");

    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| FeedError::from_reqwest(e, timeout))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(FeedError::Status { status, body });
    }

    response
        .text()
        .await
        .map_err(|e| FeedError::from_reqwest(e, timeout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(FeedError::Timeout(Duration::from_secs(6)).kind(), "timeout");
        assert_eq!(
            FeedError::Status {
                status: 429,
                body: String::new()
            }
            .kind(),
            "status"
        );
        assert_eq!(FeedError::MalformedPayload("x".into()).kind(), "malformed");

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(FeedError::from(decode).kind(), "decode");
    }

    #[tokio::test]
    async fn test_transport_timeout_reports_configured_limit() {
        // Accepts connections but never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let timeout = Duration::from_millis(100);
        let client = reqwest::Client::builder().timeout(timeout).build().unwrap();
        let err = get_text(&client, timeout, &format!("http://{addr}/market/prices"), &[])
            .await
            .unwrap_err();

        assert!(matches!(err, FeedError::Timeout(limit) if limit == timeout));
        assert_eq!(err.to_string(), "request timed out after 100ms");
    }

    #[test]
    fn test_status_display() {
        let err = FeedError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "upstream returned 503: unavailable");
    }
}
