//! Concordance service client.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::health::ReadinessCheck;
use crate::{AggregateError, Result};
use cas_common::ConcordanceRecord;

/// Read-consistency bookmark forwarded opaque from the notification.
pub const BOOKMARK_HEADER: &str = "X-Read-Bookmark";

#[async_trait]
pub trait ConcordanceResolver: Send + Sync {
    /// Return every concordance record tied to the same canonical as
    /// `uuid`, including the queried uuid itself.
    async fn resolve(&self, uuid: &str, bookmark: &str) -> Result<Vec<ConcordanceRecord>>;
}

/// HTTP client for the concordance service.
pub struct HttpConcordanceResolver {
    client: Client,
    base_url: String,
    /// Authority stamped on the synthesized record when the service has
    /// no mapping for a uuid, so a solo concept still aggregates.
    default_authority: String,
}

impl HttpConcordanceResolver {
    pub fn new(client: Client, base_url: &str, default_authority: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            default_authority: default_authority.to_string(),
        }
    }
}

#[async_trait]
impl ConcordanceResolver for HttpConcordanceResolver {
    async fn resolve(&self, uuid: &str, bookmark: &str) -> Result<Vec<ConcordanceRecord>> {
        let url = format!("{}/concordances/{}", self.base_url, uuid);
        let mut request = self.client.get(&url);
        if !bookmark.is_empty() {
            request = request.header(BOOKMARK_HEADER, bookmark);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AggregateError::Resolver(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                let records: Vec<ConcordanceRecord> = response
                    .json()
                    .await
                    .map_err(|e| AggregateError::Resolver(e.to_string()))?;
                debug!(uuid = %uuid, count = records.len(), "Resolved concordances");
                Ok(records)
            }
            StatusCode::NOT_FOUND => {
                debug!(uuid = %uuid, "No concordances, treating as solo concept");
                Ok(vec![ConcordanceRecord {
                    uuid: uuid.to_string(),
                    authority: self.default_authority.clone(),
                    authority_value: uuid.to_string(),
                }])
            }
            status => Err(AggregateError::Resolver(format!(
                "concordance lookup for {uuid} returned {status}"
            ))),
        }
    }
}

#[async_trait]
impl ReadinessCheck for HttpConcordanceResolver {
    fn id(&self) -> &str {
        "concordance-service"
    }

    fn name(&self) -> &str {
        "Concordance service reachable"
    }

    fn business_impact(&self) -> &str {
        "New or updated source records cannot be aggregated into canonical concepts"
    }

    fn panic_guide(&self) -> &str {
        "Check the concordance service health endpoints and its datastore connectivity"
    }

    async fn check(&self) -> std::result::Result<(), String> {
        let url = format!("{}/__gtg", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| e.to_string())?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("gtg returned {}", response.status()))
        }
    }
}
