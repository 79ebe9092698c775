//! HTTP sink clients: graph writer, search writer and cache purger.
//!
//! The graph writer is authoritative; its failures abort the pipeline.
//! The search writer treats 404 as a soft skip. The purger is
//! best-effort and its failures are swallowed by the caller.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::health::ReadinessCheck;
use crate::{AggregateError, Result};
use cas_common::{CanonicalConcept, WriterChange};

/// Correlation header propagated on every downstream call.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

async fn probe_gtg(client: &Client, base_url: &str) -> std::result::Result<(), String> {
    let url = format!("{base_url}/__gtg");
    let response = client.get(&url).send().await.map_err(|e| e.to_string())?;
    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("gtg returned {}", response.status()))
    }
}

// ============================================================================
// Graph writer
// ============================================================================

pub struct GraphWriter {
    client: Client,
    base_url: String,
}

impl GraphWriter {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// PUT the canonical concept. A 2xx body decodes into the change
    /// set; 304 and empty bodies mean nothing changed.
    pub async fn put(
        &self,
        concept: &CanonicalConcept,
        slug: &str,
        transaction_id: &str,
    ) -> Result<WriterChange> {
        let url = format!("{}/{}/{}", self.base_url, slug, concept.pref_uuid);
        let response = self
            .client
            .put(&url)
            .header(REQUEST_ID_HEADER, transaction_id)
            .json(concept)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            return Ok(WriterChange::default());
        }
        if status.is_success() {
            let body = response.bytes().await?;
            if body.is_empty() {
                return Ok(WriterChange::default());
            }
            let change: WriterChange = serde_json::from_slice(&body)?;
            debug!(
                uuid = %concept.pref_uuid,
                updated = change.updated_ids.len(),
                "Graph writer accepted concept"
            );
            return Ok(change);
        }

        let body = response.text().await.unwrap_or_default();
        Err(AggregateError::Writer {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ReadinessCheck for GraphWriter {
    fn id(&self) -> &str {
        "graph-writer"
    }

    fn name(&self) -> &str {
        "Graph writer reachable"
    }

    fn severity(&self) -> u8 {
        1
    }

    fn business_impact(&self) -> &str {
        "Canonical concepts cannot be persisted; downstream consumers see stale data"
    }

    fn panic_guide(&self) -> &str {
        "Check the graph writer service and its graph database connectivity"
    }

    async fn check(&self) -> std::result::Result<(), String> {
        probe_gtg(&self.client, &self.base_url).await
    }
}

// ============================================================================
// Search writer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Written,
    /// The search writer has no endpoint for this type; soft skip.
    SkippedNotFound,
}

pub struct SearchWriter {
    client: Client,
    base_url: String,
}

impl SearchWriter {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn put(
        &self,
        concept: &CanonicalConcept,
        slug: &str,
        transaction_id: &str,
    ) -> Result<SearchOutcome> {
        let url = format!("{}/{}/{}", self.base_url, slug, concept.pref_uuid);
        let response = self
            .client
            .put(&url)
            .header(REQUEST_ID_HEADER, transaction_id)
            .json(concept)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(SearchOutcome::Written);
        }
        if status == StatusCode::NOT_FOUND {
            warn!(
                uuid = %concept.pref_uuid,
                slug = %slug,
                "Search writer has no endpoint for this concept, skipping"
            );
            return Ok(SearchOutcome::SkippedNotFound);
        }
        Err(AggregateError::Search {
            status: status.as_u16(),
        })
    }
}

#[async_trait]
impl ReadinessCheck for SearchWriter {
    fn id(&self) -> &str {
        "search-writer"
    }

    fn name(&self) -> &str {
        "Search writer reachable"
    }

    fn business_impact(&self) -> &str {
        "Concept updates do not reach the search index"
    }

    fn panic_guide(&self) -> &str {
        "Check the search writer service and the search cluster behind it"
    }

    async fn check(&self) -> std::result::Result<(), String> {
        probe_gtg(&self.client, &self.base_url).await
    }
}

// ============================================================================
// Cache purger
// ============================================================================

pub struct CachePurger {
    client: Client,
    base_url: String,
}

impl CachePurger {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// POST one purge request carrying every target as a repeated
    /// `target=` query parameter.
    pub async fn purge(&self, targets: &[String], transaction_id: &str) -> Result<()> {
        if targets.is_empty() {
            return Ok(());
        }

        let params: Vec<(&str, &str)> =
            targets.iter().map(|t| ("target", t.as_str())).collect();

        let response = self
            .client
            .post(format!("{}/purge", self.base_url))
            .header(REQUEST_ID_HEADER, transaction_id)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AggregateError::Purger {
                status: status.as_u16(),
            });
        }
        debug!(count = targets.len(), "Cache targets purged");
        Ok(())
    }
}

#[async_trait]
impl ReadinessCheck for CachePurger {
    fn id(&self) -> &str {
        "cache-purger"
    }

    fn name(&self) -> &str {
        "Cache purger reachable"
    }

    fn severity(&self) -> u8 {
        3
    }

    fn business_impact(&self) -> &str {
        "Edge caches serve stale concept data until entries expire"
    }

    fn panic_guide(&self) -> &str {
        "Check the purger service; purges are best-effort and safe to replay"
    }

    async fn check(&self) -> std::result::Result<(), String> {
        probe_gtg(&self.client, &self.base_url).await
    }
}
