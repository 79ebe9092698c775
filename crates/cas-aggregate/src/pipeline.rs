//! Ordered fan-out of a merged concept to every downstream sink.
//!
//! Step order is fixed: graph writer (authoritative), cache purger
//! (best-effort), search writer (404 soft-skips), event queue, stream.
//! Any required-sink failure aborts the message so the notification is
//! redelivered.

use std::sync::Arc;
use tracing::{info, warn};

use crate::merge::ConceptAggregator;
use crate::sinks::{CachePurger, GraphWriter, SearchWriter};
use crate::stream::StreamAppender;
use crate::types::TypeRegistry;
use crate::Result;
use cas_common::CanonicalConcept;
use cas_queue::EventPublisher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The graph writer reported no change; fan-out was skipped.
    Unchanged,
    Completed {
        updated: usize,
    },
}

pub struct ConceptPipeline {
    aggregator: ConceptAggregator,
    graph_writer: Arc<GraphWriter>,
    search_writer: Arc<SearchWriter>,
    purger: Arc<CachePurger>,
    events: Arc<dyn EventPublisher>,
    stream: Arc<dyn StreamAppender>,
    types: TypeRegistry,
}

impl ConceptPipeline {
    pub fn new(
        aggregator: ConceptAggregator,
        graph_writer: Arc<GraphWriter>,
        search_writer: Arc<SearchWriter>,
        purger: Arc<CachePurger>,
        events: Arc<dyn EventPublisher>,
        stream: Arc<dyn StreamAppender>,
        types: TypeRegistry,
    ) -> Self {
        Self {
            aggregator,
            graph_writer,
            search_writer,
            purger,
            events,
            stream,
            types,
        }
    }

    pub fn aggregator(&self) -> &ConceptAggregator {
        &self.aggregator
    }

    pub async fn process(&self, uuid: &str, bookmark: &str) -> Result<ProcessOutcome> {
        let (concept, transaction_id) = self.aggregator.aggregate(uuid, bookmark).await?;
        let slug = self.types.slug(&concept.concept_type);

        let change = self
            .graph_writer
            .put(&concept, &slug, &transaction_id)
            .await?;

        if change.updated_ids.is_empty() {
            info!(
                uuid = %uuid,
                transaction_id = %transaction_id,
                "Concept unchanged, skipping fan-out"
            );
            return Ok(ProcessOutcome::Unchanged);
        }

        let targets = self.purge_targets(&concept, &slug, &change.updated_ids);
        if let Err(e) = self.purger.purge(&targets, &transaction_id).await {
            warn!(
                uuid = %uuid,
                transaction_id = %transaction_id,
                error = %e,
                "Cache purge failed, continuing"
            );
        }

        if self.types.allowed_in_search(&concept) {
            self.search_writer
                .put(&concept, &slug, &transaction_id)
                .await?;
        }

        self.events
            .publish_batch(&change.changed_records, &transaction_id)
            .await
            .map_err(|e| crate::AggregateError::Events(e.to_string()))?;

        self.stream
            .append(&change.updated_ids, &concept.concept_type)
            .await?;

        info!(
            uuid = %uuid,
            transaction_id = %transaction_id,
            updated = change.updated_ids.len(),
            "Concept fan-out complete"
        );
        Ok(ProcessOutcome::Completed {
            updated: change.updated_ids.len(),
        })
    }

    /// Every updated id gets its things/concepts targets, plus the
    /// per-type target for public endpoint types; the side-purge table
    /// adds the related concept's targets.
    fn purge_targets(
        &self,
        concept: &CanonicalConcept,
        slug: &str,
        updated_ids: &[String],
    ) -> Vec<String> {
        let public = self.types.is_public(&concept.concept_type);
        let mut targets = Vec::with_capacity(updated_ids.len() * 3 + 3);

        for id in updated_ids {
            targets.push(format!("/things/{id}"));
            targets.push(format!("/concepts/{id}"));
            if public {
                targets.push(format!("/{slug}/{id}"));
            }
        }

        if let Some((related, related_slug)) = self.types.side_purge(concept) {
            targets.push(format!("/things/{related}"));
            targets.push(format!("/concepts/{related}"));
            targets.push(format!("/{related_slug}/{related}"));
        }

        targets
    }
}
