//! Concept aggregation pipeline.
//!
//! - ConceptAggregator: concordance resolution + canonical merge
//! - ConceptPipeline: ordered fan-out to graph, cache, search, events and stream
//! - WorkerPool: notification-driven workers with per-message deadlines
//! - HealthGate: process-wide consumption gate fed by health readings
//! - HealthAggregator: composite readiness over all external dependencies
//! - API: admin HTTP endpoints (concept read, forced send, health probes)

pub mod api;
pub mod concordances;
pub mod error;
pub mod gate;
pub mod health;
pub mod merge;
pub mod pipeline;
pub mod pool;
pub mod sinks;
pub mod store;
pub mod stream;
pub mod types;

pub use concordances::{ConcordanceResolver, HttpConcordanceResolver};
pub use error::AggregateError;
pub use gate::HealthGate;
pub use health::{HealthAggregator, HealthReport, ReadinessCheck};
pub use merge::{AuthorityPolicy, ConceptAggregator};
pub use pipeline::{ConceptPipeline, ProcessOutcome};
pub use pool::WorkerPool;
pub use sinks::{CachePurger, GraphWriter, SearchOutcome, SearchWriter};
pub use store::{S3SourceStore, SourceStore};
pub use stream::{KinesisStreamAppender, StreamAppender};
pub use types::TypeRegistry;

pub type Result<T> = std::result::Result<T, AggregateError>;
