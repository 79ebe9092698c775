use async_trait::async_trait;
use cas_common::ConceptNotification;

pub mod envelope;
pub mod error;
pub mod sqs;

pub use error::QueueError;

pub type Result<T> = std::result::Result<T, QueueError>;

/// Trait for consuming concept-update notifications from a queue.
#[async_trait]
pub trait NotificationConsumer: Send + Sync {
    /// Get the unique identifier for this consumer
    fn identifier(&self) -> &str;

    /// Long-poll the queue for the next batch of notifications.
    /// Undecodable or malformed messages are dropped before return.
    async fn poll(&self) -> Result<Vec<ConceptNotification>>;

    /// Acknowledge a notification (remove from queue)
    async fn ack(&self, receipt_handle: &str) -> Result<()>;

    /// Check if the consumer is accepting polls
    fn is_healthy(&self) -> bool;

    /// Stop the consumer
    async fn stop(&self);

    /// Connectivity probe for readiness checks
    async fn gtg(&self) -> Result<()>;
}

/// Trait for publishing concept-change events to the outbound queue.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Get the queue identifier
    fn identifier(&self) -> &str;

    /// Publish a batch of event payloads, tagged with the transaction id.
    /// Every entry must be accepted; a partial batch failure is an error.
    async fn publish_batch(
        &self,
        events: &[serde_json::Value],
        transaction_id: &str,
    ) -> Result<()>;
}
