use async_trait::async_trait;
use aws_sdk_sqs::types::{
    MessageAttributeValue, QueueAttributeName, SendMessageBatchRequestEntry,
};
use aws_sdk_sqs::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use crate::envelope::parse_notification;
use crate::{EventPublisher, NotificationConsumer, QueueError, Result};
use cas_common::ConceptNotification;

/// SQS batch operations accept at most this many entries per call.
const SQS_BATCH_LIMIT: usize = 10;

/// AWS SQS notification consumer.
pub struct SqsNotificationConsumer {
    client: Client,
    queue_url: String,
    queue_name: String,
    visibility_timeout_seconds: i32,
    wait_time_seconds: i32,
    max_messages: i32,
    running: AtomicBool,
}

impl SqsNotificationConsumer {
    /// Default long poll wait time in seconds.
    /// 5 seconds balances efficiency with shutdown responsiveness.
    /// AWS SQS max is 20 seconds.
    pub const DEFAULT_WAIT_TIME_SECONDS: i32 = 5;

    pub fn new(client: Client, queue_url: String, visibility_timeout_seconds: i32) -> Self {
        let queue_name = queue_url
            .rsplit('/')
            .next()
            .unwrap_or("unknown")
            .to_string();

        Self {
            client,
            queue_url,
            queue_name,
            visibility_timeout_seconds,
            wait_time_seconds: Self::DEFAULT_WAIT_TIME_SECONDS,
            max_messages: 10,
            running: AtomicBool::new(true),
        }
    }

    /// Set the long poll wait time in seconds (max 20).
    /// Shorter times mean faster shutdown response but more API calls.
    pub fn with_wait_time_seconds(mut self, seconds: i32) -> Self {
        self.wait_time_seconds = seconds.clamp(0, 20);
        self
    }

    /// Set the per-poll batch size (SQS max is 10).
    pub fn with_max_messages(mut self, max: u32) -> Self {
        self.max_messages = max.clamp(1, 10) as i32;
        self
    }
}

#[async_trait]
impl NotificationConsumer for SqsNotificationConsumer {
    fn identifier(&self) -> &str {
        &self.queue_name
    }

    async fn poll(&self) -> Result<Vec<ConceptNotification>> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(QueueError::Stopped);
        }

        let result = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(self.max_messages)
            .visibility_timeout(self.visibility_timeout_seconds)
            .wait_time_seconds(self.wait_time_seconds)
            .send()
            .await
            .map_err(|e| QueueError::Sqs(e.to_string()))?;

        let sqs_messages = result.messages.unwrap_or_default();
        let mut notifications = Vec::with_capacity(sqs_messages.len());

        for sqs_msg in sqs_messages {
            let Some(receipt_handle) = sqs_msg.receipt_handle().map(str::to_string) else {
                warn!(queue = %self.queue_name, "SQS message without receipt handle, skipping");
                continue;
            };

            let body = sqs_msg.body().unwrap_or_default();
            match parse_notification(body) {
                Ok(parsed) => {
                    notifications.push(ConceptNotification {
                        uuid: parsed.uuid,
                        bookmark: parsed.bookmark,
                        receipt_handle,
                    });
                }
                Err(e) => {
                    warn!(
                        queue = %self.queue_name,
                        error = %e,
                        "Dropping malformed notification"
                    );
                    // ACK the malformed message to prevent infinite retries
                    if let Err(e) = self.ack(&receipt_handle).await {
                        warn!(queue = %self.queue_name, error = %e, "Failed to delete malformed notification");
                    }
                }
            }
        }

        if !notifications.is_empty() {
            debug!(
                queue = %self.queue_name,
                count = notifications.len(),
                "Polled notifications from SQS"
            );
        }

        Ok(notifications)
    }

    async fn ack(&self, receipt_handle: &str) -> Result<()> {
        self.client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Sqs(e.to_string()))?;

        debug!(queue = %self.queue_name, "Notification acknowledged in SQS");
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        info!(queue = %self.queue_name, "SQS notification consumer stopped");
    }

    async fn gtg(&self) -> Result<()> {
        self.client
            .get_queue_attributes()
            .queue_url(&self.queue_url)
            .attribute_names(QueueAttributeName::QueueArn)
            .send()
            .await
            .map_err(|e| QueueError::Sqs(e.to_string()))?;
        Ok(())
    }
}

/// AWS SQS publisher for the outbound concept-change event queue.
pub struct SqsEventPublisher {
    client: Client,
    queue_url: String,
    queue_name: String,
}

impl SqsEventPublisher {
    pub fn new(client: Client, queue_url: String) -> Self {
        let queue_name = queue_url
            .rsplit('/')
            .next()
            .unwrap_or("unknown")
            .to_string();

        Self {
            client,
            queue_url,
            queue_name,
        }
    }
}

#[async_trait]
impl EventPublisher for SqsEventPublisher {
    fn identifier(&self) -> &str {
        &self.queue_name
    }

    async fn publish_batch(
        &self,
        events: &[serde_json::Value],
        transaction_id: &str,
    ) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        let tx_attribute = MessageAttributeValue::builder()
            .data_type("String")
            .string_value(transaction_id)
            .build()
            .map_err(|e| QueueError::Sqs(e.to_string()))?;

        for (chunk_idx, chunk) in events.chunks(SQS_BATCH_LIMIT).enumerate() {
            let mut entries = Vec::with_capacity(chunk.len());
            for (i, event) in chunk.iter().enumerate() {
                let entry = SendMessageBatchRequestEntry::builder()
                    .id(format!("event-{}-{}", chunk_idx, i))
                    .message_body(event.to_string())
                    .message_attributes("X-Request-Id", tx_attribute.clone())
                    .build()
                    .map_err(|e| QueueError::Sqs(e.to_string()))?;
                entries.push(entry);
            }

            let result = self
                .client
                .send_message_batch()
                .queue_url(&self.queue_url)
                .set_entries(Some(entries))
                .send()
                .await
                .map_err(|e| QueueError::Sqs(e.to_string()))?;

            let failed = result.failed();
            if !failed.is_empty() {
                for failure in failed {
                    warn!(
                        queue = %self.queue_name,
                        entry = %failure.id(),
                        code = %failure.code(),
                        "Event batch entry rejected"
                    );
                }
                return Err(QueueError::PartialBatch {
                    failed: failed.len(),
                    total: chunk.len(),
                });
            }

            debug!(
                queue = %self.queue_name,
                count = chunk.len(),
                transaction_id = %transaction_id,
                "Event batch published"
            );
        }

        Ok(())
    }
}
