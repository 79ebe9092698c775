//! Fixed worker pool over the notification stream.
//!
//! Each worker loops independently: check the gate, long-poll, then
//! process the batch as short-lived tasks racing a per-message deadline.
//! A worker never re-polls while any of its spawned tasks is still
//! running, so deadline expiry cannot leave work dangling.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::gate::HealthGate;
use crate::pipeline::ConceptPipeline;
use cas_common::ConceptNotification;
use cas_queue::{NotificationConsumer, QueueError};

const UNHEALTHY_BACKOFF: Duration = Duration::from_secs(1);
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(1);

pub struct WorkerPool {
    consumer: Arc<dyn NotificationConsumer>,
    pipeline: Arc<ConceptPipeline>,
    gate: Arc<HealthGate>,
    workers: usize,
    message_timeout: Duration,
}

impl WorkerPool {
    pub fn new(
        consumer: Arc<dyn NotificationConsumer>,
        pipeline: Arc<ConceptPipeline>,
        gate: Arc<HealthGate>,
        workers: usize,
        message_timeout: Duration,
    ) -> Self {
        Self {
            consumer,
            pipeline,
            gate,
            workers,
            message_timeout,
        }
    }

    /// Run until the gate reports shutdown and every worker has drained.
    pub async fn run(&self) {
        info!(workers = self.workers, "Starting worker pool");

        let mut handles = Vec::with_capacity(self.workers);
        for worker_id in 0..self.workers {
            handles.push(tokio::spawn(Self::worker_loop(
                worker_id,
                Arc::clone(&self.consumer),
                Arc::clone(&self.pipeline),
                Arc::clone(&self.gate),
                self.message_timeout,
            )));
        }

        for handle in handles {
            let _ = handle.await;
        }
        info!("Worker pool drained");
    }

    async fn worker_loop(
        worker_id: usize,
        consumer: Arc<dyn NotificationConsumer>,
        pipeline: Arc<ConceptPipeline>,
        gate: Arc<HealthGate>,
        message_timeout: Duration,
    ) {
        info!(worker_id, "Worker started");

        loop {
            if gate.is_shutting_down() {
                break;
            }
            if !gate.is_healthy() {
                tokio::time::sleep(UNHEALTHY_BACKOFF).await;
                continue;
            }

            let batch = match consumer.poll().await {
                Ok(batch) => batch,
                Err(QueueError::Stopped) => break,
                Err(e) => {
                    warn!(worker_id, error = %e, "Notification poll failed");
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    continue;
                }
            };
            if batch.is_empty() {
                continue;
            }

            let mut tasks = Vec::with_capacity(batch.len());
            for notification in batch {
                let pipeline = Arc::clone(&pipeline);
                let consumer = Arc::clone(&consumer);
                tasks.push(tokio::spawn(Self::handle_notification(
                    notification,
                    pipeline,
                    consumer,
                    message_timeout,
                )));
            }

            // Every task finishes (or is cut off by its deadline) before
            // the next poll; a worker never carries work across
            // iterations.
            for task in tasks {
                let _ = task.await;
            }
        }

        info!(worker_id, "Worker exited");
    }

    /// A notification is acknowledged iff the whole fan-out succeeded.
    /// Failures and deadline expiries leave it for SQS redelivery.
    async fn handle_notification(
        notification: ConceptNotification,
        pipeline: Arc<ConceptPipeline>,
        consumer: Arc<dyn NotificationConsumer>,
        message_timeout: Duration,
    ) {
        let ConceptNotification {
            uuid,
            bookmark,
            receipt_handle,
        } = notification;

        match tokio::time::timeout(message_timeout, pipeline.process(&uuid, &bookmark)).await {
            Ok(Ok(_)) => {
                if let Err(e) = consumer.ack(&receipt_handle).await {
                    warn!(
                        uuid = %uuid,
                        error = %e,
                        "Processed but failed to acknowledge; message will redeliver"
                    );
                }
            }
            Ok(Err(e)) => {
                warn!(
                    uuid = %uuid,
                    error = %e,
                    "Processing failed; leaving message for redelivery"
                );
            }
            Err(_) => {
                warn!(
                    uuid = %uuid,
                    timeout_secs = message_timeout.as_secs(),
                    "Processing deadline exceeded; abandoning this attempt"
                );
            }
        }
    }
}
