//! Notification stream appender.

use async_trait::async_trait;
use aws_sdk_kinesis::primitives::Blob;
use aws_sdk_kinesis::Client;
use tracing::debug;

use crate::health::ReadinessCheck;
use crate::{AggregateError, Result};

#[async_trait]
pub trait StreamAppender: Send + Sync {
    /// Append the updated ids as one record, partitioned by concept type.
    async fn append(&self, updated_ids: &[String], partition_key: &str) -> Result<()>;
}

pub struct KinesisStreamAppender {
    client: Client,
    stream_name: String,
}

impl KinesisStreamAppender {
    pub fn new(client: Client, stream_name: &str) -> Self {
        Self {
            client,
            stream_name: stream_name.to_string(),
        }
    }
}

#[async_trait]
impl StreamAppender for KinesisStreamAppender {
    async fn append(&self, updated_ids: &[String], partition_key: &str) -> Result<()> {
        let data = serde_json::to_vec(updated_ids)?;

        self.client
            .put_record()
            .stream_name(&self.stream_name)
            .partition_key(partition_key)
            .data(Blob::new(data))
            .send()
            .await
            .map_err(|e| AggregateError::Stream(e.into_service_error().to_string()))?;

        debug!(
            stream = %self.stream_name,
            partition_key = %partition_key,
            count = updated_ids.len(),
            "Updated ids appended to stream"
        );
        Ok(())
    }
}

#[async_trait]
impl ReadinessCheck for KinesisStreamAppender {
    fn id(&self) -> &str {
        "notification-stream"
    }

    fn name(&self) -> &str {
        "Notification stream reachable"
    }

    fn business_impact(&self) -> &str {
        "Downstream consumers are not told about updated concepts"
    }

    fn panic_guide(&self) -> &str {
        "Check the Kinesis stream status and AWS connectivity from this service"
    }

    async fn check(&self) -> std::result::Result<(), String> {
        self.client
            .describe_stream_summary()
            .stream_name(&self.stream_name)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| e.into_service_error().to_string())
    }
}
