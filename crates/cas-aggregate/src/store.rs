//! Object-store source fetcher.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use tracing::debug;
use uuid::Uuid;

use crate::health::ReadinessCheck;
use crate::{AggregateError, Result};
use cas_common::{FetchedSource, SourceRecord};

/// Object metadata key carrying the originating transaction id.
pub const TRANSACTION_ID_METADATA_KEY: &str = "transaction_id";

/// Generate a fresh transaction id for records stored without one, so
/// every downstream call still carries a correlation id.
pub fn new_transaction_id() -> String {
    format!("tid_{}", Uuid::new_v4().simple())
}

#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Fetch the source representation for `uuid`. A missing object is
    /// not an error; the caller decides whether that is fatal.
    async fn get(&self, uuid: &str) -> Result<Option<FetchedSource>>;
}

/// S3-backed source store. Objects are keyed by the hyphen-to-slash
/// transform of the concept uuid.
pub struct S3SourceStore {
    client: Client,
    bucket: String,
}

impl S3SourceStore {
    pub fn new(client: Client, bucket: &str) -> Self {
        Self {
            client,
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl SourceStore for S3SourceStore {
    async fn get(&self, uuid: &str) -> Result<Option<FetchedSource>> {
        let key = uuid.replace('-', "/");

        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    debug!(uuid = %uuid, bucket = %self.bucket, "Source object not found");
                    return Ok(None);
                }
                return Err(AggregateError::Store(service_err.to_string()));
            }
        };

        let transaction_id = output
            .metadata()
            .and_then(|m| m.get(TRANSACTION_ID_METADATA_KEY))
            .cloned()
            .unwrap_or_else(new_transaction_id);

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| AggregateError::Store(e.to_string()))?
            .into_bytes();

        let record: SourceRecord = serde_json::from_slice(&bytes)
            .map_err(|e| AggregateError::Store(format!("undecodable source {uuid}: {e}")))?;

        debug!(uuid = %uuid, transaction_id = %transaction_id, "Fetched source record");
        Ok(Some(FetchedSource {
            record,
            transaction_id,
        }))
    }
}

#[async_trait]
impl ReadinessCheck for S3SourceStore {
    fn id(&self) -> &str {
        "object-store"
    }

    fn name(&self) -> &str {
        "Source object store reachable"
    }

    fn severity(&self) -> u8 {
        1
    }

    fn business_impact(&self) -> &str {
        "Source representations cannot be fetched; no concept can be aggregated"
    }

    fn panic_guide(&self) -> &str {
        "Check S3 bucket permissions and AWS connectivity from this service"
    }

    async fn check(&self) -> std::result::Result<(), String> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| e.into_service_error().to_string())
    }
}
