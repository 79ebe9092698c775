//! Service configuration with TOML files and environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub workers: WorkerConfig,
    pub notifications: NotificationQueueConfig,
    pub store: StoreConfig,
    pub concordances: EndpointConfig,
    pub graph_writer: EndpointConfig,
    pub search_writer: EndpointConfig,
    pub purger: EndpointConfig,
    pub events: EventQueueConfig,
    pub stream: StreamConfig,
    pub authorities: AuthorityConfig,

    /// Concept types with their own public read endpoint; these get an
    /// extra per-type purge target on cache invalidation.
    pub public_types: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            workers: WorkerConfig::default(),
            notifications: NotificationQueueConfig::default(),
            store: StoreConfig::default(),
            concordances: EndpointConfig::default(),
            graph_writer: EndpointConfig::default(),
            search_writer: EndpointConfig::default(),
            purger: EndpointConfig::default(),
            events: EventQueueConfig::default(),
            stream: StreamConfig::default(),
            authorities: AuthorityConfig::default(),
            public_types: vec![
                "Person".to_string(),
                "Organisation".to_string(),
                "Brand".to_string(),
                "PublicCompany".to_string(),
            ],
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub port: u16,
    pub host: String,
    pub request_logging: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
            request_logging: true,
        }
    }
}

/// Worker pool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub count: usize,
    pub message_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            count: 4,
            message_timeout_secs: 15,
        }
    }
}

/// Inbound notification queue (SQS) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationQueueConfig {
    pub queue_url: String,
    pub region: String,
    pub visibility_timeout_secs: u32,
    pub wait_time_secs: u32,
    pub max_messages: u32,
}

impl Default for NotificationQueueConfig {
    fn default() -> Self {
        Self {
            queue_url: String::new(),
            region: "eu-west-1".to_string(),
            visibility_timeout_secs: 30,
            wait_time_secs: 5,
            max_messages: 10,
        }
    }
}

/// Object store (S3) configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    pub bucket: String,
    pub region: String,
}

/// A plain HTTP endpoint base URL.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EndpointConfig {
    pub base_url: String,
}

/// Outbound event queue (SQS) configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EventQueueConfig {
    pub queue_url: String,
    pub region: String,
}

/// Notification stream (Kinesis) configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StreamConfig {
    pub name: String,
    pub region: String,
}

/// Authority precedence configuration. The merge logic never names an
/// authority directly; everything flows from this table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
    /// Top-priority primary authority; also the label synthesized when
    /// the concordance service has no mapping for a uuid.
    pub primary: String,
    /// Secondary primary authority, used when no primary source exists.
    pub secondary: String,
    /// Authority whose scope notes rank second in selection.
    pub wiki: String,
    /// Legacy tag system; its pref labels double as scope-note
    /// candidates for locations.
    pub legacy_tags: String,
    /// Authorities that qualify a Membership concept for search indexing.
    pub curated: Vec<String>,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            primary: "Editorial".to_string(),
            secondary: "Registry".to_string(),
            wiki: "Wikidata".to_string(),
            legacy_tags: "LegacyTags".to_string(),
            curated: vec!["Editorial".to_string()],
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Reject configurations that cannot possibly serve traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers.count == 0 {
            return Err(ConfigError::ValidationError(
                "workers.count must be at least 1".to_string(),
            ));
        }
        if self.notifications.queue_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "notifications.queue_url is required".to_string(),
            ));
        }
        if self.store.bucket.is_empty() {
            return Err(ConfigError::ValidationError(
                "store.bucket is required".to_string(),
            ));
        }
        for (name, endpoint) in [
            ("concordances", &self.concordances),
            ("graph_writer", &self.graph_writer),
            ("search_writer", &self.search_writer),
            ("purger", &self.purger),
        ] {
            if endpoint.base_url.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{name}.base_url is required"
                )));
            }
        }
        if self.events.queue_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "events.queue_url is required".to_string(),
            ));
        }
        if self.stream.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "stream.name is required".to_string(),
            ));
        }
        if self.authorities.primary.is_empty() || self.authorities.secondary.is_empty() {
            return Err(ConfigError::ValidationError(
                "authorities.primary and authorities.secondary are required".to_string(),
            ));
        }
        Ok(())
    }
}
