//! Configuration loader with file discovery and environment overrides.

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::info;

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "cas.toml",
    "./config/config.toml",
    "/etc/cas/config.toml",
];

pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file() {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        self.apply_env_overrides(&mut config);

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
        }

        if let Ok(path) = env::var("CAS_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for path in CONFIG_PATHS {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    fn apply_env_overrides(&self, config: &mut AppConfig) {
        // HTTP
        if let Ok(val) = env::var("CAS_HTTP_PORT") {
            if let Ok(port) = val.parse() {
                config.http.port = port;
            }
        }
        if let Ok(val) = env::var("CAS_HTTP_HOST") {
            config.http.host = val;
        }
        if let Ok(val) = env::var("CAS_REQUEST_LOGGING") {
            config.http.request_logging = val.parse().unwrap_or(true);
        }

        // Workers
        if let Ok(val) = env::var("CAS_WORKER_COUNT") {
            if let Ok(count) = val.parse() {
                config.workers.count = count;
            }
        }
        if let Ok(val) = env::var("CAS_MESSAGE_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                config.workers.message_timeout_secs = secs;
            }
        }

        // Notification queue
        if let Ok(val) = env::var("CAS_NOTIFICATIONS_QUEUE_URL") {
            config.notifications.queue_url = val;
        }
        if let Ok(val) = env::var("CAS_NOTIFICATIONS_REGION") {
            config.notifications.region = val;
        }
        if let Ok(val) = env::var("CAS_NOTIFICATIONS_VISIBILITY_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                config.notifications.visibility_timeout_secs = secs;
            }
        }
        if let Ok(val) = env::var("CAS_NOTIFICATIONS_WAIT_TIME") {
            if let Ok(secs) = val.parse() {
                config.notifications.wait_time_secs = secs;
            }
        }
        if let Ok(val) = env::var("CAS_NOTIFICATIONS_MAX_MESSAGES") {
            if let Ok(max) = val.parse() {
                config.notifications.max_messages = max;
            }
        }

        // Object store
        if let Ok(val) = env::var("CAS_STORE_BUCKET") {
            config.store.bucket = val;
        }
        if let Ok(val) = env::var("CAS_STORE_REGION") {
            config.store.region = val;
        }

        // HTTP collaborators
        if let Ok(val) = env::var("CAS_CONCORDANCES_BASE_URL") {
            config.concordances.base_url = val;
        }
        if let Ok(val) = env::var("CAS_GRAPH_WRITER_BASE_URL") {
            config.graph_writer.base_url = val;
        }
        if let Ok(val) = env::var("CAS_SEARCH_WRITER_BASE_URL") {
            config.search_writer.base_url = val;
        }
        if let Ok(val) = env::var("CAS_PURGER_BASE_URL") {
            config.purger.base_url = val;
        }

        // Event queue
        if let Ok(val) = env::var("CAS_EVENTS_QUEUE_URL") {
            config.events.queue_url = val;
        }
        if let Ok(val) = env::var("CAS_EVENTS_REGION") {
            config.events.region = val;
        }

        // Notification stream
        if let Ok(val) = env::var("CAS_STREAM_NAME") {
            config.stream.name = val;
        }
        if let Ok(val) = env::var("CAS_STREAM_REGION") {
            config.stream.region = val;
        }

        // Authorities
        if let Ok(val) = env::var("CAS_AUTHORITY_PRIMARY") {
            config.authorities.primary = val;
        }
        if let Ok(val) = env::var("CAS_AUTHORITY_SECONDARY") {
            config.authorities.secondary = val;
        }
        if let Ok(val) = env::var("CAS_AUTHORITY_WIKI") {
            config.authorities.wiki = val;
        }
        if let Ok(val) = env::var("CAS_AUTHORITY_LEGACY_TAGS") {
            config.authorities.legacy_tags = val;
        }
        if let Ok(val) = env::var("CAS_AUTHORITY_CURATED") {
            config.authorities.curated =
                val.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Public endpoint types
        if let Ok(val) = env::var("CAS_PUBLIC_TYPES") {
            config.public_types = val.split(',').map(|s| s.trim().to_string()).collect();
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
