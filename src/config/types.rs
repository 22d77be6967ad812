use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub kafka: KafkaConfig,
    #[serde(default)]
    pub schema_registry: Option<SchemaRegistryConfig>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_metadata_timeout", with = "humantime_serde")]
    pub metadata_timeout: Duration,
    /// Startup connect attempts before giving up.
    #[serde(default = "default_connect_retries")]
    pub connect_retries: usize,
    #[serde(default = "default_connect_backoff", with = "humantime_serde")]
    pub connect_backoff: Duration,
    /// Extra librdkafka properties (security.protocol, sasl.*, ssl.*).
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

fn default_client_id() -> String {
    "kafka-browser".to_string()
}

fn default_metadata_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_connect_retries() -> usize {
    5
}

fn default_connect_backoff() -> Duration {
    Duration::from_secs(1)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRegistryConfig {
    pub url: String,
    #[serde(default = "default_registry_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

fn default_registry_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    /// Time limit for one partition session.
    #[serde(default = "default_fetch_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Outer deadline for a whole cross-topic search.
    #[serde(default = "default_cross_topic_timeout", with = "humantime_serde")]
    pub cross_topic_timeout: Duration,
    #[serde(default = "default_group_prefix")]
    pub group_prefix: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            timeout: default_fetch_timeout(),
            cross_topic_timeout: default_cross_topic_timeout(),
            group_prefix: default_group_prefix(),
        }
    }
}

fn default_limit() -> usize {
    100
}

fn default_fetch_timeout() -> Duration {
    Duration::from_millis(20_000)
}

fn default_cross_topic_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_group_prefix() -> String {
    "kafka-browser".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Total delete attempts, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_delay", with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    4
}

fn default_retry_delay() -> Duration {
    Duration::from_millis(300)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub listen: String,
    /// Directory holding the UI bundle; `/assets` and the index fallback are served from here.
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
}
