pub mod client;
pub mod types;

pub use client::{RdKafkaAdmin, RdKafkaConsumerFactory};
pub use types::{
    BrokerInfo, ClusterInfo, ConfigEntryInfo, GroupInfo, GroupMemberInfo, PartitionInfo,
    PartitionOffsets, RawRecord, TopicConfig, TopicInfo,
};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KafkaError {
    #[error("failed to connect to brokers: {0}")]
    Connect(String),

    #[error("failed to create consumer: {0}")]
    CreateConsumer(String),

    #[error("failed to subscribe to {topic}/{partition}: {message}")]
    Subscribe {
        topic: String,
        partition: i32,
        message: String,
    },

    #[error("failed to seek {topic}/{partition} to offset {offset}: {message}")]
    Seek {
        topic: String,
        partition: i32,
        offset: i64,
        message: String,
    },

    #[error("failed to receive message: {0}")]
    Receive(String),

    #[error("metadata request failed: {0}")]
    Metadata(String),

    #[error("topic {0} not found")]
    UnknownTopic(String),

    #[error("failed to delete consumer group {group_id}: {message}")]
    DeleteGroup { group_id: String, message: String },

    #[error("admin request failed: {0}")]
    Admin(String),
}

/// Process-wide admin connection, shared read-mostly by every request handler.
#[async_trait]
pub trait KafkaAdmin: Send + Sync {
    /// Verify the brokers are reachable.
    async fn connect(&self) -> Result<(), KafkaError>;

    /// Metadata for all topics, or for a single one.
    async fn fetch_topic_metadata(&self, topic: Option<&str>) -> Result<Vec<TopicInfo>, KafkaError>;

    /// Low/high watermarks for every partition of a topic, ordered by partition id.
    async fn fetch_topic_offsets(&self, topic: &str) -> Result<Vec<PartitionOffsets>, KafkaError>;

    async fn describe_topic_config(&self, topic: &str) -> Result<TopicConfig, KafkaError>;

    /// Groups whose protocol type is `consumer`, with their members.
    async fn list_consumer_groups(&self) -> Result<Vec<GroupInfo>, KafkaError>;

    async fn describe_cluster(&self) -> Result<ClusterInfo, KafkaError>;

    async fn delete_group(&self, group_id: &str) -> Result<(), KafkaError>;
}

/// One consumer owned by exactly one fetch session.
#[async_trait]
pub trait SessionConsumer: Send {
    /// Bind the consumer to a topic partition, positioned at the earliest offset.
    async fn subscribe(&mut self, topic: &str, partition: i32) -> Result<(), KafkaError>;

    async fn seek(&mut self, topic: &str, partition: i32, offset: i64) -> Result<(), KafkaError>;

    /// Next delivered record. `None` means the delivery stream has closed.
    async fn recv(&mut self) -> Option<Result<RawRecord, KafkaError>>;

    /// Release the assignment and network resources.
    async fn stop(&mut self) -> Result<(), KafkaError>;
}

#[async_trait]
pub trait ConsumerFactory: Send + Sync {
    /// Create a consumer bound to `group_id` with auto-commit disabled.
    async fn create(&self, group_id: &str) -> Result<Box<dyn SessionConsumer>, KafkaError>;
}
