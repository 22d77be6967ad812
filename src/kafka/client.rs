use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, ResourceSpecifier};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer, StreamConsumer};
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::{Message, Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{
    BrokerInfo, ClusterInfo, ConfigEntryInfo, GroupInfo, GroupMemberInfo, PartitionInfo,
    PartitionOffsets, RawRecord, TopicConfig, TopicInfo,
};
use super::{ConsumerFactory, KafkaAdmin, KafkaError, SessionConsumer};
use crate::config::types::KafkaConfig;

/// Build the client config shared by the admin client and every session consumer.
fn base_client_config(config: &KafkaConfig) -> ClientConfig {
    let mut client_config = ClientConfig::new();
    client_config
        .set("bootstrap.servers", config.brokers.join(","))
        .set("client.id", &config.client_id);

    for (key, value) in &config.properties {
        client_config.set(key, value);
    }

    client_config
}

/// Admin collaborator backed by an rdkafka `AdminClient` plus a `BaseConsumer`
/// used for metadata, watermark and group-list requests.
pub struct RdKafkaAdmin {
    admin: AdminClient<DefaultClientContext>,
    metadata: Arc<BaseConsumer>,
    timeout: Duration,
}

impl RdKafkaAdmin {
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaError> {
        let admin: AdminClient<DefaultClientContext> = base_client_config(config)
            .create()
            .map_err(|e| KafkaError::Connect(format!("failed to create admin client: {e}")))?;
        let metadata: BaseConsumer = base_client_config(config)
            .create()
            .map_err(|e| KafkaError::Connect(format!("failed to create metadata client: {e}")))?;

        Ok(Self {
            admin,
            metadata: Arc::new(metadata),
            timeout: config.metadata_timeout,
        })
    }

    /// librdkafka metadata calls block the calling thread.
    async fn blocking<T, F>(&self, op: F) -> Result<T, KafkaError>
    where
        F: FnOnce(&BaseConsumer, Duration) -> Result<T, KafkaError> + Send + 'static,
        T: Send + 'static,
    {
        let consumer = self.metadata.clone();
        let timeout = self.timeout;
        tokio::task::spawn_blocking(move || op(&consumer, timeout))
            .await
            .map_err(|e| KafkaError::Admin(format!("blocking task failed: {e}")))?
    }

    fn options(&self) -> AdminOptions {
        AdminOptions::new().operation_timeout(Some(self.timeout))
    }
}

#[async_trait]
impl KafkaAdmin for RdKafkaAdmin {
    async fn connect(&self) -> Result<(), KafkaError> {
        self.blocking(|consumer, timeout| {
            consumer
                .fetch_metadata(None, timeout)
                .map(|_| ())
                .map_err(|e| KafkaError::Connect(e.to_string()))
        })
        .await
    }

    async fn fetch_topic_metadata(&self, topic: Option<&str>) -> Result<Vec<TopicInfo>, KafkaError> {
        let topic = topic.map(str::to_string);
        self.blocking(move |consumer, timeout| {
            let metadata = consumer
                .fetch_metadata(topic.as_deref(), timeout)
                .map_err(|e| KafkaError::Metadata(e.to_string()))?;

            let mut topics: Vec<TopicInfo> = metadata
                .topics()
                .iter()
                .filter(|t| t.error().is_none())
                .map(|t| TopicInfo {
                    name: t.name().to_string(),
                    partitions: t
                        .partitions()
                        .iter()
                        .map(|p| PartitionInfo {
                            partition_id: p.id(),
                            leader: p.leader(),
                            replicas: p.replicas().to_vec(),
                            isr: p.isr().to_vec(),
                        })
                        .collect(),
                })
                .collect();

            if let Some(name) = topic {
                if topics.is_empty() {
                    return Err(KafkaError::UnknownTopic(name));
                }
            }

            topics.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(topics)
        })
        .await
    }

    async fn fetch_topic_offsets(&self, topic: &str) -> Result<Vec<PartitionOffsets>, KafkaError> {
        let topic = topic.to_string();
        self.blocking(move |consumer, timeout| {
            let metadata = consumer
                .fetch_metadata(Some(&topic), timeout)
                .map_err(|e| KafkaError::Metadata(e.to_string()))?;

            let partitions: Vec<i32> = metadata
                .topics()
                .iter()
                .find(|t| t.name() == topic && t.error().is_none())
                .ok_or_else(|| KafkaError::UnknownTopic(topic.clone()))?
                .partitions()
                .iter()
                .map(|p| p.id())
                .collect();

            let mut offsets = Vec::with_capacity(partitions.len());
            for partition in partitions {
                let (low, high) = consumer
                    .fetch_watermarks(&topic, partition, timeout)
                    .map_err(|e| {
                        KafkaError::Metadata(format!(
                            "watermarks for {topic}/{partition}: {e}"
                        ))
                    })?;
                offsets.push(PartitionOffsets { partition, low, high });
            }

            offsets.sort_by_key(|o| o.partition);
            Ok(offsets)
        })
        .await
    }

    async fn describe_topic_config(&self, topic: &str) -> Result<TopicConfig, KafkaError> {
        let results = self
            .admin
            .describe_configs(&[ResourceSpecifier::Topic(topic)], &self.options())
            .await
            .map_err(|e| KafkaError::Admin(e.to_string()))?;

        let mut entries = Vec::new();
        for result in results {
            let resource = result.map_err(|code| KafkaError::Admin(code.to_string()))?;
            entries.extend(resource.entries.into_iter().map(|entry| ConfigEntryInfo {
                name: entry.name,
                value: entry.value,
                is_default: entry.is_default,
                is_read_only: entry.is_read_only,
                is_sensitive: entry.is_sensitive,
            }));
        }

        Ok(TopicConfig {
            topic: topic.to_string(),
            entries,
        })
    }

    async fn list_consumer_groups(&self) -> Result<Vec<GroupInfo>, KafkaError> {
        self.blocking(|consumer, timeout| {
            let list = consumer
                .fetch_group_list(None, timeout)
                .map_err(|e| KafkaError::Admin(e.to_string()))?;

            Ok(list
                .groups()
                .iter()
                .filter(|g| g.protocol_type() == "consumer")
                .map(|g| GroupInfo {
                    group_id: g.name().to_string(),
                    state: g.state().to_string(),
                    protocol: g.protocol().to_string(),
                    protocol_type: g.protocol_type().to_string(),
                    members: g
                        .members()
                        .iter()
                        .map(|m| GroupMemberInfo {
                            member_id: m.id().to_string(),
                            client_id: m.client_id().to_string(),
                            client_host: m.client_host().to_string(),
                        })
                        .collect(),
                })
                .collect())
        })
        .await
    }

    async fn describe_cluster(&self) -> Result<ClusterInfo, KafkaError> {
        self.blocking(|consumer, timeout| {
            let metadata = consumer
                .fetch_metadata(None, timeout)
                .map_err(|e| KafkaError::Metadata(e.to_string()))?;

            Ok(ClusterInfo {
                brokers: metadata
                    .brokers()
                    .iter()
                    .map(|b| BrokerInfo {
                        node_id: b.id(),
                        host: b.host().to_string(),
                        port: b.port(),
                    })
                    .collect(),
                origin_broker_id: metadata.orig_broker_id(),
            })
        })
        .await
    }

    async fn delete_group(&self, group_id: &str) -> Result<(), KafkaError> {
        let results = self
            .admin
            .delete_groups(&[group_id], &self.options())
            .await
            .map_err(|e| KafkaError::DeleteGroup {
                group_id: group_id.to_string(),
                message: e.to_string(),
            })?;

        for result in results {
            match result {
                Ok(_) => {}
                // Nothing was ever committed under this id, so the broker may not know it.
                Err((_, RDKafkaErrorCode::GroupIdNotFound)) => {
                    debug!(group_id = %group_id, "Consumer group already gone");
                }
                Err((name, code)) => {
                    return Err(KafkaError::DeleteGroup {
                        group_id: name,
                        message: code.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Creates one `StreamConsumer` per fetch session.
pub struct RdKafkaConsumerFactory {
    config: KafkaConfig,
}

impl RdKafkaConsumerFactory {
    pub fn new(config: KafkaConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConsumerFactory for RdKafkaConsumerFactory {
    async fn create(&self, group_id: &str) -> Result<Box<dyn SessionConsumer>, KafkaError> {
        let consumer: StreamConsumer = base_client_config(&self.config)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", "earliest")
            .create()
            .map_err(|e| KafkaError::CreateConsumer(e.to_string()))?;

        Ok(Box::new(RdKafkaSessionConsumer { consumer }))
    }
}

struct RdKafkaSessionConsumer {
    consumer: StreamConsumer,
}

impl RdKafkaSessionConsumer {
    fn assign_at(&self, topic: &str, partition: i32, offset: Offset) -> Result<(), String> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(topic, partition, offset)
            .map_err(|e| e.to_string())?;
        self.consumer.assign(&tpl).map_err(|e| e.to_string())
    }
}

#[async_trait]
impl SessionConsumer for RdKafkaSessionConsumer {
    async fn subscribe(&mut self, topic: &str, partition: i32) -> Result<(), KafkaError> {
        self.assign_at(topic, partition, Offset::Beginning)
            .map_err(|message| KafkaError::Subscribe {
                topic: topic.to_string(),
                partition,
                message,
            })
    }

    async fn seek(&mut self, topic: &str, partition: i32, offset: i64) -> Result<(), KafkaError> {
        // librdkafka rejects seek() until the partition has started fetching;
        // re-assigning with an explicit offset positions it before the first fetch.
        self.assign_at(topic, partition, Offset::Offset(offset))
            .map_err(|message| KafkaError::Seek {
                topic: topic.to_string(),
                partition,
                offset,
                message,
            })
    }

    async fn recv(&mut self) -> Option<Result<RawRecord, KafkaError>> {
        let delivery = match self.consumer.recv().await {
            Ok(message) => Ok(RawRecord {
                topic: message.topic().to_string(),
                partition: message.partition(),
                offset: message.offset(),
                key: message.key().map(<[u8]>::to_vec),
                payload: message.payload().map(<[u8]>::to_vec),
                timestamp: message.timestamp().to_millis(),
            }),
            Err(e) => Err(KafkaError::Receive(e.to_string())),
        };
        Some(delivery)
    }

    async fn stop(&mut self) -> Result<(), KafkaError> {
        self.consumer
            .unassign()
            .map_err(|e| KafkaError::Admin(format!("failed to unassign: {e}")))
    }
}
