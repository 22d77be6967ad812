#![allow(dead_code)]

use async_trait::async_trait;
use kafka_browser::decode::{DecodeError, DecodedValue, SchemaDecoder};
use kafka_browser::fetch::{CleanupPolicy, MessageBrowser, PartitionFetcher};
use kafka_browser::kafka::{
    BrokerInfo, ClusterInfo, ConsumerFactory, GroupInfo, KafkaAdmin, KafkaError, PartitionOffsets,
    RawRecord, SessionConsumer, TopicConfig, TopicInfo,
};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted step of a consumer's delivery stream.
#[derive(Debug, Clone)]
pub enum Step {
    Deliver(RawRecord),
    Fail(String),
    Wait(Duration),
    Close,
}

pub fn record(topic: &str, partition: i32, offset: i64, value: &str) -> RawRecord {
    RawRecord {
        topic: topic.to_string(),
        partition,
        offset,
        key: Some(format!("key-{offset}").into_bytes()),
        payload: Some(value.as_bytes().to_vec()),
        timestamp: Some(1_700_000_000_000 + offset),
    }
}

pub fn deliver_range(topic: &str, partition: i32, offsets: std::ops::Range<i64>) -> Vec<Step> {
    offsets
        .map(|o| Step::Deliver(record(topic, partition, o, &format!("{{\"n\":{o}}}"))))
        .collect()
}

/// Consumer lifecycle events, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Created(String),
    Subscribed(String, i32),
    Seeked(String, i32, i64),
    Stopped,
}

#[derive(Default)]
pub struct ScriptedConsumers {
    scripts: Mutex<HashMap<(String, i32), Vec<Step>>>,
    pub events: Arc<Mutex<Vec<Event>>>,
    pub fail_create: bool,
    pub fail_seek: bool,
}

impl ScriptedConsumers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Self::default()
        }
    }

    pub fn failing_seek() -> Self {
        Self {
            fail_seek: true,
            ..Self::default()
        }
    }

    pub fn script(self, topic: &str, partition: i32, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert((topic.to_string(), partition), steps);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Created(group) => Some(group),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ConsumerFactory for ScriptedConsumers {
    async fn create(&self, group_id: &str) -> Result<Box<dyn SessionConsumer>, KafkaError> {
        if self.fail_create {
            return Err(KafkaError::CreateConsumer("broker unreachable".to_string()));
        }
        self.events
            .lock()
            .unwrap()
            .push(Event::Created(group_id.to_string()));
        let scripts = self.scripts.lock().unwrap().clone();
        Ok(Box::new(ScriptedConsumer {
            scripts,
            steps: VecDeque::new(),
            events: self.events.clone(),
            fail_seek: self.fail_seek,
        }))
    }
}

struct ScriptedConsumer {
    scripts: HashMap<(String, i32), Vec<Step>>,
    steps: VecDeque<Step>,
    events: Arc<Mutex<Vec<Event>>>,
    fail_seek: bool,
}

#[async_trait]
impl SessionConsumer for ScriptedConsumer {
    async fn subscribe(&mut self, topic: &str, partition: i32) -> Result<(), KafkaError> {
        self.events
            .lock()
            .unwrap()
            .push(Event::Subscribed(topic.to_string(), partition));
        self.steps = self
            .scripts
            .remove(&(topic.to_string(), partition))
            .unwrap_or_default()
            .into();
        Ok(())
    }

    async fn seek(&mut self, topic: &str, partition: i32, offset: i64) -> Result<(), KafkaError> {
        if self.fail_seek {
            return Err(KafkaError::Seek {
                topic: topic.to_string(),
                partition,
                offset,
                message: "offset out of range".to_string(),
            });
        }
        self.events
            .lock()
            .unwrap()
            .push(Event::Seeked(topic.to_string(), partition, offset));
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<RawRecord, KafkaError>> {
        loop {
            match self.steps.pop_front() {
                Some(Step::Deliver(record)) => return Some(Ok(record)),
                Some(Step::Fail(message)) => return Some(Err(KafkaError::Receive(message))),
                Some(Step::Wait(duration)) => tokio::time::sleep(duration).await,
                Some(Step::Close) => return None,
                // Script exhausted: behave like an idle partition
                None => futures::future::pending::<()>().await,
            }
        }
    }

    async fn stop(&mut self) -> Result<(), KafkaError> {
        self.events.lock().unwrap().push(Event::Stopped);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockAdmin {
    offsets: HashMap<String, Vec<PartitionOffsets>>,
    pub deleted: Mutex<Vec<String>>,
    pub delete_attempts: Mutex<Vec<String>>,
    pub fail_delete: bool,
}

impl MockAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every group deletion fails with a coordinator error.
    pub fn failing_delete() -> Self {
        Self {
            fail_delete: true,
            ..Self::default()
        }
    }

    pub fn topic(mut self, name: &str, watermarks: &[(i64, i64)]) -> Self {
        let partitions = watermarks
            .iter()
            .enumerate()
            .map(|(i, &(low, high))| PartitionOffsets {
                partition: i as i32,
                low,
                high,
            })
            .collect();
        self.offsets.insert(name.to_string(), partitions);
        self
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn delete_attempts(&self) -> Vec<String> {
        self.delete_attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl KafkaAdmin for MockAdmin {
    async fn connect(&self) -> Result<(), KafkaError> {
        Ok(())
    }

    async fn fetch_topic_metadata(&self, topic: Option<&str>) -> Result<Vec<TopicInfo>, KafkaError> {
        let mut names: Vec<&String> = self
            .offsets
            .keys()
            .filter(|name| topic.map_or(true, |t| t == name.as_str()))
            .collect();
        names.sort();
        Ok(names
            .into_iter()
            .map(|name| TopicInfo {
                name: name.clone(),
                partitions: Vec::new(),
            })
            .collect())
    }

    async fn fetch_topic_offsets(&self, topic: &str) -> Result<Vec<PartitionOffsets>, KafkaError> {
        self.offsets
            .get(topic)
            .cloned()
            .ok_or_else(|| KafkaError::UnknownTopic(topic.to_string()))
    }

    async fn describe_topic_config(&self, topic: &str) -> Result<TopicConfig, KafkaError> {
        if !self.offsets.contains_key(topic) {
            return Err(KafkaError::UnknownTopic(topic.to_string()));
        }
        Ok(TopicConfig {
            topic: topic.to_string(),
            entries: Vec::new(),
        })
    }

    async fn list_consumer_groups(&self) -> Result<Vec<GroupInfo>, KafkaError> {
        Ok(Vec::new())
    }

    async fn describe_cluster(&self) -> Result<ClusterInfo, KafkaError> {
        Ok(ClusterInfo {
            brokers: vec![BrokerInfo {
                node_id: 1,
                host: "localhost".to_string(),
                port: 9092,
            }],
            origin_broker_id: 1,
        })
    }

    async fn delete_group(&self, group_id: &str) -> Result<(), KafkaError> {
        self.delete_attempts.lock().unwrap().push(group_id.to_string());
        if self.fail_delete {
            return Err(KafkaError::DeleteGroup {
                group_id: group_id.to_string(),
                message: "coordinator not available".to_string(),
            });
        }
        self.deleted.lock().unwrap().push(group_id.to_string());
        Ok(())
    }
}

/// Payloads starting with `avro:` decode to their JSON remainder as `test.Order`.
pub struct TaggedDecoder;

#[async_trait]
impl SchemaDecoder for TaggedDecoder {
    async fn decode(&self, payload: &[u8]) -> Result<DecodedValue, DecodeError> {
        let text = std::str::from_utf8(payload).map_err(|_| DecodeError::NotRegistryEncoded)?;
        let body = text.strip_prefix("avro:").ok_or(DecodeError::NotRegistryEncoded)?;
        let value = serde_json::from_str(body).map_err(|e| DecodeError::Datum {
            id: 1,
            message: e.to_string(),
        })?;
        Ok(DecodedValue {
            value,
            type_name: "test.Order".to_string(),
        })
    }
}

pub fn fetcher(consumers: Arc<ScriptedConsumers>, admin: Arc<MockAdmin>) -> Arc<PartitionFetcher> {
    Arc::new(PartitionFetcher::new(
        consumers,
        admin,
        Arc::new(TaggedDecoder),
        "test",
        CleanupPolicy::default(),
    ))
}

pub fn browser(
    consumers: Arc<ScriptedConsumers>,
    admin: Arc<MockAdmin>,
    cross_topic_timeout: Duration,
) -> MessageBrowser {
    let fetcher = fetcher(consumers, admin.clone());
    MessageBrowser::new(admin, fetcher, cross_topic_timeout)
}

/// Let detached cleanup tasks run to completion.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}
