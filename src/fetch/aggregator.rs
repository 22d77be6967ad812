use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::fetcher::PartitionFetcher;
use super::pipeline::apply_search;
use super::record::{FetchResult, FetchWindow, DEFAULT_FETCH_TIMEOUT};
use super::window::{plan_window, WindowStart};
use super::FetchError;
use crate::kafka::KafkaAdmin;

/// A single logical search across many topics.
#[derive(Debug, Clone)]
pub struct CrossTopicQuery {
    pub topics: Vec<String>,
    /// Per-partition limit.
    pub limit: usize,
    pub start: WindowStart,
    pub search: Option<String>,
    /// Per-partition session timeout.
    pub timeout: Duration,
}

impl CrossTopicQuery {
    pub fn new(topics: Vec<String>, limit: usize, start: WindowStart) -> Self {
        Self {
            topics,
            limit,
            start,
            search: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

/// Fans a query out over every non-empty partition of every topic, one partition at a time.
pub struct CrossTopicAggregator {
    admin: Arc<dyn KafkaAdmin>,
    fetcher: Arc<PartitionFetcher>,
}

impl CrossTopicAggregator {
    pub fn new(admin: Arc<dyn KafkaAdmin>, fetcher: Arc<PartitionFetcher>) -> Self {
        Self { admin, fetcher }
    }

    /// Messages are concatenated in topic, then partition order. The result is
    /// partial if any partition session timed out.
    pub async fn search(&self, query: &CrossTopicQuery) -> Result<FetchResult, FetchError> {
        let mut merged = FetchResult::default();

        for topic in &query.topics {
            let partitions = self
                .admin
                .fetch_topic_offsets(topic)
                .await
                .map_err(|source| FetchError::Offsets {
                    topic: topic.clone(),
                    source,
                })?;

            for offsets in partitions {
                let Some(planned) = plan_window(&offsets, query.limit, query.start) else {
                    debug!(topic = %topic, partition = offsets.partition, "Skipping empty partition");
                    continue;
                };

                let window = FetchWindow::new(topic.clone(), offsets.partition, planned.offset, planned.limit)
                    .with_search(query.search.clone())
                    .with_timeout(query.timeout);

                info!(topic = %topic, partition = offsets.partition, "Getting messages");
                let result = self.fetcher.fetch(&window).await?;
                info!(
                    topic = %topic,
                    partition = offsets.partition,
                    count = result.messages.len(),
                    has_timeout = result.has_timeout,
                    "Done getting messages"
                );

                merged.merge(result);
            }
        }

        // No-op when every session applied the same search
        if let Some(search) = &query.search {
            merged.messages = apply_search(merged.messages, search);
        }

        info!(
            topics = query.topics.len(),
            count = merged.messages.len(),
            has_timeout = merged.has_timeout,
            "Done getting all messages"
        );
        Ok(merged)
    }
}
