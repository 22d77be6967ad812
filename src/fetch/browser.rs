use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

use super::aggregator::{CrossTopicAggregator, CrossTopicQuery};
use super::fetcher::PartitionFetcher;
use super::record::{FetchResult, FetchWindow};
use super::window::{plan_window, WindowStart};
use super::FetchError;
use crate::kafka::KafkaAdmin;

/// Request for one partition, as parsed from the single-partition endpoint.
#[derive(Debug, Clone)]
pub struct PartitionQuery {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub limit: usize,
    pub search: Option<String>,
    pub timeout: Duration,
}

/// Entry point used by the HTTP layer for both message endpoints.
pub struct MessageBrowser {
    admin: Arc<dyn KafkaAdmin>,
    fetcher: Arc<PartitionFetcher>,
    aggregator: CrossTopicAggregator,
    cross_topic_timeout: Duration,
}

impl MessageBrowser {
    pub fn new(admin: Arc<dyn KafkaAdmin>, fetcher: Arc<PartitionFetcher>, cross_topic_timeout: Duration) -> Self {
        let aggregator = CrossTopicAggregator::new(admin.clone(), fetcher.clone());
        Self {
            admin,
            fetcher,
            aggregator,
            cross_topic_timeout,
        }
    }

    /// Fetch a window from one partition.
    ///
    /// An unknown partition is an error. A window with nothing to fetch
    /// (empty partition, offset at or past the high watermark) is skipped and
    /// yields an empty, complete result, the same outcome a cross-topic
    /// search records for that partition.
    pub async fn partition_messages(&self, query: &PartitionQuery) -> Result<FetchResult, FetchError> {
        let partitions = self
            .admin
            .fetch_topic_offsets(&query.topic)
            .await
            .map_err(|source| FetchError::Offsets {
                topic: query.topic.clone(),
                source,
            })?;

        let offsets = partitions
            .iter()
            .find(|o| o.partition == query.partition)
            .ok_or_else(|| FetchError::UnknownPartition {
                topic: query.topic.clone(),
                partition: query.partition,
            })?;

        let Some(planned) = plan_window(offsets, query.limit, WindowStart::At(query.offset)) else {
            debug!(
                topic = %query.topic,
                partition = query.partition,
                offset = query.offset,
                low = offsets.low,
                high = offsets.high,
                "Nothing to fetch in requested window"
            );
            return Ok(FetchResult::default());
        };

        let window = FetchWindow::new(query.topic.clone(), query.partition, planned.offset, planned.limit)
            .with_search(query.search.clone())
            .with_timeout(query.timeout);

        self.fetcher.fetch(&window).await
    }

    /// Search many topics under the outer cross-topic deadline.
    pub async fn cross_topic_messages(&self, query: &CrossTopicQuery) -> Result<FetchResult, FetchError> {
        match tokio::time::timeout(self.cross_topic_timeout, self.aggregator.search(query)).await {
            Ok(result) => result,
            Err(_) => {
                error!(
                    topics = ?query.topics,
                    deadline_ms = self.cross_topic_timeout.as_millis() as u64,
                    "Cross-topic search exceeded its deadline"
                );
                Err(FetchError::DeadlineExceeded(self.cross_topic_timeout))
            }
        }
    }
}
