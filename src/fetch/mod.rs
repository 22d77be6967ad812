pub mod aggregator;
pub mod browser;
pub mod cleanup;
pub mod fetcher;
pub mod group_id;
pub mod pipeline;
pub mod record;
pub mod window;

pub use aggregator::{CrossTopicAggregator, CrossTopicQuery};
pub use browser::{MessageBrowser, PartitionQuery};
pub use cleanup::{CleanupPolicy, CleanupReport, CleanupState, GroupCleanup};
pub use fetcher::PartitionFetcher;
pub use group_id::EphemeralGroupId;
pub use pipeline::{apply_search, matches_search};
pub use record::{FetchResult, FetchWindow, MessageRecord, DEFAULT_FETCH_TIMEOUT};
pub use window::{plan_window, PlannedWindow, WindowStart};

use std::time::Duration;
use thiserror::Error;

use crate::kafka::KafkaError;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch failed: {0}")]
    Setup(#[source] KafkaError),

    #[error("failed to read offsets for topic {topic}: {source}")]
    Offsets {
        topic: String,
        #[source]
        source: KafkaError,
    },

    #[error("partition {partition} not found for topic {topic}")]
    UnknownPartition { topic: String, partition: i32 },

    #[error("fetch session aborted: {0}")]
    Aborted(String),

    #[error("search did not finish within {0:?}")]
    DeadlineExceeded(Duration),
}
