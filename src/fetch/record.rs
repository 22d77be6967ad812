use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::decode::FieldValue;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_millis(20_000);

/// The bounded query issued to one partition.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchWindow {
    pub topic: String,
    pub partition: i32,
    /// First offset to return (inclusive).
    pub offset: i64,
    /// Maximum number of in-window, non-duplicate records to examine.
    pub limit: usize,
    pub search: Option<String>,
    pub timeout: Duration,
}

impl FetchWindow {
    pub fn new(topic: impl Into<String>, partition: i32, offset: i64, limit: usize) -> Self {
        Self {
            topic: topic.into(),
            partition,
            offset,
            limit,
            search: None,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// An empty search string means no filtering.
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|s| !s.is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// One delivered record after the decode attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: String,
    pub value: String,
    /// Writer schema name, present only when schema decoding succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoded_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, FieldValue>>,
}

/// Messages collected from one or more partitions.
///
/// `has_timeout` marks a partial window: the session stopped before `limit`
/// records were examined, so more matches may exist.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResult {
    pub messages: Vec<MessageRecord>,
    pub has_timeout: bool,
}

impl FetchResult {
    /// Append another partition's result; a single partial partition makes the whole result partial.
    pub fn merge(&mut self, other: FetchResult) {
        self.messages.extend(other.messages);
        self.has_timeout |= other.has_timeout;
    }
}
