use std::collections::HashSet;

use super::record::{FetchWindow, MessageRecord};

/// Why a delivered record was dropped without counting toward the limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    OtherTopic,
    OtherPartition,
    Duplicate,
    BeforeWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Ignored(IgnoreReason),
    /// Counted toward the limit but excluded by the search filter.
    Filtered,
    Accepted,
}

/// True if the search string is empty or found in the record's value or key.
pub fn matches_search(record: &MessageRecord, search: &str) -> bool {
    search.is_empty() || record.value.contains(search) || record.key.contains(search)
}

/// Keep only the records matching `search`.
pub fn apply_search(records: Vec<MessageRecord>, search: &str) -> Vec<MessageRecord> {
    records
        .into_iter()
        .filter(|record| matches_search(record, search))
        .collect()
}

/// Per-session admission state: dedup set, offset floor, search filter and examined count.
pub struct SessionFilter<'w> {
    window: &'w FetchWindow,
    seen: HashSet<i64>,
    consumed: usize,
}

impl<'w> SessionFilter<'w> {
    pub fn new(window: &'w FetchWindow) -> Self {
        Self {
            window,
            seen: HashSet::new(),
            consumed: 0,
        }
    }

    pub fn admit(&mut self, record: &MessageRecord) -> Admission {
        if record.topic != self.window.topic {
            return Admission::Ignored(IgnoreReason::OtherTopic);
        }
        if record.partition != self.window.partition {
            return Admission::Ignored(IgnoreReason::OtherPartition);
        }
        if !self.seen.insert(record.offset) {
            return Admission::Ignored(IgnoreReason::Duplicate);
        }
        if record.offset < self.window.offset {
            return Admission::Ignored(IgnoreReason::BeforeWindow);
        }

        self.consumed += 1;
        match &self.window.search {
            Some(search) if !matches_search(record, search) => Admission::Filtered,
            _ => Admission::Accepted,
        }
    }

    /// Records examined so far; bounded by the window limit.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    pub fn is_complete(&self) -> bool {
        self.consumed >= self.window.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(topic: &str, partition: i32, offset: i64, key: &str, value: &str) -> MessageRecord {
        MessageRecord {
            topic: topic.to_string(),
            partition,
            offset,
            key: key.to_string(),
            value: value.to_string(),
            decoded_type: None,
            timestamp: None,
            fields: None,
        }
    }

    #[test]
    fn test_admission_order() {
        let window = FetchWindow::new("orders", 0, 10, 5);
        let mut filter = SessionFilter::new(&window);

        assert_eq!(
            filter.admit(&record("payments", 0, 11, "", "")),
            Admission::Ignored(IgnoreReason::OtherTopic)
        );
        assert_eq!(
            filter.admit(&record("orders", 1, 11, "", "")),
            Admission::Ignored(IgnoreReason::OtherPartition)
        );
        assert_eq!(
            filter.admit(&record("orders", 0, 9, "", "")),
            Admission::Ignored(IgnoreReason::BeforeWindow)
        );
        assert_eq!(filter.admit(&record("orders", 0, 10, "", "")), Admission::Accepted);
        assert_eq!(
            filter.admit(&record("orders", 0, 10, "", "")),
            Admission::Ignored(IgnoreReason::Duplicate)
        );
        assert_eq!(filter.consumed(), 1);
    }

    #[test]
    fn test_search_counts_toward_limit() {
        let window = FetchWindow::new("orders", 0, 0, 2).with_search(Some("needle".to_string()));
        let mut filter = SessionFilter::new(&window);

        assert_eq!(filter.admit(&record("orders", 0, 0, "", "hay")), Admission::Filtered);
        assert!(!filter.is_complete());
        assert_eq!(filter.admit(&record("orders", 0, 1, "needle-key", "hay")), Admission::Accepted);
        assert!(filter.is_complete());
    }

    #[test]
    fn test_empty_search_is_no_filter() {
        let window = FetchWindow::new("orders", 0, 0, 2).with_search(Some(String::new()));
        assert!(window.search.is_none());
    }

    #[test]
    fn test_apply_search_idempotent() {
        let records = vec![
            record("orders", 0, 0, "a", "first needle"),
            record("orders", 0, 1, "b", "second"),
            record("orders", 0, 2, "needle", "third"),
        ];

        let once = apply_search(records, "needle");
        assert_eq!(once.len(), 2);
        let twice = apply_search(once.clone(), "needle");
        assert_eq!(twice, once);
    }
}
