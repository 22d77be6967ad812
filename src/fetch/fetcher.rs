use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::cleanup::{CleanupPolicy, GroupCleanup};
use super::group_id::EphemeralGroupId;
use super::pipeline::{Admission, SessionFilter};
use super::record::{FetchResult, FetchWindow, MessageRecord};
use super::FetchError;
use crate::decode::SchemaDecoder;
use crate::kafka::{ConsumerFactory, KafkaAdmin, RawRecord, SessionConsumer};

/// Runs bounded, single-partition consume sessions on ephemeral consumers.
pub struct PartitionFetcher {
    consumers: Arc<dyn ConsumerFactory>,
    admin: Arc<dyn KafkaAdmin>,
    decoder: Arc<dyn SchemaDecoder>,
    group_prefix: String,
    cleanup: CleanupPolicy,
}

impl PartitionFetcher {
    pub fn new(
        consumers: Arc<dyn ConsumerFactory>,
        admin: Arc<dyn KafkaAdmin>,
        decoder: Arc<dyn SchemaDecoder>,
        group_prefix: impl Into<String>,
        cleanup: CleanupPolicy,
    ) -> Self {
        Self {
            consumers,
            admin,
            decoder,
            group_prefix: group_prefix.into(),
            cleanup,
        }
    }

    /// Read `window` from its partition until `limit` records were examined or
    /// the timeout elapsed, whichever comes first.
    ///
    /// Setup failures (consumer creation, subscribe, seek) are returned as
    /// errors. A timeout is not an error: the collected subset comes back with
    /// `has_timeout` set. The consumer is stopped and its group deleted on a
    /// detached task in every case once it has been created.
    pub async fn fetch(&self, window: &FetchWindow) -> Result<FetchResult, FetchError> {
        if window.limit == 0 {
            return Ok(FetchResult::default());
        }

        let group_id = EphemeralGroupId::mint(&self.group_prefix);
        info!(
            topic = %window.topic,
            partition = window.partition,
            offset = window.offset,
            limit = window.limit,
            group_id = %group_id,
            "Querying partition"
        );

        let consumer = self
            .consumers
            .create(group_id.as_str())
            .await
            .map_err(FetchError::Setup)?;

        // The session owns its consumer on a separate task, so a caller that
        // stops waiting still ends in cleanup once the session settles.
        let window = window.clone();
        let decoder = self.decoder.clone();
        let admin = self.admin.clone();
        let policy = self.cleanup.clone();
        let session = tokio::spawn(async move {
            let mut consumer = consumer;
            let outcome = run_session(consumer.as_mut(), &window, decoder.as_ref()).await;
            GroupCleanup::new(consumer, group_id, admin, policy).spawn();
            outcome
        });

        session
            .await
            .map_err(|e| FetchError::Aborted(e.to_string()))?
    }
}

async fn run_session(
    consumer: &mut dyn SessionConsumer,
    window: &FetchWindow,
    decoder: &dyn SchemaDecoder,
) -> Result<FetchResult, FetchError> {
    consumer
        .subscribe(&window.topic, window.partition)
        .await
        .map_err(FetchError::Setup)?;
    consumer
        .seek(&window.topic, window.partition, window.offset)
        .await
        .map_err(FetchError::Setup)?;

    let mut filter = SessionFilter::new(window);
    let mut messages = Vec::new();

    let deadline = tokio::time::sleep(window.timeout);
    tokio::pin!(deadline);

    let has_timeout = loop {
        let delivery = tokio::select! {
            biased;
            _ = &mut deadline => break true,
            delivery = consumer.recv() => delivery,
        };

        let raw = match delivery {
            Some(Ok(raw)) => raw,
            Some(Err(e)) => {
                warn!(topic = %window.topic, partition = window.partition, error = %e, "Delivery failed");
                continue;
            }
            None => {
                warn!(
                    topic = %window.topic,
                    partition = window.partition,
                    consumed = filter.consumed(),
                    "Delivery stream closed before the window was filled"
                );
                break true;
            }
        };

        let record = decode_record(raw, decoder).await;
        match filter.admit(&record) {
            Admission::Accepted => messages.push(record),
            Admission::Filtered => {
                debug!(offset = record.offset, "Ignoring message, filtered out by search");
            }
            Admission::Ignored(reason) => {
                debug!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    reason = ?reason,
                    "Ignoring message"
                );
            }
        }

        if filter.is_complete() {
            break false;
        }
    };

    if has_timeout {
        info!(
            topic = %window.topic,
            partition = window.partition,
            timeout_ms = window.timeout.as_millis() as u64,
            collected = messages.len(),
            "Partition query ended before reaching limit"
        );
    } else {
        info!(
            topic = %window.topic,
            partition = window.partition,
            collected = messages.len(),
            "Done querying partition"
        );
    }

    Ok(FetchResult {
        messages,
        has_timeout,
    })
}

/// Attempt a schema decode; anything that fails stays as lossy UTF-8 text.
async fn decode_record(raw: RawRecord, decoder: &dyn SchemaDecoder) -> MessageRecord {
    let key = raw
        .key
        .as_deref()
        .map(|k| String::from_utf8_lossy(k).into_owned())
        .unwrap_or_default();

    let (value, decoded_type) = match raw.payload.as_deref() {
        None => (String::new(), None),
        Some(payload) => match decoder.decode(payload).await {
            Ok(decoded) => {
                let value = match decoded.value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                (value, Some(decoded.type_name))
            }
            Err(e) => {
                debug!(offset = raw.offset, error = %e, "Keeping raw value");
                (String::from_utf8_lossy(payload).into_owned(), None)
            }
        },
    };

    MessageRecord {
        topic: raw.topic,
        partition: raw.partition,
        offset: raw.offset,
        key,
        value,
        decoded_type,
        timestamp: raw.timestamp,
        fields: None,
    }
}
