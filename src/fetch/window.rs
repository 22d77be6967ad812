use crate::kafka::PartitionOffsets;

/// Where a window starts within a partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStart {
    /// At the low watermark.
    Beginning,
    /// The most recent `limit` records.
    End,
    /// At an explicit offset, clamped to the low watermark.
    At(i64),
}

impl WindowStart {
    /// Parse the `search_from` query parameter: `Beginning` selects from-beginning, anything else tails.
    pub fn from_search_from(value: Option<&str>) -> Self {
        match value {
            Some("Beginning") => WindowStart::Beginning,
            _ => WindowStart::End,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedWindow {
    pub offset: i64,
    pub limit: usize,
}

/// Compute the offset window to request from a partition.
///
/// Returns `None` when there is nothing to fetch: an empty partition, a start
/// at or past the high watermark, or a zero limit. Callers skip the partition.
/// The returned limit never exceeds the records that currently exist, so the
/// session is not left waiting on offsets that have not been produced.
pub fn plan_window(offsets: &PartitionOffsets, limit: usize, start: WindowStart) -> Option<PlannedWindow> {
    if offsets.is_empty() || limit == 0 {
        return None;
    }

    let requested = i64::try_from(limit).unwrap_or(i64::MAX);
    let offset = match start {
        WindowStart::Beginning => offsets.low,
        WindowStart::End => offsets.high.saturating_sub(requested).max(offsets.low),
        WindowStart::At(offset) => offset.max(offsets.low),
    };

    let available = offsets.high.saturating_sub(offset);
    if available <= 0 {
        return None;
    }

    Some(PlannedWindow {
        offset,
        limit: limit.min(usize::try_from(available).unwrap_or(usize::MAX)),
    })
}
