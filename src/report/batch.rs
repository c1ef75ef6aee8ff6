//! Splits a user's records into windows that can be rendered independently.

use std::num::NonZeroU64;

use crate::record::RecordKind;

/// A window of records of one kind, rendered by a single task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    /// The kind of records in the window.
    pub kind: RecordKind,
    /// The number of records, in report order, that precede the window.
    pub offset: u64,
    /// The maximum number of records in the window.
    pub limit: u64,
}

/// Plan the batches needed to cover `count` records of `kind`.
///
/// Returns `ceil(count / page_size)` batches with offsets `0, P, 2P, ...` and
/// a limit of `P` each, so the windows cover `[0, count)` with no gaps or
/// overlap. The last window may hold fewer than `P` records.
pub fn plan_batches(kind: RecordKind, count: u64, page_size: NonZeroU64) -> Vec<Batch> {
    let page_size = page_size.get();
    let batch_count = count.div_ceil(page_size);

    (0..batch_count)
        .map(|i| Batch {
            kind,
            offset: i * page_size,
            limit: page_size,
        })
        .collect()
}
