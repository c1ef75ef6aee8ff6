use std::{ops::Range, thread, time::Duration};

use rand::Rng;
use time::{OffsetDateTime, macros::datetime};

use crate::{
    Error, UserID,
    record::{LabelTotal, Record, RecordDetail, RecordKind, RecordStore},
};

/// A record store backed by a vector that can pause for a random time on
/// every page read, to shuffle the order in which render tasks finish.
#[derive(Debug, Default)]
pub(crate) struct MemoryRecordStore {
    records: Vec<(UserID, Record)>,
    page_latency_ms: Range<u64>,
    failing_page: Option<(RecordKind, u64)>,
}

impl MemoryRecordStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sleep for a random duration in `range` milliseconds on each page read.
    pub(crate) fn with_page_latency(mut self, range: Range<u64>) -> Self {
        self.page_latency_ms = range;
        self
    }

    /// Make reading the page of `kind` starting at `offset` fail as if the
    /// database were unavailable.
    pub(crate) fn with_failing_page(mut self, kind: RecordKind, offset: u64) -> Self {
        self.failing_page = Some((kind, offset));
        self
    }

    /// Add `count` records of `kind` for `owner`, each one second older than
    /// the last, labelled `label`.
    pub(crate) fn with_records(
        mut self,
        owner: UserID,
        kind: RecordKind,
        count: usize,
        amount: f64,
        label: Option<&str>,
    ) -> Self {
        let start: OffsetDateTime = datetime!(2025-06-30 12:00 UTC);

        for _ in 0..count {
            let id = self.records.len() as i64 + 1;
            let record = Record {
                id,
                amount,
                created_at: start - time::Duration::seconds(id),
                detail: RecordDetail::new(kind, label.map(str::to_owned)),
            };
            self.records.push((owner, record));
        }

        self
    }

    fn matching(&self, owner: UserID, kind: RecordKind) -> Vec<&Record> {
        let mut records: Vec<&Record> = self
            .records
            .iter()
            .filter(|(record_owner, record)| *record_owner == owner && record.kind() == kind)
            .map(|(_, record)| record)
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        records
    }
}

impl RecordStore for MemoryRecordStore {
    fn count(&self, owner: UserID, kind: RecordKind) -> Result<u64, Error> {
        Ok(self.matching(owner, kind).len() as u64)
    }

    fn find_page(
        &self,
        owner: UserID,
        kind: RecordKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>, Error> {
        if !self.page_latency_ms.is_empty() {
            let millis = rand::thread_rng().gen_range(self.page_latency_ms.clone());
            thread::sleep(Duration::from_millis(millis));
        }

        if self.failing_page == Some((kind, offset)) {
            return Err(Error::DatabaseLockError);
        }

        Ok(self
            .matching(owner, kind)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    fn aggregate_sum(&self, owner: UserID, kind: RecordKind) -> Result<f64, Error> {
        Ok(self
            .matching(owner, kind)
            .iter()
            .map(|record| record.amount)
            .sum())
    }

    fn sum_by_label(&self, owner: UserID, kind: RecordKind) -> Result<Vec<LabelTotal>, Error> {
        let mut totals: Vec<LabelTotal> = Vec::new();

        for record in self.matching(owner, kind) {
            let name = record.detail.label().map(str::to_owned);
            match totals.iter_mut().find(|total| total.name == name) {
                Some(total) => total.value += record.amount,
                None => totals.push(LabelTotal {
                    name,
                    value: record.amount,
                }),
            }
        }

        Ok(totals)
    }
}
