//! Income and expense records, and the store the report pipeline reads them from.

mod sqlite;

use std::fmt::Display;

use serde::Serialize;
use time::OffsetDateTime;

use crate::{Error, UserID};

pub use sqlite::{SqliteRecordStore, create_record_tables, insert_record};

/// The two collections of records a user owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Money earned, labelled by its source.
    Income,
    /// Money spent, labelled by its category.
    Expense,
}

impl RecordKind {
    /// Every record kind, in the order they appear in a report.
    pub const ALL: [RecordKind; 2] = [RecordKind::Income, RecordKind::Expense];

    /// The name of the field that labels a record of this kind.
    pub fn label_field(&self) -> &'static str {
        match self {
            RecordKind::Income => "source",
            RecordKind::Expense => "category",
        }
    }

    pub(crate) fn table(&self) -> &'static str {
        match self {
            RecordKind::Income => "income",
            RecordKind::Expense => "expense",
        }
    }
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// The kind-specific part of a record.
///
/// Both variants carry an optional label since the store does not enforce
/// one. Code that needs the label should go through [Record::label], which
/// treats a missing label as an error.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordDetail {
    /// Details of an income record.
    Income {
        /// Where the money came from, e.g. "Salary".
        source: Option<String>,
    },
    /// Details of an expense record.
    Expense {
        /// What the money was spent on, e.g. "Groceries".
        category: Option<String>,
    },
}

impl RecordDetail {
    /// The kind of record these details belong to.
    pub fn kind(&self) -> RecordKind {
        match self {
            RecordDetail::Income { .. } => RecordKind::Income,
            RecordDetail::Expense { .. } => RecordKind::Expense,
        }
    }

    /// The source of an income or the category of an expense, if it is set
    /// and not blank.
    pub fn label(&self) -> Option<&str> {
        let label = match self {
            RecordDetail::Income { source } => source.as_deref(),
            RecordDetail::Expense { category } => category.as_deref(),
        };

        label.filter(|label| !label.trim().is_empty())
    }

    pub(crate) fn new(kind: RecordKind, label: Option<String>) -> Self {
        match kind {
            RecordKind::Income => RecordDetail::Income { source: label },
            RecordKind::Expense => RecordDetail::Expense { category: label },
        }
    }
}

/// An income or expense owned by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// The ID of the record within its collection.
    pub id: i64,
    /// The amount of money earned or spent. Always positive.
    pub amount: f64,
    /// When the record was created.
    pub created_at: OffsetDateTime,
    /// The kind-specific details of the record.
    pub detail: RecordDetail,
}

impl Record {
    /// The kind of the record.
    pub fn kind(&self) -> RecordKind {
        self.detail.kind()
    }

    /// The label printed for the record in reports.
    ///
    /// # Errors
    /// Returns [Error::MissingLabel] if the record has no source/category.
    pub fn label(&self) -> Result<&str, Error> {
        self.detail.label().ok_or(Error::MissingLabel {
            kind: self.kind(),
            record_id: self.id,
        })
    }
}

/// The data needed to create a record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    /// The amount of money earned or spent.
    pub amount: f64,
    /// The source of an income or the category of an expense.
    pub label: Option<String>,
    /// A free text note about the record.
    pub description: String,
    /// When the record was created.
    pub created_at: OffsetDateTime,
}

/// The total amount for one source or category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelTotal {
    /// The source/category, or `None` for records without one.
    pub name: Option<String>,
    /// The sum of the amounts of the records with this label.
    pub value: f64,
}

/// Read access to a user's records.
///
/// Implementations must return pages in a stable order, `created_at`
/// descending with ties broken by `id` ascending, so that consecutive
/// `(offset, limit)` windows never skip or repeat a record.
pub trait RecordStore: Send + Sync {
    /// The number of records of `kind` owned by `owner`.
    fn count(&self, owner: UserID, kind: RecordKind) -> Result<u64, Error>;

    /// Up to `limit` records of `kind` owned by `owner`, skipping the first
    /// `offset` records in report order.
    fn find_page(
        &self,
        owner: UserID,
        kind: RecordKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>, Error>;

    /// The sum of the amounts of all records of `kind` owned by `owner`, or
    /// zero if there are none.
    fn aggregate_sum(&self, owner: UserID, kind: RecordKind) -> Result<f64, Error>;

    /// The sum of the amounts of the records of `kind` owned by `owner`,
    /// grouped by source/category.
    fn sum_by_label(&self, owner: UserID, kind: RecordKind) -> Result<Vec<LabelTotal>, Error>;
}
