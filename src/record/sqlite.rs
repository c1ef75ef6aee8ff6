//! Implements a SQLite backed record store.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error, UserID,
    record::{LabelTotal, NewRecord, Record, RecordDetail, RecordKind, RecordStore},
};

/// Stores income and expense records in a SQLite database.
///
/// The tables must have been created with [create_record_tables] (or
/// [crate::initialize_db]).
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Create a new store for the SQLite `connection`.
    pub fn new(connection: Arc<Mutex<Connection>>) -> Self {
        Self { connection }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)
    }
}

impl RecordStore for SqliteRecordStore {
    fn count(&self, owner: UserID, kind: RecordKind) -> Result<u64, Error> {
        let connection = self.lock()?;

        let count: i64 = connection.query_row(
            &format!("SELECT COUNT(id) FROM {} WHERE user_id = ?1", kind.table()),
            (owner.as_i64(),),
            |row| row.get(0),
        )?;

        Ok(count as u64)
    }

    fn find_page(
        &self,
        owner: UserID,
        kind: RecordKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Record>, Error> {
        let connection = self.lock()?;

        let mut statement = connection.prepare(&format!(
            "SELECT id, amount, created_at, {label} FROM {table}
             WHERE user_id = :user_id
             ORDER BY created_at DESC, id ASC
             LIMIT :limit OFFSET :offset",
            label = kind.label_field(),
            table = kind.table(),
        ))?;

        let records = statement
            .query_map(
                rusqlite::named_params! {
                    ":user_id": owner.as_i64(),
                    ":limit": limit as i64,
                    ":offset": offset as i64,
                },
                |row| map_record_row(kind, row),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn aggregate_sum(&self, owner: UserID, kind: RecordKind) -> Result<f64, Error> {
        let connection = self.lock()?;

        connection
            .query_row(
                &format!(
                    "SELECT COALESCE(SUM(amount), 0.0) FROM {} WHERE user_id = ?1",
                    kind.table()
                ),
                (owner.as_i64(),),
                |row| row.get(0),
            )
            .map_err(|error| error.into())
    }

    fn sum_by_label(&self, owner: UserID, kind: RecordKind) -> Result<Vec<LabelTotal>, Error> {
        let connection = self.lock()?;

        let mut statement = connection.prepare(&format!(
            "SELECT {label}, SUM(amount) FROM {table}
             WHERE user_id = ?1
             GROUP BY {label}
             ORDER BY {label} ASC",
            label = kind.label_field(),
            table = kind.table(),
        ))?;

        let totals = statement
            .query_map((owner.as_i64(),), |row| {
                Ok(LabelTotal {
                    name: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(totals)
    }
}

/// Create the income and expense tables.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_record_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    for kind in RecordKind::ALL {
        connection.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL,
                    amount REAL NOT NULL,
                    {label} TEXT,
                    description TEXT NOT NULL DEFAULT '',
                    created_at INTEGER NOT NULL
                    )",
                table = kind.table(),
                label = kind.label_field(),
            ),
            (),
        )?;

        // Covers the owner filter and the report ordering.
        connection.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS idx_{table}_user_created
                 ON {table}(user_id, created_at DESC, id ASC)",
                table = kind.table(),
            ),
            (),
        )?;
    }

    Ok(())
}

/// Create a new record of `kind` for `owner`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn insert_record(
    owner: UserID,
    kind: RecordKind,
    record: &NewRecord,
    connection: &Connection,
) -> Result<Record, Error> {
    let inserted = connection
        .prepare(&format!(
            "INSERT INTO {table} (user_id, amount, {label}, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             RETURNING id, amount, created_at, {label}",
            table = kind.table(),
            label = kind.label_field(),
        ))?
        .query_row(
            (
                owner.as_i64(),
                record.amount,
                record.label.as_deref(),
                &record.description,
                to_timestamp_millis(record.created_at),
            ),
            |row| map_record_row(kind, row),
        )?;

    Ok(inserted)
}

/// Timestamps are stored as milliseconds since the Unix epoch so that they
/// sort numerically regardless of the offset they were created with.
fn to_timestamp_millis(date_time: OffsetDateTime) -> i64 {
    (date_time.unix_timestamp_nanos() / 1_000_000) as i64
}

fn from_timestamp_millis(millis: i64) -> Result<OffsetDateTime, rusqlite::Error> {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Integer, Box::new(error))
    })
}

fn map_record_row(kind: RecordKind, row: &Row) -> Result<Record, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let created_at = from_timestamp_millis(row.get(2)?)?;
    let label = row.get(3)?;

    Ok(Record {
        id,
        amount,
        created_at,
        detail: RecordDetail::new(kind, label),
    })
}
