//! Sets up the application database.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, record::create_record_tables};

/// Create the tables for the domain models if they do not already exist.
///
/// # Errors
/// Returns an [Error::SqlError] if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_record_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
