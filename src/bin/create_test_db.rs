use std::error::Error;
use std::path::Path;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;
use time::{Duration, OffsetDateTime};

use finance_tracker::{NewRecord, RecordKind, UserID, initialize_db, insert_record};

/// A utility for creating a test database for the REST API server of finance_tracker.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to save the SQLite database to.
    #[arg(long, short)]
    output_path: String,

    /// The ID of the user that owns the generated records.
    #[arg(long, default_value_t = 1)]
    user_id: i64,

    /// The number of income records to generate.
    #[arg(long, default_value_t = 500)]
    income_count: usize,

    /// The number of expense records to generate.
    #[arg(long, default_value_t = 2500)]
    expense_count: usize,
}

const SOURCES: [&str; 4] = ["Salary", "Freelance", "Dividends", "Gift"];
const CATEGORIES: [&str; 6] = [
    "Groceries",
    "Rent",
    "Transport",
    "Utilities",
    "Dining",
    "Entertainment",
];

/// Create and populate a database for manual testing.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let output_path = Path::new(&args.output_path);

    match output_path.extension() {
        None => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        Some(extension) if extension.is_empty() => {
            eprintln!("Output path must include a file extension (e.g., 'my_database.db').");
            exit(1);
        }
        _ => {}
    }

    if output_path.is_file() {
        eprintln!("File already exists at {output_path:#?}!");
        exit(1);
    }

    println!("Creating database at {output_path:#?}");
    let mut conn = Connection::open(output_path)?;

    initialize_db(&conn)?;

    let owner = UserID::new(args.user_id);
    let now = OffsetDateTime::now_utc();
    let transaction = conn.transaction()?;

    println!("Creating {} income records...", args.income_count);
    for i in 0..args.income_count {
        let record = NewRecord {
            amount: 500.0 + (i % 17) as f64 * 125.5,
            label: Some(SOURCES[i % SOURCES.len()].to_owned()),
            description: format!("Generated income #{}", i + 1),
            created_at: now - Duration::hours(i as i64 * 7),
        };
        insert_record(owner, RecordKind::Income, &record, &transaction)?;
    }

    println!("Creating {} expense records...", args.expense_count);
    for i in 0..args.expense_count {
        let record = NewRecord {
            amount: 3.5 + (i % 23) as f64 * 4.25,
            label: Some(CATEGORIES[i % CATEGORIES.len()].to_owned()),
            description: format!("Generated expense #{}", i + 1),
            created_at: now - Duration::minutes(i as i64 * 53),
        };
        insert_record(owner, RecordKind::Expense, &record, &transaction)?;
    }

    transaction.commit()?;

    println!("Success!");

    Ok(())
}
