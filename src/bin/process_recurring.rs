use std::{error::Error, path::Path, process::exit};

use clap::Parser;
use rusqlite::Connection;
use tracing_subscriber::filter;

use tally_rs::{local_date_today, process_due_rules};

/// A utility for creating the transactions that recurring rules are due to
/// produce. Intended to be run daily from cron or a systemd timer.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long)]
    db_path: String,

    /// The canonical name of the local timezone, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Pacific/Auckland")]
    timezone: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_max_level(filter::LevelFilter::INFO)
        .init();

    let args = Args::parse();
    let db_path = Path::new(&args.db_path);

    if !db_path.is_file() {
        eprintln!("File does not exist at {db_path:#?}!");
        exit(1);
    }

    let today = local_date_today(&args.timezone).ok_or_else(|| {
        format!("'{}' is not a valid canonical timezone name", args.timezone)
    })?;

    let connection = Connection::open(db_path)?;
    let created_count = process_due_rules(today, &connection)?;

    println!("Created {created_count} transaction(s) from recurring rules.");

    Ok(())
}
