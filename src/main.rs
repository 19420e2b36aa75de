//! coredb - inspect and extend a database directory from the command line
//!
//! Usage:
//!   coredb init ./data --block-size 400 --pool-size 8
//!   coredb append ./data 42 commit
//!   coredb dump ./data --forward
//!   coredb stats ./data

use clap::{Parser, Subcommand};
use prettytable::{Table, row};
use std::path::PathBuf;
use std::process::ExitCode;

use coredb::{Database, DatabaseResult, LogRecord, LogResult, LogValue, StorageConfig};

mod logger;

/// Type tags of the values the CLI writes, stored in front of each value
const INT_TAG: i32 = 0;
const STR_TAG: i32 = 1;

#[derive(Parser)]
#[command(name = "coredb")]
#[command(about = "Buffer pool and write-ahead log storage core", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a database directory or change its settings
    Init {
        dir: PathBuf,

        /// Size of a disk block in bytes (fixed once the directory exists)
        #[arg(long)]
        block_size: Option<usize>,

        /// Number of buffers in the pool
        #[arg(long)]
        pool_size: Option<usize>,

        /// Name of the log file inside the directory
        #[arg(long)]
        log_file: Option<String>,
    },
    /// Append one record to the log; integers are stored as ints, anything
    /// else as strings
    Append {
        dir: PathBuf,

        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
    },
    /// Print every log record, newest first
    Dump {
        dir: PathBuf,

        /// Print oldest first instead
        #[arg(long)]
        forward: bool,
    },
    /// Show the configuration and log size
    Stats { dir: PathBuf },
}

fn main() -> ExitCode {
    logger::setup_logger();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init {
            dir,
            block_size,
            pool_size,
            log_file,
        } => cmd_init(dir, block_size, pool_size, log_file),
        Commands::Append { dir, values } => cmd_append(dir, &values),
        Commands::Dump { dir, forward } => cmd_dump(dir, forward),
        Commands::Stats { dir } => cmd_stats(dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_init(
    dir: PathBuf,
    block_size: Option<usize>,
    pool_size: Option<usize>,
    log_file: Option<String>,
) -> DatabaseResult<()> {
    let mut config = StorageConfig::load_or_default(&dir)?;
    if let Some(block_size) = block_size {
        config.block_size = block_size;
    }
    if let Some(pool_size) = pool_size {
        config.pool_size = pool_size;
    }
    if let Some(log_file) = log_file {
        config.log_file = log_file;
    }

    let db = Database::open_with_config(&dir, config)?;
    println!("Initialized {}", dir.display());
    print_config(db.config());
    Ok(())
}

fn cmd_append(dir: PathBuf, tokens: &[String]) -> DatabaseResult<()> {
    let db = Database::open(&dir)?;
    let lsn = db.log_manager().append(&encode_values(tokens))?;
    db.log_manager().flush(lsn)?;
    println!("Appended record at LSN {}", lsn);
    Ok(())
}

fn cmd_dump(dir: PathBuf, forward: bool) -> DatabaseResult<()> {
    let db = Database::open(&dir)?;
    let log = db.log_manager();

    let mut records = log.iterator()?;
    if forward {
        // Run the backward cursor to the start of the log first
        for record in records.by_ref() {
            record?;
        }
        records = log.forward_iterator(&records)?;
    }

    let mut table = Table::new();
    table.set_titles(row!["LSN", "Bytes", "Values"]);
    let mut count = 0;
    for record in records {
        let record = record?;
        let lsn = record.lsn();
        let len = record.len();
        let values = describe(record).unwrap_or_else(|| "<unrecognized>".to_string());
        table.add_row(row![lsn, len, values]);
        count += 1;
    }

    table.printstd();
    println!("{} records", count);
    Ok(())
}

fn cmd_stats(dir: PathBuf) -> DatabaseResult<()> {
    let db = Database::open(&dir)?;
    print_config(db.config());

    let records = db
        .log_manager()
        .iterator()?
        .collect::<LogResult<Vec<_>>>()?;

    let mut table = Table::new();
    table.set_titles(row!["Log", "Value"]);
    table.add_row(row!["blocks", db.log_size()?]);
    table.add_row(row!["current LSN", db.log_manager().current_lsn()]);
    table.add_row(row!["records", records.len()]);
    table.printstd();
    Ok(())
}

fn print_config(config: &StorageConfig) {
    let mut table = Table::new();
    table.set_titles(row!["Setting", "Value"]);
    table.add_row(row!["block size", config.block_size]);
    table.add_row(row!["pool size", config.pool_size]);
    table.add_row(row!["log file", config.log_file]);
    table.printstd();
}

/// Encode CLI tokens as `count, (tag, value)*`
fn encode_values(tokens: &[String]) -> Vec<LogValue> {
    let mut values = Vec::with_capacity(tokens.len() * 2 + 1);
    values.push(LogValue::Int(tokens.len() as i32));
    for token in tokens {
        match token.parse::<i32>() {
            Ok(i) => {
                values.push(LogValue::Int(INT_TAG));
                values.push(LogValue::Int(i));
            }
            Err(_) => {
                values.push(LogValue::Int(STR_TAG));
                values.push(LogValue::from(token.as_str()));
            }
        }
    }
    values
}

/// Decode a record written by `encode_values` into a printable list
fn describe(mut record: LogRecord) -> Option<String> {
    let count = record.next_int().ok()?;
    let mut values = Vec::new();
    for _ in 0..count {
        let value = match record.next_int().ok()? {
            INT_TAG => LogValue::Int(record.next_int().ok()?),
            STR_TAG => LogValue::Str(record.next_string().ok()?),
            _ => return None,
        };
        values.push(value.to_string());
    }
    (record.remaining() == 0).then(|| format!("[{}]", values.join(", ")))
}
