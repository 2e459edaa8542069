//! Strata CLI
//!
//! Command-line interface for inspecting and editing a Strata directory.

use std::process;

use clap::{Parser, Subcommand};
use strata::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// Strata CLI
#[derive(Parser, Debug)]
#[command(name = "strata-cli")]
#[command(about = "CLI for the Strata storage engine")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./strata_data")]
    data_dir: String,

    /// MemTable flush threshold in bytes
    #[arg(short = 'm', long, default_value = "67108864")]
    memtable_bytes: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Print live pairs in key order
    Scan {
        /// Start key (inclusive)
        #[arg(short, long, default_value = "")]
        from: String,

        /// Stop after this many pairs
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List segments with their row counts
    Segments,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,strata=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .memtable_size_limit(args.memtable_bytes)
        .build();

    if let Err(e) = run(config, args.command) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(config: Config, command: Commands) -> strata::Result<()> {
    let mut engine = Engine::open(config)?;

    match command {
        Commands::Get { key } => match engine.get(key.as_bytes())? {
            Some(value) => println!("{}", String::from_utf8_lossy(&value)),
            None => println!("(nil)"),
        },
        Commands::Put { key, value } => {
            engine.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            engine.delete(key.as_bytes())?;
            println!("OK");
        }
        Commands::Scan { from, limit } => {
            let pairs = engine.get_range(from.as_bytes())?;
            for pair in pairs.take(limit.unwrap_or(usize::MAX)) {
                let (key, value) = pair?;
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&value)
                );
            }
        }
        Commands::Segments => {
            for (generation, segment) in engine.storage().segments() {
                println!(
                    "{}\t{} rows\t{} bytes",
                    generation,
                    segment.row_count(),
                    segment.file_size()
                );
            }
        }
    }

    engine.close()
}
