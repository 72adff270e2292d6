//! GridKV CLI
//!
//! Runs one command against a data directory, saves after a successful
//! write, and exits.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use gridkv::protocol::Command;
use gridkv::{Config, Engine, StorageBackend};
use tracing_subscriber::{fmt, EnvFilter};

/// GridKV CLI
#[derive(Parser, Debug)]
#[command(name = "gridkv-cli")]
#[command(about = "Run one command against a GridKV data directory")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./gridkv_data")]
    data_dir: PathBuf,

    /// Layout for grids created or loaded by this run
    #[arg(short, long, default_value = "flat")]
    backend: StorageBackend,

    /// Keep the command log instead of saving a snapshot after a write
    #[arg(long)]
    no_save: bool,

    /// Command words, e.g. `GRID.DIM sheet 2 3`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("(error) {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> gridkv::Result<()> {
    let command = Command::parse(&args.command)?;

    let config = Config::builder()
        .data_dir(&args.data_dir)
        .default_backend(args.backend)
        .build();
    tracing::debug!(data_dir = %args.data_dir.display(), backend = %args.backend, "opening engine");
    let engine = Engine::open(config)?;

    let is_write = command.is_write();
    let outcome = engine.execute(command);
    match &outcome {
        Ok(reply) => println!("{}", reply),
        Err(e) => println!("(error) {}", e),
    }

    // Reads leave the keyspace as opened, so there is nothing new to snapshot
    if is_write && outcome.is_ok() && !args.no_save {
        engine.save()?;
    }
    engine.close()?;

    outcome.map(|_| ())
}
