//! Binary entry point for the pagekv command line.
//!
//! Reads a command stream from stdin and answers `find` queries on stdout.
//! Logs go to stderr.

mod commands;
mod error;

use clap::Parser;
use error::{CliError, Result};
use pagekv_common::StoreConfig;
use pagekv_storage::KvStore;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "pagekv",
    version,
    about = "Disk-resident multimap from string keys to i32 values"
)]
struct Cli {
    #[arg(long, default_value = "./data", help = "Directory holding the store files")]
    data_dir: PathBuf,

    #[arg(long, default_value_t = 4096, help = "Page cache size (pages)")]
    cache_pages: usize,

    #[arg(long, help = "Delete existing store files before starting")]
    reset: bool,

    #[arg(long, help = "Skip fsync on flush and close")]
    no_fsync: bool,

    #[arg(long, default_value = "warn", help = "Log filter directive, e.g. pagekv_buffer=debug")]
    log: String,

    #[arg(long, help = "Verify the tree structure after the run and report it on stderr")]
    check: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log)?;

    let mut config = StoreConfig::new(&cli.data_dir);
    config.cache_pages = cli.cache_pages;
    config.fsync_enabled = !cli.no_fsync;

    let mut store = if cli.reset {
        KvStore::open_fresh(config)?
    } else {
        KvStore::open(config)?
    };

    let stdin = io::stdin();
    let mut out = BufWriter::new(io::stdout().lock());
    commands::run(&mut store, stdin.lock(), &mut out)?;
    out.flush()?;

    if cli.check {
        let shape = store.check_invariants()?;
        eprintln!(
            "ok: height {} leaves {} internals {} records {}",
            shape.height, shape.leaves, shape.internals, shape.records
        );
    }

    store.close()?;
    Ok(())
}

fn init_logging(directive: &str) -> Result<()> {
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| CliError::Logging(format!("invalid log directive: {e}")))?;
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| CliError::Logging(e.to_string()))
}
