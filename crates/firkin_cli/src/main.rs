//! Firkin CLI
//!
//! Interactive shell over one firkin data directory. The shell translates
//! typed commands into engine calls and prints their results; it contains
//! no storage logic of its own.
//!
//! # Commands
//!
//! - `PUT <key> <value>` - write a value
//! - `GET <key>` - read a value
//! - `COMPACT` - rewrite live values into one segment
//! - `EXIT` / `QUIT` - terminate

mod shell;

use clap::Parser;
use firkin_core::{Config, Engine};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Interactive shell for a firkin data directory.
#[derive(Parser)]
#[command(name = "firkin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the data directory
    #[arg(short, long, default_value = "./firkin_data")]
    path: PathBuf,

    /// Maximum segment size in bytes before rollover
    #[arg(short, long, default_value_t = 16 * 1024)]
    max_segment_size: u64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::new().max_segment_size(cli.max_segment_size);
    let engine = Engine::open_with_config(&cli.path, config)?;

    println!(
        "firkin v{} — data directory: {}",
        firkin_core::VERSION,
        cli.path.display()
    );

    shell::run(&engine)?;
    Ok(())
}
