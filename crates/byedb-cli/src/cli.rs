use std::path::PathBuf;

use byedb_common::Mode;
use clap::Parser;

/// ByeDB: ask questions about your database in plain language.
#[derive(Parser, Debug)]
#[command(name = "byedb", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// User whose session the REPL drives.
    #[arg(short, long, default_value = "local")]
    pub user: String,

    /// Starting mode (agent or ask). Defaults to the configured mode.
    #[arg(short, long)]
    pub mode: Option<Mode>,

    /// Print the effective configuration (credentials masked) and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}
