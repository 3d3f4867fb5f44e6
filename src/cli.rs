//! CLI argument parsing via clap.

use clap::Parser;

/// Country and currency assistant for the terminal.
#[derive(Debug, Parser)]
#[command(name = "mundi", version, long_version = mundi::build_info::LONG_VERSION)]
pub struct Args {
    /// Path to config file (default: ./mundi.toml or ~/.config/mundi/mundi.toml).
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,

    /// Override model name.
    #[arg(short = 'm', long = "model")]
    pub model: Option<String>,

    /// Override the SQLite database path.
    #[arg(long = "db", value_name = "PATH")]
    pub db: Option<String>,

    /// Log in as this user instead of prompting.
    #[arg(short = 'u', long = "login")]
    pub login: Option<String>,

    /// Disable color output.
    #[arg(long = "no-color")]
    pub no_color: bool,
}
