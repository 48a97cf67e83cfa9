//! Process arguments for `optwatch`.
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--data-dir` | `data` (`OPTWATCH_HOME`) | Directory holding the CSV files |
//! | `--mock` | `false` | Use the deterministic offline sources |
//! | `--timeout-ms` | `10000` | Per-request HTTP timeout |
//!
//! Trailing words are joined and run as a single command, after which the
//! process exits instead of starting the prompt:
//!
//! ```bash
//! optwatch spreads TECH '$NVDA'
//! optwatch --mock report
//! ```

use std::path::PathBuf;

use clap::Parser;

/// Watchlist-driven option and credit-spread scanner
#[derive(Debug, Parser)]
#[command(
    name = "optwatch",
    author,
    version,
    about = "Watchlist-driven option and credit-spread scanner",
    long_about = "optwatch keeps named watchlists of tickers and a rolling cache of their \
option expirations, and scans the front month for premium-selling candidates.\n\
\n\
Run without a command for the interactive prompt, or pass one command as \
trailing arguments. Type 'help' at the prompt for the command list."
)]
pub struct Cli {
    /// Directory holding symbols.csv, months.csv and settings.csv.
    #[arg(long, env = "OPTWATCH_HOME", default_value = "data")]
    pub data_dir: PathBuf,

    /// Serve chains and dividends from deterministic offline data.
    #[arg(long)]
    pub mock: bool,

    /// HTTP request timeout in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// One command to run instead of the interactive prompt.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}
