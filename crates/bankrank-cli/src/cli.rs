use clap::{Parser, Subcommand};

pub fn parse_max_rows(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|_| "max-rows must be a positive integer".to_string())?;
    if parsed == 0 {
        return Err("max-rows must be at least 1".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "bankrank",
    version,
    about = "largest-banks market cap ETL",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the full pipeline: scrape, convert, write CSV, load SQLite
    Run {
        /// Page URL to scrape instead of the pinned archive snapshot
        #[arg(long)]
        url: Option<String>,
        /// Exchange-rate CSV path (falls back to built-in rates when missing)
        #[arg(long)]
        rates: Option<String>,
        /// Output CSV path
        #[arg(long)]
        csv_out: Option<String>,
        /// SQLite database path
        #[arg(long)]
        db: Option<String>,
        /// Destination table name
        #[arg(long)]
        table: Option<String>,
        /// Run-log file path
        #[arg(long)]
        log_file: Option<String>,
        /// Base directory for default data and log paths
        #[arg(long)]
        data_dir: Option<String>,
        /// Suppress log echo on the console
        #[arg(long)]
        quiet: bool,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Run a read-only SQL query against the loaded database
    Sql {
        /// Inline SQL query to execute
        query: Option<String>,
        /// Read SQL from a file path, or `-` for stdin
        #[arg(long)]
        file: Option<String>,
        /// SQLite database path
        #[arg(long)]
        db: Option<String>,
        /// Maximum rows to return
        #[arg(long, value_parser = parse_max_rows)]
        max_rows: Option<usize>,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
