use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::records::ExchangeRates;

/// Archived snapshot of the Wikipedia "List of largest banks" page. Pinned to
/// a web.archive.org capture so reruns see a stable table layout.
pub const DEFAULT_SOURCE_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

pub const DEFAULT_TABLE_NAME: &str = "Largest_banks";

/// Fallback multipliers used when no exchange-rate file is present.
pub const DEFAULT_EXCHANGE_RATES: ExchangeRates = ExchangeRates {
    gbp: 0.8,
    eur: 0.93,
    inr: 82.95,
};

/// strftime-style stamp for run-log lines, e.g. `2023-Sep-08-09:16:35`.
pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%b-%d-%H:%M:%S";

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// All run settings, resolved once at startup and passed by reference into
/// each stage. No component reads ambient global state.
#[derive(Debug, Clone)]
pub struct Config {
    pub source_url: String,
    pub rate_file: PathBuf,
    pub output_csv: PathBuf,
    pub db_path: PathBuf,
    pub table_name: String,
    pub log_path: PathBuf,
    pub http_timeout: Duration,
    pub default_rates: ExchangeRates,
}

impl Config {
    /// Defaults rooted at `base_dir`: outputs under `<base>/data/`, the run
    /// log beside them at `<base>/code_log.txt`.
    pub fn with_base_dir(base_dir: &Path) -> Self {
        let data_dir = base_dir.join("data");
        Self {
            source_url: DEFAULT_SOURCE_URL.to_string(),
            rate_file: data_dir.join("exchange_rate.csv"),
            output_csv: data_dir.join("Largest_banks_data.csv"),
            db_path: data_dir.join("Banks.db"),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            log_path: base_dir.join("code_log.txt"),
            http_timeout: HTTP_TIMEOUT,
            default_rates: DEFAULT_EXCHANGE_RATES,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::with_base_dir(Path::new("."))
    }
}
