use serde::Serialize;

use crate::config::Config;
use crate::error::{EtlError, EtlResult};
use crate::extract::{self, SkippedRow};
use crate::load;
use crate::query::{self, DEFAULT_MAX_ROWS, QueryTable};
use crate::runlog::RunLog;
use crate::transform::{self, RatesSource};

/// One verification query and its result.
#[derive(Debug, Clone, Serialize)]
pub struct QueryBlock {
    pub sql: String,
    #[serde(flatten)]
    pub table: QueryTable,
}

/// Outcome of a successful run, for rendering and the JSON contract.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub banks_loaded: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub skipped: Vec<SkippedRow>,
    pub rates_source: String,
    pub csv_path: String,
    pub db_path: String,
    pub table_name: String,
    pub queries: Vec<QueryBlock>,
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Captured page body used instead of the network fetch (tests).
    pub page_override: Option<String>,
}

pub fn run(config: &Config, log: &RunLog) -> EtlResult<RunReport> {
    run_with_options(config, log, RunOptions::default())
}

/// Executes the five pipeline stages in order, stopping at the first
/// failure. Every failure is logged with its stage before propagating; no
/// stage retries. The database connection is scoped to this function, so it
/// is released on every exit path.
pub fn run_with_options(
    config: &Config,
    log: &RunLog,
    options: RunOptions,
) -> EtlResult<RunReport> {
    log.record("ETL run starting");

    let extraction = extract::extract(config, log, options.page_override.as_deref())?;

    let (rates, rates_source) =
        transform::load_rates(&config.rate_file, config.default_rates, log)
            .map_err(|error| abort(log, "transform", error))?;
    let enriched = transform::enrich(&extraction.records, rates);
    log.record("transformation finished, starting load");

    load::csv::write_csv(&enriched, &config.output_csv)
        .map_err(|error| abort(log, "CSV load", error))?;
    log.record(&format!(
        "CSV written to `{}`",
        config.output_csv.display()
    ));

    let mut connection = load::db::open_database(&config.db_path)
        .map_err(|error| abort(log, "database open", error))?;
    load::db::replace_table(&mut connection, &config.table_name, &enriched)
        .map_err(|error| abort(log, "database load", error))?;
    log.record(&format!(
        "table `{}` replaced in `{}`",
        config.table_name,
        config.db_path.display()
    ));

    let mut queries = Vec::new();
    for sql in verification_queries(&config.table_name) {
        let table = query::run_query(&connection, &sql, DEFAULT_MAX_ROWS)
            .map_err(|error| abort(log, "verification query", error))?;
        log.record(&format!("query ok: {sql}"));
        queries.push(QueryBlock { sql, table });
    }

    drop(connection);
    log.record("ETL run completed successfully");

    Ok(RunReport {
        banks_loaded: extraction.records.len(),
        rows_read: extraction.rows_read,
        rows_skipped: extraction.skipped.len(),
        skipped: extraction.skipped,
        rates_source: match rates_source {
            RatesSource::File(path) => path,
            RatesSource::Defaults => "built-in defaults".to_string(),
        },
        csv_path: config.output_csv.display().to_string(),
        db_path: config.db_path.display().to_string(),
        table_name: config.table_name.clone(),
        queries,
    })
}

/// Post-load operator checks: full contents, one aggregate, the top names.
fn verification_queries(table_name: &str) -> Vec<String> {
    vec![
        format!("SELECT * FROM {table_name}"),
        format!("SELECT AVG(MC_GBP_Billion) FROM {table_name}"),
        format!("SELECT Name FROM {table_name} LIMIT 5"),
    ]
}

fn abort(log: &RunLog, stage: &str, error: EtlError) -> EtlError {
    log.record(&format!("{stage} failed: {error}"));
    error
}
