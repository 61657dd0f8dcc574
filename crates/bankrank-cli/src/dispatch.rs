use std::path::{Path, PathBuf};

use bankrank_core::commands::run::{self, EtlRunOptions};
use bankrank_core::commands::sql::{self, SqlQueryOptions};
use bankrank_core::config::Config;
use bankrank_core::{EtlResult, SuccessEnvelope};

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: &Cli) -> EtlResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Run {
            url,
            rates,
            csv_out,
            db,
            table,
            log_file,
            data_dir,
            quiet,
            json,
        } => {
            let config = build_run_config(
                url.as_deref(),
                rates.as_deref(),
                csv_out.as_deref(),
                db.as_deref(),
                table.as_deref(),
                log_file.as_deref(),
                data_dir.as_deref(),
            );
            // JSON mode keeps stdout machine-readable, so the log echo stays off.
            let quiet = *quiet || *json;
            run::run_with_options(EtlRunOptions {
                config: Some(config),
                base_dir_override: None,
                page_override: None,
                quiet,
            })
        }
        Commands::Sql {
            query,
            file,
            db,
            max_rows,
            json: _,
        } => {
            let db_path = db
                .as_deref()
                .map(PathBuf::from)
                .unwrap_or_else(sql::default_db_path);
            sql::run_with_options(SqlQueryOptions {
                query: query.clone(),
                file: file.clone(),
                db_override: Some(&db_path),
                stdin_override: None,
                max_rows: *max_rows,
            })
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_run_config(
    url: Option<&str>,
    rates: Option<&str>,
    csv_out: Option<&str>,
    db: Option<&str>,
    table: Option<&str>,
    log_file: Option<&str>,
    data_dir: Option<&str>,
) -> Config {
    let mut config = match data_dir {
        Some(base) => Config::with_base_dir(Path::new(base)),
        None => Config::default(),
    };

    if let Some(url) = url {
        config.source_url = url.to_string();
    }
    if let Some(rates) = rates {
        config.rate_file = PathBuf::from(rates);
    }
    if let Some(csv_out) = csv_out {
        config.output_csv = PathBuf::from(csv_out);
    }
    if let Some(db) = db {
        config.db_path = PathBuf::from(db);
    }
    if let Some(table) = table {
        config.table_name = table.to_string();
    }
    if let Some(log_file) = log_file {
        config.log_path = PathBuf::from(log_file);
    }

    config
}
