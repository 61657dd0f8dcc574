use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::envelope::{SuccessEnvelope, success};
use crate::query::{self, DEFAULT_MAX_ROWS, HARD_MAX_ROWS, QueryTable};
use crate::{EtlError, EtlResult};

const MAX_SQL_LENGTH: usize = 65_536;

#[derive(Debug, Clone, Default)]
pub struct SqlQueryOptions<'a> {
    pub query: Option<String>,
    pub file: Option<String>,
    pub db_override: Option<&'a Path>,
    pub stdin_override: Option<String>,
    pub max_rows: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SqlSource {
    Inline,
    File { path: String },
    Stdin,
}

/// JSON payload for one ad-hoc query.
#[derive(Debug, Clone, Serialize)]
pub struct SqlQueryData {
    #[serde(flatten)]
    pub table: QueryTable,
    pub max_rows: i64,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

pub fn run(query: Option<String>, file: Option<String>) -> EtlResult<SuccessEnvelope> {
    run_with_options(SqlQueryOptions {
        query,
        file,
        db_override: None,
        stdin_override: None,
        max_rows: None,
    })
}

#[doc(hidden)]
pub fn run_with_options(options: SqlQueryOptions<'_>) -> EtlResult<SuccessEnvelope> {
    let (sql, source) = resolve_sql_source(
        options.query,
        options.file,
        options.stdin_override.as_deref(),
    )?;
    validate_sql_input(&sql)?;
    let max_rows = normalize_max_rows(options.max_rows)?;

    let db_path = match options.db_override {
        Some(path) => path.to_path_buf(),
        None => Config::default().db_path,
    };

    let connection = query::open_readonly(&db_path)?;
    ensure_statement_is_readonly(&connection, &sql)?;
    let table = query::run_query(&connection, &sql, max_rows)?;

    let data = SqlQueryData {
        table,
        max_rows: max_rows as i64,
        source: source_label(&source).to_string(),
        source_ref: source_ref(&source),
    };
    success("sql", data)
}

fn resolve_sql_source(
    query: Option<String>,
    file: Option<String>,
    stdin_override: Option<&str>,
) -> EtlResult<(String, SqlSource)> {
    if query.is_some() && file.is_some() {
        return Err(sql_source_error());
    }

    if let Some(inline_query) = query {
        return Ok((inline_query, SqlSource::Inline));
    }

    if let Some(file_path) = file {
        if file_path == "-" {
            let stdin_body = if let Some(override_body) = stdin_override {
                override_body.to_string()
            } else {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .map_err(|error| {
                        EtlError::io(format!("Failed to read SQL from stdin: {error}"))
                    })?;
                buffer
            };
            return Ok((stdin_body, SqlSource::Stdin));
        }

        let file_body = fs::read_to_string(&file_path).map_err(|error| {
            EtlError::io(format!("Failed to read SQL file `{file_path}`: {error}"))
        })?;
        return Ok((file_body, SqlSource::File { path: file_path }));
    }

    Err(sql_source_error())
}

fn sql_source_error() -> EtlError {
    EtlError::query(
        "Provide exactly one SQL source: inline query arg, --file <path>, or --file - for stdin.",
    )
}

fn validate_sql_input(sql: &str) -> EtlResult<()> {
    if sql.trim().is_empty() {
        return Err(EtlError::query("SQL query cannot be empty."));
    }
    if sql.as_bytes().contains(&0) {
        return Err(EtlError::query("SQL query contains unsupported NUL bytes."));
    }
    if sql.len() > MAX_SQL_LENGTH {
        return Err(EtlError::query(format!(
            "SQL query exceeds max length ({MAX_SQL_LENGTH} characters)."
        )));
    }
    Ok(())
}

fn normalize_max_rows(max_rows: Option<usize>) -> EtlResult<usize> {
    let resolved = max_rows.unwrap_or(DEFAULT_MAX_ROWS);
    if resolved == 0 || resolved > HARD_MAX_ROWS {
        return Err(EtlError::query(format!(
            "max_rows must be between 1 and {HARD_MAX_ROWS}."
        )));
    }
    Ok(resolved)
}

/// The ad-hoc surface never writes. `Statement::readonly` reflects what the
/// prepared statement would actually do, so it also catches writes hidden
/// behind CTEs.
fn ensure_statement_is_readonly(
    connection: &rusqlite::Connection,
    sql: &str,
) -> EtlResult<()> {
    let statement = connection
        .prepare(sql)
        .map_err(|error| query::map_query_error(sql, &error))?;
    if !statement.readonly() {
        return Err(EtlError::query(
            "SQL statement must be read-only. Use SELECT queries only.",
        ));
    }
    Ok(())
}

fn source_label(source: &SqlSource) -> &'static str {
    match source {
        SqlSource::Inline => "inline",
        SqlSource::File { .. } => "file",
        SqlSource::Stdin => "stdin",
    }
}

fn source_ref(source: &SqlSource) -> Option<String> {
    match source {
        SqlSource::File { path } => Some(path.clone()),
        _ => None,
    }
}

pub fn default_db_path() -> PathBuf {
    Config::default().db_path
}
