use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::ValueRef;
use serde::Serialize;
use serde_json::Value;

use crate::error::{EtlError, EtlResult};

pub const DEFAULT_MAX_ROWS: usize = 1000;
pub const HARD_MAX_ROWS: usize = 10000;

/// Tabular result of a read query. Cells are JSON scalars; blobs are
/// hex-encoded.
#[derive(Debug, Clone, Serialize)]
pub struct QueryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: i64,
    pub truncated: bool,
}

/// Executes a read query and collects up to `max_rows` rows. The SQL text is
/// not validated up front: malformed statements surface as `Query` errors
/// from the engine. An empty result set is a success.
pub fn run_query(connection: &Connection, sql: &str, max_rows: usize) -> EtlResult<QueryTable> {
    let mut statement = connection
        .prepare(sql)
        .map_err(|error| map_query_error(sql, &error))?;

    let columns = statement
        .column_names()
        .into_iter()
        .map(std::string::ToString::to_string)
        .collect::<Vec<String>>();

    let mut cursor = statement
        .query([])
        .map_err(|error| map_query_error(sql, &error))?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    let mut truncated = false;
    while let Some(row) = cursor.next().map_err(|error| map_query_error(sql, &error))? {
        if rows.len() >= max_rows {
            truncated = true;
            break;
        }

        let mut output_row = Vec::with_capacity(columns.len());
        for column_index in 0..columns.len() {
            let raw = row
                .get_ref(column_index)
                .map_err(|error| map_query_error(sql, &error))?;
            output_row.push(value_ref_to_json(raw));
        }
        rows.push(output_row);
    }

    Ok(QueryTable {
        columns,
        row_count: rows.len() as i64,
        rows,
        truncated,
    })
}

/// Opens the loaded database read-only for ad-hoc queries.
pub fn open_readonly(db_path: &Path) -> EtlResult<Connection> {
    use rusqlite::OpenFlags;

    if !db_path.exists() {
        return Err(EtlError::query(format!(
            "database `{}` does not exist; run `bankrank run` first",
            db_path.display()
        )));
    }

    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY;
    let connection = Connection::open_with_flags(db_path, flags).map_err(|error| {
        EtlError::query(format!(
            "cannot open database `{}`: {error}",
            db_path.display()
        ))
    })?;
    connection
        .busy_timeout(std::time::Duration::from_millis(250))
        .map_err(|error| {
            EtlError::query(format!(
                "cannot configure database `{}`: {error}",
                db_path.display()
            ))
        })?;
    Ok(connection)
}

pub(crate) fn map_query_error(sql: &str, error: &rusqlite::Error) -> EtlError {
    EtlError::query(format!("query `{sql}` failed: {error}"))
}

fn value_ref_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(number) => Value::from(number),
        ValueRef::Real(number) => Value::from(number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).to_string()),
        ValueRef::Blob(bytes) => Value::String(encode_blob_hex(bytes)),
    }
}

fn encode_blob_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push(HEX[(byte >> 4) as usize] as char);
        output.push(HEX[(byte & 0x0f) as usize] as char);
    }
    output
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use serde_json::Value;

    use super::{DEFAULT_MAX_ROWS, run_query};

    fn seeded_connection() -> Connection {
        let connection =
            Connection::open_in_memory().expect("in-memory database should open");
        let seeded = connection.execute_batch(
            "CREATE TABLE Largest_banks (
                 Name TEXT NOT NULL,
                 MC_USD_Billion REAL NOT NULL,
                 MC_GBP_Billion REAL NOT NULL,
                 MC_EUR_Billion REAL NOT NULL,
                 MC_INR_Billion REAL NOT NULL
             );
             INSERT INTO Largest_banks VALUES
                 ('JPMorgan Chase', 432.92, 346.34, 402.62, 35910.71),
                 ('Bank of America', 231.52, 185.22, 215.31, 19204.58);",
        );
        assert!(seeded.is_ok());
        connection
    }

    #[test]
    fn select_all_returns_columns_and_rows() {
        let connection = seeded_connection();

        let table = run_query(
            &connection,
            "SELECT * FROM Largest_banks",
            DEFAULT_MAX_ROWS,
        );
        assert!(table.is_ok());
        if let Ok(table) = table {
            assert_eq!(table.columns[0], "Name");
            assert_eq!(table.row_count, 2);
            assert!(!table.truncated);
            assert_eq!(
                table.rows[0][0],
                Value::String("JPMorgan Chase".to_string())
            );
        }
    }

    #[test]
    fn aggregate_query_returns_a_single_cell() {
        let connection = seeded_connection();

        let table = run_query(
            &connection,
            "SELECT AVG(MC_GBP_Billion) FROM Largest_banks",
            DEFAULT_MAX_ROWS,
        );
        assert!(table.is_ok());
        if let Ok(table) = table {
            assert_eq!(table.row_count, 1);
            let average = table.rows[0][0].as_f64();
            assert!(average.is_some());
            if let Some(average) = average {
                assert!((average - 265.78).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn empty_table_query_is_a_success_with_zero_rows() {
        let connection = seeded_connection();
        let cleared = connection.execute("DELETE FROM Largest_banks", []);
        assert!(cleared.is_ok());

        let table = run_query(
            &connection,
            "SELECT * FROM Largest_banks",
            DEFAULT_MAX_ROWS,
        );
        assert!(table.is_ok());
        if let Ok(table) = table {
            assert_eq!(table.row_count, 0);
            assert!(table.rows.is_empty());
            assert_eq!(table.columns.len(), 5);
        }
    }

    #[test]
    fn malformed_sql_surfaces_as_query_error() {
        let connection = seeded_connection();

        let table = run_query(&connection, "SELEC wrong FROM nowhere", DEFAULT_MAX_ROWS);
        assert!(table.is_err());
        if let Err(error) = table {
            assert_eq!(error.code(), "query_error");
        }
    }

    #[test]
    fn results_truncate_at_the_row_cap() {
        let connection = seeded_connection();

        let table = run_query(&connection, "SELECT Name FROM Largest_banks", 1);
        assert!(table.is_ok());
        if let Ok(table) = table {
            assert_eq!(table.row_count, 1);
            assert!(table.truncated);
        }
    }
}
