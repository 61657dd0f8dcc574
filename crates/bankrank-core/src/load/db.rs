use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, TransactionBehavior, params};

use crate::error::{EtlError, EtlResult, map_io_error, map_sqlite_error};
use crate::records::EnrichedBankRecord;

/// Opens (creating if needed) the run's database, with a short busy timeout
/// so a concurrently held lock surfaces as a storage error instead of a hang.
pub fn open_database(db_path: &Path) -> EtlResult<Connection> {
    if let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|error| map_io_error(parent, &error))?;
    }

    let connection =
        Connection::open(db_path).map_err(|error| map_sqlite_error(db_path, &error))?;
    connection
        .busy_timeout(Duration::from_millis(250))
        .map_err(|error| map_sqlite_error(db_path, &error))?;
    Ok(connection)
}

/// Replaces `table_name` entirely with the enriched records: drop, recreate,
/// insert, all inside one immediate transaction. Running twice with the same
/// input leaves identical contents.
pub fn replace_table(
    connection: &mut Connection,
    table_name: &str,
    records: &[EnrichedBankRecord],
) -> EtlResult<()> {
    ensure_safe_table_name(table_name)?;

    let db_path = connection_path(connection);
    let transaction = connection
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    // `table_name` passed the identifier check above and never comes from
    // row data.
    transaction
        .execute_batch(&format!(
            "DROP TABLE IF EXISTS {table_name};
             CREATE TABLE {table_name} (
                 Name TEXT NOT NULL,
                 MC_USD_Billion REAL NOT NULL,
                 MC_GBP_Billion REAL NOT NULL,
                 MC_EUR_Billion REAL NOT NULL,
                 MC_INR_Billion REAL NOT NULL
             );"
        ))
        .map_err(|error| map_sqlite_error(&db_path, &error))?;

    {
        let mut insert = transaction
            .prepare(&format!(
                "INSERT INTO {table_name} (
                     Name, MC_USD_Billion, MC_GBP_Billion, MC_EUR_Billion, MC_INR_Billion
                 ) VALUES (?1, ?2, ?3, ?4, ?5)"
            ))
            .map_err(|error| map_sqlite_error(&db_path, &error))?;

        for record in records {
            insert
                .execute(params![
                    &record.name,
                    record.market_cap_usd,
                    record.market_cap_gbp,
                    record.market_cap_eur,
                    record.market_cap_inr,
                ])
                .map_err(|error| map_sqlite_error(&db_path, &error))?;
        }
    }

    transaction
        .commit()
        .map_err(|error| map_sqlite_error(&db_path, &error))
}

/// Table names come from configuration, not row data, but they are still
/// interpolated into DDL; restrict them to plain identifiers.
fn ensure_safe_table_name(table_name: &str) -> EtlResult<()> {
    let mut chars = table_name.chars();
    let starts_ok = chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    let rest_ok = chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_');

    if starts_ok && rest_ok {
        Ok(())
    } else {
        Err(EtlError::config(format!(
            "table name `{table_name}` must be a plain SQL identifier"
        )))
    }
}

fn connection_path(connection: &Connection) -> std::path::PathBuf {
    connection
        .path()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::path::PathBuf::from(":memory:"))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::records::EnrichedBankRecord;

    use super::{connection_path, ensure_safe_table_name, open_database, replace_table};

    fn sample_records() -> Vec<EnrichedBankRecord> {
        vec![
            EnrichedBankRecord {
                name: "JPMorgan Chase".to_string(),
                market_cap_usd: 432.92,
                market_cap_gbp: 346.34,
                market_cap_eur: 402.62,
                market_cap_inr: 35910.71,
            },
            EnrichedBankRecord {
                name: "HSBC".to_string(),
                market_cap_usd: 148.9,
                market_cap_gbp: 119.12,
                market_cap_eur: 138.48,
                market_cap_inr: 12351.26,
            },
        ]
    }

    #[test]
    fn replace_table_writes_all_rows() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let db_path = dir.path().join("Banks.db");
            let connection = open_database(&db_path);
            assert!(connection.is_ok());
            if let Ok(mut connection) = connection {
                let loaded = replace_table(&mut connection, "Largest_banks", &sample_records());
                assert!(loaded.is_ok());

                let count = connection.query_row(
                    "SELECT COUNT(*), MIN(Name) FROM Largest_banks",
                    [],
                    |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                );
                assert!(count.is_ok());
                if let Ok((rows, first_name)) = count {
                    assert_eq!(rows, 2);
                    assert_eq!(first_name, "HSBC");
                }
            }
        }
    }

    #[test]
    fn reloading_identical_input_is_idempotent() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let db_path = dir.path().join("Banks.db");
            let connection = open_database(&db_path);
            assert!(connection.is_ok());
            if let Ok(mut connection) = connection {
                let records = sample_records();
                assert!(replace_table(&mut connection, "Largest_banks", &records).is_ok());
                assert!(replace_table(&mut connection, "Largest_banks", &records).is_ok());

                let count = connection.query_row(
                    "SELECT COUNT(*) FROM Largest_banks",
                    [],
                    |row| row.get::<_, i64>(0),
                );
                assert!(count.is_ok());
                if let Ok(rows) = count {
                    assert_eq!(rows, records.len() as i64);
                }
            }
        }
    }

    #[test]
    fn reload_replaces_rather_than_appends() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let db_path = dir.path().join("Banks.db");
            let connection = open_database(&db_path);
            assert!(connection.is_ok());
            if let Ok(mut connection) = connection {
                assert!(replace_table(&mut connection, "Largest_banks", &sample_records()).is_ok());
                assert!(
                    replace_table(&mut connection, "Largest_banks", &sample_records()[..1]).is_ok()
                );

                let count = connection.query_row(
                    "SELECT COUNT(*) FROM Largest_banks",
                    [],
                    |row| row.get::<_, i64>(0),
                );
                assert!(count.is_ok());
                if let Ok(rows) = count {
                    assert_eq!(rows, 1);
                }
            }
        }
    }

    #[test]
    fn connection_path_names_the_backing_file() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let db_path = dir.path().join("Banks.db");
            let connection = open_database(&db_path);
            assert!(connection.is_ok());
            if let Ok(connection) = connection {
                assert!(connection_path(&connection).ends_with("Banks.db"));
            }
        }
    }

    #[test]
    fn table_names_are_restricted_to_identifiers() {
        assert!(ensure_safe_table_name("Largest_banks").is_ok());
        assert!(ensure_safe_table_name("_staging2").is_ok());
        assert!(ensure_safe_table_name("banks; DROP TABLE x").is_err());
        assert!(ensure_safe_table_name("1banks").is_err());
        assert!(ensure_safe_table_name("").is_err());
    }
}
