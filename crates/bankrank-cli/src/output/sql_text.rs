use std::io;

use serde_json::Value;

use super::format::{self, Align, Column};
use super::run_text::render_scalar;

pub fn render_sql_result(data: &Value) -> io::Result<String> {
    let columns = data
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("sql output requires columns"))?;
    let rows = data
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("sql output requires rows"))?;

    let row_count = data.get("row_count").and_then(Value::as_i64).unwrap_or(0);
    let truncated = data
        .get("truncated")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let max_rows = data.get("max_rows").and_then(Value::as_i64).unwrap_or(0);
    let source = data
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    let mut source_label = source.to_string();
    if let Some(reference) = data.get("source_ref").and_then(Value::as_str) {
        source_label = format!("{source} ({reference})");
    }

    let mut lines = vec![
        "Query completed successfully.".to_string(),
        String::new(),
        "Summary:".to_string(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("Rows returned:", row_count.to_string()),
            (
                "Truncated:",
                if truncated { "yes" } else { "no" }.to_string(),
            ),
            ("Row limit:", max_rows.to_string()),
            ("Source:", source_label),
        ],
        2,
    ));

    lines.push(String::new());
    if rows.is_empty() {
        lines.push("No rows returned.".to_string());
        return Ok(lines.join("\n"));
    }

    lines.push("Results:".to_string());

    let table_columns = columns
        .iter()
        .map(|column| Column {
            name: column.as_str().unwrap_or("?"),
            align: Align::Left,
        })
        .collect::<Vec<Column<'_>>>();

    let table_rows = rows
        .iter()
        .map(|row| {
            row.as_array()
                .map(|values| values.iter().map(render_scalar).collect::<Vec<String>>())
                .unwrap_or_default()
        })
        .collect::<Vec<Vec<String>>>();

    lines.extend(format::render_table(&table_columns, &table_rows));

    if truncated {
        lines.push(String::new());
        lines.push(format!(
            "Result set was truncated at {max_rows} rows. Narrow your query to inspect more rows."
        ));
    }

    Ok(lines.join("\n"))
}
