use std::io;

use serde_json::Value;

use super::format::{self, Align, Column};

pub fn render_run_report(data: &Value) -> io::Result<String> {
    let banks_loaded = data.get("banks_loaded").and_then(Value::as_i64).unwrap_or(0);
    let rows_read = data.get("rows_read").and_then(Value::as_i64).unwrap_or(0);
    let rows_skipped = data.get("rows_skipped").and_then(Value::as_i64).unwrap_or(0);
    let rates_source = data
        .get("rates_source")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let csv_path = data.get("csv_path").and_then(Value::as_str).unwrap_or("?");
    let db_path = data.get("db_path").and_then(Value::as_str).unwrap_or("?");
    let table_name = data
        .get("table_name")
        .and_then(Value::as_str)
        .unwrap_or("?");

    let mut lines = vec![
        "ETL run completed successfully.".to_string(),
        String::new(),
        "Summary:".to_string(),
    ];
    lines.extend(format::key_value_rows(
        &[
            ("Banks loaded:", banks_loaded.to_string()),
            ("Rows read:", rows_read.to_string()),
            ("Rows skipped:", rows_skipped.to_string()),
            ("Rates source:", rates_source.to_string()),
            ("CSV output:", csv_path.to_string()),
            ("Database:", format!("{db_path} (table `{table_name}`)")),
        ],
        2,
    ));

    if let Some(skipped) = data.get("skipped").and_then(Value::as_array)
        && !skipped.is_empty()
    {
        lines.push(String::new());
        lines.push("Skipped rows:".to_string());
        for entry in skipped {
            let row = entry.get("row").and_then(Value::as_i64).unwrap_or(0);
            lines.push(format!("  Row {row}: {}", describe_skip(entry.get("reason"))));
        }
    }

    let queries = data
        .get("queries")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("run output requires queries"))?;

    lines.push(String::new());
    lines.push("Verification queries:".to_string());
    for block in queries {
        let sql = block.get("sql").and_then(Value::as_str).unwrap_or("?");
        lines.push(String::new());
        lines.push(format!("  {sql}"));
        lines.extend(render_query_table(block)?.into_iter().map(|line| {
            if line.is_empty() {
                line
            } else {
                format!("  {line}")
            }
        }));
    }

    Ok(lines.join("\n"))
}

fn describe_skip(reason: Option<&Value>) -> String {
    let Some(reason) = reason else {
        return "skipped".to_string();
    };
    let kind = reason.get("kind").and_then(Value::as_str).unwrap_or("");
    match kind {
        "too_few_columns" => {
            let found = reason.get("found").and_then(Value::as_i64).unwrap_or(0);
            format!("only {found} cells")
        }
        "empty_name" => "empty bank name".to_string(),
        "unparsable_market_cap" => {
            let raw = reason.get("raw").and_then(Value::as_str).unwrap_or("");
            format!("market cap `{raw}` is not a number")
        }
        "non_positive_market_cap" => {
            let value = reason.get("value").and_then(Value::as_f64).unwrap_or(0.0);
            format!("market cap {value} is not positive")
        }
        other => other.to_string(),
    }
}

fn render_query_table(block: &Value) -> io::Result<Vec<String>> {
    let columns = block
        .get("columns")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("query block requires columns"))?;
    let rows = block
        .get("rows")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("query block requires rows"))?;

    if rows.is_empty() {
        return Ok(vec!["  (no rows)".to_string()]);
    }

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

    Ok(format::render_table(&table_columns, &table_rows))
}

pub(super) fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        _ => value.to_string(),
    }
}
