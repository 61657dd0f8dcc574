mod fetch;
mod html;

use serde::Serialize;

use crate::config::Config;
use crate::error::{EtlError, EtlResult};
use crate::records::BankRecord;
use crate::runlog::RunLog;

/// Class marker of the ranked table on the source page.
const TABLE_CLASS: &str = "wikitable";

/// Rows need at least rank, name, and market cap.
const MIN_CELLS: usize = 3;
const NAME_CELL: usize = 1;
const MARKET_CAP_CELL: usize = 2;

/// Why a data row was excluded. Skips are not failures: the run proceeds as
/// long as at least one valid row remains, but every skip stays inspectable.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    TooFewColumns { found: usize },
    EmptyName,
    UnparsableMarketCap { raw: String },
    NonPositiveMarketCap { value: f64 },
}

impl SkipReason {
    pub fn describe(&self) -> String {
        match self {
            Self::TooFewColumns { found } => format!("row has {found} columns, expected at least {MIN_CELLS}"),
            Self::EmptyName => "bank name is empty".to_string(),
            Self::UnparsableMarketCap { raw } => format!("market cap `{raw}` is not numeric"),
            Self::NonPositiveMarketCap { value } => format!("market cap {value} is not positive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based position among the table's data rows (header excluded).
    pub row: usize,
    pub reason: SkipReason,
}

/// Result of the extract stage: valid records in page order, plus the
/// classified skips and the raw row count for reporting.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub records: Vec<BankRecord>,
    pub skipped: Vec<SkippedRow>,
    pub rows_read: usize,
}

/// Fetches the source page and extracts the ranked bank table.
///
/// `page_override` substitutes a captured page body for the network fetch;
/// tests use it the same way other commands accept stdin overrides.
pub fn extract(config: &Config, log: &RunLog, page_override: Option<&str>) -> EtlResult<Extraction> {
    log.record("extraction started");

    let body_storage;
    let body = match page_override {
        Some(page) => page,
        None => {
            body_storage = fetch::fetch_page(&config.source_url, config.http_timeout)
                .inspect_err(|error| log.record(&format!("extraction failed: {error}")))?;
            &body_storage
        }
    };

    match parse_banks(body) {
        Ok(extraction) => {
            log.record(&format!(
                "extraction finished: {} banks ({} rows skipped)",
                extraction.records.len(),
                extraction.skipped.len()
            ));
            Ok(extraction)
        }
        Err(error) => {
            log.record(&format!("extraction failed: {error}"));
            Err(error)
        }
    }
}

/// Parses the first wikitable on the page into bank records, preserving page
/// order. Page order is treated as opaque; descending market cap is not
/// verified.
pub fn parse_banks(page: &str) -> EtlResult<Extraction> {
    let table = html::first_table_with_class(page, TABLE_CLASS).ok_or_else(|| {
        EtlError::data_not_found(format!("no `{TABLE_CLASS}` table found on the source page"))
    })?;

    let rows = html::table_rows(table);
    let mut records = Vec::new();
    let mut skipped = Vec::new();
    let mut rows_read = 0usize;

    // First row is the header.
    for (index, row) in rows.iter().skip(1).enumerate() {
        rows_read += 1;
        let row_number = index + 1;
        match classify_row(row) {
            Ok(record) => records.push(record),
            Err(reason) => skipped.push(SkippedRow {
                row: row_number,
                reason,
            }),
        }
    }

    if records.is_empty() {
        return Err(EtlError::data_not_found(
            "no valid bank rows remain after filtering",
        ));
    }

    Ok(Extraction {
        records,
        skipped,
        rows_read,
    })
}

fn classify_row(row: &str) -> Result<BankRecord, SkipReason> {
    let cells = html::row_cells(row);
    if cells.len() < MIN_CELLS {
        return Err(SkipReason::TooFewColumns { found: cells.len() });
    }

    let name = cells[NAME_CELL].trim().to_string();
    if name.is_empty() {
        return Err(SkipReason::EmptyName);
    }

    let raw = cells[MARKET_CAP_CELL].replace(['\n', ','], "");
    let raw = raw.trim();
    let Ok(market_cap_usd) = raw.parse::<f64>() else {
        return Err(SkipReason::UnparsableMarketCap {
            raw: raw.to_string(),
        });
    };

    if !market_cap_usd.is_finite() || market_cap_usd <= 0.0 {
        return Err(SkipReason::NonPositiveMarketCap {
            value: market_cap_usd,
        });
    }

    Ok(BankRecord {
        name,
        market_cap_usd,
    })
}
