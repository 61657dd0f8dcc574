use std::path::Path;

use crate::error::{EtlResult, map_io_error};
use crate::records::{EnrichedBankRecord, OUTPUT_COLUMNS};

/// Writes the enriched table as CSV, overwriting any existing file. Parent
/// directories are created if absent. Numeric columns carry two fractional
/// digits.
pub fn write_csv(records: &[EnrichedBankRecord], output_path: &Path) -> EtlResult<()> {
    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|error| map_io_error(parent, &error))?;
    }

    let mut writer =
        csv::Writer::from_path(output_path).map_err(|error| map_csv_error(output_path, &error))?;

    writer
        .write_record(OUTPUT_COLUMNS)
        .map_err(|error| map_csv_error(output_path, &error))?;

    for record in records {
        writer
            .write_record([
                record.name.as_str(),
                &format!("{:.2}", record.market_cap_usd),
                &format!("{:.2}", record.market_cap_gbp),
                &format!("{:.2}", record.market_cap_eur),
                &format!("{:.2}", record.market_cap_inr),
            ])
            .map_err(|error| map_csv_error(output_path, &error))?;
    }

    writer
        .flush()
        .map_err(|error| map_io_error(output_path, &error))
}

fn map_csv_error(path: &Path, error: &csv::Error) -> crate::EtlError {
    crate::EtlError::io(format!("CSV write to `{}` failed: {error}", path.display()))
}
