use std::collections::HashMap;
use std::path::Path;

use crate::error::{EtlError, EtlResult};
use crate::records::{BankRecord, EnrichedBankRecord, ExchangeRates};
use crate::runlog::RunLog;

/// Where the multipliers for a run came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RatesSource {
    File(String),
    Defaults,
}

/// Loads the exchange-rate table for a run. A missing file falls back to the
/// built-in defaults with a logged warning; a present-but-invalid file is a
/// configuration failure.
pub fn load_rates(
    rate_file: &Path,
    defaults: ExchangeRates,
    log: &RunLog,
) -> EtlResult<(ExchangeRates, RatesSource)> {
    if !rate_file.exists() {
        log.record(&format!(
            "exchange-rate file `{}` not found, using default rates",
            rate_file.display()
        ));
        return Ok((defaults, RatesSource::Defaults));
    }

    let content = std::fs::read_to_string(rate_file).map_err(|error| {
        EtlError::config(format!(
            "exchange-rate file `{}` is unreadable: {error}",
            rate_file.display()
        ))
    })?;

    let rates = parse_rate_csv(&content)?;
    Ok((rates, RatesSource::File(rate_file.display().to_string())))
}

/// Parses `Currency,Rate` rows. GBP, EUR, and INR are required; extra
/// currencies are ignored.
pub(crate) fn parse_rate_csv(content: &str) -> EtlResult<ExchangeRates> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|_| EtlError::config("exchange-rate file has no readable header row"))?
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<String>>();

    let currency_index = headers.iter().position(|name| name == "Currency");
    let rate_index = headers.iter().position(|name| name == "Rate");
    let (Some(currency_index), Some(rate_index)) = (currency_index, rate_index) else {
        return Err(EtlError::config(
            "exchange-rate file must have `Currency` and `Rate` columns",
        ));
    };

    let mut by_code: HashMap<String, f64> = HashMap::new();
    for record in reader.records() {
        let record =
            record.map_err(|error| EtlError::config(format!("malformed exchange-rate row: {error}")))?;
        let Some(code) = record.get(currency_index) else {
            continue;
        };
        let Some(raw_rate) = record.get(rate_index) else {
            continue;
        };
        let rate = raw_rate.parse::<f64>().map_err(|_| {
            EtlError::config(format!("rate for `{code}` is not numeric: `{raw_rate}`"))
        })?;
        by_code.insert(code.to_string(), rate);
    }

    Ok(ExchangeRates {
        gbp: required_rate(&by_code, "GBP")?,
        eur: required_rate(&by_code, "EUR")?,
        inr: required_rate(&by_code, "INR")?,
    })
}

fn required_rate(by_code: &HashMap<String, f64>, code: &str) -> EtlResult<f64> {
    let rate = by_code
        .get(code)
        .copied()
        .ok_or_else(|| EtlError::config(format!("exchange-rate file is missing `{code}`")))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(EtlError::config(format!(
            "rate for `{code}` must be positive, got {rate}"
        )));
    }
    Ok(rate)
}

/// Rounds to two decimal places, ties away from zero (`f64::round`).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Computes the converted columns for each record, preserving input order.
pub fn enrich(records: &[BankRecord], rates: ExchangeRates) -> Vec<EnrichedBankRecord> {
    records
        .iter()
        .map(|record| EnrichedBankRecord {
            name: record.name.clone(),
            market_cap_usd: record.market_cap_usd,
            market_cap_gbp: round2(record.market_cap_usd * rates.gbp),
            market_cap_eur: round2(record.market_cap_usd * rates.eur),
            market_cap_inr: round2(record.market_cap_usd * rates.inr),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::config::DEFAULT_EXCHANGE_RATES;
    use crate::records::{BankRecord, ExchangeRates};
    use crate::runlog::RunLog;

    use super::{RatesSource, enrich, load_rates, parse_rate_csv, round2};

    #[test]
    fn conversion_applies_each_rate_and_rounds() {
        let records = vec![BankRecord {
            name: "Test Bank".to_string(),
            market_cap_usd: 100.0,
        }];
        let rates = ExchangeRates {
            gbp: 0.8,
            eur: 0.93,
            inr: 82.95,
        };

        let enriched = enrich(&records, rates);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].market_cap_gbp, 80.0);
        assert_eq!(enriched[0].market_cap_eur, 93.0);
        assert_eq!(enriched[0].market_cap_inr, 8295.0);
    }

    #[test]
    fn enrich_preserves_input_order() {
        let records = vec![
            BankRecord {
                name: "First".to_string(),
                market_cap_usd: 10.0,
            },
            BankRecord {
                name: "Second".to_string(),
                market_cap_usd: 20.0,
            },
        ];

        let enriched = enrich(&records, DEFAULT_EXCHANGE_RATES);
        assert_eq!(enriched[0].name, "First");
        assert_eq!(enriched[1].name, "Second");
    }

    #[test]
    fn round2_breaks_ties_away_from_zero() {
        // 1.125 and 112.5 are exactly representable, so the tie is real.
        assert_eq!(round2(1.125), 1.13);
        assert_eq!(round2(-1.125), -1.13);
        assert_eq!(round2(2.004), 2.0);
        assert_eq!(round2(2.005000001), 2.01);
    }

    #[test]
    fn rate_csv_parses_required_currencies() {
        let rates = parse_rate_csv("Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\nJPY,147.5\n");
        assert!(rates.is_ok());
        if let Ok(rates) = rates {
            assert_eq!(rates.gbp, 0.8);
            assert_eq!(rates.eur, 0.93);
            assert_eq!(rates.inr, 82.95);
        }
    }

    #[test]
    fn missing_required_currency_is_a_config_error() {
        let rates = parse_rate_csv("Currency,Rate\nEUR,0.93\nGBP,0.8\n");
        assert!(rates.is_err());
        if let Err(error) = rates {
            assert_eq!(error.code(), "config_error");
            assert!(error.to_string().contains("INR"));
        }
    }

    #[test]
    fn non_positive_rate_is_a_config_error() {
        let rates = parse_rate_csv("Currency,Rate\nEUR,0.93\nGBP,-0.8\nINR,82.95\n");
        assert!(rates.is_err());
        if let Err(error) = rates {
            assert_eq!(error.code(), "config_error");
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults_and_logs() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let log_path = dir.path().join("log.txt");
            let log = RunLog::silent(&log_path);
            let missing = dir.path().join("no_such_rates.csv");

            let loaded = load_rates(&missing, DEFAULT_EXCHANGE_RATES, &log);
            assert!(loaded.is_ok());
            if let Ok((rates, source)) = loaded {
                assert_eq!(rates, DEFAULT_EXCHANGE_RATES);
                assert_eq!(source, RatesSource::Defaults);
            }

            let body = std::fs::read_to_string(&log_path).unwrap_or_default();
            assert!(body.contains("using default rates"));
        }
    }

    #[test]
    fn present_file_is_used_and_reported_as_the_source() {
        let dir = tempdir();
        assert!(dir.is_ok());
        if let Ok(dir) = dir {
            let rate_path = dir.path().join("exchange_rate.csv");
            let written =
                std::fs::write(&rate_path, "Currency,Rate\nEUR,0.9\nGBP,0.75\nINR,80.0\n");
            assert!(written.is_ok());

            let log = RunLog::silent(&dir.path().join("log.txt"));
            let loaded = load_rates(&rate_path, DEFAULT_EXCHANGE_RATES, &log);
            assert!(loaded.is_ok());
            if let Ok((rates, source)) = loaded {
                assert_eq!(rates.gbp, 0.75);
                assert_eq!(source, RatesSource::File(rate_path.display().to_string()));
            }
        }
    }
}
