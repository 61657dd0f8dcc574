use serde::Serialize;

/// Output column order shared by the CSV file and the database table.
pub const OUTPUT_COLUMNS: [&str; 5] = [
    "Name",
    "MC_USD_Billion",
    "MC_GBP_Billion",
    "MC_EUR_Billion",
    "MC_INR_Billion",
];

/// One bank as extracted from the source page. `market_cap_usd` is strictly
/// positive and finite; `name` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankRecord {
    pub name: String,
    pub market_cap_usd: f64,
}

/// A bank with the three converted market caps, each rounded to two decimal
/// places. Produced by the transformer, consumed by both loaders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedBankRecord {
    pub name: String,
    pub market_cap_usd: f64,
    pub market_cap_gbp: f64,
    pub market_cap_eur: f64,
    pub market_cap_inr: f64,
}

/// USD-to-currency multipliers, loaded once per run and never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExchangeRates {
    pub gbp: f64,
    pub eur: f64,
    pub inr: f64,
}
