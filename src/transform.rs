// 💱 Transformer - USD market caps → GBP / EUR / INR columns

use crate::error::{EtlError, Result};
use crate::record::{BankRecord, ConvertedBank, Currency};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

// ============================================================================
// RATE TABLE
// ============================================================================

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,

    #[serde(rename = "Rate")]
    rate: f64,
}

/// Currency code → multiplier from USD
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    /// Read a `Currency,Rate` CSV file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
        Self::from_reader(file).map_err(|e| match e {
            EtlError::Parse(msg) => EtlError::Parse(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = HashMap::new();

        for (line_num, result) in rdr.deserialize::<RateRow>().enumerate() {
            let row = result.map_err(|e| match e.into_kind() {
                csv::ErrorKind::Io(io) => EtlError::io("<rate table>", io),
                kind => EtlError::Parse(format!(
                    "malformed rate table at line {}: {:?}",
                    line_num + 2,
                    kind
                )),
            })?;
            // later rows override earlier ones for the same code
            rates.insert(row.currency, row.rate);
        }

        Ok(RateTable { rates })
    }

    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        RateTable {
            rates: pairs.into_iter().map(|(c, r)| (c.into(), r)).collect(),
        }
    }

    pub fn get(&self, code: &str) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Multiplier for `currency`; a missing code multiplies by 1.0
    pub fn rate_for(&self, currency: Currency) -> f64 {
        self.get(currency.code()).unwrap_or(1.0)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

// ============================================================================
// TRANSFORM
// ============================================================================

/// Round half away from zero to 2 decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn convert(record: &BankRecord, rates: &RateTable) -> ConvertedBank {
    let usd = record.market_cap_usd;
    ConvertedBank {
        name: record.name.clone(),
        market_cap_usd: usd,
        market_cap_gbp: round2(usd * rates.rate_for(Currency::Gbp)),
        market_cap_eur: round2(usd * rates.rate_for(Currency::Eur)),
        market_cap_inr: round2(usd * rates.rate_for(Currency::Inr)),
    }
}

/// Add the three currency columns to every record, keeping input order
pub fn transform(records: &[BankRecord], rates: &RateTable) -> Vec<ConvertedBank> {
    records.iter().map(|r| convert(r, rates)).collect()
}

/// Load the rate table at `rate_table_path`, then [`transform`]
pub fn transform_with_file(
    records: &[BankRecord],
    rate_table_path: &Path,
) -> Result<Vec<ConvertedBank>> {
    let rates = RateTable::load(rate_table_path)?;
    if rates.is_empty() {
        tracing::warn!(
            "{} has no rates; every currency column copies the USD value",
            rate_table_path.display()
        );
    } else {
        tracing::debug!("Loaded {} exchange rates", rates.len());
    }
    Ok(transform(records, &rates))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_rates() -> RateTable {
        RateTable::from_pairs([("GBP", 0.8), ("EUR", 0.9), ("INR", 80.0)])
    }

    #[test]
    fn test_transform_two_banks() {
        let records = vec![BankRecord::new("Bank A", 100.5), BankRecord::new("Bank B", 50.25)];
        let out = transform(&records, &sample_rates());

        assert_eq!(
            out,
            vec![
                ConvertedBank {
                    name: "Bank A".to_string(),
                    market_cap_usd: 100.5,
                    market_cap_gbp: 80.4,
                    market_cap_eur: 90.45,
                    market_cap_inr: 8040.0,
                },
                ConvertedBank {
                    name: "Bank B".to_string(),
                    market_cap_usd: 50.25,
                    market_cap_gbp: 40.2,
                    market_cap_eur: 45.23,
                    market_cap_inr: 4020.0,
                },
            ]
        );
    }

    #[test]
    fn test_derived_columns_match_formula() {
        let rates = RateTable::from_pairs([("GBP", 0.7931), ("EUR", 0.9301), ("INR", 82.9553)]);
        for usd in [0.0, 1.0, 12.345, 432.92, 1234.5678] {
            let bank = convert(&BankRecord::new("B", usd), &rates);
            for cur in Currency::ALL {
                assert_eq!(bank.market_cap(cur), round2(usd * rates.rate_for(cur)));
            }
        }
    }

    #[test]
    fn test_missing_rate_defaults_to_one() {
        let rates = RateTable::from_pairs([("GBP", 0.8)]);
        let bank = convert(&BankRecord::new("Bank A", 10.126), &rates);

        assert_eq!(bank.market_cap_gbp, 8.1);
        assert_eq!(bank.market_cap_eur, 10.13);
        assert_eq!(bank.market_cap_inr, 10.13);
    }

    #[test]
    fn test_rate_table_from_csv() {
        let csv = "Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n";
        let rates = RateTable::from_reader(csv.as_bytes()).unwrap();

        assert_eq!(rates.len(), 3);
        assert_eq!(rates.get("EUR"), Some(0.93));
        assert_eq!(rates.rate_for(Currency::Inr), 82.95);
    }

    #[test]
    fn test_header_only_rate_table_converts_at_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange_rate.csv");
        std::fs::write(&path, "Currency,Rate\n").unwrap();

        assert!(RateTable::load(&path).unwrap().is_empty());

        let out = transform_with_file(&[BankRecord::new("Bank A", 100.5)], &path).unwrap();
        assert_eq!(out[0].market_cap_gbp, 100.5);
        assert_eq!(out[0].market_cap_inr, 100.5);
    }

    #[test]
    fn test_rate_table_bad_rate() {
        let csv = "Currency,Rate\nEUR,abc\n";
        let err = RateTable::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, EtlError::Parse(_)));
    }

    #[test]
    fn test_rate_table_missing_column() {
        let csv = "Code,Value\nEUR,0.93\n";
        assert!(matches!(
            RateTable::from_reader(csv.as_bytes()),
            Err(EtlError::Parse(_))
        ));
    }

    #[test]
    fn test_rate_table_missing_file() {
        let err = RateTable::load(Path::new("/definitely/not/here/exchange_rate.csv")).unwrap_err();
        assert_eq!(err.kind(), "IOError");
    }

    #[test]
    fn test_transform_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exchange_rate.csv");
        std::fs::write(&path, "Currency,Rate\nGBP,0.8\nEUR,0.9\nINR,80\n").unwrap();

        let out = transform_with_file(&[BankRecord::new("Bank B", 50.25)], &path).unwrap();
        assert_eq!(out[0].market_cap_eur, 45.23);
    }
}
