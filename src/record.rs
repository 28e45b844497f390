// 🏦 Bank records - the one entity that flows through the pipeline
// Extractor creates BankRecord, Transformer turns it into ConvertedBank.

// ============================================================================
// COLUMN NAMES
// ============================================================================

pub const NAME_COLUMN: &str = "Name";
pub const USD_COLUMN: &str = "MC_USD_Billion";

/// Columns produced by the extractor, in order
pub const EXTRACT_COLUMNS: [&str; 2] = [NAME_COLUMN, USD_COLUMN];

/// Columns of a fully transformed record, in order (no index column)
pub const OUTPUT_COLUMNS: [&str; 5] = [
    NAME_COLUMN,
    USD_COLUMN,
    "MC_GBP_Billion",
    "MC_EUR_Billion",
    "MC_INR_Billion",
];

// ============================================================================
// CURRENCY
// ============================================================================

/// Target currencies of the transform, in fixed column order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Inr];

    /// ISO code as it appears in the rate table
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }

    /// Derived column name, e.g. `MC_GBP_Billion`
    pub fn column(&self) -> &'static str {
        match self {
            Currency::Gbp => "MC_GBP_Billion",
            Currency::Eur => "MC_EUR_Billion",
            Currency::Inr => "MC_INR_Billion",
        }
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// One row scraped from the source table
#[derive(Debug, Clone, PartialEq)]
pub struct BankRecord {
    pub name: String,
    pub market_cap_usd: f64,
}

impl BankRecord {
    pub fn new(name: impl Into<String>, market_cap_usd: f64) -> Self {
        BankRecord {
            name: name.into(),
            market_cap_usd,
        }
    }
}

/// A bank record after currency conversion.
/// Field order is the column order of both loaders.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedBank {
    pub name: String,
    pub market_cap_usd: f64,
    pub market_cap_gbp: f64,
    pub market_cap_eur: f64,
    pub market_cap_inr: f64,
}

impl ConvertedBank {
    /// Derived value for one target currency
    pub fn market_cap(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Gbp => self.market_cap_gbp,
            Currency::Eur => self.market_cap_eur,
            Currency::Inr => self.market_cap_inr,
        }
    }
}
