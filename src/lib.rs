// Largest-banks ETL - Core Library
// Exposes the pipeline stages for the CLI and tests

pub mod config;
pub mod error;
pub mod extract;
pub mod load;
pub mod pipeline;
pub mod progress;
pub mod query;
pub mod record;
pub mod transform;

// Re-export commonly used types
pub use config::EtlConfig;
pub use error::{EtlError, Result};
pub use extract::{extract, parse_bank_table, HttpPageSource, PageSource, StaticPageSource};
pub use load::{count_rows, load_to_file, load_to_table, read_file, read_table};
pub use pipeline::{EtlPipeline, RunSummary, Stage};
pub use progress::ProgressLog;
pub use query::{execute_query, run_query, run_query_to, ResultSet};
pub use record::{BankRecord, ConvertedBank, Currency, EXTRACT_COLUMNS, OUTPUT_COLUMNS};
pub use transform::{transform, transform_with_file, RateTable};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
