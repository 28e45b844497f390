// ⚙️ Run configuration
// Defaults reproduce the fixed paths of the original batch job; a TOML
// file and CLI flags can override them.

use crate::error::{EtlError, Result};
use crate::load::table_ref;
use crate::record::EXTRACT_COLUMNS;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL: &str =
    "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EtlConfig {
    /// Page holding the bank table
    pub url: String,

    /// Column names of the extracted table
    pub table_attribs: Vec<String>,

    /// `Currency,Rate` CSV
    pub rates_path: PathBuf,

    /// Flat-file output
    pub output_path: PathBuf,

    /// SQLite database file
    pub db_path: PathBuf,

    pub table_name: String,

    /// Append-only progress log
    pub log_file: PathBuf,

    pub http_timeout_secs: u64,
}

impl Default for EtlConfig {
    fn default() -> Self {
        EtlConfig {
            url: DEFAULT_URL.to_string(),
            table_attribs: EXTRACT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rates_path: PathBuf::from("exchange_rate.csv"),
            output_path: PathBuf::from("Largest_banks_data.csv"),
            db_path: PathBuf::from("Banks.db"),
            table_name: "Largest_banks".to_string(),
            log_file: PathBuf::from("code_log.txt"),
            http_timeout_secs: 30,
        }
    }
}

impl EtlConfig {
    /// Read a TOML file; keys it leaves out keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("failed to read config file '{}': {}", path.display(), e))
        })?;

        Self::from_toml(&content)
            .map_err(|e| EtlError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// `table_attribs` as borrowed strs, the shape `extract` takes
    pub fn columns(&self) -> Vec<&str> {
        self.table_attribs.iter().map(String::as_str).collect()
    }

    /// The three fixed report queries, in execution order
    pub fn report_queries(&self) -> [String; 3] {
        let table = table_ref(&self.table_name);
        [
            format!("SELECT * FROM {}", table),
            format!("SELECT AVG(MC_GBP_Billion) FROM {}", table),
            format!("SELECT Name FROM {} LIMIT 5", table),
        ]
    }
}
