use anyhow::{Context, Result};
use banks_etl::{EtlConfig, EtlPipeline};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Scrape the largest-banks table, add GBP/EUR/INR columns,
/// save to CSV + SQLite and print the report queries.
#[derive(Parser, Debug)]
#[command(name = "banks-etl", version, about)]
struct Cli {
    /// TOML file overriding the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page holding the bank table
    #[arg(long)]
    url: Option<String>,

    /// Exchange-rate CSV (Currency,Rate)
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Output CSV file
    #[arg(long)]
    output: Option<PathBuf>,

    /// SQLite database file
    #[arg(long)]
    db: Option<PathBuf>,

    /// Table to replace in the database
    #[arg(long)]
    table: Option<String>,

    /// Progress log file
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<EtlConfig> {
        let mut config = match &self.config {
            Some(path) => EtlConfig::load(path)?,
            None => EtlConfig::default(),
        };

        if let Some(url) = self.url {
            config.url = url;
        }
        if let Some(rates) = self.rates {
            config.rates_path = rates;
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(db) = self.db {
            config.db_path = db;
        }
        if let Some(table) = self.table {
            config.table_name = table;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = log_file;
        }

        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let config = Cli::parse().into_config()?;

    println!("🏦 Largest banks ETL");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let pipeline = EtlPipeline::with_http(config).context("Failed to set up HTTP client")?;
    let summary = pipeline
        .run()
        .with_context(|| format!("ETL run failed (see {})", pipeline.config().log_file.display()))?;

    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "✓ {} banks saved to {} and table {}",
        summary.banks.len(),
        pipeline.config().output_path.display(),
        pipeline.config().table_name
    );

    Ok(())
}
