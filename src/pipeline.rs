// 🔄 Orchestrator - extract → transform → load → query, strictly in order
//
// Start → Extracted → Transformed → FileLoaded → ConnectionOpen
//       → TableLoaded → Queried → Closed
//
// Any failure stops the run where it is. Nothing downstream executes and
// nothing already written is rolled back.

use crate::config::EtlConfig;
use crate::error::{EtlError, Result};
use crate::extract::{extract, HttpPageSource, PageSource};
use crate::load::{load_to_file, load_to_table};
use crate::progress::ProgressLog;
use crate::query::{run_query_to, ResultSet};
use crate::record::ConvertedBank;
use crate::transform::transform_with_file;
use rusqlite::Connection;
use std::fmt;
use std::io::{self, Write};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Extracted,
    Transformed,
    FileLoaded,
    ConnectionOpen,
    TableLoaded,
    Queried,
    Closed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "Start",
            Stage::Extracted => "Extracted",
            Stage::Transformed => "Transformed",
            Stage::FileLoaded => "FileLoaded",
            Stage::ConnectionOpen => "ConnectionOpen",
            Stage::TableLoaded => "TableLoaded",
            Stage::Queried => "Queried",
            Stage::Closed => "Closed",
        };
        f.write_str(name)
    }
}

/// What a completed run produced
#[derive(Debug)]
pub struct RunSummary {
    pub banks: Vec<ConvertedBank>,
    /// Results of the three report queries, in execution order
    pub reports: Vec<ResultSet>,
    pub stage: Stage,
}

pub struct EtlPipeline {
    config: EtlConfig,
    source: Box<dyn PageSource>,
    log: ProgressLog,
}

impl EtlPipeline {
    pub fn new(config: EtlConfig, source: Box<dyn PageSource>) -> Self {
        let log = ProgressLog::new(config.log_file.clone());
        EtlPipeline { config, source, log }
    }

    /// Pipeline that fetches over HTTP
    pub fn with_http(config: EtlConfig) -> Result<Self> {
        let source = HttpPageSource::new(config.http_timeout())?;
        Ok(Self::new(config, Box::new(source)))
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// Run end to end, reporting query results to stdout
    pub fn run(&self) -> Result<RunSummary> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        self.run_with_report(&mut handle)
    }

    /// Run end to end, reporting query results to `out`.
    ///
    /// On failure the progress log gets one `Process aborted` line naming
    /// the last completed stage, then the error is returned.
    pub fn run_with_report<W: Write>(&self, out: &mut W) -> Result<RunSummary> {
        let mut stage = Stage::Start;

        match self.execute(&mut stage, out) {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("ETL run failed after stage {}: {}", stage, e);
                // the run is already failing; a log write error here is dropped
                let _ = self
                    .log
                    .log(&format!("Process aborted after {}: {}: {}", stage, e.kind(), e));
                Err(e)
            }
        }
    }

    fn advance(&self, stage: &mut Stage, next: Stage, message: &str) -> Result<()> {
        *stage = next;
        info!("stage -> {}", next);
        self.log.log(message)
    }

    fn execute<W: Write>(&self, stage: &mut Stage, out: &mut W) -> Result<RunSummary> {
        let cfg = &self.config;

        self.log.log("Preliminaries complete. Initiating ETL process")?;

        // EXTRACT
        let records = extract(self.source.as_ref(), &cfg.url, &cfg.columns())?;
        self.advance(
            stage,
            Stage::Extracted,
            "Data extraction complete. Initiating Transformation process",
        )?;

        // TRANSFORM
        let banks = transform_with_file(&records, &cfg.rates_path)?;
        self.advance(
            stage,
            Stage::Transformed,
            "Data transformation complete. Initiating loading process",
        )?;

        // LOAD
        load_to_file(&banks, &cfg.output_path)?;
        self.advance(stage, Stage::FileLoaded, "Data saved to CSV file")?;

        // Dropped on every early return below; closed explicitly on success
        let conn = Connection::open(&cfg.db_path).map_err(EtlError::Storage)?;
        self.advance(stage, Stage::ConnectionOpen, "SQL Connection initiated.")?;

        load_to_table(&banks, &conn, &cfg.table_name)?;
        self.advance(
            stage,
            Stage::TableLoaded,
            "Data loaded to Database as table. Running the queries",
        )?;

        // QUERY
        let mut reports = Vec::with_capacity(3);
        for query in cfg.report_queries() {
            reports.push(run_query_to(&query, &conn, out)?);
        }
        self.advance(stage, Stage::Queried, "Process Complete.")?;

        conn.close().map_err(|(_, e)| EtlError::Storage(e))?;
        *stage = Stage::Closed;

        Ok(RunSummary {
            banks,
            reports,
            stage: *stage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::StaticPageSource;
    use crate::load::{read_file, read_table};
    use std::path::Path;

    const PAGE: &str = r#"
        <table><tbody>
          <tr></tr>
          <tr><td>1</td><td>Bank A</td><td>100.5</td></tr>
          <tr><td>2</td><td>Bank B</td><td>50.25</td></tr>
        </tbody></table>
    "#;

    fn test_config(dir: &Path) -> EtlConfig {
        EtlConfig {
            url: "http://example.invalid/largest_banks".to_string(),
            rates_path: dir.join("exchange_rate.csv"),
            output_path: dir.join("Largest_banks_data.csv"),
            db_path: dir.join("Banks.db"),
            log_file: dir.join("code_log.txt"),
            ..EtlConfig::default()
        }
    }

    fn write_rates(path: &Path) {
        std::fs::write(path, "Currency,Rate\nGBP,0.8\nEUR,0.9\nINR,80\n").unwrap();
    }

    fn log_messages(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| l.splitn(2, " : ").nth(1).unwrap_or("").to_string())
            .collect()
    }

    #[test]
    fn test_full_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_rates(&config.rates_path);

        let pipeline = EtlPipeline::new(config.clone(), Box::new(StaticPageSource::new(PAGE)));
        let mut report = Vec::new();
        let summary = pipeline.run_with_report(&mut report).unwrap();

        assert_eq!(summary.stage, Stage::Closed);
        assert_eq!(summary.banks.len(), 2);
        assert_eq!(summary.banks[1].market_cap_eur, 45.23);

        // flat file and table agree with the in-memory result
        assert_eq!(read_file(&config.output_path).unwrap(), summary.banks);
        let conn = Connection::open(&config.db_path).unwrap();
        assert_eq!(read_table(&conn, "Largest_banks").unwrap(), summary.banks);

        // queries
        assert_eq!(summary.reports.len(), 3);
        assert_eq!(summary.reports[0].len(), 2);
        let avg = summary.reports[1].scalar_f64().unwrap();
        assert!((avg - 60.3).abs() < 1e-9);
        assert_eq!(summary.reports[2].column_text("Name"), vec!["Bank A", "Bank B"]);

        let printed = String::from_utf8(report).unwrap();
        assert!(printed.contains("SELECT * FROM Largest_banks"));
        assert!(printed.contains("SELECT Name FROM Largest_banks LIMIT 5"));

        assert_eq!(
            log_messages(&config.log_file),
            vec![
                "Preliminaries complete. Initiating ETL process",
                "Data extraction complete. Initiating Transformation process",
                "Data transformation complete. Initiating loading process",
                "Data saved to CSV file",
                "SQL Connection initiated.",
                "Data loaded to Database as table. Running the queries",
                "Process Complete.",
            ]
        );
    }

    #[test]
    fn test_rerun_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_rates(&config.rates_path);

        let pipeline = EtlPipeline::new(config.clone(), Box::new(StaticPageSource::new(PAGE)));
        pipeline.run_with_report(&mut io::sink()).unwrap();
        pipeline.run_with_report(&mut io::sink()).unwrap();

        let conn = Connection::open(&config.db_path).unwrap();
        assert_eq!(crate::load::count_rows(&conn, "Largest_banks").unwrap(), 2);
    }

    #[test]
    fn test_table_name_with_space() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        write_rates(&config.rates_path);
        config.table_name = "Largest banks".to_string();

        let pipeline = EtlPipeline::new(config.clone(), Box::new(StaticPageSource::new(PAGE)));
        let summary = pipeline.run_with_report(&mut io::sink()).unwrap();

        assert_eq!(summary.stage, Stage::Closed);
        assert_eq!(summary.reports[0].len(), 2);
        assert_eq!(summary.reports[2].column_text("Name"), vec!["Bank A", "Bank B"]);

        let conn = Connection::open(&config.db_path).unwrap();
        assert_eq!(read_table(&conn, "Largest banks").unwrap(), summary.banks);
    }

    #[test]
    fn test_missing_rate_file_stops_before_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let pipeline = EtlPipeline::new(config.clone(), Box::new(StaticPageSource::new(PAGE)));
        let err = pipeline.run_with_report(&mut io::sink()).unwrap_err();

        assert_eq!(err.kind(), "IOError");
        assert!(!config.output_path.exists());
        assert!(!config.db_path.exists());

        let messages = log_messages(&config.log_file);
        assert_eq!(messages.len(), 3);
        assert!(messages[2].starts_with("Process aborted after Extracted: IOError"));
    }

    #[test]
    fn test_storage_failure_leaves_file_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(dir.path());
        write_rates(&config.rates_path);
        config.db_path = dir.path().join("no_such_dir").join("Banks.db");

        let pipeline = EtlPipeline::new(config.clone(), Box::new(StaticPageSource::new(PAGE)));
        let err = pipeline.run_with_report(&mut io::sink()).unwrap_err();

        assert!(matches!(err, EtlError::Storage(_)));
        assert_eq!(read_file(&config.output_path).unwrap().len(), 2);
        let messages = log_messages(&config.log_file);
        assert!(messages
            .last()
            .unwrap()
            .starts_with("Process aborted after FileLoaded: StorageError"));
    }

    #[test]
    fn test_bad_page_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        write_rates(&config.rates_path);

        let source = StaticPageSource::new("<p>page moved</p>");
        let pipeline = EtlPipeline::new(config, Box::new(source));

        let err = pipeline.run_with_report(&mut io::sink()).unwrap_err();
        assert!(matches!(err, EtlError::Parse(_)));
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::ConnectionOpen.to_string(), "ConnectionOpen");
        assert_eq!(Stage::Closed.to_string(), "Closed");
    }
}
