// 🌐 Extractor - first <tbody> of a web page → Vec<BankRecord>
//
// Fetching sits behind the PageSource trait; parsing is a pure function
// over the document text so it can be tested without a network.

use crate::error::{EtlError, Result};
use crate::record::{BankRecord, EXTRACT_COLUMNS};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info};

// ============================================================================
// PAGE SOURCE
// ============================================================================

/// Where the raw HTML comes from
pub trait PageSource {
    /// Fetch the document at `url` as text
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP GET via reqwest
pub struct HttpPageSource {
    client: reqwest::blocking::Client,
}

impl HttpPageSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("banks-etl/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EtlError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(HttpPageSource { client })
    }
}

impl PageSource for HttpPageSource {
    fn fetch(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| EtlError::Network(format!("GET {} failed: {}", url, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(EtlError::Network(format!("GET {} returned {}", url, status)));
        }

        resp.text()
            .map_err(|e| EtlError::Network(format!("failed to read body of {}: {}", url, e)))
    }
}

/// A fixed document, for offline runs and tests
pub struct StaticPageSource {
    html: String,
}

impl StaticPageSource {
    pub fn new(html: impl Into<String>) -> Self {
        StaticPageSource { html: html.into() }
    }
}

impl PageSource for StaticPageSource {
    fn fetch(&self, _url: &str) -> Result<String> {
        Ok(self.html.clone())
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Fetch `url` and parse its first table-body into records.
///
/// `expected_columns` names the output schema; it must match
/// [`EXTRACT_COLUMNS`] since the record layout is fixed at compile time.
pub fn extract(
    source: &dyn PageSource,
    url: &str,
    expected_columns: &[&str],
) -> Result<Vec<BankRecord>> {
    check_columns(expected_columns)?;

    let html = source.fetch(url)?;
    let records = parse_bank_table(&html)?;

    info!("Extracted {} bank records from {}", records.len(), url);
    Ok(records)
}

fn check_columns(expected_columns: &[&str]) -> Result<()> {
    if expected_columns != EXTRACT_COLUMNS {
        return Err(EtlError::Parse(format!(
            "unsupported column layout {:?}, expected {:?}",
            expected_columns, EXTRACT_COLUMNS
        )));
    }
    Ok(())
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| EtlError::Parse(format!("bad selector `{}`: {:?}", css, e)))
}

/// Parse the first `<tbody>` of `html`.
///
/// Rows without `<td>` cells (header/separator rows) are skipped. For every
/// other row, cell 1 is the name and cell 2 the USD market cap.
pub fn parse_bank_table(html: &str) -> Result<Vec<BankRecord>> {
    let document = Html::parse_document(html);
    let tbody_sel = selector("tbody")?;
    let tr_sel = selector("tr")?;
    let td_sel = selector("td")?;

    let tbody = document
        .select(&tbody_sel)
        .next()
        .ok_or_else(|| EtlError::Parse("no <tbody> found in document".to_string()))?;

    let mut records = Vec::new();

    for (row_num, row) in tbody.select(&tr_sel).enumerate() {
        let cells: Vec<ElementRef> = row.select(&td_sel).collect();
        if cells.is_empty() {
            debug!("skipping row {} (no data cells)", row_num);
            continue;
        }

        if cells.len() < 3 {
            return Err(EtlError::Parse(format!(
                "row {} has {} data cells, need at least 3",
                row_num,
                cells.len()
            )));
        }

        let name = cell_text(&cells[1]);
        let raw_cap = cell_text(&cells[2]);
        let market_cap_usd: f64 = raw_cap.parse().map_err(|_| {
            EtlError::Parse(format!(
                "row {}: market cap `{}` for `{}` is not a number",
                row_num, raw_cap, name
            ))
        })?;

        records.push(BankRecord::new(name, market_cap_usd));
    }

    Ok(records)
}

/// All descendant text of a cell, trimmed
fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}
