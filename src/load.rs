// 💾 Loaders - converted records → CSV file and SQLite table

use crate::error::{EtlError, Result};
use crate::record::{ConvertedBank, OUTPUT_COLUMNS};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;

// ============================================================================
// FLAT FILE
// ============================================================================

/// One CSV line: row position followed by the record columns.
/// The index header is empty, so the file starts with `,Name,...`.
#[derive(Debug, Serialize, Deserialize)]
struct IndexedRow {
    #[serde(rename = "")]
    index: usize,

    #[serde(rename = "Name")]
    name: String,

    #[serde(rename = "MC_USD_Billion")]
    market_cap_usd: f64,

    #[serde(rename = "MC_GBP_Billion")]
    market_cap_gbp: f64,

    #[serde(rename = "MC_EUR_Billion")]
    market_cap_eur: f64,

    #[serde(rename = "MC_INR_Billion")]
    market_cap_inr: f64,
}

impl IndexedRow {
    fn new(index: usize, bank: &ConvertedBank) -> Self {
        IndexedRow {
            index,
            name: bank.name.clone(),
            market_cap_usd: bank.market_cap_usd,
            market_cap_gbp: bank.market_cap_gbp,
            market_cap_eur: bank.market_cap_eur,
            market_cap_inr: bank.market_cap_inr,
        }
    }

    fn into_bank(self) -> ConvertedBank {
        ConvertedBank {
            name: self.name,
            market_cap_usd: self.market_cap_usd,
            market_cap_gbp: self.market_cap_gbp,
            market_cap_eur: self.market_cap_eur,
            market_cap_inr: self.market_cap_inr,
        }
    }
}

fn csv_io_error(path: &Path, err: csv::Error) -> EtlError {
    match err.into_kind() {
        csv::ErrorKind::Io(e) => EtlError::io(path, e),
        kind => EtlError::io(path, io::Error::new(io::ErrorKind::Other, format!("{:?}", kind))),
    }
}

/// Write all records to `output_path`, replacing any existing file.
pub fn load_to_file(records: &[ConvertedBank], output_path: &Path) -> Result<()> {
    let file = File::create(output_path).map_err(|e| EtlError::io(output_path, e))?;
    let mut wtr = csv::Writer::from_writer(file);

    for (index, bank) in records.iter().enumerate() {
        wtr.serialize(IndexedRow::new(index, bank))
            .map_err(|e| csv_io_error(output_path, e))?;
    }

    // an empty run still gets a header line
    if records.is_empty() {
        let mut header = vec![""];
        header.extend(OUTPUT_COLUMNS);
        wtr.write_record(&header)
            .map_err(|e| csv_io_error(output_path, e))?;
    }

    wtr.flush().map_err(|e| EtlError::io(output_path, e))?;
    tracing::debug!("Wrote {} rows to {}", records.len(), output_path.display());
    Ok(())
}

/// Read a file written by [`load_to_file`], dropping the index column
pub fn read_file(path: &Path) -> Result<Vec<ConvertedBank>> {
    let file = File::open(path).map_err(|e| EtlError::io(path, e))?;
    let mut rdr = csv::Reader::from_reader(file);

    let mut banks = Vec::new();
    for (line_num, result) in rdr.deserialize::<IndexedRow>().enumerate() {
        let row = result.map_err(|e| {
            EtlError::Parse(format!("{} line {}: {}", path.display(), line_num + 2, e))
        })?;
        banks.push(row.into_bank());
    }

    Ok(banks)
}

// ============================================================================
// SQLITE TABLE
// ============================================================================

/// Quote a table name as an SQL identifier
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn is_bare_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Table name as written in hand-built SQL: plain names stay bare,
/// anything else is quoted
pub fn table_ref(name: &str) -> String {
    if is_bare_identifier(name) {
        name.to_string()
    } else {
        quote_identifier(name)
    }
}

fn create_table_sql(table: &str) -> String {
    let columns: Vec<String> = OUTPUT_COLUMNS
        .iter()
        .enumerate()
        .map(|(i, col)| {
            let sql_type = if i == 0 { "TEXT" } else { "REAL" };
            format!("{} {}", col, sql_type)
        })
        .collect();

    format!("CREATE TABLE {} ({})", table, columns.join(", "))
}

/// Replace `table_name` with exactly `records`, in order.
///
/// Drop, create and insert share one transaction: if any step fails the
/// previous table is left as it was.
pub fn load_to_table(records: &[ConvertedBank], conn: &Connection, table_name: &str) -> Result<usize> {
    let table = quote_identifier(table_name);
    let tx = conn.unchecked_transaction()?;

    tx.execute(&format!("DROP TABLE IF EXISTS {}", table), [])?;
    tx.execute(&create_table_sql(&table), [])?;

    let mut inserted = 0;
    {
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {} ({}) VALUES (?1, ?2, ?3, ?4, ?5)",
            table,
            OUTPUT_COLUMNS.join(", ")
        ))?;

        for bank in records {
            stmt.execute(params![
                bank.name,
                bank.market_cap_usd,
                bank.market_cap_gbp,
                bank.market_cap_eur,
                bank.market_cap_inr,
            ])?;
            inserted += 1;
        }
    }

    tx.commit()?;
    tracing::debug!("Inserted {} rows into {}", inserted, table_name);
    Ok(inserted)
}

pub fn count_rows(conn: &Connection, table_name: &str) -> Result<i64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_identifier(table_name)),
        [],
        |row| row.get(0),
    )?;

    Ok(count)
}

/// All rows of `table_name` in rowid order
pub fn read_table(conn: &Connection, table_name: &str) -> Result<Vec<ConvertedBank>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} ORDER BY rowid",
        OUTPUT_COLUMNS.join(", "),
        quote_identifier(table_name)
    ))?;

    let banks = stmt
        .query_map([], |row| {
            Ok(ConvertedBank {
                name: row.get(0)?,
                market_cap_usd: row.get(1)?,
                market_cap_gbp: row.get(2)?,
                market_cap_eur: row.get(3)?,
                market_cap_inr: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(banks)
}
