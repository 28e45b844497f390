// 🔍 Query runner - execute a statement, print it and its result set

use crate::error::{EtlError, Result};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::fmt;
use std::io::{self, Write};

/// Column names plus rows of dynamically typed SQLite values
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row as a number, for aggregate queries
    pub fn scalar_f64(&self) -> Option<f64> {
        match self.rows.first()?.first()? {
            Value::Real(v) => Some(*v),
            Value::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Values of one column as text, in row order
    pub fn column_text(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.columns.iter().position(|c| c == column) else {
            return Vec::new();
        };
        self.rows.iter().map(|row| render_value(&row[idx])).collect()
    }
}

fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => format!("{:?}", v),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

/// Right-aligned table with a leading row-number column
impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(render_value).collect())
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                cells
                    .iter()
                    .map(|row| row[i].len())
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:>w$}", "", w = index_width)?;
        for (name, w) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>w$}", name, w = *w)?;
        }
        writeln!(f)?;

        for (i, row) in cells.iter().enumerate() {
            write!(f, "{:>w$}", i, w = index_width)?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {:>w$}", cell, w = *w)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

/// Execute `query` and collect every row
pub fn execute_query(query: &str, conn: &Connection) -> Result<ResultSet> {
    let query_err = |source: rusqlite::Error| EtlError::Query {
        query: query.to_string(),
        source,
    };

    let mut stmt = conn.prepare(query).map_err(query_err)?;
    let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
    let n = columns.len();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([]).map_err(query_err)?;
    while let Some(row) = cursor.next().map_err(query_err)? {
        let mut values = Vec::with_capacity(n);
        for i in 0..n {
            values.push(row.get::<_, Value>(i).map_err(query_err)?);
        }
        rows.push(values);
    }

    Ok(ResultSet { columns, rows })
}

/// Execute `query`, then report the statement and its results to `out`
pub fn run_query_to<W: Write>(query: &str, conn: &Connection, out: &mut W) -> Result<ResultSet> {
    let result = execute_query(query, conn)?;
    if result.is_empty() {
        tracing::debug!("no rows for `{}`", query);
    }

    let report = format!("{}\n{}", query, result);
    out.write_all(report.as_bytes())
        .map_err(|e| EtlError::io("<report>", e))?;

    Ok(result)
}

/// Execute `query` and report to stdout
pub fn run_query(query: &str, conn: &Connection) -> Result<ResultSet> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    run_query_to(query, conn, &mut handle)
}
