// src/table/mod.rs

mod names;
mod record;
mod value;

pub use names::ColumnNamer;
pub use record::Record;
pub use value::{parse_number, Value};

use std::collections::HashMap;
use std::fmt;

/// An ordered set of rows sharing one column set.
///
/// Every row has exactly `columns().len()` cells; a field a source item did
/// not carry is `Value::Null`. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Build from records: columns are the union of keys in first-seen order,
    /// missing fields are backfilled with `Null`.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut sparse: Vec<Vec<(usize, Value)>> = Vec::new();

        for rec in records {
            let mut cells = Vec::with_capacity(rec.len());
            for (name, value) in rec {
                let ix = match index.get(&name) {
                    Some(&ix) => ix,
                    None => {
                        let ix = columns.len();
                        index.insert(name.clone(), ix);
                        columns.push(name);
                        ix
                    }
                };
                cells.push((ix, value));
            }
            sparse.push(cells);
        }

        let width = columns.len();
        let rows = sparse
            .into_iter()
            .map(|cells| {
                let mut row = vec![Value::Null; width];
                for (ix, v) in cells {
                    row[ix] = v;
                }
                row
            })
            .collect();

        Self { columns, rows }
    }

    /// Build from an explicit header and rows already padded to its width.
    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        debug_assert!(rows.iter().all(|r| r.len() == columns.len()));
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All cells of one column, top to bottom.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let ix = self.column_index(name)?;
        Some(self.rows.iter().map(move |r| &r[ix]))
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let ix = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[ix])
    }

    /// Rows as records; every record carries every column.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect()
        })
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

const MAX_CELL_WIDTH: usize = 28;

fn clip(s: &str) -> String {
    if s.chars().count() <= MAX_CELL_WIDTH {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(MAX_CELL_WIDTH - 1).collect();
        out.push('…');
        out
    }
}

/// Aligned plain-text rendering, with `NaN` for nulls.
impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header: Vec<String> = self.columns.iter().map(|c| clip(c)).collect();
        let body: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|v| match v {
                        Value::Null => "NaN".to_string(),
                        other => clip(&other.to_string()),
                    })
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
        for row in &body {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        let idx_width = self.rows.len().saturating_sub(1).to_string().len();

        write!(f, "{:idx_width$}", "")?;
        for (h, w) in header.iter().zip(&widths) {
            write!(f, "  {:>w$}", h, w = *w)?;
        }
        writeln!(f)?;
        for (i, row) in body.iter().enumerate() {
            write!(f, "{:<idx_width$}", i)?;
            for (cell, w) in row.iter().zip(&widths) {
                write!(f, "  {:>w$}", cell, w = *w)?;
            }
            writeln!(f)?;
        }
        write!(f, "[{} rows x {} columns]", self.len(), self.width())
    }
}
