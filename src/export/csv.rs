// src/export/csv.rs

use anyhow::Result;
use csv::WriterBuilder;
use std::io::Write;

use crate::table::Table;

/// Header row, then one line per row; nulls are empty fields.
pub fn write_csv<W: Write>(table: &Table, out: W) -> Result<()> {
    let mut wtr = WriterBuilder::new().from_writer(out);
    if table.width() > 0 {
        wtr.write_record(table.columns())?;
        for row in table.rows() {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
    }
    wtr.flush()?;
    Ok(())
}
