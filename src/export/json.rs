// src/export/json.rs

use anyhow::Result;
use std::io::{BufWriter, Write};

use crate::table::Table;

/// One JSON object per line, keys in column order, nulls kept.
pub fn write_json_lines<W: Write>(table: &Table, out: W) -> Result<()> {
    let mut w = BufWriter::new(out);
    for rec in table.records() {
        serde_json::to_writer(&mut w, &rec)?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(())
}
