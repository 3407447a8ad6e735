// src/summary/mod.rs
//
// Read-only statistics over a finished Table, the inputs a charting front
// end would plot. Nothing here mutates or re-shapes the Table.

mod counts;
mod dates;
mod describe;
mod resample;

pub use counts::value_counts;
pub use dates::parse_date;
pub use describe::{describe, numeric_columns, Description};
pub use resample::{resample_by_period, Period};

use crate::error::{PipelineError, Stage};
use crate::table::{Table, Value};

fn column<'a>(
    table: &'a Table,
    name: &str,
) -> Result<impl Iterator<Item = &'a Value> + 'a, PipelineError> {
    table.column(name).ok_or_else(|| {
        PipelineError::schema(
            Stage::Summarize,
            format!("no column `{}` (have {})", name, table.columns().join(", ")),
        )
    })
}
