// src/export/parquet.rs

use anyhow::{anyhow, Context, Result};
use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::io::Write;
use std::sync::Arc;
use tracing::debug;

use crate::table::{Table, Value};

/// Pick an Arrow type for one column from its non-null cells:
///  - all Int             → Int64
///  - all Int/Float       → Float64
///  - all Bool            → Boolean
///  - anything else, or no samples → Utf8
pub fn infer_arrow_type<'a, I>(cells: I) -> DataType
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut seen: Option<DataType> = None;
    for v in cells {
        let ty = match v {
            Value::Null => continue,
            Value::Int(_) => DataType::Int64,
            Value::Float(_) => DataType::Float64,
            Value::Bool(_) => DataType::Boolean,
            Value::Text(_) | Value::Object(_) => return DataType::Utf8,
        };
        seen = Some(match (seen, ty) {
            (None, t) => t,
            (Some(a), b) if a == b => a,
            (Some(DataType::Int64), DataType::Float64)
            | (Some(DataType::Float64), DataType::Int64) => DataType::Float64,
            _ => return DataType::Utf8,
        });
    }
    seen.unwrap_or(DataType::Utf8)
}

fn build_column(table: &Table, ix: usize, ty: &DataType) -> ArrayRef {
    let cells = table.rows().iter().map(|r| &r[ix]);
    match ty {
        DataType::Int64 => Arc::new(Int64Array::from(
            cells
                .map(|v| match v {
                    Value::Int(i) => Some(*i),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        DataType::Float64 => Arc::new(Float64Array::from(
            cells.map(|v| v.as_f64()).collect::<Vec<_>>(),
        )),
        DataType::Boolean => Arc::new(BooleanArray::from(
            cells
                .map(|v| match v {
                    Value::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<Vec<_>>(),
        )),
        _ => Arc::new(StringArray::from(
            cells
                .map(|v| (!v.is_null()).then(|| v.to_string()))
                .collect::<Vec<_>>(),
        )),
    }
}

/// Arrow schema plus one batch holding the whole table.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    if table.width() == 0 {
        return Err(anyhow!("table has no columns"));
    }

    let mut fields = Vec::with_capacity(table.width());
    let mut arrays = Vec::with_capacity(table.width());
    for (ix, name) in table.columns().iter().enumerate() {
        let ty = infer_arrow_type(table.rows().iter().map(|r| &r[ix]));
        debug!(column = %name, ?ty, "inferred arrow type");
        arrays.push(build_column(table, ix, &ty));
        fields.push(Field::new(name, ty, /* nullable = */ true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building record batch")
}

/// Snappy-compressed Parquet, one row group.
pub fn write_parquet<W: Write + Send>(table: &Table, out: W) -> Result<()> {
    let batch = to_record_batch(table)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(out, batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;
    Ok(())
}
