// src/summary/describe.rs

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::column;
use crate::error::PipelineError;
use crate::table::Table;

/// Summary statistics of one numeric column.
///
/// `count` is the number of cells that read as numbers; every other
/// statistic is `None` when it is undefined for that count.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Description {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1).
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub q50: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

/// Describe each named column; cells that are not numbers are ignored.
pub fn describe(
    table: &Table,
    columns: &BTreeSet<String>,
) -> Result<BTreeMap<String, Description>, PipelineError> {
    let mut out = BTreeMap::new();
    for name in columns {
        let mut xs: Vec<f64> = column(table, name)?.filter_map(|v| v.as_f64()).collect();
        out.insert(name.clone(), describe_values(&mut xs));
    }
    Ok(out)
}

fn describe_values(xs: &mut [f64]) -> Description {
    let n = xs.len();
    if n == 0 {
        return Description::default();
    }
    xs.sort_by(|a, b| a.total_cmp(b));

    let mean = xs.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let ss: f64 = xs.iter().map(|x| (x - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    Description {
        count: n,
        mean: Some(mean),
        std,
        min: xs.first().copied(),
        q25: Some(quantile(xs, 0.25)),
        q50: Some(quantile(xs, 0.50)),
        q75: Some(quantile(xs, 0.75)),
        max: xs.last().copied(),
    }
}

/// Columns whose populated cells all read as numbers.
/// Columns with no populated cell are left out.
pub fn numeric_columns(table: &Table) -> BTreeSet<String> {
    table
        .columns()
        .iter()
        .filter(|name| {
            let mut populated = table
                .column(name)
                .into_iter()
                .flatten()
                .filter(|v| !v.is_null())
                .peekable();
            populated.peek().is_some() && populated.all(|v| v.as_f64().is_some())
        })
        .cloned()
        .collect()
}

/// Linear interpolation between closest ranks of sorted, non-empty `xs`.
fn quantile(xs: &[f64], q: f64) -> f64 {
    let pos = (xs.len() - 1) as f64 * q;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    xs[lo] + (xs[hi] - xs[lo]) * (pos - lo as f64)
}
