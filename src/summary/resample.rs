// src/summary/resample.rs

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use super::{column, dates::parse_date};
use crate::error::PipelineError;
use crate::table::{Table, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    /// Monday-based weeks.
    Week,
    Month,
}

impl Period {
    /// First day of the period containing `d`.
    pub fn start_of(self, d: NaiveDate) -> NaiveDate {
        match self {
            Period::Day => d,
            Period::Week => d - Days::new(u64::from(d.weekday().num_days_from_monday())),
            Period::Month => d.with_day(1).unwrap_or(d),
        }
    }

    fn next(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            Period::Day => start.checked_add_days(Days::new(1)),
            Period::Week => start.checked_add_days(Days::new(7)),
            Period::Month => start.checked_add_months(Months::new(1)),
        }
    }
}

/// Row counts per period of `date_column`, oldest first.
///
/// Every period between the first and last populated one is present, with a
/// zero count when empty. Null and unparseable cells are left out.
pub fn resample_by_period(
    table: &Table,
    date_column: &str,
    period: Period,
) -> Result<Vec<(NaiveDate, usize)>, PipelineError> {
    let mut buckets: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    let mut unparsed = 0usize;

    for v in column(table, date_column)? {
        let date = match v {
            Value::Null => continue,
            Value::Text(s) => parse_date(s),
            _ => None,
        };
        match date {
            Some(d) => *buckets.entry(period.start_of(d)).or_insert(0) += 1,
            None => unparsed += 1,
        }
    }

    if unparsed > 0 {
        warn!(column = date_column, unparsed, "skipped cells that are not dates");
    }

    let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    let mut cursor = Some(first);
    while let Some(start) = cursor.filter(|s| *s <= last) {
        out.push((start, buckets.get(&start).copied().unwrap_or(0)));
        cursor = period.next(start);
    }
    Ok(out)
}
