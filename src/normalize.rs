// src/normalize.rs

use tracing::{debug, instrument};

use crate::error::{PipelineError, Stage};
use crate::extract::{Extraction, IssueKind, Policy, Report};
use crate::table::{Record, Table, Value};

/// Separator between a parent field and its nested children.
pub const NESTED_SEPARATOR: char = '.';

/// Records → Table.
///
/// With `nested_key`, each record is replaced by the object under that key
/// and its other fields are dropped. A record without it (or where it is not
/// an object) is rejected under `Strict` and skipped under `Lenient`.
/// Nested objects are flattened to `parent.child` columns; the column set is
/// the union of all keys in first-seen order.
pub fn normalize(
    records: Vec<Record>,
    nested_key: Option<&str>,
    policy: Policy,
) -> Result<Extraction, PipelineError> {
    let mut report = Report::default();
    let table = normalize_indexed(
        records.into_iter().enumerate(),
        nested_key,
        policy,
        &mut report,
    )?;
    Ok(Extraction { table, report })
}

/// Like [`normalize`], with caller-supplied source positions for diagnostics.
#[instrument(level = "debug", skip(records, report))]
pub(crate) fn normalize_indexed<I>(
    records: I,
    nested_key: Option<&str>,
    policy: Policy,
    report: &mut Report,
) -> Result<Table, PipelineError>
where
    I: IntoIterator<Item = (usize, Record)>,
{
    let mut flat = Vec::new();

    for (index, mut rec) in records {
        let rec = match nested_key {
            None => rec,
            Some(key) => match rec.remove(key) {
                Some(Value::Object(inner)) => inner,
                Some(other) => {
                    let found = kind_of(&other);
                    policy.tolerate(
                        report,
                        Stage::Normalize,
                        index,
                        IssueKind::Skipped,
                        format!("`{}` is {}, not an object", key, found),
                    )?;
                    continue;
                }
                None => {
                    policy.tolerate(
                        report,
                        Stage::Normalize,
                        index,
                        IssueKind::Skipped,
                        format!("missing nested key `{}`", key),
                    )?;
                    continue;
                }
            },
        };

        let mut out = Record::with_capacity(rec.len());
        flatten_into(&mut out, None, rec);
        flat.push(out);
    }

    let table = Table::from_records(flat);
    debug!(
        rows = table.len(),
        columns = table.width(),
        skipped = report.skipped,
        "normalized"
    );
    Ok(table)
}

fn flatten_into(out: &mut Record, prefix: Option<&str>, rec: Record) {
    for (key, value) in rec {
        let name = match prefix {
            Some(p) => format!("{}{}{}", p, NESTED_SEPARATOR, key),
            None => key,
        };
        match value {
            Value::Object(inner) if !inner.is_empty() => flatten_into(out, Some(&name), inner),
            // an empty object still names a column
            Value::Object(_) => out.insert(name, Value::Null),
            scalar => out.insert(name, scalar),
        }
    }
}

fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Int(_) | Value::Float(_) => "a number",
        Value::Text(_) => "a string",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(pairs: Vec<(&str, Value)>) -> Record {
        pairs.into_iter().collect()
    }

    fn wrapped(inner: Vec<(&str, Value)>) -> Record {
        rec(vec![
            ("_index", Value::text("complaint")),
            ("_source", Value::Object(rec(inner))),
        ])
    }

    #[test]
    fn lifts_nested_key_and_backfills() {
        let out = normalize(
            vec![
                wrapped(vec![("a", Value::Int(1)), ("b", Value::Int(2))]),
                wrapped(vec![("a", Value::Int(3))]),
            ],
            Some("_source"),
            Policy::Strict,
        )
        .unwrap();
        assert_eq!(out.table.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(out.table.rows()[0], vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(out.table.rows()[1], vec![Value::Int(3), Value::Null]);
        assert!(out.report.is_clean());
    }

    #[test]
    fn missing_nested_key_strict_aborts() {
        let err = normalize(
            vec![
                wrapped(vec![("a", Value::Int(1))]),
                rec(vec![("_index", Value::text("x"))]),
            ],
            Some("_source"),
            Policy::Strict,
        )
        .unwrap_err();
        match err {
            PipelineError::PartialRecord { stage, index, .. } => {
                assert_eq!(stage, Stage::Normalize);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_nested_key_lenient_skips_and_counts() {
        let out = normalize(
            vec![
                rec(vec![("_index", Value::text("x"))]),
                wrapped(vec![("a", Value::Int(1))]),
                rec(vec![("_source", Value::Null)]),
            ],
            Some("_source"),
            Policy::Lenient,
        )
        .unwrap();
        assert_eq!(out.table.len(), 1);
        assert_eq!(out.report.skipped, 2);
        assert_eq!(
            out.report.issues.iter().map(|i| i.index).collect::<Vec<_>>(),
            vec![0, 2]
        );
        assert!(out.report.issues[1].detail.contains("null"));
    }

    #[test]
    fn nested_objects_become_dotted_columns() {
        let out = normalize(
            vec![rec(vec![
                ("id", Value::Int(7)),
                (
                    "company",
                    Value::Object(rec(vec![
                        ("name", Value::text("Acme")),
                        ("geo", Value::Object(rec(vec![("state", Value::text("TX"))]))),
                    ])),
                ),
                ("tags", Value::Object(Record::new())),
            ])],
            None,
            Policy::Strict,
        )
        .unwrap();
        assert_eq!(
            out.table.columns(),
            &[
                "id".to_string(),
                "company.name".to_string(),
                "company.geo.state".to_string(),
                "tags".to_string()
            ]
        );
        assert_eq!(out.table.get(0, "tags"), Some(&Value::Null));
    }

    #[test]
    fn already_flat_input_is_unchanged() {
        let input = vec![
            rec(vec![("x", Value::Int(1)), ("y", Value::text("a"))]),
            rec(vec![("x", Value::Int(2)), ("y", Value::text("b"))]),
        ];
        let once = normalize(input.clone(), None, Policy::Strict).unwrap().table;
        let again = normalize(once.records().collect(), None, Policy::Strict)
            .unwrap()
            .table;
        assert_eq!(once, again);
        assert_eq!(once.records().collect::<Vec<_>>(), input);
    }

    #[test]
    fn column_order_is_deterministic() {
        let make = || {
            vec![
                rec(vec![("b", Value::Int(1))]),
                rec(vec![("a", Value::Int(2)), ("c", Value::Int(3))]),
            ]
        };
        let first = normalize(make(), None, Policy::Lenient).unwrap().table;
        let second = normalize(make(), None, Policy::Lenient).unwrap().table;
        assert_eq!(first.columns(), &["b".to_string(), "a".to_string(), "c".to_string()]);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_input_is_empty_table() {
        let out = normalize(Vec::new(), Some("_source"), Policy::Strict).unwrap();
        assert!(out.table.is_empty());
        assert_eq!(out.table.width(), 0);
    }
}
