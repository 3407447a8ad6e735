// src/extract/json.rs

use serde_json::Value as Json;
use tracing::{info, instrument};

use super::{check_content_type, Extraction, IssueKind, Policy, Report};
use crate::error::{PayloadFormat, PipelineError, Stage};
use crate::fetch::RawPayload;
use crate::normalize::normalize_indexed;
use crate::table::Value;

/// Search-API style JSON → Table.
///
/// `hits_path` (e.g. `["hits", "hits"]`) leads through objects to an array of
/// wrapper objects; `nested_key` (e.g. `_source`) names the object inside
/// each wrapper that holds the actual record.
#[instrument(level = "info", skip(payload, hits_path), fields(url = %payload.url, bytes = payload.len()))]
pub fn extract_json<S: AsRef<str>>(
    payload: &RawPayload,
    hits_path: &[S],
    nested_key: Option<&str>,
    policy: Policy,
) -> Result<Extraction, PipelineError> {
    check_content_type(payload, PayloadFormat::Json);

    let root: Json = serde_json::from_slice(&payload.body)
        .map_err(|e| PipelineError::malformed(PayloadFormat::Json, e, &payload.body))?;

    let hits = walk(root, hits_path)?;

    let mut report = Report::default();
    let mut records = Vec::with_capacity(hits.len());
    for (index, hit) in hits.into_iter().enumerate() {
        match Value::from_json(hit) {
            Value::Object(rec) => records.push((index, rec)),
            other => {
                let found = match other {
                    Value::Null => "null",
                    Value::Bool(_) => "a boolean",
                    Value::Int(_) | Value::Float(_) => "a number",
                    _ => "a string or array",
                };
                policy.tolerate(
                    &mut report,
                    Stage::Parse,
                    index,
                    IssueKind::Skipped,
                    format!("hit is {}, not an object", found),
                )?;
            }
        }
    }

    let table = normalize_indexed(records, nested_key, policy, &mut report)?;
    info!(rows = table.len(), columns = table.width(), %report, "extracted JSON hits");
    Ok(Extraction { table, report })
}

/// Follow `path` through nested objects to the hits array.
fn walk<S: AsRef<str>>(root: Json, path: &[S]) -> Result<Vec<Json>, PipelineError> {
    let mut current = root;
    let mut walked: Vec<&str> = Vec::with_capacity(path.len());

    for seg in path {
        let seg = seg.as_ref();
        let here = display_path(&walked);
        current = match current {
            Json::Object(mut map) => map.remove(seg).ok_or_else(|| {
                PipelineError::schema(
                    Stage::Parse,
                    format!("missing key `{}` under {}", seg, here),
                )
            })?,
            other => {
                return Err(PipelineError::schema(
                    Stage::Parse,
                    format!("expected an object at {}, found {}", here, json_kind(&other)),
                ))
            }
        };
        walked.push(seg);
    }

    match current {
        Json::Array(items) => Ok(items),
        other => Err(PipelineError::schema(
            Stage::Parse,
            format!(
                "expected an array at {}, found {}",
                display_path(&walked),
                json_kind(&other)
            ),
        )),
    }
}

fn display_path(segments: &[&str]) -> String {
    if segments.is_empty() {
        "the document root".to_string()
    } else {
        format!("`{}`", segments.join("."))
    }
}

fn json_kind(v: &Json) -> &'static str {
    match v {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Value;
    use serde_json::json;

    const HITS: &[&str] = &["hits", "hits"];

    fn payload(v: serde_json::Value) -> RawPayload {
        RawPayload::from_bytes("mem://complaints", v.to_string())
    }

    #[test]
    fn source_records_become_rows() {
        let p = payload(json!({"hits": {"total": 2, "hits": [
            {"_index": "complaint", "_source": {"a": 1, "b": 2}},
            {"_index": "complaint", "_source": {"a": 3}}
        ]}}));
        let out = extract_json(&p, HITS, Some("_source"), Policy::Strict).unwrap();
        assert_eq!(out.table.columns(), &["a".to_string(), "b".to_string()]);
        assert_eq!(out.table.rows()[0], vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(out.table.rows()[1], vec![Value::Int(3), Value::Null]);
        assert!(out.report.is_clean());
    }

    #[test]
    fn top_level_array_with_empty_path() {
        let p = payload(json!([{"_source": {"a": 1, "b": 2}}, {"_source": {"a": 3}}]));
        let out = extract_json::<&str>(&p, &[], Some("_source"), Policy::Strict).unwrap();
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.table.get(1, "b"), Some(&Value::Null));
    }

    #[test]
    fn realistic_complaint_fields() {
        let p = payload(json!({"hits": {"hits": [{"_source": {
            "product": "Credit reporting",
            "company_response": "Closed with explanation",
            "date_received": "2023-04-13T12:00:00-05:00",
            "tags": null,
            "has_narrative": false,
            "zip_code": "75062"
        }}]}}));
        let out = extract_json(&p, HITS, Some("_source"), Policy::Lenient).unwrap();
        assert_eq!(out.table.width(), 6);
        assert_eq!(out.table.get(0, "tags"), Some(&Value::Null));
        assert_eq!(out.table.get(0, "has_narrative"), Some(&Value::Bool(false)));
        assert_eq!(out.table.get(0, "zip_code"), Some(&Value::text("75062")));
    }

    #[test]
    fn empty_hits_is_empty_table() {
        let p = payload(json!({"hits": {"hits": []}}));
        let out = extract_json(&p, HITS, Some("_source"), Policy::Strict).unwrap();
        assert!(out.table.is_empty());
        assert_eq!(out.table.width(), 0);
    }

    #[test]
    fn invalid_json_is_malformed() {
        let p = RawPayload::from_bytes("mem", "<html>rate limited</html>");
        let err = extract_json(&p, HITS, None, Policy::Lenient).unwrap_err();
        match &err {
            PipelineError::MalformedPayload { format, snippet, .. } => {
                assert_eq!(*format, PayloadFormat::Json);
                assert!(snippet.contains("rate limited"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.stage(), Stage::Parse);
    }

    #[test]
    fn missing_or_wrong_path_is_schema_mismatch() {
        let missing = payload(json!({"hits": {"total": 0}}));
        let err = extract_json(&missing, HITS, None, Policy::Lenient).unwrap_err();
        assert!(matches!(err, PipelineError::SchemaMismatch { stage: Stage::Parse, .. }));
        assert!(err.to_string().contains("missing key `hits` under `hits`"));

        let not_container = payload(json!({"hits": 5}));
        let err = extract_json(&not_container, HITS, None, Policy::Lenient).unwrap_err();
        assert!(err.to_string().contains("expected an object at `hits`, found a number"));

        let not_array = payload(json!({"hits": {"hits": {"a": 1}}}));
        let err = extract_json(&not_array, HITS, None, Policy::Lenient).unwrap_err();
        assert!(err.to_string().contains("expected an array at `hits.hits`"));
    }

    #[test]
    fn strict_aborts_on_first_bad_hit() {
        let p = payload(json!({"hits": {"hits": [
            {"_source": {"a": 1}},
            42,
            {"no_source": true}
        ]}}));
        let err = extract_json(&p, HITS, Some("_source"), Policy::Strict).unwrap_err();
        match err {
            PipelineError::PartialRecord { stage, index, .. } => {
                assert_eq!(stage, Stage::Parse);
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn lenient_keeps_good_hits_and_counts_the_rest() {
        crate::logging::init_test_logging();
        let p = payload(json!({"hits": {"hits": [
            {"_source": {"a": 1}},
            42,
            {"no_source": true},
            {"_source": {"a": 2}}
        ]}}));
        let out = extract_json(&p, HITS, Some("_source"), Policy::Lenient).unwrap();
        assert_eq!(out.table.len(), 2);
        assert_eq!(out.report.skipped, 2);
        let indices: Vec<usize> = out.report.issues.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn without_nested_key_wrappers_are_flattened() {
        let p = payload(json!({"hits": {"hits": [{"_id": "1", "_source": {"a": 1}}]}}));
        let out = extract_json(&p, HITS, None, Policy::Strict).unwrap();
        assert_eq!(out.table.columns(), &["_id".to_string(), "_source.a".to_string()]);
    }
}
