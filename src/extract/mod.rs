// src/extract/mod.rs
//
// Payload → Table. Each extractor turns one RawPayload into Records and
// hands them to the normalizer, so every Table that leaves this module has a
// unified column set.
//
// Per-record policy, by extractor:
//   JSON  - a hit that is not an object, or lacks the nested key, is an anomaly.
//   HTML  - a body row shorter or longer than the header is an anomaly.
//           Rows above the header row are always skipped and counted.
//   XML   - none; differing child sets are expected and backfilled with null.
// Strict aborts with PartialRecord on the first anomaly. Lenient (the
// default) skips, pads or truncates and counts it in the Report.

pub mod html;
pub mod json;
pub mod xml;

pub use html::extract_html;
pub use json::extract_json;
pub use xml::extract_xml;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PayloadFormat, PipelineError, Stage};
use crate::fetch::RawPayload;
use crate::table::Table;

/// What to do with a record that does not fit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    /// Abort on the first anomalous record.
    Strict,
    /// Skip, pad or truncate and count it.
    #[default]
    Lenient,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    Skipped,
    Padded,
    Truncated,
}

/// One per-record anomaly tolerated in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordIssue {
    /// Position of the source item (hit, body row) in the payload.
    pub index: usize,
    pub kind: IssueKind,
    pub detail: String,
}

/// Counts of what lenient mode tolerated while building a Table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub skipped: usize,
    pub padded: usize,
    pub truncated: usize,
    pub issues: Vec<RecordIssue>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn note(&mut self, index: usize, kind: IssueKind, detail: String) {
        match kind {
            IssueKind::Skipped => self.skipped += 1,
            IssueKind::Padded => self.padded += 1,
            IssueKind::Truncated => self.truncated += 1,
        }
        self.issues.push(RecordIssue {
            index,
            kind,
            detail,
        });
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "skipped={} padded={} truncated={}",
            self.skipped, self.padded, self.truncated
        )
    }
}

impl Policy {
    /// Strict: turn the anomaly into an error. Lenient: record it.
    pub(crate) fn tolerate(
        self,
        report: &mut Report,
        stage: Stage,
        index: usize,
        kind: IssueKind,
        detail: String,
    ) -> Result<(), PipelineError> {
        match self {
            Policy::Strict => Err(PipelineError::PartialRecord {
                stage,
                index,
                reason: detail,
            }),
            Policy::Lenient => {
                tracing::debug!(index, ?kind, %detail, "tolerated record anomaly");
                report.note(index, kind, detail);
                Ok(())
            }
        }
    }
}

/// A Table plus what it took to build it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub table: Table,
    pub report: Report,
}

/// Names the element a markup extractor reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// CSS selector whose first match must be a `<table>`, e.g. `table.wikitable`.
    Css(String),
    /// Local name of the repeating XML element, e.g. `row`.
    Tag(String),
}

/// HTML table or repeating XML element → Table, depending on `selector`.
pub fn extract_markup(
    payload: &RawPayload,
    selector: &Selector,
    policy: Policy,
) -> Result<Extraction, PipelineError> {
    match selector {
        Selector::Css(css) => extract_html(payload, css, policy),
        Selector::Tag(tag) => extract_xml(payload, tag),
    }
}

/// A configured extractor, as named in a job file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Extractor {
    Json {
        hits_path: Vec<String>,
        #[serde(default)]
        nested_key: Option<String>,
    },
    Html {
        selector: String,
    },
    Xml {
        tag: String,
    },
}

impl Extractor {
    pub fn format(&self) -> PayloadFormat {
        match self {
            Extractor::Json { .. } => PayloadFormat::Json,
            Extractor::Html { .. } => PayloadFormat::Html,
            Extractor::Xml { .. } => PayloadFormat::Xml,
        }
    }

    pub fn extract(&self, payload: &RawPayload, policy: Policy) -> Result<Extraction, PipelineError> {
        match self {
            Extractor::Json {
                hits_path,
                nested_key,
            } => extract_json(payload, hits_path, nested_key.as_deref(), policy),
            Extractor::Html { selector } => {
                extract_markup(payload, &Selector::Css(selector.clone()), policy)
            }
            Extractor::Xml { tag } => extract_markup(payload, &Selector::Tag(tag.clone()), policy),
        }
    }
}

/// Warn when the server declared a content type other than what we parse.
fn check_content_type(payload: &RawPayload, format: PayloadFormat) {
    let needle = match format {
        PayloadFormat::Json => "json",
        PayloadFormat::Html => "html",
        PayloadFormat::Xml => "xml",
    };
    if payload.declares(needle) == Some(false) {
        tracing::warn!(
            url = %payload.url,
            content_type = payload.content_type.as_deref().unwrap_or("-"),
            expected = %format,
            "content type does not match extractor"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_is_default() {
        assert_eq!(Policy::default(), Policy::Lenient);
    }

    #[test]
    fn strict_rejects_lenient_records() {
        let mut report = Report::default();
        let err = Policy::Strict
            .tolerate(&mut report, Stage::Parse, 3, IssueKind::Padded, "short".into())
            .unwrap_err();
        assert!(matches!(err, PipelineError::PartialRecord { index: 3, .. }));
        assert!(report.is_clean());

        Policy::Lenient
            .tolerate(&mut report, Stage::Parse, 3, IssueKind::Padded, "short".into())
            .unwrap();
        assert_eq!(report.padded, 1);
        assert_eq!(report.to_string(), "skipped=0 padded=1 truncated=0");
    }

    #[test]
    fn extractor_from_yaml() {
        let ex: Extractor = serde_yaml::from_str(
            "kind: json\nhits_path: [hits, hits]\nnested_key: _source\n",
        )
        .unwrap();
        assert_eq!(
            ex,
            Extractor::Json {
                hits_path: vec!["hits".into(), "hits".into()],
                nested_key: Some("_source".into()),
            }
        );
        let ex: Extractor = serde_yaml::from_str("kind: xml\ntag: row\n").unwrap();
        assert_eq!(ex.format(), PayloadFormat::Xml);
    }

    #[test]
    fn markup_dispatches_on_selector() {
        let html = RawPayload::from_bytes(
            "mem",
            "<table class=t><tr><th>A</th></tr><tr><td>1</td></tr></table>",
        );
        let out = extract_markup(&html, &Selector::Css("table.t".into()), Policy::Strict).unwrap();
        assert_eq!(out.table.columns(), &["A".to_string()]);

        let xml = RawPayload::from_bytes("mem", "<r><row><a>1</a></row></r>");
        let out = extract_markup(&xml, &Selector::Tag("row".into()), Policy::Strict).unwrap();
        assert_eq!(out.table.columns(), &["a".to_string()]);
    }
}
