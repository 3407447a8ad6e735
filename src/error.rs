// src/error.rs

use std::fmt;
use thiserror::Error;

/// Which step of fetch → parse → normalize → summarize produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Parse,
    Normalize,
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Fetch => "fetch",
            Stage::Parse => "parse",
            Stage::Normalize => "normalize",
            Stage::Summarize => "summarize",
        })
    }
}

/// The declared format of a payload, used in parse diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    Json,
    Html,
    Xml,
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PayloadFormat::Json => "JSON",
            PayloadFormat::Html => "HTML",
            PayloadFormat::Xml => "XML",
        })
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("fetch: could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("fetch: invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("fetch: transport error for {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// `body` is the complete response body; the message shows a snippet.
    #[error("fetch: HTTP {status} from {url}: {}", snippet(.body.as_bytes()))]
    HttpStatus {
        url: String,
        status: u16,
        body: String,
    },

    #[error("parse: malformed {format} payload: {reason} (near {snippet:?})")]
    MalformedPayload {
        format: PayloadFormat,
        reason: String,
        snippet: String,
    },

    #[error("parse: invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("{stage}: schema mismatch: {detail}")]
    SchemaMismatch { stage: Stage, detail: String },

    #[error("{stage}: record {index} rejected: {reason}")]
    PartialRecord {
        stage: Stage,
        index: usize,
        reason: String,
    },
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Client(_)
            | PipelineError::InvalidEndpoint { .. }
            | PipelineError::Transport { .. }
            | PipelineError::HttpStatus { .. } => Stage::Fetch,
            PipelineError::MalformedPayload { .. } | PipelineError::InvalidSelector { .. } => {
                Stage::Parse
            }
            PipelineError::SchemaMismatch { stage, .. }
            | PipelineError::PartialRecord { stage, .. } => *stage,
        }
    }

    pub(crate) fn schema(stage: Stage, detail: impl Into<String>) -> Self {
        PipelineError::SchemaMismatch {
            stage,
            detail: detail.into(),
        }
    }

    pub(crate) fn malformed(format: PayloadFormat, reason: impl fmt::Display, raw: &[u8]) -> Self {
        PipelineError::MalformedPayload {
            format,
            reason: reason.to_string(),
            snippet: snippet(raw),
        }
    }
}

/// Maximum number of characters of a raw body carried inside an error.
pub const SNIPPET_CHARS: usize = 200;

/// Lossy, length-bounded view of a raw body for diagnostics.
pub fn snippet(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_CHARS {
        trimmed.to_string()
    } else {
        let mut s: String = trimmed.chars().take(SNIPPET_CHARS).collect();
        s.push('…');
        s
    }
}
