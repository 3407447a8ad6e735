// src/fetch/payload.rs

/// The body of one fetch, held until a single extractor consumes it.
#[derive(Debug, Clone)]
pub struct RawPayload {
    /// Final URL after redirects, or a label for in-memory payloads.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawPayload {
    /// Wrap bytes that did not come from the network (files, fixtures).
    pub fn from_bytes(label: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: label.into(),
            status: 200,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Whether the declared content type mentions `needle` (case-insensitive).
    /// `None` when the server declared nothing.
    pub fn declares(&self, needle: &str) -> Option<bool> {
        self.content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains(needle))
    }
}
