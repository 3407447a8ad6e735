// src/extract/xml.rs

use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{info, instrument};

use super::{check_content_type, Extraction, Report};
use crate::error::{PayloadFormat, PipelineError};
use crate::fetch::RawPayload;
use crate::table::{Record, Table, Value};

/// An element matching the repeating tag whose end tag has not been seen yet.
struct OpenMatch {
    /// Depth of the matched element itself (root = 1).
    depth: usize,
    /// Position of its record in document order.
    slot: usize,
    fields: Record,
    /// Direct child currently open: (tag, text so far).
    child: Option<(String, String)>,
}

impl OpenMatch {
    /// A repeated child name keeps its first position and takes the last value.
    fn close_child(&mut self) {
        if let Some((tag, text)) = self.child.take() {
            self.fields.insert(tag, Value::text_or_null(&text));
        }
    }
}

/// Every `tag` element, at any depth and in document order → one row each.
///
/// Each direct child element becomes a field (its own trimmed text, `Null`
/// when empty); a repeated child name keeps the last value. A child that is
/// itself a `tag` element is a row of its own, never a field of its parent,
/// so a wrapper `<row>` around the data rows adds one all-null row and no
/// columns. Rows with different child sets are unioned and backfilled with
/// `Null`. Attributes are ignored.
#[instrument(level = "info", skip(payload), fields(url = %payload.url, bytes = payload.len()))]
pub fn extract_xml(payload: &RawPayload, tag: &str) -> Result<Extraction, PipelineError> {
    check_content_type(payload, PayloadFormat::Xml);

    let malformed = |reason: String| PipelineError::malformed(PayloadFormat::Xml, reason, &payload.body);

    let mut reader = Reader::from_reader(payload.body.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut open: Vec<OpenMatch> = Vec::new();
    let mut slots: Vec<Option<Record>> = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            malformed(format!(
                "{} at byte {}",
                e,
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if depth == 0 && saw_root {
                    return Err(malformed("more than one root element".into()));
                }
                depth += 1;
                saw_root = true;
                if name == tag {
                    open.push(OpenMatch {
                        depth,
                        slot: slots.len(),
                        fields: Record::new(),
                        child: None,
                    });
                    slots.push(None);
                } else {
                    for m in open.iter_mut().filter(|m| m.depth + 1 == depth) {
                        m.child = Some((name.clone(), String::new()));
                    }
                }
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if depth == 0 && saw_root {
                    return Err(malformed("more than one root element".into()));
                }
                saw_root = true;
                if name == tag {
                    slots.push(Some(Record::new()));
                } else {
                    for m in open.iter_mut().filter(|m| m.depth == depth) {
                        m.child = Some((name.clone(), String::new()));
                        m.close_child();
                    }
                }
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| malformed(format!("bad text content: {}", err)))?;
                append_text(&mut open, depth, &text);
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                append_text(&mut open, depth, &text);
            }
            Event::End(_) => {
                if depth == 0 {
                    return Err(malformed("end tag without a start tag".into()));
                }
                for m in open.iter_mut().filter(|m| m.depth + 1 == depth) {
                    m.close_child();
                }
                if open.last().map(|m| m.depth) == Some(depth) {
                    if let Some(done) = open.pop() {
                        slots[done.slot] = Some(done.fields);
                    }
                }
                depth -= 1;
            }
            Event::Eof => break,
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(malformed("document has no root element".into()));
    }
    if depth != 0 {
        return Err(malformed(format!(
            "document ended with {} unclosed element(s)",
            depth
        )));
    }

    let table = Table::from_records(slots.into_iter().flatten());
    info!(rows = table.len(), columns = table.width(), tag, "extracted XML rows");
    Ok(Extraction {
        table,
        report: Report::default(),
    })
}

/// Text directly inside an open match's current child.
fn append_text(open: &mut [OpenMatch], depth: usize, text: &str) {
    for m in open.iter_mut().filter(|m| m.depth + 1 == depth) {
        if let Some((_, buf)) = m.child.as_mut() {
            buf.push_str(text);
        }
    }
}
