// src/extract/html.rs

use scraper::{ElementRef, Html, Selector as CssSelector};
use std::borrow::Cow;
use tracing::{info, instrument, warn};

use super::{check_content_type, Extraction, IssueKind, Policy, Report};
use crate::error::{PayloadFormat, PipelineError, Stage};
use crate::fetch::RawPayload;
use crate::table::{ColumnNamer, Table, Value};

/// First `<table>` matching `css` → Table.
///
/// The header is the first row holding a `<th>` (or the first row when none
/// does); every later row of the same table is a body row. Rows of nested
/// tables and rows without cells are ignored.
#[instrument(level = "info", skip(payload), fields(url = %payload.url, bytes = payload.len()))]
pub fn extract_html(
    payload: &RawPayload,
    css: &str,
    policy: Policy,
) -> Result<Extraction, PipelineError> {
    check_content_type(payload, PayloadFormat::Html);

    let selector = CssSelector::parse(css).map_err(|e| PipelineError::InvalidSelector {
        selector: css.to_string(),
        reason: format!("{:?}", e),
    })?;
    let row_sel = CssSelector::parse("tr").expect("`tr` selector should parse");

    let text = decode(payload);
    let document = Html::parse_document(&text);

    let table = document.select(&selector).next().ok_or_else(|| {
        PipelineError::schema(Stage::Parse, format!("no element matches `{}`", css))
    })?;
    if table.value().name() != "table" {
        return Err(PipelineError::schema(
            Stage::Parse,
            format!(
                "`{}` matched a <{}>, not a <table>",
                css,
                table.value().name()
            ),
        ));
    }

    // 1) rows that belong to this table, each as its cell texts
    let rows: Vec<(Vec<String>, bool)> = table
        .select(&row_sel)
        .filter(|tr| owning_table(tr).map(|t| t.id()) == Some(table.id()))
        .map(|tr| {
            let cells: Vec<ElementRef> = tr
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "td" | "th"))
                .collect();
            let has_th = cells.iter().any(|c| c.value().name() == "th");
            (cells.iter().map(cell_text).collect::<Vec<String>>(), has_th)
        })
        .filter(|(cells, _)| !cells.is_empty())
        .collect();

    // 2) header row
    let header_at = rows.iter().position(|(_, has_th)| *has_th).unwrap_or(0);
    let Some((header_cells, _)) = rows.get(header_at) else {
        info!("table has no rows");
        return Ok(Extraction::default());
    };
    let mut namer = ColumnNamer::new();
    let columns: Vec<String> = header_cells.iter().map(|h| namer.assign(h)).collect();
    let width = columns.len();

    // rows above the header (captions, banners) are not data
    let mut report = Report::default();
    for index in 0..header_at {
        report.note(index, IssueKind::Skipped, "row above the header".to_string());
    }
    if header_at > 0 {
        info!(rows = header_at, "skipped rows above the header");
    }

    // 3) body rows, padded or truncated to the header width
    let mut body = Vec::with_capacity(rows.len().saturating_sub(header_at + 1));
    for (index, (cells, _)) in rows.into_iter().skip(header_at + 1).enumerate() {
        let n = cells.len();
        if n < width {
            policy.tolerate(
                &mut report,
                Stage::Parse,
                index,
                IssueKind::Padded,
                format!("row has {} cells, header has {}", n, width),
            )?;
        } else if n > width {
            policy.tolerate(
                &mut report,
                Stage::Parse,
                index,
                IssueKind::Truncated,
                format!("row has {} cells, header has {}", n, width),
            )?;
        }

        let mut row: Vec<Value> = cells.into_iter().take(width).map(Value::Text).collect();
        row.resize(width, Value::Null);
        body.push(row);
    }

    let table = Table::from_parts(columns, body);
    info!(rows = table.len(), columns = table.width(), %report, "extracted HTML table");
    Ok(Extraction { table, report })
}

/// Body as text. Invalid UTF-8 is replaced, with a warning naming the
/// declared content type.
fn decode(payload: &RawPayload) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(&payload.body);
    if let Cow::Owned(_) = text {
        warn!(
            url = %payload.url,
            content_type = payload.content_type.as_deref().unwrap_or("-"),
            "body is not valid UTF-8; undecodable bytes were replaced"
        );
    }
    text
}

/// Nearest `<table>` ancestor of a row.
fn owning_table<'a>(tr: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table")
}

/// Cell text with runs of whitespace collapsed and the ends trimmed.
fn cell_text(cell: &ElementRef) -> String {
    let raw: String = cell.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
