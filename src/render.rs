//! Batch renderer: one batch line in, one styled terminal line out.

use ratatui::text::{Line, Span};
use thiserror::Error;

use crate::item::{BarItem, Batch, DisplayMode, Roster};
use crate::markup::{self, MarkupSpan};
use crate::session::SessionState;
use crate::style;

/// A batch line that could not be decoded.
#[derive(Debug, Error)]
#[error("malformed batch line: {source}")]
pub struct ParseError {
    #[from]
    source: serde_json::Error,
}

/// Output of [`render`].
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedLine {
    /// The composed bar, or the raw line when parsing failed.
    pub line: Line<'static>,
    /// Roster of the batch; `None` when parsing failed.
    pub roster: Option<Roster>,
}

/// Decode a `[...],` line.
///
/// # Errors
/// Returns an error if the line (minus its trailing comma) is not a JSON
/// array of objects.
pub fn parse_batch(line: &str) -> Result<Batch, ParseError> {
    let array = line.strip_suffix(',').unwrap_or(line);
    Ok(serde_json::from_str(array)?)
}

/// Parse and compose a batch line under the session's mode and filter.
///
/// Never fails: malformed input comes back verbatim with no roster.
#[must_use]
pub fn render(line: &str, state: &SessionState) -> RenderedLine {
    match parse_batch(line) {
        Ok(batch) => RenderedLine {
            line: compose(&batch, state),
            roster: Some(batch.roster()),
        },
        Err(err) => {
            tracing::warn!("{}", err);
            RenderedLine {
                line: Line::raw(line.to_string()),
                roster: None,
            }
        }
    }
}

/// Compose the visible items of a batch, separated by [`style::SEPARATOR`].
#[must_use]
pub fn compose(batch: &Batch, state: &SessionState) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();

    let visible = batch
        .items()
        .iter()
        .filter(|item| state.is_visible(item.instance().as_deref()));

    for item in visible {
        let Some(item_spans) = item_spans(item, state.display_mode) else {
            continue;
        };
        if !spans.is_empty() {
            spans.push(style::separator());
        }
        spans.extend(item_spans);
    }

    Line::from(spans)
}

/// Styled spans for one item, or `None` when it has no text in this mode.
fn item_spans(item: &BarItem, mode: DisplayMode) -> Option<Vec<Span<'static>>> {
    if mode == DisplayMode::Json {
        return Some(vec![Span::raw(item.to_json())]);
    }

    let text = item.text(mode)?;
    let runs = if item.has_markup() {
        markup::parse(text)
    } else {
        vec![MarkupSpan::plain(text)]
    };

    // Span attributes win; the item's colors fill whatever a span leaves unset.
    let spans: Vec<_> = runs
        .into_iter()
        .map(|run| {
            style::style(
                run.text,
                run.foreground.as_deref().or(item.color()),
                run.background.as_deref().or(item.background()),
            )
        })
        .collect();

    Some(spans)
}
