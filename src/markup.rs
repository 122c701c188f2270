//! Parser for the inline span markup carried by `markup: "pango"` items.
//!
//! Only the top level is interpreted: each top-level element becomes one
//! span styled by its own `foreground`/`background` attributes, and its
//! text content (nested elements flattened) becomes the span text. Text
//! outside elements passes through as unstyled spans.

use std::sync::LazyLock;

use regex::Regex;

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid regex")
});

/// One run of text with its own color attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkupSpan {
    /// Decoded text content.
    pub text: String,
    /// Foreground attribute as written.
    pub foreground: Option<String>,
    /// Background attribute as written.
    pub background: Option<String>,
}

impl MarkupSpan {
    /// An unstyled span.
    #[must_use]
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum TagKind {
    Open,
    Close,
    SelfClosing,
}

#[derive(Debug)]
struct Tag<'a> {
    kind: TagKind,
    body: &'a str,
    /// Bytes consumed including `<` and `>`.
    len: usize,
}

impl<'a> Tag<'a> {
    /// Parse a tag at the start of `input`, which must begin with `<`.
    fn parse(input: &'a str) -> Option<Self> {
        let end = input.find('>')?;
        let inner = &input[1..end];
        let (kind, body) = if let Some(rest) = inner.strip_prefix('/') {
            (TagKind::Close, rest)
        } else if let Some(rest) = inner.strip_suffix('/') {
            (TagKind::SelfClosing, rest)
        } else {
            (TagKind::Open, inner)
        };
        if !body.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self {
            kind,
            body,
            len: end + 1,
        })
    }

    fn attribute(&self, names: &[&str]) -> Option<String> {
        ATTRIBUTE_RE.captures_iter(self.body).find_map(|caps| {
            let key = caps.get(1)?.as_str();
            if !names.contains(&key) {
                return None;
            }
            caps.get(2)
                .or_else(|| caps.get(3))
                .map(|value| decode_entities(value.as_str()))
        })
    }
}

/// Split markup into styled spans.
///
/// Malformed input never fails: a stray `<` is kept as text and an element
/// missing its closing tag runs to the end of the input.
#[must_use]
pub fn parse(input: &str) -> Vec<MarkupSpan> {
    let mut spans = Vec::new();
    let mut pending = String::new();
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        pending.push_str(&rest[..start]);
        let at_tag = &rest[start..];
        let Some(tag) = Tag::parse(at_tag) else {
            pending.push('<');
            rest = &at_tag[1..];
            continue;
        };
        rest = &at_tag[tag.len..];

        match tag.kind {
            TagKind::Close | TagKind::SelfClosing => {}
            TagKind::Open => {
                flush_plain(&mut spans, &mut pending);
                let (content, consumed) = element_content(rest);
                rest = &rest[consumed..];
                if !content.is_empty() {
                    spans.push(MarkupSpan {
                        text: decode_entities(&content),
                        foreground: tag.attribute(&["foreground", "fgcolor", "color"]),
                        background: tag.attribute(&["background", "bgcolor"]),
                    });
                }
            }
        }
    }

    pending.push_str(rest);
    flush_plain(&mut spans, &mut pending);
    spans
}

/// Collect the raw text inside an element whose open tag was just consumed.
///
/// Returns the text and the number of bytes up to and including the
/// matching close tag.
fn element_content(input: &str) -> (String, usize) {
    let mut text = String::new();
    let mut depth = 1usize;
    let mut offset = 0;

    while let Some(start) = input[offset..].find('<') {
        let start = offset + start;
        text.push_str(&input[offset..start]);
        let Some(tag) = Tag::parse(&input[start..]) else {
            text.push('<');
            offset = start + 1;
            continue;
        };
        offset = start + tag.len;
        match tag.kind {
            TagKind::Open => depth += 1,
            TagKind::Close => {
                depth -= 1;
                if depth == 0 {
                    return (text, offset);
                }
            }
            TagKind::SelfClosing => {}
        }
    }

    text.push_str(&input[offset..]);
    (text, input.len())
}

fn flush_plain(spans: &mut Vec<MarkupSpan>, pending: &mut String) {
    if !pending.is_empty() {
        spans.push(MarkupSpan::plain(decode_entities(pending)));
        pending.clear();
    }
}

/// Decode the XML entities allowed in markup text.
///
/// Unknown entities are left untouched.
#[must_use]
pub fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let entity = &rest[amp..];
        let decoded = entity.find(';').and_then(|semi| {
            let name = &entity[1..semi];
            let ch = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => name.strip_prefix('#').and_then(|code| {
                    let value = match code.strip_prefix(['x', 'X']) {
                        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                        None => code.parse().ok()?,
                    };
                    char::from_u32(value)
                }),
            };
            ch.map(|ch| (ch, semi + 1))
        });

        match decoded {
            Some((ch, len)) => {
                out.push(ch);
                rest = &entity[len..];
            }
            None => {
                out.push('&');
                rest = &entity[1..];
            }
        }
    }

    out.push_str(rest);
    out
}
