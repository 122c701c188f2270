//! Styling adapter: text plus optional colors to a styled span.

use std::str::FromStr;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

/// Glyph placed between rendered items.
pub const SEPARATOR: &str = "|";

/// Parse a color attribute.
///
/// Accepts `#rrggbb`, `#rgb` and anything ratatui's color parser knows
/// (`red`, `lightblue`, indexed numbers). Alpha suffixes (`#rrggbbaa`) are
/// dropped.
#[must_use]
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if !hex.is_ascii() {
            return None;
        }
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            8 => hex[..6].to_string(),
            _ => return None,
        };
        let rgb = u32::from_str_radix(&expanded, 16).ok()?;
        let [_, r, g, b] = rgb.to_be_bytes();
        return Some(Color::Rgb(r, g, b));
    }
    Color::from_str(value).ok()
}

/// Style for the given foreground and background attributes.
///
/// Attributes that fail to parse are left unset.
#[must_use]
pub fn attributes(fg: Option<&str>, bg: Option<&str>) -> Style {
    let mut style = Style::default();
    if let Some(color) = fg.and_then(parse_color) {
        style = style.fg(color);
    }
    if let Some(color) = bg.and_then(parse_color) {
        style = style.bg(color);
    }
    style
}

/// Style `text` with optional foreground and background colors.
#[must_use]
pub fn style(text: impl Into<String>, fg: Option<&str>, bg: Option<&str>) -> Span<'static> {
    Span::styled(text.into(), attributes(fg, bg))
}

/// Muted style used for separators and the filter tag.
#[must_use]
pub fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// Style for informational text (help, roster).
#[must_use]
pub fn note() -> Style {
    Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::ITALIC)
}

/// The item separator span.
#[must_use]
pub fn separator() -> Span<'static> {
    Span::styled(SEPARATOR, muted())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_colors() {
        assert_eq!(parse_color("#ff8000"), Some(Color::Rgb(255, 128, 0)));
        assert_eq!(parse_color("#F80"), Some(Color::Rgb(255, 136, 0)));
        assert_eq!(parse_color("#11223344"), Some(Color::Rgb(0x11, 0x22, 0x33)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn test_parse_named_colors() {
        assert_eq!(parse_color("red"), Some(Color::Red));
        assert_eq!(parse_color("not-a-color"), None);
    }

    #[test]
    fn test_style_without_colors_is_plain() {
        let span = style("50%", None, None);
        assert_eq!(span.content, "50%");
        assert_eq!(span.style, Style::default());
    }

    #[test]
    fn test_style_applies_both_colors() {
        let span = style("x", Some("#000000"), Some("#ffffff"));
        assert_eq!(span.style.fg, Some(Color::Rgb(0, 0, 0)));
        assert_eq!(span.style.bg, Some(Color::Rgb(255, 255, 255)));
    }

    #[test]
    fn test_invalid_color_ignored() {
        let span = style("x", Some("bogus"), Some("#00ff00"));
        assert_eq!(span.style.fg, None);
        assert_eq!(span.style.bg, Some(Color::Rgb(0, 255, 0)));
    }
}
