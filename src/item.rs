//! Bar protocol data model: items, batches, rosters and click events.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Markup value that turns on inline span parsing.
pub const PANGO_MARKUP: &str = "pango";

/// Roster id shown for items without an instance.
pub const UNKNOWN_INSTANCE: &str = "?";

/// Which text variant of each item is displayed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DisplayMode {
    /// `full_text`.
    #[default]
    Full,
    /// `short_text`, falling back to `full_text`.
    Short,
    /// The whole item serialized as JSON.
    Json,
}

impl DisplayMode {
    /// Name used in commands and the prompt.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Short => "short",
            Self::Json => "json",
        }
    }

    /// Next mode in the full → short → json cycle.
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Full => Self::Short,
            Self::Short => Self::Json,
            Self::Json => Self::Full,
        }
    }

    /// Flip between full and short. Json counts as not-short.
    #[must_use]
    pub fn toggle_short(self) -> Self {
        match self {
            Self::Short => Self::Full,
            Self::Full | Self::Json => Self::Short,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(Self::Full),
            "short" => Ok(Self::Short),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown display mode: {other}")),
        }
    }
}

/// One entry of a batch.
///
/// The object is kept as received (key order included) so json mode can
/// show it verbatim; typed fields are read through accessors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BarItem(Map<String, Value>);

impl BarItem {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// A string field, with numbers and booleans rendered as text.
    fn scalar_field(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.0.get(key)? {
            Value::String(s) => Some(Cow::Borrowed(s)),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// Instance id, if the item carries one.
    #[must_use]
    pub fn instance(&self) -> Option<Cow<'_, str>> {
        self.scalar_field("instance")
    }

    /// Human readable item name.
    #[must_use]
    pub fn name(&self) -> Option<Cow<'_, str>> {
        self.scalar_field("name")
    }

    /// Item-level foreground color.
    #[must_use]
    pub fn color(&self) -> Option<&str> {
        self.str_field("color")
    }

    /// Item-level background color.
    #[must_use]
    pub fn background(&self) -> Option<&str> {
        self.str_field("background")
    }

    /// Whether the text embeds span markup.
    #[must_use]
    pub fn has_markup(&self) -> bool {
        self.str_field("markup") == Some(PANGO_MARKUP)
    }

    /// Text to show for a keyed mode, falling back to `full_text`.
    ///
    /// Returns `None` for json mode and when nothing non-empty resolves.
    #[must_use]
    pub fn text(&self, mode: DisplayMode) -> Option<&str> {
        let full = || self.str_field("full_text").filter(|t| !t.is_empty());
        match mode {
            DisplayMode::Full => full(),
            DisplayMode::Short => self
                .str_field("short_text")
                .filter(|t| !t.is_empty())
                .or_else(full),
            DisplayMode::Json => None,
        }
    }

    /// The item as a single line of JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        Value::Object(self.0.clone()).to_string()
    }
}

impl From<Map<String, Value>> for BarItem {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Items of one bar update, in emitted order.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    items: Vec<BarItem>,
}

impl Batch {
    /// Create a batch from items.
    #[must_use]
    pub fn new(items: Vec<BarItem>) -> Self {
        Self { items }
    }

    /// Items in order.
    #[must_use]
    pub fn items(&self) -> &[BarItem] {
        &self.items
    }

    /// Instance roster of this batch.
    #[must_use]
    pub fn roster(&self) -> Roster {
        Roster(
            self.items
                .iter()
                .map(|item| RosterEntry {
                    id: item
                        .instance()
                        .filter(|id| !id.is_empty())
                        .map_or_else(|| UNKNOWN_INSTANCE.to_string(), Cow::into_owned),
                    name: item.name().map(Cow::into_owned).unwrap_or_default(),
                })
                .collect(),
        )
    }
}

/// An `{id, name}` pair for one bar item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RosterEntry {
    /// Instance id, or [`UNKNOWN_INSTANCE`].
    pub id: String,
    /// Item name.
    pub name: String,
}

impl fmt::Display for RosterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.name)
    }
}

/// Instances seen in the latest successfully parsed batch.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Roster(Vec<RosterEntry>);

impl Roster {
    /// Entries in batch order.
    #[must_use]
    pub fn entries(&self) -> &[RosterEntry] {
        &self.0
    }

    /// Check if no items have been seen.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

/// Synthetic click sent to the bar process.
///
/// Field order is the wire order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ClickEvent {
    /// Item name; always `null` from the console.
    pub name: Option<String>,
    /// Instance id of the clicked item.
    pub instance: String,
    /// Pointer button number.
    pub button: u8,
    /// Held modifier names, e.g. `Shift`.
    pub modifiers: Vec<String>,
    /// Pointer x on the output.
    pub x: i32,
    /// Pointer y on the output.
    pub y: i32,
    /// Pointer x within the item.
    pub relative_x: i32,
    /// Pointer y within the item.
    pub relative_y: i32,
    /// Output x origin.
    pub output_x: i32,
    /// Output y origin.
    pub output_y: i32,
    /// Item width in pixels.
    pub width: i32,
    /// Item height in pixels.
    pub height: i32,
}

impl ClickEvent {
    /// Create a click with placeholder geometry.
    #[must_use]
    pub fn new(instance: impl Into<String>, button: u8, shift: bool) -> Self {
        Self {
            name: None,
            instance: instance.into(),
            button,
            modifiers: if shift {
                vec!["Shift".to_string()]
            } else {
                Vec::new()
            },
            x: 0,
            y: 0,
            relative_x: 0,
            relative_y: 0,
            output_x: 0,
            output_y: 0,
            width: 10,
            height: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: &str) -> BarItem {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_mode_cycle() {
        assert_eq!(DisplayMode::Full.cycle(), DisplayMode::Short);
        assert_eq!(DisplayMode::Short.cycle(), DisplayMode::Json);
        assert_eq!(DisplayMode::Json.cycle(), DisplayMode::Full);
    }

    #[test]
    fn test_toggle_short() {
        assert_eq!(DisplayMode::Full.toggle_short(), DisplayMode::Short);
        assert_eq!(DisplayMode::Short.toggle_short(), DisplayMode::Full);
        assert_eq!(DisplayMode::Json.toggle_short(), DisplayMode::Short);
    }

    #[test]
    fn test_short_text_falls_back_to_full() {
        let both = item(r#"{"full_text":"long","short_text":"s"}"#);
        let empty_short = item(r#"{"full_text":"long","short_text":""}"#);
        let none = item(r#"{"short_text":"s"}"#);

        assert_eq!(both.text(DisplayMode::Short), Some("s"));
        assert_eq!(both.text(DisplayMode::Full), Some("long"));
        assert_eq!(empty_short.text(DisplayMode::Short), Some("long"));
        assert_eq!(none.text(DisplayMode::Full), None);
        assert_eq!(both.text(DisplayMode::Json), None);
    }

    #[test]
    fn test_markup_detection() {
        assert!(item(r#"{"markup":"pango"}"#).has_markup());
        assert!(!item(r#"{"markup":"none"}"#).has_markup());
        assert!(!item("{}").has_markup());
    }

    #[test]
    fn test_to_json_keeps_key_order() {
        let raw = r#"{"name":"vol","instance":"0","full_text":"50%"}"#;
        assert_eq!(item(raw).to_json(), raw);
    }

    #[test]
    fn test_roster_placeholder() {
        let batch: Batch =
            serde_json::from_str(r#"[{"instance":"0","name":"vol"},{"name":"mem"},{"instance":"","name":"cpu"}]"#)
                .unwrap();
        let roster = batch.roster();
        let ids: Vec<_> = roster.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["0", "?", "?"]);
        assert_eq!(roster.to_string(), "0: vol, ?: mem, ?: cpu");
    }

    #[test]
    fn test_numeric_instance_and_name() {
        let numeric = item(r#"{"instance":7,"name":42}"#);
        assert_eq!(numeric.instance().as_deref(), Some("7"));
        assert_eq!(numeric.name().as_deref(), Some("42"));
        assert_eq!(item(r#"{"instance":null}"#).instance(), None);

        let batch: Batch = serde_json::from_str(r#"[{"instance":3,"name":"disk"}]"#).unwrap();
        assert_eq!(batch.roster().to_string(), "3: disk");
    }

    #[test]
    fn test_click_wire_format() {
        let click = ClickEvent::new("0", 3, true);
        assert_eq!(
            serde_json::to_string(&click).unwrap(),
            r#"{"name":null,"instance":"0","button":3,"modifiers":["Shift"],"x":0,"y":0,"relative_x":0,"relative_y":0,"output_x":0,"output_y":0,"width":10,"height":10}"#
        );
    }
}
