//! Session state owned by the console loop.

use crate::item::DisplayMode;

/// Committed commands with a recall cursor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
    /// Recall position; `entries.len()` means "past the end".
    cursor: usize,
}

impl History {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dispatched command.
    ///
    /// Repeats of the most recent entry are dropped and leave the cursor
    /// where it was.
    pub fn record(&mut self, command: &str) {
        if self.last() == Some(command) {
            return;
        }
        self.entries.push(command.to_string());
        self.cursor = self.entries.len();
    }

    /// Most recent entry.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    /// Step toward the oldest entry and return it.
    ///
    /// Returns `None` only when the history is empty.
    pub fn recall_previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.cursor = self.cursor.saturating_sub(1);
        self.entries.get(self.cursor).map(String::as_str)
    }

    /// Step toward the end and return the entry there.
    ///
    /// Returns `Some("")` past the last entry and `None` when empty.
    pub fn recall_next(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        self.cursor = (self.cursor + 1).min(self.entries.len());
        Some(self.entries.get(self.cursor).map_or("", String::as_str))
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Current recall position.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// Everything the user can change interactively.
///
/// Only the command interpreter mutates this; the renderer and compositor
/// read it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Which text variant is displayed.
    pub display_mode: DisplayMode,
    /// Instance ids to show; empty shows everything.
    filter: Vec<String>,
    /// When set, batches are parsed but the bar line is not repainted.
    pub paused: bool,
    /// Uncommitted command text.
    pub input: String,
    /// Committed commands.
    pub history: History,
}

impl SessionState {
    /// Create a fresh session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Active filter ids in the order given.
    #[must_use]
    pub fn filter(&self) -> &[String] {
        &self.filter
    }

    /// Replace the filter. Duplicates and empty ids are dropped.
    pub fn set_filter(&mut self, ids: Vec<String>) {
        self.filter.clear();
        for id in ids {
            if !id.is_empty() && !self.filter.contains(&id) {
                self.filter.push(id);
            }
        }
    }

    /// Whether an item with this instance passes the filter.
    #[must_use]
    pub fn is_visible(&self, instance: Option<&str>) -> bool {
        self.filter.is_empty()
            || instance.is_some_and(|id| self.filter.iter().any(|f| f == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(entries: &[&str]) -> History {
        let mut history = History::new();
        for entry in entries {
            history.record(entry);
        }
        history
    }

    #[test]
    fn test_consecutive_duplicates_suppressed() {
        let h = history(&["f 1,2", "f 1,2", "p"]);
        assert_eq!(h.entries(), ["f 1,2", "p"]);

        let h = history(&["p", "d", "p"]);
        assert_eq!(h.entries(), ["p", "d", "p"]);
    }

    #[test]
    fn test_record_moves_cursor_past_end() {
        let mut h = history(&["a", "b"]);
        h.recall_previous();
        h.record("c");
        assert_eq!(h.cursor(), 3);
    }

    #[test]
    fn test_recall_previous() {
        let mut h = history(&["a", "b", "c"]);
        assert_eq!(h.recall_previous(), Some("c"));
        assert_eq!(h.recall_previous(), Some("b"));
        assert_eq!(h.recall_previous(), Some("a"));
        assert_eq!(h.recall_previous(), Some("a"));
        assert_eq!(h.cursor(), 0);
    }

    #[test]
    fn test_recall_next() {
        let mut h = history(&["a", "b"]);
        h.recall_previous();
        h.recall_previous();
        assert_eq!(h.recall_next(), Some("b"));
        assert_eq!(h.recall_next(), Some(""));
        assert_eq!(h.recall_next(), Some(""));
        assert_eq!(h.cursor(), 2);
    }

    #[test]
    fn test_recall_on_empty_history() {
        let mut h = History::new();
        assert_eq!(h.recall_previous(), None);
        assert_eq!(h.recall_next(), None);
    }

    #[test]
    fn test_filter_visibility() {
        let mut state = SessionState::new();
        assert!(state.is_visible(None));
        assert!(state.is_visible(Some("9")));

        state.set_filter(vec!["1".into(), "3".into(), "1".into(), String::new()]);
        assert_eq!(state.filter(), ["1", "3"]);
        assert!(state.is_visible(Some("3")));
        assert!(!state.is_visible(Some("2")));
        assert!(!state.is_visible(None));
    }
}
