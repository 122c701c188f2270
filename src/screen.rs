//! Screen compositor: the three-line live region at the bottom of the terminal.
//!
//! Row 0 holds the latest bar line, row 1 the instance roster (both
//! right-aligned), row 2 the command prompt. Anything printed with
//! [`Screen::print_above`] scrolls up out of the region.

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Constraint, Layout, Rect},
    text::{Line, Span, Text},
    widgets::{Paragraph, Widget},
    Terminal,
};

use crate::error::{Error, Result};
use crate::item::Roster;
use crate::session::SessionState;
use crate::style;

/// Height of the live region in rows.
pub const LIVE_REGION_HEIGHT: u16 = 3;

/// The prompt row: `<mode|paused>(<filter>)> <input>`.
#[must_use]
pub fn prompt_line(state: &SessionState) -> Line<'static> {
    let label = if state.paused {
        "paused"
    } else {
        state.display_mode.as_str()
    };

    let mut spans = vec![Span::raw(label)];
    if !state.filter().is_empty() {
        spans.push(Span::styled(
            format!("({})", state.filter().join(",")),
            style::muted(),
        ));
    }
    spans.push(Span::raw("> "));
    spans.push(Span::raw(state.input.clone()));
    Line::from(spans)
}

/// The roster row: `id: name` pairs joined by commas.
#[must_use]
pub fn roster_line(roster: &Roster) -> Line<'static> {
    Line::styled(roster.to_string(), style::note())
}

/// Widget drawing the three live rows.
pub struct LiveRegion<'a> {
    bar: &'a Line<'static>,
    roster: &'a Roster,
    state: &'a SessionState,
}

impl<'a> LiveRegion<'a> {
    /// Create the widget from the current bar line, roster and session.
    #[must_use]
    pub fn new(bar: &'a Line<'static>, roster: &'a Roster, state: &'a SessionState) -> Self {
        Self { bar, roster, state }
    }

    fn rows(area: Rect) -> [Rect; 3] {
        Layout::vertical([Constraint::Length(1); 3]).areas(area)
    }

    /// Where the cursor sits: just after the typed input.
    #[must_use]
    pub fn cursor(&self, area: Rect) -> (u16, u16) {
        let [_, _, prompt] = Self::rows(area);
        let width = u16::try_from(prompt_line(self.state).width()).unwrap_or(u16::MAX);
        let x = prompt
            .x
            .saturating_add(width)
            .min(prompt.right().saturating_sub(1));
        (x, prompt.y)
    }
}

impl Widget for LiveRegion<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [bar, roster, prompt] = Self::rows(area);

        Paragraph::new(self.bar.clone())
            .alignment(Alignment::Right)
            .render(bar, buf);
        Paragraph::new(roster_line(self.roster))
            .alignment(Alignment::Right)
            .render(roster, buf);
        Paragraph::new(prompt_line(self.state)).render(prompt, buf);
    }
}

/// Owns the terminal and the bar line currently on screen.
pub struct Screen<B: Backend> {
    terminal: Terminal<B>,
    bar: Line<'static>,
}

impl<B: Backend> Screen<B> {
    /// Wrap a terminal. An inline viewport of [`LIVE_REGION_HEIGHT`] rows is
    /// expected for real terminals.
    #[must_use]
    pub fn new(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            bar: Line::default(),
        }
    }

    /// Replace the bar row, unless output is paused.
    pub fn update_bar(&mut self, line: Line<'static>, state: &SessionState) {
        if !state.paused {
            self.bar = line;
        }
    }

    /// The bar row as last accepted.
    #[must_use]
    pub fn bar(&self) -> &Line<'static> {
        &self.bar
    }

    /// Print lines above the live region. Lines are not wrapped.
    ///
    /// # Errors
    /// Returns an error if writing to the terminal fails.
    pub fn print_above(&mut self, lines: Vec<Line<'static>>) -> Result<()> {
        if lines.is_empty() {
            return Ok(());
        }
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX);
        self.terminal
            .insert_before(height, |buf| {
                Paragraph::new(Text::from(lines)).render(buf.area, buf);
            })
            .map_err(Error::Terminal)
    }

    /// Repaint the live region.
    ///
    /// # Errors
    /// Returns an error if drawing fails.
    pub fn draw(&mut self, state: &SessionState, roster: &Roster) -> Result<()> {
        let bar = &self.bar;
        self.terminal
            .draw(|frame| {
                let area = frame.area();
                let region = LiveRegion::new(bar, roster, state);
                let cursor = region.cursor(area);
                frame.render_widget(region, area);
                frame.set_cursor_position(cursor);
            })
            .map(|_| ())
            .map_err(Error::Terminal)
    }

    /// The underlying terminal.
    #[must_use]
    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> std::fmt::Debug for Screen<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("bar", &self.bar)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::item::{Batch, DisplayMode};

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol())
            .collect::<String>()
    }

    fn screen(width: u16) -> Screen<TestBackend> {
        Screen::new(Terminal::new(TestBackend::new(width, LIVE_REGION_HEIGHT)).unwrap())
    }

    fn roster() -> Roster {
        serde_json::from_str::<Batch>(r#"[{"instance":"0","name":"vol"},{"name":"mem"}]"#)
            .unwrap()
            .roster()
    }

    #[test]
    fn test_prompt_line() {
        let mut state = SessionState::new();
        state.input = "c 0".to_string();
        assert_eq!(prompt_line(&state).to_string(), "full> c 0");

        state.display_mode = DisplayMode::Json;
        state.set_filter(vec!["1".into(), "2".into()]);
        assert_eq!(prompt_line(&state).to_string(), "json(1,2)> c 0");

        state.paused = true;
        assert_eq!(prompt_line(&state).to_string(), "paused(1,2)> c 0");
    }

    #[test]
    fn test_draw_layout() {
        let mut screen = screen(20);
        let mut state = SessionState::new();
        state.input = "p".to_string();

        screen.update_bar(Line::raw("50%|3G"), &state);
        screen.draw(&state, &roster()).unwrap();

        let buf = screen.terminal().backend().buffer();
        assert_eq!(row_text(buf, 0), "              50%|3G");
        assert_eq!(row_text(buf, 1), "      0: vol, ?: mem");
        assert_eq!(row_text(buf, 2), "full> p             ");
    }

    #[test]
    fn test_cursor_after_input() {
        let mut screen = screen(20);
        let mut state = SessionState::new();
        state.input = "ab".to_string();
        screen.draw(&state, &Roster::default()).unwrap();

        let pos = screen.terminal.get_cursor_position().unwrap();
        assert_eq!((pos.x, pos.y), (8, 2));
    }

    #[test]
    fn test_paused_keeps_previous_bar() {
        let mut screen = screen(10);
        let mut state = SessionState::new();
        screen.update_bar(Line::raw("old"), &state);

        state.paused = true;
        screen.update_bar(Line::raw("new"), &state);
        assert_eq!(screen.bar(), &Line::raw("old"));

        screen.draw(&state, &Roster::default()).unwrap();
        let buf = screen.terminal().backend().buffer();
        assert_eq!(row_text(buf, 0), "       old");
        assert_eq!(row_text(buf, 2), "paused>   ");
    }
}
