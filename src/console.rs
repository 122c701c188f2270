//! The console event loop.
//!
//! Bar output and keystrokes are produced on separate tasks and funneled
//! into one channel; [`Console::run`] is the only consumer, so session
//! state is never touched from two places at once.

use crossterm::event::{Event, KeyEvent};
use ratatui::backend::Backend;
use ratatui::text::Line;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::command::{self, Key, Outcome, HELP};
use crate::config::ConsoleConfig;
use crate::error::{Error, Result};
use crate::item::Roster;
use crate::protocol::{Bridge, BridgeEvent, InboundLine, LineWriter};
use crate::render;
use crate::screen::Screen;
use crate::session::SessionState;
use crate::style;

/// Everything the console reacts to.
#[derive(Clone, Debug)]
pub enum ConsoleEvent {
    /// Something from the bar process.
    Bridge(BridgeEvent),
    /// A key press.
    Key(KeyEvent),
    /// The terminal was resized.
    Resize,
}

impl From<BridgeEvent> for ConsoleEvent {
    fn from(event: BridgeEvent) -> Self {
        Self::Bridge(event)
    }
}

/// Whether the loop keeps going after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Session state, roster and screen, driven one event at a time.
pub struct Console<B: Backend> {
    state: SessionState,
    roster: Roster,
    screen: Screen<B>,
    writer: LineWriter,
}

impl<B: Backend> Console<B> {
    /// Create a console drawing to `screen` and writing to `writer`.
    #[must_use]
    pub fn new(screen: Screen<B>, writer: LineWriter) -> Self {
        Self {
            state: SessionState::new(),
            roster: Roster::default(),
            screen,
            writer,
        }
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Roster of the last good batch.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The compositor.
    #[must_use]
    pub fn screen(&self) -> &Screen<B> {
        &self.screen
    }

    /// Consume events until the user quits or every producer is gone.
    ///
    /// # Errors
    /// Returns an error on terminal failures or when the bar process stops
    /// accepting input.
    pub async fn run(&mut self, mut events: mpsc::Receiver<ConsoleEvent>) -> Result<()> {
        self.screen.draw(&self.state, &self.roster)?;
        while let Some(event) = events.recv().await {
            if self.handle(event).await? == Flow::Exit {
                tracing::info!("console exiting");
                return Ok(());
            }
        }
        tracing::debug!("all event producers closed");
        Ok(())
    }

    /// Handle one event and repaint.
    ///
    /// # Errors
    /// Returns an error on terminal failures or failed writes to the bar
    /// process.
    pub async fn handle(&mut self, event: ConsoleEvent) -> Result<Flow> {
        match event {
            ConsoleEvent::Bridge(BridgeEvent::Line(line)) => self.on_line(line)?,
            ConsoleEvent::Bridge(BridgeEvent::Exited { code }) => {
                tracing::warn!("bar process exited: {:?}", code);
                let notice = match code {
                    Some(code) => format!("bar process exited with code {code}"),
                    None => "bar process was killed".to_string(),
                };
                self.screen
                    .print_above(vec![Line::styled(notice, style::note())])?;
            }
            ConsoleEvent::Bridge(BridgeEvent::WriteFailed(err)) => {
                return Err(Error::ChildWrite(err));
            }
            ConsoleEvent::Key(event) => {
                if let Some(key) = Key::from_event(event) {
                    if self.on_key(key).await? == Flow::Exit {
                        return Ok(Flow::Exit);
                    }
                }
            }
            ConsoleEvent::Resize => {}
        }

        self.screen.draw(&self.state, &self.roster)?;
        Ok(Flow::Continue)
    }

    fn on_line(&mut self, line: InboundLine) -> Result<()> {
        match line {
            InboundLine::Batch(text) => {
                let rendered = render::render(&text, &self.state);
                if let Some(roster) = rendered.roster {
                    self.roster = roster;
                }
                self.screen.update_bar(rendered.line, &self.state);
            }
            InboundLine::Passthrough(text) => {
                if !self.state.paused && !text.is_empty() {
                    self.screen.print_above(vec![Line::raw(text)])?;
                }
            }
        }
        Ok(())
    }

    async fn on_key(&mut self, key: Key) -> Result<Flow> {
        match command::handle_key(&mut self.state, key) {
            Outcome::Redraw => {}
            Outcome::Help => self.screen.print_above(help_lines())?,
            Outcome::List => self.screen.print_above(roster_lines(&self.roster))?,
            Outcome::Click(click) => {
                tracing::debug!("sending click {:?}", click);
                self.writer.write_line(&click).await?;
            }
            Outcome::Exit => return Ok(Flow::Exit),
        }
        Ok(Flow::Continue)
    }
}

impl<B: Backend> std::fmt::Debug for Console<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("state", &self.state)
            .field("roster", &self.roster)
            .finish_non_exhaustive()
    }
}

/// Usage text as terminal lines.
#[must_use]
pub fn help_lines() -> Vec<Line<'static>> {
    std::iter::once(Line::default())
        .chain(HELP.lines().map(|l| Line::styled(l, style::note())))
        .collect()
}

/// `id: name` per roster entry, framed by blank lines.
#[must_use]
pub fn roster_lines(roster: &Roster) -> Vec<Line<'static>> {
    std::iter::once(Line::default())
        .chain(
            roster
                .entries()
                .iter()
                .map(|entry| Line::styled(entry.to_string(), style::note())),
        )
        .chain(std::iter::once(Line::default()))
        .collect()
}

/// Launch the bar process and drive the console on `terminal` until quit.
///
/// The terminal is expected to be in raw mode already.
///
/// # Errors
/// Returns an error if the bar process cannot be started, stops accepting
/// input, or the terminal fails.
pub async fn run<B: Backend>(config: &ConsoleConfig, terminal: Terminal<B>) -> Result<()> {
    let (event_tx, event_rx) = mpsc::channel(config.event_capacity);
    let bridge = Bridge::start(&config.program, config.event_capacity, event_tx.clone())?;
    let _key_reader = spawn_key_reader(event_tx);

    let mut console = Console::new(Screen::new(terminal), bridge.writer());
    let result = console.run(event_rx).await;
    // The receiver is gone by now, so the monitor's exit report is dropped.
    let closed = bridge.close().await;
    result.and(closed)
}

/// Spawns the task that forwards terminal input into the event channel.
pub fn spawn_key_reader(event_tx: mpsc::Sender<ConsoleEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        loop {
            let event = match crossterm::event::read() {
                Ok(Event::Key(key)) => ConsoleEvent::Key(key),
                Ok(Event::Resize(..)) => ConsoleEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("terminal read error: {}", e);
                    break;
                }
            };
            if event_tx.blocking_send(event).is_err() {
                break;
            }
        }

        tracing::debug!("Key reader task finished");
    })
}

#[cfg(test)]
mod tests {
    use crossterm::event::{KeyCode, KeyModifiers};
    use ratatui::backend::TestBackend;

    use super::*;
    use crate::item::DisplayMode;
    use crate::screen::LIVE_REGION_HEIGHT;

    fn console() -> (Console<TestBackend>, mpsc::Receiver<Vec<u8>>) {
        let terminal = Terminal::new(TestBackend::new(40, LIVE_REGION_HEIGHT)).unwrap();
        let (tx, rx) = mpsc::channel(16);
        (Console::new(Screen::new(terminal), LineWriter::new(tx)), rx)
    }

    fn batch(line: &str) -> ConsoleEvent {
        BridgeEvent::Line(InboundLine::classify(line.to_string())).into()
    }

    fn key(code: KeyCode) -> ConsoleEvent {
        ConsoleEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn type_line(console: &mut Console<TestBackend>, line: &str) -> Flow {
        for c in line.chars() {
            console.handle(key(KeyCode::Char(c))).await.unwrap();
        }
        console.handle(key(KeyCode::Enter)).await.unwrap()
    }

    const VOL: &str = r#"[{"instance":"0","name":"vol","full_text":"50%","markup":"none"}],"#;

    #[tokio::test]
    async fn test_batch_updates_bar_and_roster() {
        let (mut console, _rx) = console();
        console.handle(batch(VOL)).await.unwrap();

        assert_eq!(console.screen().bar(), &Line::from(ratatui::text::Span::raw("50%")));
        assert_eq!(console.roster().to_string(), "0: vol");
    }

    #[tokio::test]
    async fn test_malformed_batch_keeps_roster() {
        let (mut console, _rx) = console();
        console.handle(batch(VOL)).await.unwrap();
        console.handle(batch("not json],")).await.unwrap();

        assert_eq!(console.screen().bar(), &Line::raw("not json],"));
        assert_eq!(console.roster().to_string(), "0: vol");
    }

    #[tokio::test]
    async fn test_paused_still_tracks_roster() {
        let (mut console, _rx) = console();
        type_line(&mut console, "p").await;
        console.handle(batch(VOL)).await.unwrap();

        assert!(console.screen().bar().spans.is_empty());
        assert_eq!(console.roster().to_string(), "0: vol");
    }

    #[tokio::test]
    async fn test_click_writes_one_line() {
        let (mut console, mut rx) = console();
        type_line(&mut console, "c 0 3 s").await;

        let line = rx.try_recv().unwrap();
        assert_eq!(
            String::from_utf8(line).unwrap(),
            "{\"name\":null,\"instance\":\"0\",\"button\":3,\"modifiers\":[\"Shift\"],\"x\":0,\"y\":0,\"relative_x\":0,\"relative_y\":0,\"output_x\":0,\"output_y\":0,\"width\":10,\"height\":10}\n"
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_bad_click_sends_nothing() {
        let (mut console, mut rx) = console();
        type_line(&mut console, "c 0").await;
        assert!(rx.try_recv().is_err());
        assert!(console.state().history.entries().is_empty());
    }

    #[tokio::test]
    async fn test_click_after_child_gone_is_error() {
        let (mut console, rx) = console();
        drop(rx);
        for c in "c 1 1".chars() {
            console.handle(key(KeyCode::Char(c))).await.unwrap();
        }
        assert!(matches!(
            console.handle(key(KeyCode::Enter)).await,
            Err(Error::ChildStdinClosed)
        ));
    }

    #[tokio::test]
    async fn test_display_mode_rerenders_next_batch() {
        let (mut console, _rx) = console();
        type_line(&mut console, "d json").await;
        assert_eq!(console.state().display_mode, DisplayMode::Json);

        console.handle(batch(r#"[{"full_text":"x"}],"#)).await.unwrap();
        assert_eq!(console.screen().bar().to_string(), r#"{"full_text":"x"}"#);
    }

    #[tokio::test]
    async fn test_interrupt_and_quit() {
        let (mut console, _rx) = console();
        let ctrl_c = ConsoleEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(console.handle(ctrl_c).await.unwrap(), Flow::Exit);
        assert_eq!(type_line(&mut console, "q").await, Flow::Exit);
    }

    #[tokio::test]
    async fn test_write_failure_is_fatal() {
        let (mut console, _rx) = console();
        let result = console
            .handle(BridgeEvent::WriteFailed("broken pipe".into()).into())
            .await;
        assert!(matches!(result, Err(Error::ChildWrite(_))));
    }

    #[tokio::test]
    async fn test_run_stops_on_quit() {
        let (mut console, _rx) = console();
        let (tx, rx) = mpsc::channel(16);
        tx.send(batch(VOL)).await.unwrap();
        tx.send(key(KeyCode::Char('q'))).await.unwrap();
        tx.send(key(KeyCode::Enter)).await.unwrap();
        tx.send(batch("[],")).await.unwrap();

        console.run(rx).await.unwrap();
        assert_eq!(console.screen().bar().to_string(), "50%");
    }

    #[test]
    fn test_roster_lines() {
        let roster = crate::render::parse_batch(VOL).unwrap().roster();
        let lines: Vec<String> = roster_lines(&roster).iter().map(Line::to_string).collect();
        assert_eq!(lines, ["", "0: vol", ""]);
    }

    #[test]
    fn test_help_lines_cover_commands() {
        let text: String = help_lines().iter().map(|l| l.to_string() + "\n").collect();
        for word in ["click", "filter", "list", "display", "pause", "repeat", "help", "quit"] {
            assert!(text.contains(word), "help is missing {word}");
        }
    }
}
