//! Command interpreter: key events in, session changes and actions out.

use std::str::FromStr;
use std::sync::LazyLock;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use regex::Regex;
use thiserror::Error;

use crate::item::{ClickEvent, DisplayMode};
use crate::session::SessionState;

static DISPLAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^d(?:isplay)?(?:\s+(full|short|json))?").expect("valid regex")
});
static FILTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^f(?:ilter)?(?:\s+((?:\d,?)+))?").expect("valid regex"));
static CLICK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^c(?:lick)?\s+(\d)\s+(\d)(?:\s+(s))?").expect("valid regex")
});

/// Usage text shown for `help` and for unrecognized input.
pub const HELP: &str = "\
Usage:
  [c]lick <instance> <button> [s]   e.g.: \"click 0 3\" (s = with shift)
  [f]ilter                          e.g.: \"filter 1,3,6\" (empty to reset)
  [l]ist                            lists bar items with instance ids
  [d]isplay                         display type, one of: \"full\", \"short\" or \"json\"
  [j] or short                      toggles between full and short text
  [p]ause                           toggles pausing output
  [r]epeat                          repeats last command
  [h]elp or ?                       show this text
  [q]uit                            exits";

/// Input that matches no command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized command: {input:?}")]
pub struct CommandSyntaxError {
    /// The rejected text.
    pub input: String,
}

impl CommandSyntaxError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_string(),
        }
    }
}

/// A recognized command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `h`, `help`, `?...`
    Help,
    /// `r`, `repeat`
    Repeat,
    /// `d[isplay] [full|short|json]`; `None` cycles.
    Display(Option<DisplayMode>),
    /// `j`, `short`
    ToggleShort,
    /// `f[ilter] [ids]`; empty clears.
    Filter(Vec<String>),
    /// `p`, `pause`
    Pause,
    /// `q`, `quit`
    Quit,
    /// `l`, `list`
    List,
    /// `c[lick] <instance> <button> [s]`
    Click(ClickEvent),
}

impl FromStr for Command {
    type Err = CommandSyntaxError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let syntax_error = || CommandSyntaxError::new(input);

        if input.starts_with('?') || input == "h" || input == "help" {
            return Ok(Self::Help);
        }
        if input == "r" || input == "repeat" {
            return Ok(Self::Repeat);
        }

        if input.starts_with('d') {
            let caps = DISPLAY_RE.captures(input).ok_or_else(syntax_error)?;
            let mode = caps
                .get(1)
                .map(|m| m.as_str().parse::<DisplayMode>())
                .transpose()
                .map_err(|_| syntax_error())?;
            return Ok(Self::Display(mode));
        }
        if input == "j" || input == "short" {
            return Ok(Self::ToggleShort);
        }
        if input.starts_with('f') {
            let caps = FILTER_RE.captures(input).ok_or_else(syntax_error)?;
            let ids = caps.get(1).map_or_else(Vec::new, |m| {
                m.as_str()
                    .split(',')
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect()
            });
            return Ok(Self::Filter(ids));
        }

        match input {
            "p" | "pause" => return Ok(Self::Pause),
            "q" | "quit" => return Ok(Self::Quit),
            "l" | "list" => return Ok(Self::List),
            _ => {}
        }

        if input.starts_with('c') {
            let caps = CLICK_RE.captures(input).ok_or_else(syntax_error)?;
            let instance = caps.get(1).ok_or_else(syntax_error)?.as_str();
            let button = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<u8>().ok())
                .ok_or_else(syntax_error)?;
            let shift = caps.get(3).is_some();
            return Ok(Self::Click(ClickEvent::new(instance, button, shift)));
        }

        Err(syntax_error())
    }
}

/// A keystroke as the interpreter sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Ctrl-C or Ctrl-D.
    Interrupt,
    Backspace,
    Enter,
    /// Up arrow.
    RecallPrevious,
    /// Down arrow.
    RecallNext,
    /// Any other navigation or escape key; clears the input.
    Escape,
    /// A printable character.
    Char(char),
}

impl Key {
    /// Map a terminal key event. Releases and unsupported chords are `None`.
    #[must_use]
    pub fn from_event(event: KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let ctrl = event.modifiers.contains(KeyModifiers::CONTROL);

        match event.code {
            KeyCode::Char('c' | 'd') if ctrl => Some(Self::Interrupt),
            KeyCode::Char(_) if ctrl => None,
            KeyCode::Char(c) => Some(Self::Char(c)),
            KeyCode::Backspace => Some(Self::Backspace),
            KeyCode::Enter => Some(Self::Enter),
            KeyCode::Up => Some(Self::RecallPrevious),
            KeyCode::Down => Some(Self::RecallNext),
            KeyCode::Left
            | KeyCode::Right
            | KeyCode::Home
            | KeyCode::End
            | KeyCode::PageUp
            | KeyCode::PageDown
            | KeyCode::Delete
            | KeyCode::Insert
            | KeyCode::Esc
            | KeyCode::BackTab
            | KeyCode::F(_) => Some(Self::Escape),
            _ => None,
        }
    }
}

/// What the console has to do after a key was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Only repaint.
    Redraw,
    /// Print the usage text.
    Help,
    /// Print the roster.
    List,
    /// Send a click to the bar process.
    Click(ClickEvent),
    /// End the program with exit code 0.
    Exit,
}

/// Apply one keystroke to the session.
pub fn handle_key(state: &mut SessionState, key: Key) -> Outcome {
    match key {
        Key::Interrupt => return Outcome::Exit,
        Key::Backspace => {
            state.input.pop();
        }
        Key::Enter => {
            let text = state.input.trim().to_string();
            state.input.clear();
            return commit(state, &text);
        }
        Key::RecallPrevious => {
            if let Some(entry) = state.history.recall_previous() {
                state.input = entry.to_string();
            }
        }
        Key::RecallNext => {
            if let Some(entry) = state.history.recall_next() {
                state.input = entry.to_string();
            }
        }
        Key::Escape => state.input.clear(),
        Key::Char(c) => state.input.push(c),
    }
    Outcome::Redraw
}

/// Dispatch a committed command line.
///
/// Unrecognized input leaves the session untouched and asks for help.
pub fn commit(state: &mut SessionState, text: &str) -> Outcome {
    let command = match text.parse::<Command>() {
        Ok(command) => command,
        Err(err) => {
            tracing::debug!("{}", err);
            return Outcome::Help;
        }
    };

    let (text, command) = match command {
        Command::Help => return Outcome::Help,
        Command::Repeat => {
            let Some(last) = state.history.last().map(str::to_string) else {
                return Outcome::Help;
            };
            match last.parse::<Command>() {
                Ok(Command::Help | Command::Repeat) | Err(_) => return Outcome::Help,
                Ok(command) => (last, command),
            }
        }
        command => (text.to_string(), command),
    };

    let outcome = match command {
        Command::Quit => return Outcome::Exit,
        Command::Display(Some(mode)) => {
            state.display_mode = mode;
            Outcome::Redraw
        }
        Command::Display(None) => {
            state.display_mode = state.display_mode.cycle();
            Outcome::Redraw
        }
        Command::ToggleShort => {
            state.display_mode = state.display_mode.toggle_short();
            Outcome::Redraw
        }
        Command::Filter(ids) => {
            state.set_filter(ids);
            Outcome::Redraw
        }
        Command::Pause => {
            state.paused = !state.paused;
            Outcome::Redraw
        }
        Command::List => Outcome::List,
        Command::Click(click) => Outcome::Click(click),
        Command::Help | Command::Repeat => Outcome::Help,
    };

    state.history.record(&text);
    outcome
}
