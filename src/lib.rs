//! # Barconsole
//!
//! An interactive terminal console for status bar protocol processes.
//!
//! The console launches a bar process, reads its stream of item batches and
//! keeps a one-line live preview of the bar at the bottom of the terminal.
//! Commands typed at the prompt change how the bar is shown or send
//! synthetic click events back to the process.
//!
//! ## Components
//!
//! - **Protocol bridge** ([`Bridge`]): spawns the process, frames stdout
//!   into lines and writes JSON lines to stdin
//! - **Renderer** ([`render()`]): turns a batch line into a styled line
//!   under the current display mode and instance filter
//! - **Interpreter** ([`handle_key`]): the prompt's key state machine and
//!   command grammar
//! - **Compositor** ([`Screen`]): paints the bar, roster and prompt rows
//!
//! ## Example
//!
//! ```no_run
//! use barconsole::{ConsoleConfig, LIVE_REGION_HEIGHT};
//! use ratatui::{backend::CrosstermBackend, Terminal, TerminalOptions, Viewport};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConsoleConfig::new("./my-bar");
//!     let terminal = Terminal::with_options(
//!         CrosstermBackend::new(std::io::stdout()),
//!         TerminalOptions {
//!             viewport: Viewport::Inline(LIVE_REGION_HEIGHT),
//!         },
//!     )?;
//!     barconsole::run(&config, terminal).await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod command;
mod config;
mod console;
mod error;
mod item;
pub mod logging;
mod markup;
mod protocol;
mod render;
mod screen;
mod session;
mod style;

// Re-export public API
pub use command::{commit, handle_key, Command, CommandSyntaxError, Key, Outcome, HELP};
pub use config::{ConsoleConfig, DEFAULT_PROGRAM, LOG_ENV, PROGRAM_ENV};
pub use console::{help_lines, roster_lines, run, spawn_key_reader, Console, ConsoleEvent, Flow};
pub use error::{Error, Result};
pub use item::{
    BarItem, Batch, ClickEvent, DisplayMode, Roster, RosterEntry, PANGO_MARKUP, UNKNOWN_INSTANCE,
};
pub use markup::{decode_entities, MarkupSpan};
pub use protocol::{
    encode_line, Bridge, BridgeEvent, InboundLine, LineBuffer, LineWriter, BATCH_TERMINATOR,
    SESSION_PREAMBLE,
};
pub use render::{compose, parse_batch, render, ParseError, RenderedLine};
pub use screen::{prompt_line, roster_line, LiveRegion, Screen, LIVE_REGION_HEIGHT};
pub use session::{History, SessionState};
pub use style::{parse_color, SEPARATOR};

/// Parse inline span markup. See [`MarkupSpan`].
pub use markup::parse as parse_markup;
/// Style text with optional colors.
pub use style::style as style_text;
