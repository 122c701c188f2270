use std::io::Stdout;

use anyhow::{Context, Result};
use barconsole::{ConsoleConfig, LIVE_REGION_HEIGHT};
use crossterm::cursor;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use ratatui::backend::CrosstermBackend;
use ratatui::{Terminal, TerminalOptions, Viewport};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ConsoleConfig::from_env();
    if let Some(path) = &config.log_file {
        barconsole::logging::init(path)
            .with_context(|| format!("initialize logging to {}", path.display()))?;
    }

    let ignored: Vec<String> = std::env::args().skip(1).collect();
    if !ignored.is_empty() {
        tracing::warn!(
            "ignoring arguments {:?}; set {} to choose the bar program",
            ignored,
            barconsole::PROGRAM_ENV
        );
    }

    let terminal = setup_terminal()?;
    let result = barconsole::run(&config, terminal).await;
    restore_terminal()?;

    // Blocking reader tasks never finish on their own, so leave without
    // waiting for the runtime to shut down.
    match result {
        Ok(()) => std::process::exit(0),
        Err(err) => {
            tracing::error!("{}", err);
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    // insert_before needs at least one row above the inline viewport.
    if matches!(cursor::position(), Ok((_, 0))) {
        println!();
    }

    enable_raw_mode().context("enable raw mode")?;
    Terminal::with_options(
        CrosstermBackend::new(std::io::stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(LIVE_REGION_HEIGHT),
        },
    )
    .context("create terminal")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(std::io::stdout(), cursor::Show).context("show cursor")?;
    println!();
    Ok(())
}
