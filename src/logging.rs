//! Tracing setup.
//!
//! The terminal belongs to the compositor, so logs only ever go to a file.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Install a global subscriber writing to `path`.
///
/// The filter comes from `RUST_LOG`, defaulting to `debug` for this crate.
///
/// # Errors
/// Returns an error if the file cannot be created or a subscriber is
/// already installed.
pub fn init(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barconsole=debug"));
    build_subscriber(file, env_filter).try_init()?;
    Ok(())
}

/// Build a file-backed subscriber.
pub fn build_subscriber(
    log_file: File,
    env_filter: EnvFilter,
) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_writes_to_file() {
        let path = std::env::temp_dir().join(format!("barconsole-log-{}.log", std::process::id()));
        let file = File::create(&path).unwrap();
        let subscriber = build_subscriber(file, EnvFilter::new("debug"));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("bar process exited");
        });

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(contents.contains("WARN"));
        assert!(contents.contains("bar process exited"));
    }
}
