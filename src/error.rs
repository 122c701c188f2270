//! Error types for the barconsole crate.

use thiserror::Error;

/// Result type alias using barconsole's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end the console session.
///
/// Recoverable failures have their own types ([`crate::ParseError`] and
/// [`crate::CommandSyntaxError`]) and never surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to launch the bar process.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Executable that was launched.
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The bar process could not be killed on shutdown.
    #[error("failed to kill bar process {pid}: {source}")]
    Kill {
        /// OS process id.
        pid: u32,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The bar process stdin writer is gone (process exited or pipe broke).
    #[error("bar process stdin is closed")]
    ChildStdinClosed,

    /// The bar process did not expose a stdio pipe.
    #[error("bar process is missing its {0} pipe")]
    MissingPipe(&'static str),

    /// The stdin writer task failed to deliver a line.
    #[error("failed to write to bar process: {0}")]
    ChildWrite(String),

    /// Drawing to the terminal failed.
    #[error("terminal error: {0}")]
    Terminal(#[source] std::io::Error),

    /// An outbound record could not be encoded.
    #[error("failed to encode command: {0}")]
    Encode(#[from] serde_json::Error),
}
