//! Bar process spawning, line framing and stdin writes.

use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};

/// Bytes written once after launch to open the streaming array.
pub const SESSION_PREAMBLE: &[u8] = b"[\n";

/// Suffix marking a line as a complete batch.
pub const BATCH_TERMINATOR: &str = "],";

/// How often the monitor task checks whether the process has exited.
const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A complete line read from the bar process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InboundLine {
    /// A `[...],` batch line, still encoded.
    Batch(String),
    /// Anything else (protocol header, diagnostics).
    Passthrough(String),
}

impl InboundLine {
    /// Classify a line by its terminator.
    #[must_use]
    pub fn classify(line: String) -> Self {
        if line.ends_with(BATCH_TERMINATOR) {
            Self::Batch(line)
        } else {
            Self::Passthrough(line)
        }
    }
}

/// Events emitted by the bridge.
#[derive(Clone, Debug)]
pub enum BridgeEvent {
    /// A complete output line.
    Line(InboundLine),

    /// The process exited. `code` is `None` when killed by a signal.
    Exited { code: Option<i32> },

    /// A stdin write failed; later writes will be rejected.
    WriteFailed(String),
}

/// Reassembles output chunks into complete lines.
///
/// The trailing fragment of each chunk is held until its newline arrives,
/// so callers only ever see whole lines.
#[derive(Clone, Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);
        complete[..complete.len() - 1]
            .split(|&b| b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Bytes held back waiting for a newline.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

/// Encode a value as one newline-terminated JSON line.
///
/// # Errors
/// Returns an error if the value cannot be serialized.
pub fn encode_line<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut line = serde_json::to_vec(value)?;
    line.push(b'\n');
    Ok(line)
}

/// Cloneable handle for queueing writes to the bar process stdin.
#[derive(Clone, Debug)]
pub struct LineWriter {
    input_tx: mpsc::Sender<Vec<u8>>,
}

impl LineWriter {
    /// Wrap the sending half of a stdin queue.
    #[must_use]
    pub fn new(input_tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { input_tx }
    }

    /// Serialize `value` and queue it as a single line.
    ///
    /// Fire-and-forget: returns once the line is queued, not when the
    /// process has read it.
    ///
    /// # Errors
    /// Returns an error if encoding fails or the writer task has stopped.
    pub async fn write_line<T: Serialize>(&self, value: &T) -> Result<()> {
        self.write_raw(encode_line(value)?).await
    }

    /// Queue raw bytes.
    ///
    /// # Errors
    /// Returns an error if the writer task has stopped.
    pub async fn write_raw(&self, data: Vec<u8>) -> Result<()> {
        self.input_tx
            .send(data)
            .await
            .map_err(|_| Error::ChildStdinClosed)
    }
}

/// A running bar process with its I/O tasks.
///
/// Output lines, exit and write failures are delivered on the event
/// channel passed to [`Bridge::start`]; dropping that receiver cancels the
/// subscription and ends the reader.
///
/// The process keeps running until it exits on its own or [`Bridge::close`]
/// kills it.
#[derive(Debug)]
pub struct Bridge {
    writer: LineWriter,
    child: Arc<Mutex<Child>>,
    pid: u32,
    monitor_handle: JoinHandle<()>,
}

impl Bridge {
    /// Launch `program` with no arguments and begin the session.
    ///
    /// Stderr is inherited so diagnostics reach the console's own stderr.
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the process cannot be spawned.
    pub fn start<E>(program: &Path, capacity: usize, event_tx: mpsc::Sender<E>) -> Result<Self>
    where
        E: From<BridgeEvent> + Send + 'static,
    {
        let mut child = Command::new(program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: program.display().to_string(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(Error::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(Error::MissingPipe("stdout"))?;
        let pid = child.id();

        let (input_tx, input_rx) = mpsc::channel::<Vec<u8>>(capacity.max(1));
        input_tx
            .try_send(SESSION_PREAMBLE.to_vec())
            .map_err(|_| Error::ChildStdinClosed)?;

        let child = Arc::new(Mutex::new(child));
        spawn_reader_task(stdout, event_tx.clone());
        spawn_writer_task(stdin, input_rx, event_tx.clone());
        let monitor_handle = spawn_monitor_task(Arc::clone(&child), event_tx);

        tracing::info!("started {} (pid {})", program.display(), pid);

        Ok(Self {
            writer: LineWriter::new(input_tx),
            child,
            pid,
            monitor_handle,
        })
    }

    /// Handle for writing command lines.
    #[must_use]
    pub fn writer(&self) -> LineWriter {
        self.writer.clone()
    }

    /// Serialize `value` and send it as one line.
    ///
    /// # Errors
    /// Returns an error if encoding fails or stdin is closed.
    pub async fn write_line<T: Serialize>(&self, value: &T) -> Result<()> {
        self.writer.write_line(value).await
    }

    /// Kill the bar process and wait until it has been reaped.
    ///
    /// Killing closes its stdout, which ends the reader; the exit is still
    /// reported as [`BridgeEvent::Exited`] if the event receiver is alive.
    ///
    /// # Errors
    /// Returns an error if the process could not be signalled.
    pub async fn close(self) -> Result<()> {
        let killed = lock_child(&self.child).kill();
        match killed {
            Ok(()) => tracing::debug!("killed bar process (pid {})", self.pid),
            // Already exited and reaped.
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => {}
            Err(source) => {
                return Err(Error::Kill {
                    pid: self.pid,
                    source,
                })
            }
        }

        if let Err(e) = self.monitor_handle.await {
            tracing::warn!("monitor task failed: {}", e);
        }
        Ok(())
    }
}

fn lock_child(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Spawns the task that frames stdout into lines.
fn spawn_reader_task<E>(mut stdout: ChildStdout, event_tx: mpsc::Sender<E>) -> JoinHandle<()>
where
    E: From<BridgeEvent> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut buf = [0u8; 4096];
        let mut lines = LineBuffer::new();

        'read: loop {
            match stdout.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    for line in lines.push(&buf[..n]) {
                        let event = BridgeEvent::Line(InboundLine::classify(line));
                        if event_tx.blocking_send(event.into()).is_err() {
                            tracing::debug!("line subscriber dropped");
                            break 'read;
                        }
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::debug!("stdout read error: {}", e);
                    break;
                }
            }
        }

        if !lines.pending().is_empty() {
            tracing::debug!("dropping {} bytes of unterminated output", lines.pending().len());
        }
        tracing::debug!("Reader task finished");
    })
}

/// Spawns the task that writes queued lines to stdin.
fn spawn_writer_task<E>(
    mut stdin: ChildStdin,
    mut input_rx: mpsc::Receiver<Vec<u8>>,
    event_tx: mpsc::Sender<E>,
) -> JoinHandle<()>
where
    E: From<BridgeEvent> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        while let Some(data) = input_rx.blocking_recv() {
            if let Err(e) = stdin.write_all(&data).and_then(|()| stdin.flush()) {
                tracing::warn!("stdin write error: {}", e);
                let _ = event_tx.blocking_send(BridgeEvent::WriteFailed(e.to_string()).into());
                break;
            }
        }

        tracing::debug!("Writer task finished");
    })
}

/// Spawns the task that waits for the process to exit.
///
/// Polls rather than blocking in `wait` so [`Bridge::close`] can take the
/// lock to kill the process.
fn spawn_monitor_task<E>(child: Arc<Mutex<Child>>, event_tx: mpsc::Sender<E>) -> JoinHandle<()>
where
    E: From<BridgeEvent> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let code = loop {
            match lock_child(&child).try_wait() {
                Ok(Some(status)) => break status.code(),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("failed to wait for bar process: {}", e);
                    break None;
                }
            }
            std::thread::sleep(EXIT_POLL_INTERVAL);
        };
        tracing::info!("bar process exited with {:?}", code);
        let _ = event_tx.blocking_send(BridgeEvent::Exited { code }.into());
    })
}
