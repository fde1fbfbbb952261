//! Console output and run-wide capture.
//!
//! The orchestrator owns a [`Console`] that every test host writes to.
//! During a run the console is redirected into a pipe; a copier thread
//! drains the pipe into a buffer and optionally tees it to the real stdout
//! and to the event logger:
//!
//! ```text
//! hosts ──► Console ──► pipe ──► copier ──► buffer ──► Orchestrator::output
//!                                   ├──► real stdout (print_to_stdout)
//!                                   └──► EventWriter (print_output_to_event_log)
//! ```
//!
//! The pipe disconnects when the redirect guard drops, which is what lets
//! the copier see end-of-stream.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::event::EventWriter;

enum Target {
    Stdout,
    Pipe(Sender<Vec<u8>>),
}

/// The run's output stream. Cheap to clone; clones share the target.
#[derive(Clone)]
pub struct Console {
    target: Arc<Mutex<Target>>,
}

impl Console {
    pub fn stdout() -> Self {
        Console {
            target: Arc::new(Mutex::new(Target::Stdout)),
        }
    }

    /// Write `text` followed by a newline as one unit.
    pub fn line(&self, text: &str) {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(b'\n');
        self.write_bytes(bytes);
    }

    /// Write raw bytes. Writes from different threads never interleave.
    pub fn write_bytes(&self, bytes: Vec<u8>) {
        let target = self.target.lock();
        match &*target {
            Target::Stdout => {
                let mut out = io::stdout().lock();
                if let Err(err) = out.write_all(&bytes).and_then(|()| out.flush()) {
                    tracing::warn!(%err, "console write failed");
                }
            }
            Target::Pipe(pipe) => {
                if pipe.send(bytes).is_err() {
                    tracing::warn!("output capture closed early; console write dropped");
                }
            }
        }
    }

    pub fn is_redirected(&self) -> bool {
        matches!(&*self.target.lock(), Target::Pipe(_))
    }

    /// Send everything written to this console into `pipe` until the guard
    /// drops. Dropping the guard restores stdout and closes the pipe.
    pub fn redirect(&self, pipe: Sender<Vec<u8>>) -> ConsoleGuard<'_> {
        *self.target.lock() = Target::Pipe(pipe);
        ConsoleGuard { console: self }
    }
}

impl Default for Console {
    fn default() -> Self {
        Console::stdout()
    }
}

impl std::fmt::Debug for Console {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Console")
            .field("redirected", &self.is_redirected())
            .finish()
    }
}

/// Restores the console to stdout on drop, on every exit path.
#[must_use = "the console is restored as soon as the guard drops"]
pub struct ConsoleGuard<'c> {
    console: &'c Console,
}

impl Drop for ConsoleGuard<'_> {
    fn drop(&mut self) {
        *self.console.target.lock() = Target::Stdout;
    }
}

/// A new pipe for [`Console::redirect`] and [`Capture::start`].
pub fn pipe() -> (Sender<Vec<u8>>, Receiver<Vec<u8>>) {
    channel::unbounded()
}

/// Where captured bytes are copied besides the buffer.
#[derive(Default)]
pub struct Tee {
    pub stdout: bool,
    pub events: Option<EventWriter>,
}

/// The copier side of a capture.
pub struct Capture {
    copier: JoinHandle<Vec<u8>>,
}

impl Capture {
    /// Start draining `reader` on a dedicated thread.
    pub fn start(reader: Receiver<Vec<u8>>, tee: Tee) -> io::Result<Capture> {
        let copier = thread::Builder::new()
            .name("testdeck-capture".to_owned())
            .spawn(move || copy(&reader, tee))?;
        Ok(Capture { copier })
    }

    /// Wait for end-of-stream and return everything captured.
    ///
    /// Blocks until every sender of the pipe has been dropped.
    pub fn finish(self) -> String {
        match self.copier.join() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(payload) => {
                tracing::warn!(
                    "output capture thread panicked: {}",
                    deck_defer::panic_message(payload.as_ref())
                );
                String::new()
            }
        }
    }
}

fn copy(reader: &Receiver<Vec<u8>>, mut tee: Tee) -> Vec<u8> {
    let mut buf = Vec::new();
    let mut stdout = tee.stdout.then(io::stdout);
    for chunk in reader {
        if let Some(out) = stdout.as_mut() {
            if let Err(err) = out.write_all(&chunk).and_then(|()| out.flush()) {
                tracing::warn!(%err, "output capture issue: tee to stdout failed");
                stdout = None;
            }
        }
        if let Some(events) = tee.events.as_mut() {
            if let Err(err) = events.write_all(&chunk) {
                tracing::warn!(%err, "output capture issue: tee to event log failed");
            }
        }
        buf.extend_from_slice(&chunk);
    }
    buf
}
