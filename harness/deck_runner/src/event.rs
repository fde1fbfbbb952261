//! Free-text run events.

use std::io;
use std::sync::Arc;

use parking_lot::RwLock;

/// Receives progress events during a run.
pub trait EventLogger: Send + Sync {
    fn log(&self, message: &str);
}

/// Routes events to the currently configured logger, if any.
///
/// The logger can be swapped at any time, including while tests are
/// running on other threads.
#[derive(Default)]
pub struct EventRouter {
    logger: RwLock<Option<Arc<dyn EventLogger>>>,
}

impl EventRouter {
    pub fn new() -> Self {
        EventRouter::default()
    }

    pub fn set_logger(&self, logger: Option<Arc<dyn EventLogger>>) {
        *self.logger.write() = logger;
    }

    pub fn has_logger(&self) -> bool {
        self.logger.read().is_some()
    }

    /// Relay `message`. A no-op without a logger.
    pub fn log(&self, message: &str) {
        // Clone out so a slow logger never blocks `set_logger`.
        let logger = self.logger.read().clone();
        if let Some(logger) = logger {
            logger.log(message);
        }
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("has_logger", &self.has_logger())
            .finish()
    }
}

/// Adapts the event router to `io::Write`, one event per write.
pub struct EventWriter {
    events: Arc<EventRouter>,
}

impl EventWriter {
    pub fn new(events: Arc<EventRouter>) -> Self {
        EventWriter { events }
    }
}

impl io::Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.events.log(&String::from_utf8_lossy(buf));
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
