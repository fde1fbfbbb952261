//! Test doubles shared by the unit tests.

use parking_lot::Mutex;

use crate::event::EventLogger;

/// Event logger that keeps every message.
#[derive(Default)]
pub(crate) struct RecordingLogger {
    messages: Mutex<Vec<String>>,
}

impl RecordingLogger {
    pub(crate) fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl EventLogger for RecordingLogger {
    fn log(&self, message: &str) {
        self.messages.lock().push(message.to_owned());
    }
}
