use deck_runner::EventLogger;

/// Relays run events to `tracing` at info level.
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingEventLogger;

impl EventLogger for TracingEventLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "testdeck::events", "{}", message.trim_end());
    }
}
