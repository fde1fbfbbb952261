//! The process-wide orchestrator.
//!
//! For callers that cannot thread an [`Orchestrator`] through explicitly.
//! The first successful [`init`] wins and lives for the rest of the
//! process; later calls get the existing instance back.

use std::sync::OnceLock;

use crate::driver::Driver;
use crate::error::RunnerError;
use crate::orchestrator::Orchestrator;

static INSTANCE: OnceLock<Orchestrator> = OnceLock::new();

/// Install an orchestrator over `driver`, or return the one already
/// installed. A driver passed after the first call is dropped unused.
pub fn init(driver: impl Driver + 'static) -> &'static Orchestrator {
    if let Some(existing) = INSTANCE.get() {
        tracing::debug!("process-wide orchestrator already installed; ignoring new driver");
        return existing;
    }
    INSTANCE.get_or_init(|| {
        tracing::debug!("installing process-wide orchestrator");
        Orchestrator::new(driver)
    })
}

/// The installed orchestrator.
///
/// Fails with [`RunnerError::Configuration`] if [`init`] was never called.
pub fn instance() -> Result<&'static Orchestrator, RunnerError> {
    INSTANCE.get().ok_or(RunnerError::Configuration)
}

pub fn initialized() -> bool {
    INSTANCE.get().is_some()
}
