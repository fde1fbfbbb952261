//! Test orchestrator for testdeck.
//!
//! An [`Orchestrator`] stands in for a native test loop. It asks a
//! [`Driver`] for the registered tests, filters them, captures everything
//! the run writes to its [`Console`], and collects one
//! [`Statistics`](deck_model::Statistics) record per test through its
//! sink.
//!
//! ```text
//! Orchestrator::run
//!   ├─ Driver::enumerate ──► filter (or tag names)
//!   ├─ Console::redirect ──► pipe ──► Capture thread
//!   ├─ Driver::run(tests, RunContext)
//!   │     └─ per test: host Reporter ──► deck_lifecycle::test ──► sink
//!   └─ restore console, join capture, copy output into this run's records
//! ```
//!
//! [`Registry`] is the bundled driver: tests are registered by name, no
//! discovery involved. [`global`] offers a process-wide instance for code
//! that cannot be handed one.

pub mod capture;
pub mod config;
mod driver;
mod error;
mod event;
pub mod global;
mod orchestrator;
mod registry;

#[cfg(test)]
mod testing;

pub use capture::Console;
pub use config::{ConfigError, EnvConfig, RunAs, RunnerConfig};
pub use driver::{Driver, Entrypoint, RunContext, TestEntry};
pub use error::RunnerError;
pub use event::{EventLogger, EventRouter, EventWriter};
pub use orchestrator::{Orchestrator, StatisticsStore};
pub use registry::{Registry, DEFAULT_STACK_SIZE};
