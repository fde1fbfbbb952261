//! Staged test cases with per-stage statistics.
//!
//! Every test case runs through a fixed lifecycle (Arrange, Act, Assert,
//! After) and produces a [`Statistics`] record with per-stage timings and
//! statuses. An [`Orchestrator`] runs many such tests through a [`Driver`]
//! (usually a [`Registry`]), captures their combined output, and collects
//! the records.
//!
//! ```text
//! let mut registry = Registry::new();
//! registry.add("TestLogin", |t| {
//!     testdeck::test(t, TestCase::new()
//!         .arrange(|td| td.log("creating user"))
//!         .act(|td| login(td))
//!         .assert(|td| check(td)));
//! });
//!
//! let orchestrator = Orchestrator::new(registry);
//! let code = orchestrator.run()?;
//! for stats in orchestrator.statistics() { /* persist */ }
//! ```
//!
//! Set `RUST_LOG` and call [`init_tracing`] to see the engine's internal
//! diagnostics on stderr.

use std::sync::Once;

pub mod cli;
pub mod demo;
mod logger;
pub mod summary;

pub use deck_defer::DeferStack;
pub use deck_lifecycle::{
    name_tag, test, test_with, Reporter, StageFn, StatisticsSink, Td, TestCase, TestConfig,
};
pub use deck_model::{LifecycleStage, Outcome, Statistics, Status, Timing};
pub use deck_runner::{
    config, global, Console, ConfigError, Driver, Entrypoint, EnvConfig, EventLogger,
    EventRouter, EventWriter, Orchestrator, Registry, RunAs, RunContext, RunnerConfig,
    RunnerError, StatisticsStore, TestEntry,
};
pub use logger::TracingEventLogger;

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber. Idempotent.
///
/// Does nothing unless `RUST_LOG` is set, so normal runs pay nothing.
/// Output is an indented span tree on stderr, out of the way of the
/// captured console.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};
        use tracing_tree::HierarchicalLayer;

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    HierarchicalLayer::new(2)
                        .with_targets(true)
                        .with_indent_lines(true),
                )
                .with(filter)
                .init();
        }
    });
}
