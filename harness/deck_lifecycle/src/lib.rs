//! Lifecycle engine for testdeck test cases.
//!
//! A [`TestCase`] bundles up to four stage callbacks and a deferred-call
//! stack. [`test`] drives it through the lifecycle against a host
//! [`Reporter`] and produces a [`Statistics`](deck_model::Statistics)
//! record:
//!
//! ```text
//! Arrange ──ok──► Act ──ok──► Assert ─┐
//!    │             │            │     │
//!    └── fatal/skip ┴────────────┴─────┴─► cleanup:
//!                                          After (unless skipped in Arrange)
//!                                          final status
//!                                          deferred calls (LIFO)
//!                                          statistics ──► sink
//! ```
//!
//! Fatal- and skip-class reports on the [`Td`] context unwind the stage
//! immediately; the engine catches the unwind at the stage boundary so the
//! cleanup always runs.
//!
//! # Usage
//!
//! ```text
//! fn login_succeeds(t: &dyn Reporter) {
//!     let token = RefCell::new(None);
//!     deck_lifecycle::test(t, TestCase::new()
//!         .arrange(|td| td.log("creating user"))
//!         .act(|td| *token.borrow_mut() = login(td))
//!         .assert(|td| if token.borrow().is_none() { td.fatal("no token") }));
//! }
//! ```

mod abort;
mod case;
mod context;
mod engine;
pub mod name_tag;
mod reporter;

#[cfg(test)]
mod mock;

pub use case::{StageFn, TestCase};
pub use context::Td;
pub use engine::{test, test_with, TestConfig};
pub use reporter::{Reporter, StatisticsSink};
