//! Data model for testdeck test cases.
//!
//! Every test invocation produces one [`Statistics`] record:
//!
//! ```text
//! TestSetup ─► Arrange ─► Act ─► Assert ─► After ─► TestFinished
//!                 │         │       │         │
//!                 └─────────┴───────┴─────────┴──► Timing (one per stage)
//!
//! error / fatal / skip reports ──► Status (appended, chronological)
//! ```
//!
//! The types here are plain data. Behaviour lives in `deck_lifecycle`
//! (which builds the records) and `deck_runner` (which aggregates them).

mod stage;
mod statistics;
mod status;
mod timing;

pub use stage::LifecycleStage;
pub use statistics::Statistics;
pub use status::{Outcome, Status};
pub use timing::Timing;
