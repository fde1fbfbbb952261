//! Per-stage timing.

use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::LifecycleStage;

/// Start, end and duration of one lifecycle stage.
///
/// `started` is set when the stage callback was invoked and `ended` when it
/// returned normally. A stage whose callback was absent, or that was never
/// reached, has both flags unset and a zero duration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    pub stage: LifecycleStage,
    pub start: SystemTime,
    pub end: SystemTime,
    pub duration: Duration,
    pub started: bool,
    pub ended: bool,
}

impl Timing {
    /// Timing entry for a stage whose callback did not run.
    pub fn not_run(stage: LifecycleStage, at: SystemTime) -> Self {
        Timing {
            stage,
            start: at,
            end: at,
            duration: Duration::ZERO,
            started: false,
            ended: false,
        }
    }

    /// Whether the callback started but did not return normally.
    pub fn aborted(&self) -> bool {
        self.started && !self.ended
    }
}
