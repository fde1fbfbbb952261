//! Per-stage outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::LifecycleStage;

/// Result recorded for a stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass => f.write_str("Pass"),
            Outcome::Fail => f.write_str("Fail"),
            Outcome::Skip => f.write_str("Skip"),
        }
    }
}

/// One recorded outcome, tagged with the stage that was active when it
/// was reported.
///
/// Statuses are appended in chronological order and never mutated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    pub outcome: Outcome,
    pub stage: LifecycleStage,
    pub fatal: bool,
}

impl Status {
    pub fn pass(stage: LifecycleStage) -> Self {
        Status {
            outcome: Outcome::Pass,
            stage,
            fatal: false,
        }
    }

    pub fn fail(stage: LifecycleStage, fatal: bool) -> Self {
        Status {
            outcome: Outcome::Fail,
            stage,
            fatal,
        }
    }

    pub fn skip(stage: LifecycleStage) -> Self {
        Status {
            outcome: Outcome::Skip,
            stage,
            fatal: false,
        }
    }

    pub fn is_pass(&self) -> bool {
        self.outcome == Outcome::Pass
    }

    pub fn is_fail(&self) -> bool {
        self.outcome == Outcome::Fail
    }

    pub fn is_skip(&self) -> bool {
        self.outcome == Outcome::Skip
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.stage, self.outcome)?;
        if self.fatal {
            f.write_str(" (fatal)")?;
        }
        Ok(())
    }
}
