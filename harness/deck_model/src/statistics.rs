//! The terminal record of one test invocation.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::{LifecycleStage, Status, Timing};

/// Everything recorded about one test case.
///
/// Built once by the lifecycle engine when the invocation finishes and then
/// handed to a statistics sink. The only field a sink fills in afterwards
/// is `output`, which the orchestrator sets to the run-wide captured output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub name: String,
    pub failed: bool,
    pub fatal: bool,
    /// Chronological statuses. The last entry is always the
    /// `TestFinished` status.
    pub statuses: Vec<Status>,
    /// One entry per timed stage.
    pub timings: BTreeMap<LifecycleStage, Timing>,
    pub start: SystemTime,
    pub end: SystemTime,
    pub duration: Duration,
    pub output: String,
}

impl Statistics {
    /// The status appended at `TestFinished`, if the record is complete.
    pub fn final_status(&self) -> Option<&Status> {
        self.statuses
            .last()
            .filter(|s| s.stage == LifecycleStage::TestFinished)
    }

    pub fn timing(&self, stage: LifecycleStage) -> Option<&Timing> {
        self.timings.get(&stage)
    }

    /// Whether any stage reported a skip.
    pub fn is_skipped(&self) -> bool {
        self.statuses.iter().any(Status::is_skip)
    }

    /// Whether the final status is a pass.
    pub fn passed(&self) -> bool {
        self.final_status().is_some_and(Status::is_pass)
    }
}
