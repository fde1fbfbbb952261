//! Lifecycle stages of a single test case.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A phase of a test case's lifecycle.
///
/// Stages are strictly sequential and never re-entered. The variant order
/// is the execution order, so `Ord` sorts stages chronologically.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LifecycleStage {
    /// Implicit initial stage, before `Arrange` starts.
    #[serde(rename = "FrameworkTestSetup")]
    TestSetup,
    /// Setup before the code under test runs.
    Arrange,
    /// The code under test.
    Act,
    /// Verification of the outcome.
    Assert,
    /// Clean-up, run by the guaranteed-cleanup step.
    After,
    /// Terminal bookkeeping stage carrying the final status.
    #[serde(rename = "FrameworkTestFinished")]
    TestFinished,
}

impl LifecycleStage {
    /// The four stages that run a callback and record a timing, in order.
    pub const TIMED: [LifecycleStage; 4] = [
        LifecycleStage::Arrange,
        LifecycleStage::Act,
        LifecycleStage::Assert,
        LifecycleStage::After,
    ];

    /// Whether this stage runs a user callback.
    pub fn is_timed(self) -> bool {
        Self::TIMED.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStage::TestSetup => "FrameworkTestSetup",
            LifecycleStage::Arrange => "Arrange",
            LifecycleStage::Act => "Act",
            LifecycleStage::Assert => "Assert",
            LifecycleStage::After => "After",
            LifecycleStage::TestFinished => "FrameworkTestFinished",
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
