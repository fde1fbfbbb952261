//! Capabilities the lifecycle engine consumes from its host.

use std::sync::Arc;

use deck_model::Statistics;

/// The host test-reporting object a test case runs against.
///
/// These are recorders: none of them diverge. Aborting the current test
/// after a fatal or skip report is the lifecycle context's job, so a host
/// only has to remember what happened and print it.
pub trait Reporter {
    /// Record a non-fatal failure.
    fn error(&self, message: &str);

    /// Record a failure that aborts the test.
    fn fatal(&self, message: &str);

    /// Record that the test is skipped. `message` may be empty.
    fn skip(&self, message: &str);

    /// Mark the test failed without a message.
    fn fail(&self);

    fn log(&self, message: &str);

    fn name(&self) -> &str;

    fn failed(&self) -> bool;

    fn skipped(&self) -> bool;

    /// Mark the calling function as a test helper.
    fn helper(&self) {}

    /// Ask the host to schedule this test in parallel with other parallel
    /// tests. May block until the host lets parallel tests run.
    fn parallel(&self) {}

    /// Where finished statistics records go, if anywhere.
    fn sink(&self) -> Option<Arc<dyn StatisticsSink>> {
        None
    }

    /// Relay a free-text progress event to the run's event logger.
    fn log_event(&self, _message: &str) {}
}

/// Receiver of finished statistics records.
///
/// Called from many test threads at once.
pub trait StatisticsSink: Send + Sync {
    fn add_statistics(&self, stats: Statistics);
}
