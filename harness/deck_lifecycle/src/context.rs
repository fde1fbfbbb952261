//! The per-invocation lifecycle context.

use std::collections::BTreeMap;
use std::fmt;

use deck_defer::DeferStack;
use deck_model::{LifecycleStage, Status, Timing};

use crate::abort::Abort;
use crate::reporter::Reporter;

/// Lifecycle context handed to every stage callback.
///
/// Wraps the host [`Reporter`]: reporting calls are forwarded to the host
/// and additionally recorded as [`Status`] entries tagged with the active
/// stage. Fatal- and skip-class calls never return.
pub struct Td<'a> {
    pub(crate) host: &'a dyn Reporter,
    pub(crate) stage: LifecycleStage,
    pub(crate) fatal: bool,
    pub(crate) statuses: Vec<Status>,
    pub(crate) timings: BTreeMap<LifecycleStage, Timing>,
    pub(crate) actual_name: Option<String>,
    pub(crate) deferred: DeferStack<'a>,
}

impl<'a> Td<'a> {
    pub(crate) fn new(host: &'a dyn Reporter, deferred: DeferStack<'a>) -> Self {
        Td {
            host,
            stage: LifecycleStage::TestSetup,
            fatal: false,
            statuses: Vec::new(),
            timings: BTreeMap::new(),
            actual_name: None,
            deferred,
        }
    }

    /// The stage currently executing.
    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }

    /// Statuses recorded so far, oldest first.
    pub fn statuses(&self) -> &[Status] {
        &self.statuses
    }

    /// Whether a fatal-class report has been made.
    pub fn is_fatal(&self) -> bool {
        self.fatal
    }

    // Error-class

    /// Record a failure and keep going.
    pub fn error(&mut self, message: impl fmt::Display) {
        self.host.helper();
        self.record(Status::fail(self.stage, false));
        self.host.error(&message.to_string());
    }

    pub fn errorf(&mut self, args: fmt::Arguments<'_>) {
        self.error(args);
    }

    /// Mark the test failed without a message and keep going.
    pub fn fail(&mut self) {
        self.record(Status::fail(self.stage, false));
        self.host.fail();
    }

    // Fatal-class

    /// Record a failure and abort the test.
    pub fn fatal(&mut self, message: impl fmt::Display) -> ! {
        self.host.helper();
        self.record_fatal();
        self.host.fatal(&message.to_string());
        Abort::Fatal.raise()
    }

    pub fn fatalf(&mut self, args: fmt::Arguments<'_>) -> ! {
        self.fatal(args)
    }

    /// Mark the test failed and abort it without a message.
    pub fn fail_now(&mut self) -> ! {
        self.record_fatal();
        self.host.fail();
        Abort::Fatal.raise()
    }

    // Skip-class

    /// Record a skip and abort the test. The fatal flag is untouched.
    pub fn skip(&mut self, message: impl fmt::Display) -> ! {
        self.record(Status::skip(self.stage));
        self.host.skip(&message.to_string());
        Abort::Skip.raise()
    }

    pub fn skipf(&mut self, args: fmt::Arguments<'_>) -> ! {
        self.skip(args)
    }

    pub fn skip_now(&mut self) -> ! {
        self.skip("")
    }

    // Pass-through

    pub fn log(&self, message: impl fmt::Display) {
        self.host.log(&message.to_string());
    }

    pub fn logf(&self, args: fmt::Arguments<'_>) {
        self.log(args);
    }

    /// The test's name, with any match tag stripped.
    pub fn name(&self) -> &str {
        self.actual_name
            .as_deref()
            .unwrap_or_else(|| self.host.name())
    }

    pub fn failed(&self) -> bool {
        self.host.failed()
    }

    pub fn skipped(&self) -> bool {
        self.host.skipped()
    }

    pub fn helper(&self) {
        self.host.helper();
    }

    pub fn parallel(&self) {
        self.host.parallel();
    }

    /// Register a cleanup call to run after `After`, most recent first.
    pub fn defer(&mut self, f: impl FnOnce() + 'a) {
        self.deferred.defer(f);
    }

    pub(crate) fn record(&mut self, status: Status) {
        tracing::debug!(stage = %self.stage, %status, "status recorded");
        self.statuses.push(status);
    }

    pub(crate) fn record_fatal(&mut self) {
        self.record(Status::fail(self.stage, true));
        self.fatal = true;
    }
}

impl fmt::Debug for Td<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Td")
            .field("name", &self.name())
            .field("stage", &self.stage)
            .field("fatal", &self.fatal)
            .field("statuses", &self.statuses)
            .finish_non_exhaustive()
    }
}
