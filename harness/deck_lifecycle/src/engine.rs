//! Drives one test case through its lifecycle.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Instant, SystemTime};

use deck_model::{LifecycleStage, Statistics, Status, Timing};

use crate::abort::Abort;
use crate::case::{StageFn, TestCase};
use crate::context::Td;
use crate::name_tag;
use crate::reporter::Reporter;

/// Per-invocation options.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TestConfig {
    /// Run this test sequentially instead of asking the host for parallel
    /// scheduling.
    pub parallel_off: bool,
}

/// Run `case` against `host` with the default configuration.
///
/// See [`test_with`].
pub fn test<'a>(host: &'a dyn Reporter, case: TestCase<'a>) -> Option<Statistics> {
    test_with(host, case, TestConfig::default())
}

/// Run `case` against `host`.
///
/// Returns the statistics record, which has also been handed to the host's
/// sink if it has one. Returns `None` only when the host name carries a
/// match tag that this test does not satisfy; nothing runs in that case.
pub fn test_with<'a>(
    host: &'a dyn Reporter,
    case: TestCase<'a>,
    config: TestConfig,
) -> Option<Statistics> {
    let decoded = name_tag::decode(host.name());
    let start = SystemTime::now();
    host.log_event(&format!("Instantiating: {}", decoded.name));

    let TestCase {
        arrange,
        act,
        assert,
        after,
        deferred,
    } = case;
    let mut td = Td::new(host, deferred);

    if !config.parallel_off {
        td.parallel();
    }

    if decoded.tagged {
        if !decoded.matched {
            host.log_event("(match workaround) test not in tagged set; skipping");
            return None;
        }
        td.actual_name = Some(decoded.name.to_owned());
    }

    let span = tracing::debug_span!("test", name = %td.name());
    let _guard = span.enter();

    let mut arrange_complete = false;
    if td.run_stage(LifecycleStage::Arrange, arrange) {
        arrange_complete = true;
        if td.run_stage(LifecycleStage::Act, act) {
            td.run_stage(LifecycleStage::Assert, assert);
        }
    }

    Some(td.finish(after, arrange_complete, start))
}

impl<'a> Td<'a> {
    /// Run one stage. Returns false if the stage was aborted.
    fn run_stage(&mut self, stage: LifecycleStage, callback: Option<StageFn<'a>>) -> bool {
        self.stage = stage;
        let _guard = tracing::debug_span!("stage", %stage).entered();

        let start = SystemTime::now();
        let clock = Instant::now();
        let mut started = false;
        let mut ended = false;
        if let Some(callback) = callback {
            started = true;
            match catch_unwind(AssertUnwindSafe(|| callback(self))) {
                Ok(()) => ended = true,
                Err(payload) => self.absorb(payload),
            }
        }
        let duration = clock.elapsed();

        self.timings.insert(
            stage,
            Timing {
                stage,
                start,
                end: start + duration,
                duration,
                started,
                ended,
            },
        );
        ended || !started
    }

    /// Account for an unwind out of a stage callback.
    ///
    /// Aborts have already been recorded by the call that raised them. Any
    /// other panic is recorded here as a fatal failure of the active stage.
    fn absorb(&mut self, payload: Box<dyn Any + Send>) {
        match Abort::from_payload(payload) {
            Ok(abort) => {
                tracing::debug!(stage = %self.stage, ?abort, "stage aborted");
            }
            Err(payload) => {
                let message = deck_defer::panic_message(payload.as_ref());
                tracing::debug!(stage = %self.stage, %message, "stage panicked");
                self.record_fatal();
                self.host.fatal(&format!("panicked: {message}"));
            }
        }
    }

    /// The guaranteed cleanup: After, final status, deferred calls, and the
    /// statistics record.
    fn finish(
        mut self,
        after: Option<StageFn<'a>>,
        arrange_complete: bool,
        start: SystemTime,
    ) -> Statistics {
        let end = SystemTime::now();
        let duration = end.duration_since(start).unwrap_or_default();

        let skipped = self.skipped() || self.statuses.iter().any(Status::is_skip);
        if !skipped || arrange_complete {
            self.run_stage(LifecycleStage::After, after);
        }
        self.stage = LifecycleStage::TestFinished;

        if self.statuses.is_empty() {
            self.record(Status::pass(self.stage));
        } else {
            self.record(Status::fail(self.stage, self.fatal));
        }

        let panics = self.deferred.run_all();
        if !panics.is_empty() {
            for message in &panics {
                self.host.fatal(&format!("deferred call panicked: {message}"));
            }
            // The final status already went in; a panicking cleanup turns it
            // into a fatal failure.
            self.fatal = true;
            if let Some(last) = self.statuses.last_mut() {
                *last = Status::fail(self.stage, true);
            }
        }

        let finished = SystemTime::now();
        for stage in LifecycleStage::TIMED {
            self.timings
                .entry(stage)
                .or_insert_with(|| Timing::not_run(stage, finished));
        }

        let stats = Statistics {
            name: self.name().to_owned(),
            failed: self.failed(),
            fatal: self.fatal,
            statuses: std::mem::take(&mut self.statuses),
            timings: std::mem::take(&mut self.timings),
            start,
            end,
            duration,
            output: String::new(),
        };
        tracing::debug!(
            name = %stats.name,
            failed = stats.failed,
            fatal = stats.fatal,
            "test finished"
        );

        if let Some(sink) = self.host.sink() {
            sink.add_statistics(stats.clone());
        }
        stats
    }
}
