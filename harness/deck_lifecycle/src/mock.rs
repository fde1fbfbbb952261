//! Recording host for unit tests.

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use deck_model::Statistics;
use parking_lot::Mutex;

use crate::reporter::{Reporter, StatisticsSink};

/// A [`Reporter`] that records every call it receives.
///
/// Failure and skip state follow the calls the way a real host would, and
/// can be preset to test the pass-through of the query methods.
#[derive(Default)]
pub(crate) struct MockReporter {
    name: String,
    calls: RefCell<Vec<(&'static str, String)>>,
    failed: Cell<bool>,
    skipped: Cell<bool>,
    sink: Option<Arc<CollectingSink>>,
}

impl MockReporter {
    pub(crate) fn new() -> Self {
        MockReporter::default()
    }

    pub(crate) fn named(name: &str) -> Self {
        MockReporter {
            name: name.to_owned(),
            ..MockReporter::default()
        }
    }

    pub(crate) fn with_sink(mut self, sink: Arc<CollectingSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub(crate) fn preset(&self, failed: bool, skipped: bool) {
        self.failed.set(failed);
        self.skipped.set(skipped);
    }

    /// How many times `method` was called.
    pub(crate) fn count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|(m, _)| *m == method).count()
    }

    /// Arguments of every call to `method`, oldest first.
    pub(crate) fn messages(&self, method: &str) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|(m, _)| *m == method)
            .map(|(_, msg)| msg.clone())
            .collect()
    }

    fn call(&self, method: &'static str, message: &str) {
        self.calls.borrow_mut().push((method, message.to_owned()));
    }
}

impl Reporter for MockReporter {
    fn error(&self, message: &str) {
        self.call("error", message);
        self.failed.set(true);
    }

    fn fatal(&self, message: &str) {
        self.call("fatal", message);
        self.failed.set(true);
    }

    fn skip(&self, message: &str) {
        self.call("skip", message);
        self.skipped.set(true);
    }

    fn fail(&self) {
        self.call("fail", "");
        self.failed.set(true);
    }

    fn log(&self, message: &str) {
        self.call("log", message);
    }

    fn name(&self) -> &str {
        self.call("name", "");
        &self.name
    }

    fn failed(&self) -> bool {
        self.call("failed", "");
        self.failed.get()
    }

    fn skipped(&self) -> bool {
        self.call("skipped", "");
        self.skipped.get()
    }

    fn helper(&self) {
        self.call("helper", "");
    }

    fn parallel(&self) {
        self.call("parallel", "");
    }

    fn sink(&self) -> Option<Arc<dyn StatisticsSink>> {
        self.sink
            .clone()
            .map(|sink| sink as Arc<dyn StatisticsSink>)
    }

    fn log_event(&self, message: &str) {
        self.call("log_event", message);
    }
}

/// Sink that keeps every record it is given.
#[derive(Default)]
pub(crate) struct CollectingSink {
    records: Mutex<Vec<Statistics>>,
}

impl CollectingSink {
    pub(crate) fn records(&self) -> Vec<Statistics> {
        self.records.lock().clone()
    }
}

impl StatisticsSink for CollectingSink {
    fn add_statistics(&self, stats: Statistics) {
        self.records.lock().push(stats);
    }
}
