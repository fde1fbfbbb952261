//! The run-wide controller.

use std::io::{self, Write};
use std::sync::Arc;

use deck_lifecycle::{name_tag, StatisticsSink};
use deck_model::Statistics;
use parking_lot::Mutex;
use regex::Regex;

use crate::capture::{pipe, Capture, Console, Tee};
use crate::config::RunnerConfig;
use crate::driver::{Driver, RunContext, TestEntry};
use crate::error::RunnerError;
use crate::event::{EventLogger, EventRouter, EventWriter};

/// Mutex-guarded list of statistics records.
///
/// This is the sink test hosts deliver to; many test threads add to it at
/// once.
#[derive(Debug, Default)]
pub struct StatisticsStore {
    records: Mutex<Vec<Statistics>>,
}

impl StatisticsStore {
    pub fn snapshot(&self) -> Vec<Statistics> {
        self.records.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }

    pub fn any_failed(&self) -> bool {
        self.records.lock().iter().any(|s| s.failed)
    }

    /// Copy `output` into every record from index `from` on.
    fn fill_output(&self, from: usize, output: &str) {
        let mut records = self.records.lock();
        let from = from.min(records.len());
        for record in &mut records[from..] {
            record.output = output.to_owned();
        }
    }
}

impl StatisticsSink for StatisticsStore {
    fn add_statistics(&self, stats: Statistics) {
        self.records.lock().push(stats);
    }
}

#[derive(Clone, Debug)]
struct Filter {
    pattern: String,
    re: Regex,
}

impl Filter {
    fn compile(pattern: &str) -> Result<Self, RunnerError> {
        let re = Regex::new(pattern).map_err(|source| RunnerError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Filter {
            pattern: pattern.to_owned(),
            re,
        })
    }
}

#[derive(Debug)]
struct State {
    filter: Option<Filter>,
    output: String,
    print_to_stdout: bool,
    print_output_to_event_log: bool,
    match_workaround: bool,
}

/// Runs a driver's tests with filtering, output capture and statistics
/// aggregation.
///
/// All operations take `&self`; an orchestrator can be shared between the
/// thread driving the run and the tests reporting into it.
pub struct Orchestrator {
    driver: Box<dyn Driver>,
    stats: Arc<StatisticsStore>,
    events: Arc<EventRouter>,
    console: Console,
    state: Mutex<State>,
}

impl Orchestrator {
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self::from_parts(Box::new(driver), &RunnerConfig::default(), None)
    }

    /// Create an orchestrator with `config` applied.
    ///
    /// Fails with [`RunnerError::InvalidPattern`] if the configured filter
    /// does not compile.
    pub fn with_config(driver: impl Driver + 'static, config: &RunnerConfig) -> Result<Self, RunnerError> {
        let filter = config.filter.as_deref().map(Filter::compile).transpose()?;
        Ok(Self::from_parts(Box::new(driver), config, filter))
    }

    fn from_parts(driver: Box<dyn Driver>, config: &RunnerConfig, filter: Option<Filter>) -> Self {
        Orchestrator {
            driver,
            stats: Arc::new(StatisticsStore::default()),
            events: Arc::new(EventRouter::new()),
            console: Console::stdout(),
            state: Mutex::new(State {
                filter,
                output: String::new(),
                print_to_stdout: config.print_to_stdout,
                print_output_to_event_log: config.print_output_to_event_log,
                match_workaround: config.match_workaround,
            }),
        }
    }

    /// Run the driver's tests once.
    ///
    /// Enumerates the tests, applies the filter, captures everything
    /// written to the console while the driver runs, and copies the
    /// captured output into every record produced by this run. Returns the
    /// driver's exit code.
    ///
    /// Only output written through the [`Console`] is captured, which
    /// includes everything a test reports through its `Td` or `Reporter`.
    /// `println!` and other direct writes to the process stdout bypass the
    /// capture and never reach `Statistics::output`.
    pub fn run(&self) -> Result<i32, RunnerError> {
        let tests = self.driver.enumerate()?;

        let (filter, workaround, print_to_stdout, print_to_events) = {
            let state = self.state.lock();
            (
                state.filter.clone(),
                state.match_workaround,
                state.print_to_stdout,
                state.print_output_to_event_log,
            )
        };
        let total = tests.len();
        let tests = select(tests, filter.as_ref(), workaround);
        tracing::debug!(total, selected = tests.len(), "starting run");

        let first_record = self.stats.len();
        let ctx = RunContext {
            console: self.console.clone(),
            sink: Some(Arc::clone(&self.stats) as Arc<dyn StatisticsSink>),
            events: Arc::clone(&self.events),
        };
        let tee = Tee {
            stdout: print_to_stdout,
            events: print_to_events.then(|| EventWriter::new(Arc::clone(&self.events))),
        };

        let (writer, reader) = pipe();
        let (code, mut output) = match Capture::start(reader, tee) {
            Ok(capture) => {
                let code = {
                    let _restore = self.console.redirect(writer);
                    self.driver.run(tests, &ctx)
                };
                (code, capture.finish())
            }
            Err(err) => {
                tracing::warn!(%err, "output capture issue: running without capture");
                drop(writer);
                (self.driver.run(tests, &ctx), String::new())
            }
        };

        if let Some(filter) = filter.as_ref().filter(|_| workaround) {
            output = name_tag::strip_tags(&output, &filter.pattern);
        }

        self.stats.fill_output(first_record, &output);
        self.state.lock().output = output;
        tracing::debug!(code, "run finished");
        Ok(code)
    }

    pub fn add_statistics(&self, stats: Statistics) {
        self.stats.add_statistics(stats);
    }

    /// Every record accumulated so far.
    pub fn statistics(&self) -> Vec<Statistics> {
        self.stats.snapshot()
    }

    pub fn clear_statistics(&self) {
        self.stats.clear();
    }

    /// The sink this orchestrator collects into.
    pub fn sink(&self) -> Arc<dyn StatisticsSink> {
        Arc::clone(&self.stats) as Arc<dyn StatisticsSink>
    }

    /// Only run tests whose name matches `pattern` from the next run on.
    ///
    /// An invalid pattern leaves the current filter in place.
    pub fn match_pattern(&self, pattern: &str) -> Result<(), RunnerError> {
        let filter = Filter::compile(pattern)?;
        self.state.lock().filter = Some(filter);
        Ok(())
    }

    /// The active filter pattern, if any.
    pub fn pattern(&self) -> Option<String> {
        self.state.lock().filter.as_ref().map(|f| f.pattern.clone())
    }

    pub fn print_to_stdout(&self, yes: bool) {
        self.state.lock().print_to_stdout = yes;
    }

    pub fn print_output_to_event_log(&self, yes: bool) {
        self.state.lock().print_output_to_event_log = yes;
    }

    /// Filter by tagging names instead of dropping tests. See
    /// [`name_tag`] for the caveats.
    pub fn set_match_workaround(&self, yes: bool) {
        self.state.lock().match_workaround = yes;
    }

    pub fn set_event_logger(&self, logger: Option<Arc<dyn EventLogger>>) {
        self.events.set_logger(logger);
    }

    pub fn log_event(&self, message: &str) {
        self.events.log(message);
    }

    /// Debug dump: one `index failed name` line per record.
    pub fn report_statistics(&self, out: &mut impl Write) -> io::Result<()> {
        for (i, stats) in self.stats.snapshot().iter().enumerate() {
            writeln!(out, "{i} {} {}", stats.failed, stats.name)?;
        }
        Ok(())
    }

    /// True iff no accumulated record failed.
    pub fn passed(&self) -> bool {
        !self.stats.any_failed()
    }

    /// Output captured by the most recent run.
    pub fn output(&self) -> String {
        self.state.lock().output.clone()
    }

    pub fn console(&self) -> &Console {
        &self.console
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("records", &self.stats.len())
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

/// Apply `filter` to `tests`.
///
/// With the match workaround the tests are all kept and renamed to carry
/// the pattern instead; a match-everything pattern needs no tagging.
fn select(tests: Vec<TestEntry>, filter: Option<&Filter>, workaround: bool) -> Vec<TestEntry> {
    let Some(filter) = filter else {
        return tests;
    };
    if workaround && filter.pattern != ".*" {
        return tests
            .into_iter()
            .map(|mut test| {
                test.name = name_tag::encode(&filter.pattern, &test.name);
                test
            })
            .collect();
    }
    tests
        .into_iter()
        .filter(|test| filter.re.is_match(&test.name))
        .collect()
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
