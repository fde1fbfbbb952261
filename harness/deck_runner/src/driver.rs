//! The underlying test driver capability.

use std::sync::Arc;

use deck_lifecycle::{Reporter, StatisticsSink};

use crate::capture::Console;
use crate::error::RunnerError;
use crate::event::EventRouter;

/// A test body, called with the host reporter for that test.
pub type Entrypoint = Arc<dyn Fn(&dyn Reporter) + Send + Sync>;

/// One registered test.
#[derive(Clone)]
pub struct TestEntry {
    pub name: String,
    pub entrypoint: Entrypoint,
}

impl TestEntry {
    pub fn new(name: impl Into<String>, entrypoint: impl Fn(&dyn Reporter) + Send + Sync + 'static) -> Self {
        TestEntry {
            name: name.into(),
            entrypoint: Arc::new(entrypoint),
        }
    }
}

impl std::fmt::Debug for TestEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// What a driver hands to the host reporters it creates.
#[derive(Clone)]
pub struct RunContext {
    /// Where test output goes.
    pub console: Console,
    /// Where finished statistics records go.
    pub sink: Option<Arc<dyn StatisticsSink>>,
    /// Progress events.
    pub events: Arc<EventRouter>,
}

impl RunContext {
    /// A context that prints to stdout and collects nothing.
    pub fn detached() -> Self {
        RunContext {
            console: Console::stdout(),
            sink: None,
            events: Arc::new(EventRouter::new()),
        }
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("console", &self.console)
            .field("sink", &self.sink.is_some())
            .field("events", &self.events)
            .finish()
    }
}

/// Something that knows the registered tests and how to execute them.
pub trait Driver: Send + Sync {
    /// All registered tests, in registration order.
    fn enumerate(&self) -> Result<Vec<TestEntry>, RunnerError>;

    /// Execute `tests` and return a process exit code: 0 when every test
    /// passed.
    fn run(&self, tests: Vec<TestEntry>, ctx: &RunContext) -> i32;
}
