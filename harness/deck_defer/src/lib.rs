//! Deferred cleanup calls for test cases.
//!
//! A [`DeferStack`] collects no-argument callbacks while a test case runs and
//! invokes them in reverse registration order once the lifecycle has
//! finished, after the `After` stage.
//!
//! ```text
//! let mut stack = DeferStack::new();
//! stack.defer(|| close_connection());
//! stack.defer(|| drop_table());
//! stack.run_all(); // drop_table, then close_connection
//! ```
//!
//! Callbacks registered after a test was aborted are never seen here: the
//! registering code simply never runs. Everything registered before the
//! abort still runs.

use std::panic::{catch_unwind, AssertUnwindSafe};

type Deferred<'a> = Box<dyn FnOnce() + 'a>;

/// LIFO registry of cleanup callbacks owned by one test case.
#[derive(Default)]
pub struct DeferStack<'a> {
    calls: Vec<Deferred<'a>>,
}

impl<'a> DeferStack<'a> {
    pub fn new() -> Self {
        DeferStack { calls: Vec::new() }
    }

    /// Push a callback to run later.
    pub fn defer(&mut self, f: impl FnOnce() + 'a) {
        self.calls.push(Box::new(f));
    }

    /// Number of callbacks waiting to run.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Run every registered callback, most recent first.
    ///
    /// The stack is drained, so each callback runs at most once. A callback
    /// that panics does not stop the remaining ones. Returns the messages
    /// of the callbacks that panicked, in the order they ran.
    pub fn run_all(&mut self) -> Vec<String> {
        let mut panics = Vec::new();
        while let Some(call) = self.calls.pop() {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(call)) {
                let message = panic_message(payload.as_ref());
                tracing::warn!(
                    remaining = self.calls.len(),
                    "deferred call panicked: {message}"
                );
                panics.push(message);
            }
        }
        panics
    }
}

impl std::fmt::Debug for DeferStack<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferStack")
            .field("len", &self.calls.len())
            .finish()
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    }
}
