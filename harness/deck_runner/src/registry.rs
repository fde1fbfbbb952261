//! Explicit-registration test driver.
//!
//! [`Registry`] is the native test loop: tests are registered by name and
//! run the way a conventional harness runs them.
//!
//! - Tests start one at a time in registration order, each on its own
//!   thread.
//! - A test that calls `parallel()` pauses and lets the loop move on. Paused
//!   tests resume once every test has been started, at most
//!   `max_parallel` at a time.
//! - A panic that escapes a test body fails that test only.
//!
//! Console format:
//!
//! ```text
//! === RUN   TestLogin
//! === PAUSE TestLogin
//! === RUN   TestSignup
//!     signup log line
//! --- PASS: TestSignup (0.01s)
//! === CONT  TestLogin
//! --- FAIL: TestLogin (0.20s)
//! FAIL
//! ```

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam::channel::{self, Receiver, Sender};
use deck_lifecycle::{Reporter, StatisticsSink};
use parking_lot::{Condvar, Mutex};

use crate::driver::{Driver, RunContext, TestEntry};
use crate::error::RunnerError;

/// Stack size for test threads. Stage callbacks run several frames deep
/// inside unwinding guards.
pub const DEFAULT_STACK_SIZE: usize = 16 * 1024 * 1024;

/// A list of named tests plus the settings of the loop that runs them.
pub struct Registry {
    tests: Vec<TestEntry>,
    max_parallel: usize,
    stack_size: usize,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            tests: Vec::new(),
            max_parallel: rayon::current_num_threads().max(1),
            stack_size: DEFAULT_STACK_SIZE,
        }
    }

    /// Register a test. Names must be unique.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        entrypoint: impl Fn(&dyn Reporter) + Send + Sync + 'static,
    ) -> &mut Self {
        self.tests.push(TestEntry::new(name, entrypoint));
        self
    }

    /// Bound on how many parallel tests run at once. Clamped to at least 1.
    #[must_use]
    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel.max(1);
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tests.iter().map(|t| t.name.as_str())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tests", &self.tests.len())
            .field("max_parallel", &self.max_parallel)
            .field("stack_size", &self.stack_size)
            .finish()
    }
}

impl Driver for Registry {
    fn enumerate(&self) -> Result<Vec<TestEntry>, RunnerError> {
        let mut seen = HashSet::new();
        for test in &self.tests {
            if !seen.insert(test.name.as_str()) {
                return Err(RunnerError::Introspection {
                    reason: format!("test `{}` is registered more than once", test.name),
                });
            }
        }
        Ok(self.tests.clone())
    }

    fn run(&self, tests: Vec<TestEntry>, ctx: &RunContext) -> i32 {
        let started = Instant::now();
        let semaphore = Semaphore::new(self.max_parallel);
        // Never sent on: paused tests resume when the sender drops.
        let (release, released) = channel::bounded::<()>(0);
        let mut failed = false;

        thread::scope(|scope| {
            let mut running = Vec::with_capacity(tests.len());
            for test in tests {
                let (paused, paused_rx) = channel::bounded::<()>(1);
                let gate = Gate {
                    paused: Some(paused),
                    released: released.clone(),
                    semaphore: &semaphore,
                    permit: None,
                };
                let name = test.name.clone();
                let spawned = thread::Builder::new()
                    .name(thread_name(&name))
                    .stack_size(self.stack_size)
                    .spawn_scoped(scope, move || run_test(&test, ctx, gate));
                match spawned {
                    Ok(handle) => {
                        // Returns once the test pauses or finishes.
                        let _ = paused_rx.recv();
                        running.push((name, handle));
                    }
                    Err(err) => {
                        ctx.console.line(&format!("--- FAIL: {name} (0.00s)"));
                        ctx.console.line(&format!("    could not start test thread: {err}"));
                        failed = true;
                    }
                }
            }

            drop(release);

            for (name, handle) in running {
                match handle.join() {
                    Ok(passed) => failed |= !passed,
                    Err(_) => {
                        tracing::warn!(%name, "test thread panicked outside its body");
                        failed = true;
                    }
                }
            }
        });

        ctx.console.line(if failed { "FAIL" } else { "PASS" });
        tracing::debug!(elapsed = ?started.elapsed(), failed, "registry run finished");
        i32::from(failed)
    }
}

fn thread_name(test: &str) -> String {
    format!("test:{}", test.replace('\0', "/"))
}

fn run_test(test: &TestEntry, ctx: &RunContext, gate: Gate<'_>) -> bool {
    let host = HostT::new(&test.name, ctx, gate);
    ctx.console.line(&format!("=== RUN   {}", test.name));

    if let Err(payload) = catch_unwind(AssertUnwindSafe(|| (test.entrypoint)(&host))) {
        let message = deck_defer::panic_message(payload.as_ref());
        Reporter::fatal(&host, &format!("panic: {message}"));
    }
    host.finish()
}

/// Scheduling handles of one test.
struct Gate<'s> {
    paused: Option<Sender<()>>,
    released: Receiver<()>,
    semaphore: &'s Semaphore,
    permit: Option<Permit<'s>>,
}

/// The reporter a registered test runs against.
struct HostT<'r> {
    name: String,
    ctx: &'r RunContext,
    failed: Cell<bool>,
    skipped: Cell<bool>,
    start: Cell<Instant>,
    gate: RefCell<Gate<'r>>,
}

impl<'r> HostT<'r> {
    fn new(name: &str, ctx: &'r RunContext, gate: Gate<'r>) -> Self {
        HostT {
            name: name.to_owned(),
            ctx,
            failed: Cell::new(false),
            skipped: Cell::new(false),
            start: Cell::new(Instant::now()),
            gate: RefCell::new(gate),
        }
    }

    fn log_lines(&self, message: &str) {
        if message.is_empty() {
            self.ctx.console.line("    ");
            return;
        }
        for line in message.lines() {
            self.ctx.console.line(&format!("    {line}"));
        }
    }

    /// Print the verdict and give back the parallel slot.
    fn finish(&self) -> bool {
        let secs = self.start.get().elapsed().as_secs_f64();
        let (verdict, passed) = if self.failed.get() {
            ("FAIL", false)
        } else if self.skipped.get() {
            ("SKIP", true)
        } else {
            ("PASS", true)
        };
        self.ctx
            .console
            .line(&format!("--- {verdict}: {} ({secs:.2}s)", self.name));
        self.gate.borrow_mut().permit = None;
        passed
    }
}

impl Reporter for HostT<'_> {
    fn error(&self, message: &str) {
        self.log_lines(message);
        self.failed.set(true);
    }

    fn fatal(&self, message: &str) {
        self.log_lines(message);
        self.failed.set(true);
    }

    fn skip(&self, message: &str) {
        self.log_lines(message);
        self.skipped.set(true);
    }

    fn fail(&self) {
        self.failed.set(true);
    }

    fn log(&self, message: &str) {
        self.log_lines(message);
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn failed(&self) -> bool {
        self.failed.get()
    }

    fn skipped(&self) -> bool {
        self.skipped.get()
    }

    fn parallel(&self) {
        let mut gate = self.gate.borrow_mut();
        let Some(paused) = gate.paused.take() else {
            tracing::warn!(name = %self.name, "parallel() called more than once");
            return;
        };
        self.ctx.console.line(&format!("=== PAUSE {}", self.name));
        let _ = paused.send(());
        drop(paused);

        // Disconnects once every test has been started.
        let _ = gate.released.recv();
        let permit = gate.semaphore.acquire();
        gate.permit = Some(permit);

        self.ctx.console.line(&format!("=== CONT  {}", self.name));
        self.start.set(Instant::now());
    }

    fn sink(&self) -> Option<Arc<dyn StatisticsSink>> {
        self.ctx.sink.clone()
    }

    fn log_event(&self, message: &str) {
        self.ctx.events.log(message);
    }
}

/// Counting semaphore bounding concurrently running parallel tests.
struct Semaphore {
    count: Mutex<usize>,
    condvar: Condvar,
    max: usize,
}

impl Semaphore {
    fn new(max: usize) -> Self {
        Semaphore {
            count: Mutex::new(0),
            condvar: Condvar::new(),
            max,
        }
    }

    /// Block until a slot is free. The slot is held until the permit drops.
    fn acquire(&self) -> Permit<'_> {
        let mut count = self.count.lock();
        while *count >= self.max {
            self.condvar.wait(&mut count);
        }
        *count += 1;
        Permit { semaphore: self }
    }

    fn release(&self) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(1);
        self.condvar.notify_one();
    }
}

struct Permit<'s> {
    semaphore: &'s Semaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests;
