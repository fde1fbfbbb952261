use super::*;
use crate::capture::{pipe, Capture, Tee};
use deck_lifecycle::TestCase;
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

fn run_captured(registry: &Registry, ctx: &RunContext) -> (i32, String) {
    let (writer, reader) = pipe();
    let capture = Capture::start(reader, Tee::default()).unwrap();
    let code = {
        let _guard = ctx.console.redirect(writer);
        registry.run(registry.enumerate().unwrap(), ctx)
    };
    (code, capture.finish())
}

fn position(output: &str, needle: &str) -> usize {
    output
        .find(needle)
        .unwrap_or_else(|| panic!("`{needle}` not in output:\n{output}"))
}

#[test]
fn empty_log_prints_blank_indented_line() {
    let mut registry = Registry::new();
    registry.add("TestBlank", |t| {
        t.log("");
        t.log("after blank");
    });

    let (_, output) = run_captured(&registry, &RunContext::detached());

    assert!(
        output.contains("=== RUN   TestBlank\n    \n    after blank\n"),
        "{output:?}"
    );
}

#[test]
fn sequential_tests_run_in_order() {
    let mut registry = Registry::new();
    registry
        .add("TestFirst", |t| t.log("first body"))
        .add("TestSecond", |t| t.log("second body"));

    let (code, output) = run_captured(&registry, &RunContext::detached());

    assert_eq!(code, 0);
    let lines: Vec<&str> = output
        .lines()
        .map(|l| l.split(" (").next().unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![
            "=== RUN   TestFirst",
            "    first body",
            "--- PASS: TestFirst",
            "=== RUN   TestSecond",
            "    second body",
            "--- PASS: TestSecond",
            "PASS",
        ]
    );
}

#[test]
fn failure_sets_exit_code() {
    let mut registry = Registry::new();
    registry
        .add("TestGood", |_| {})
        .add("TestBad", |t| t.error("expected 200, got 500"));

    let (code, output) = run_captured(&registry, &RunContext::detached());

    assert_eq!(code, 1);
    assert!(output.contains("--- PASS: TestGood"));
    assert!(output.contains("    expected 200, got 500\n--- FAIL: TestBad"));
    assert!(output.ends_with("FAIL\n"));
}

#[test]
fn skip_is_not_a_failure() {
    let mut registry = Registry::new();
    registry.add("TestLater", |t| t.skip("not ready"));

    let (code, output) = run_captured(&registry, &RunContext::detached());

    assert_eq!(code, 0);
    assert!(output.contains("    not ready\n--- SKIP: TestLater"));
}

#[test]
fn panic_fails_only_that_test() {
    let mut registry = Registry::new();
    registry
        .add("TestPanics", |_| panic!("index out of bounds"))
        .add("TestFine", |_| {});

    let (code, output) = run_captured(&registry, &RunContext::detached());

    assert_eq!(code, 1);
    assert!(output.contains("    panic: index out of bounds\n--- FAIL: TestPanics"));
    assert!(output.contains("--- PASS: TestFine"));
}

#[test]
fn parallel_tests_wait_for_sequential_ones() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut registry = Registry::new();
    let seen = Arc::clone(&order);
    registry.add("TestParallel", move |t| {
        t.parallel();
        seen.lock().push("parallel");
    });
    let seen = Arc::clone(&order);
    registry.add("TestSequential", move |_| seen.lock().push("sequential"));

    let (code, output) = run_captured(&registry, &RunContext::detached());

    assert_eq!(code, 0);
    assert_eq!(*order.lock(), vec!["sequential", "parallel"]);
    assert!(position(&output, "=== PAUSE TestParallel") < position(&output, "=== RUN   TestSequential"));
    assert!(position(&output, "--- PASS: TestSequential") < position(&output, "=== CONT  TestParallel"));
}

#[test]
fn parallel_tests_respect_max_parallel() {
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let mut registry = Registry::new().with_max_parallel(2);
    for i in 0..6 {
        let current = Arc::clone(&current);
        let peak = Arc::clone(&peak);
        registry.add(format!("TestParallel{i}"), move |t| {
            t.parallel();
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            current.fetch_sub(1, Ordering::SeqCst);
        });
    }

    let (code, _) = run_captured(&registry, &RunContext::detached());

    assert_eq!(code, 0);
    assert_eq!(registry.max_parallel(), 2);
    let peak = peak.load(Ordering::SeqCst);
    assert!((1..=2).contains(&peak), "peak concurrency {peak}");
}

#[test]
fn lifecycle_tests_reach_the_sink() {
    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);
    impl StatisticsSink for Collect {
        fn add_statistics(&self, stats: deck_model::Statistics) {
            self.0.lock().push(stats.name);
        }
    }

    let sink = Arc::new(Collect::default());
    let ctx = RunContext {
        sink: Some(sink.clone()),
        ..RunContext::detached()
    };
    let mut registry = Registry::new();
    registry
        .add("TestA", |t| {
            deck_lifecycle::test(t, TestCase::new().act(|td| td.log("acting")));
        })
        .add("TestB", |t| {
            deck_lifecycle::test(t, TestCase::new().assert(|td| td.fatal("nope")));
        });

    let (code, output) = run_captured(&registry, &ctx);

    assert_eq!(code, 1);
    let mut names = sink.0.lock().clone();
    names.sort();
    assert_eq!(names, vec!["TestA", "TestB"]);
    assert!(output.contains("=== PAUSE TestA"));
    assert!(output.contains("    nope\n--- FAIL: TestB"));
}

#[test]
fn duplicate_names_fail_enumeration() {
    let mut registry = Registry::new();
    registry.add("TestSame", |_| {}).add("TestSame", |_| {});

    let err = registry.enumerate().unwrap_err();

    assert!(matches!(err, RunnerError::Introspection { .. }));
    assert!(err.to_string().contains("TestSame"));
}

#[test]
fn names_in_registration_order() {
    let mut registry = Registry::default();
    assert!(registry.is_empty());
    registry.add("B", |_| {}).add("A", |_| {});

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.names().collect::<Vec<_>>(), vec!["B", "A"]);
}

#[test]
fn tagged_names_make_valid_thread_names() {
    assert_eq!(thread_name("^A\0TestA"), "test:^A/TestA");
}

#[test]
fn semaphore_blocks_at_capacity() {
    let semaphore = Semaphore::new(1);
    let held = semaphore.acquire();
    let acquired = AtomicUsize::new(0);

    thread::scope(|scope| {
        scope.spawn(|| {
            let _permit = semaphore.acquire();
            acquired.store(1, Ordering::SeqCst);
        });
        thread::sleep(Duration::from_millis(20));
        assert_eq!(acquired.load(Ordering::SeqCst), 0);
        drop(held);
    });

    assert_eq!(acquired.load(Ordering::SeqCst), 1);
}
