use super::*;
use crate::registry::Registry;
use crate::testing::RecordingLogger;
use deck_lifecycle::{StatisticsSink, TestCase};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rayon::prelude::*;
use std::time::{Duration, SystemTime};

/// Driver that prints each test name it is given.
struct EchoDriver {
    names: Vec<&'static str>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl Driver for EchoDriver {
    fn enumerate(&self) -> Result<Vec<TestEntry>, RunnerError> {
        Ok(self
            .names
            .iter()
            .map(|name| TestEntry::new(*name, |_| {}))
            .collect())
    }

    fn run(&self, tests: Vec<TestEntry>, ctx: &RunContext) -> i32 {
        for test in tests {
            ctx.console.line(&format!("ran {}", test.name));
            self.seen.lock().push(test.name);
        }
        0
    }
}

fn echo(names: &[&'static str]) -> (Orchestrator, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let driver = EchoDriver {
        names: names.to_vec(),
        seen: Arc::clone(&seen),
    };
    let orchestrator = Orchestrator::new(driver);
    orchestrator.print_to_stdout(false);
    (orchestrator, seen)
}

struct BrokenDriver;

impl Driver for BrokenDriver {
    fn enumerate(&self) -> Result<Vec<TestEntry>, RunnerError> {
        Err(RunnerError::Introspection {
            reason: "test list not found".to_owned(),
        })
    }

    fn run(&self, _: Vec<TestEntry>, _: &RunContext) -> i32 {
        unreachable!("nothing to run")
    }
}

struct PanickingDriver;

impl Driver for PanickingDriver {
    fn enumerate(&self) -> Result<Vec<TestEntry>, RunnerError> {
        Ok(vec![TestEntry::new("TestAny", |_| {})])
    }

    fn run(&self, _: Vec<TestEntry>, ctx: &RunContext) -> i32 {
        ctx.console.line("about to fail");
        panic!("driver crashed");
    }
}

fn record(name: &str, failed: bool) -> Statistics {
    let now = SystemTime::now();
    Statistics {
        name: name.to_owned(),
        failed,
        fatal: false,
        statuses: Vec::new(),
        timings: std::collections::BTreeMap::new(),
        start: now,
        end: now,
        duration: Duration::ZERO,
        output: String::new(),
    }
}

fn demo_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .add("TestLoginSucceeds", |t| {
            deck_lifecycle::test(t, TestCase::new().act(|td| td.log("logging in")));
        })
        .add("TestLoginRejected", |t| {
            deck_lifecycle::test(t, TestCase::new().assert(|td| td.error("wrong status")));
        })
        .add("TestLogout", |t| {
            deck_lifecycle::test(t, TestCase::new().act(|td| td.log("logging out")));
        });
    registry
}

#[test]
fn run_captures_output_into_this_runs_records() {
    let orchestrator = Orchestrator::new(demo_registry());
    orchestrator.print_to_stdout(false);
    orchestrator.add_statistics(record("Earlier", false));

    let code = orchestrator.run().unwrap();

    assert_eq!(code, 1);
    let output = orchestrator.output();
    assert!(output.contains("=== RUN   TestLoginSucceeds"));
    assert!(output.contains("    logging in"));
    assert!(output.contains("    wrong status\n--- FAIL: TestLoginRejected"));
    assert!(output.ends_with("FAIL\n"));

    let records = orchestrator.statistics();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0].name, "Earlier");
    assert_eq!(records[0].output, "");
    for stats in &records[1..] {
        assert_eq!(stats.output, output);
    }
    assert!(!orchestrator.console().is_redirected());
    assert!(!orchestrator.passed());
}

#[test]
fn filter_selects_matching_tests() {
    let orchestrator = Orchestrator::new(demo_registry());
    orchestrator.print_to_stdout(false);
    orchestrator.match_pattern("^TestLogin").unwrap();

    let code = orchestrator.run().unwrap();

    assert_eq!(code, 1);
    let mut names: Vec<String> = orchestrator.statistics().into_iter().map(|s| s.name).collect();
    names.sort();
    assert_eq!(names, vec!["TestLoginRejected", "TestLoginSucceeds"]);
    assert!(!orchestrator.output().contains("TestLogout"));
}

#[test]
fn invalid_pattern_keeps_previous_filter() {
    let (orchestrator, seen) = echo(&["TestA", "TestB"]);
    orchestrator.match_pattern("A$").unwrap();

    let err = orchestrator.match_pattern("bad[regex").unwrap_err();

    match &err {
        RunnerError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "bad[regex"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(orchestrator.pattern().as_deref(), Some("A$"));
    orchestrator.run().unwrap();
    assert_eq!(*seen.lock(), vec!["TestA"]);
}

#[test]
fn with_config_applies_toggles() {
    let config = RunnerConfig::new().filter("B").print_to_stdout(false);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let driver = EchoDriver {
        names: vec!["TestA", "TestB"],
        seen: Arc::clone(&seen),
    };

    let orchestrator = Orchestrator::with_config(driver, &config).unwrap();
    orchestrator.run().unwrap();

    assert_eq!(*seen.lock(), vec!["TestB"]);
    assert_eq!(orchestrator.output(), "ran TestB\n");
}

#[test]
fn with_config_rejects_bad_filter() {
    let config = RunnerConfig::new().filter("(");
    let err = Orchestrator::with_config(BrokenDriver, &config).unwrap_err();
    assert!(matches!(err, RunnerError::InvalidPattern { .. }));
}

#[test]
fn match_workaround_tags_names_and_strips_output() {
    let orchestrator = Orchestrator::new(demo_registry());
    orchestrator.print_to_stdout(false);
    orchestrator.set_match_workaround(true);
    orchestrator.match_pattern("^TestLogout$").unwrap();

    orchestrator.run().unwrap();

    let records = orchestrator.statistics();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "TestLogout");
    let output = orchestrator.output();
    assert!(!output.contains('\0'));
    assert!(output.contains("=== RUN   TestLoginSucceeds"));
    assert!(output.contains("    logging out"));
    assert!(!output.contains("logging in"));
}

#[test]
fn match_everything_pattern_skips_tagging() {
    let (orchestrator, seen) = echo(&["TestA", "TestB"]);
    orchestrator.set_match_workaround(true);
    orchestrator.match_pattern(".*").unwrap();

    orchestrator.run().unwrap();

    assert_eq!(*seen.lock(), vec!["TestA", "TestB"]);
}

#[test]
fn enumeration_failure_is_returned() {
    let orchestrator = Orchestrator::new(BrokenDriver);

    let err = orchestrator.run().unwrap_err();

    assert!(matches!(err, RunnerError::Introspection { .. }));
    assert_eq!(err.to_string(), "could not enumerate tests: test list not found");
    assert!(!orchestrator.console().is_redirected());
}

#[test]
fn console_restored_when_driver_panics() {
    let orchestrator = Orchestrator::new(PanickingDriver);
    orchestrator.print_to_stdout(false);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| orchestrator.run()));

    assert!(result.is_err());
    assert!(!orchestrator.console().is_redirected());
}

#[test]
fn concurrent_add_statistics_loses_nothing() {
    let (orchestrator, _) = echo(&[]);
    let n = 2_000;

    (0..n)
        .into_par_iter()
        .for_each(|i| orchestrator.add_statistics(record(&format!("Test{i}"), false)));

    assert_eq!(orchestrator.statistics().len(), n);
    assert!(orchestrator.passed());
}

#[test]
fn statistics_bookkeeping() {
    let (orchestrator, _) = echo(&[]);
    assert!(orchestrator.passed());

    orchestrator.add_statistics(record("TestA", false));
    orchestrator.add_statistics(record("TestB", true));
    let mut report = Vec::new();
    orchestrator.report_statistics(&mut report).unwrap();

    assert_eq!(String::from_utf8(report).unwrap(), "0 false TestA\n1 true TestB\n");
    assert!(!orchestrator.passed());

    orchestrator.clear_statistics();
    assert!(orchestrator.statistics().is_empty());
    assert!(orchestrator.passed());
}

#[test]
fn store_reports_failures_without_copying() {
    let store = StatisticsStore::default();
    assert!(!store.any_failed());

    store.add_statistics(record("TestA", false));
    assert!(!store.any_failed());

    store.add_statistics(record("TestB", true));
    assert!(store.any_failed());
    assert_eq!(store.len(), 2);
}

#[test]
fn direct_stdout_writes_are_not_captured() {
    struct DirectWriter;

    impl Driver for DirectWriter {
        fn enumerate(&self) -> Result<Vec<TestEntry>, RunnerError> {
            Ok(vec![TestEntry::new("TestDirect", |_| {})])
        }

        fn run(&self, _: Vec<TestEntry>, ctx: &RunContext) -> i32 {
            println!("written straight to stdout");
            ctx.console.line("written through the console");
            0
        }
    }

    let orchestrator = Orchestrator::new(DirectWriter);
    orchestrator.print_to_stdout(false);
    orchestrator.run().unwrap();

    let output = orchestrator.output();
    assert_eq!(output, "written through the console\n");
}

#[test]
fn sink_feeds_the_same_store() {
    let (orchestrator, _) = echo(&[]);
    orchestrator.sink().add_statistics(record("ViaSink", false));
    assert_eq!(orchestrator.statistics()[0].name, "ViaSink");
}

#[test]
fn events_reach_the_logger() {
    let orchestrator = Orchestrator::new(demo_registry());
    orchestrator.print_to_stdout(false);
    orchestrator.log_event("dropped: no logger yet");

    let logger = Arc::new(RecordingLogger::default());
    orchestrator.set_event_logger(Some(logger.clone()));
    orchestrator.log_event("starting");
    orchestrator.run().unwrap();

    let messages = logger.messages();
    assert_eq!(messages[0], "starting");
    assert!(messages.contains(&"Instantiating: TestLogout".to_owned()));
    assert!(!messages.iter().any(|m| m.starts_with("=== RUN")));
}

#[test]
fn output_can_be_relayed_to_event_log() {
    let (orchestrator, _) = echo(&["TestA"]);
    let logger = Arc::new(RecordingLogger::default());
    orchestrator.set_event_logger(Some(logger.clone()));
    orchestrator.print_output_to_event_log(true);

    orchestrator.run().unwrap();

    assert_eq!(logger.messages(), vec!["ran TestA\n"]);
}

proptest! {
    #[test]
    fn filtering_keeps_exactly_the_matches(
        names in proptest::collection::btree_set("[A-Za-z]{1,8}", 0..12),
        needle in "[A-Za-z]{1,2}",
    ) {
        let tests: Vec<TestEntry> = names.iter().map(|n| TestEntry::new(n.as_str(), |_| {})).collect();
        let filter = Filter::compile(&needle).unwrap();

        let kept: Vec<String> = select(tests, Some(&filter), false)
            .into_iter()
            .map(|t| t.name)
            .collect();

        let expected: Vec<String> = names.iter().filter(|n| n.contains(needle.as_str())).cloned().collect();
        prop_assert_eq!(kept, expected);
    }
}
