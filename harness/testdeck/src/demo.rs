//! The bundled demo suite run by `testdeck-demo`.
//!
//! One test per lifecycle behavior worth seeing on a console: a clean pass,
//! a non-fatal error, a fatal abort in Arrange, a skip, cleanups
//! registered from several places, and a test that opts out of parallel
//! scheduling.

use std::cell::Cell;

use deck_lifecycle::{test, test_with, Reporter, TestCase, TestConfig};
use deck_runner::Registry;

/// Names of the demo tests, in registration order.
pub const NAMES: [&str; 6] = [
    "TestDemoPass",
    "TestDemoError",
    "TestDemoFatal",
    "TestDemoSkip",
    "TestDemoDeferredCleanup",
    "TestDemoSequential",
];

/// A registry holding the whole demo suite.
pub fn registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .add(NAMES[0], pass)
        .add(NAMES[1], error)
        .add(NAMES[2], fatal)
        .add(NAMES[3], skip)
        .add(NAMES[4], deferred_cleanup)
        .add(NAMES[5], sequential);
    registry
}

fn pass(t: &dyn Reporter) {
    let total = Cell::new(0);
    test(
        t,
        TestCase::new()
            .arrange(|td| td.log("cart holds two items priced 300 and 200"))
            .act(|_| total.set(300 + 200))
            .assert(|td| {
                if total.get() != 500 {
                    td.errorf(format_args!("total = {}, want 500", total.get()));
                }
            }),
    );
}

fn error(t: &dyn Reporter) {
    let status = Cell::new(0);
    test(
        t,
        TestCase::new()
            .act(|td| {
                status.set(503);
                if status.get() != 200 {
                    td.errorf(format_args!("GET /items: status = {}, want 200", status.get()));
                }
                td.log("continuing after a non-fatal error");
            })
            .assert(|td| td.logf(format_args!("assert still runs (status {})", status.get()))),
    );
}

fn fatal(t: &dyn Reporter) {
    test(
        t,
        TestCase::new()
            .arrange(|td| td.fatal("could not create fixture user"))
            .act(|td| td.log("never printed"))
            .after(|td| td.log("after runs even though arrange aborted")),
    );
}

fn skip(t: &dyn Reporter) {
    test(
        t,
        TestCase::new()
            .arrange(|td| td.skip("feature flag `new-checkout` is disabled"))
            .act(|td| td.log("never printed"))
            .after(|td| td.log("never printed either")),
    );
}

fn deferred_cleanup(t: &dyn Reporter) {
    let mut case = TestCase::new()
        .arrange(move |td| {
            td.log("opening connection");
            td.defer(move || t.log("closing connection"));
        })
        .act(move |td| {
            td.log("creating temp table");
            td.defer(move || t.log("dropping temp table"));
        })
        .assert(|td| td.log("temp table is queryable"));
    case.defer(move || t.log("releasing fixture lock"));
    test(t, case);
}

fn sequential(t: &dyn Reporter) {
    test_with(
        t,
        TestCase::new()
            .arrange(|td| td.log("migrating shared schema"))
            .assert(|td| td.logf(format_args!("{} ran without pausing", td.name()))),
        TestConfig { parallel_off: true },
    );
}
