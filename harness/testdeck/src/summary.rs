//! Human-readable run summary.

use std::io::{self, Write};

use deck_model::{LifecycleStage, Statistics};

/// Verdict of one record, as the console prints it.
pub fn verdict(stats: &Statistics) -> &'static str {
    if stats.failed {
        "FAIL"
    } else if stats.is_skipped() {
        "SKIP"
    } else {
        "PASS"
    }
}

/// One line per stage outcome: `ok`, `aborted`, or `-` when not run.
fn stage_marks(stats: &Statistics) -> String {
    LifecycleStage::TIMED
        .iter()
        .map(|stage| {
            let mark = match stats.timing(*stage) {
                Some(t) if t.ended => "ok",
                Some(t) if t.aborted() => "aborted",
                _ => "-",
            };
            format!("{stage}:{mark}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write a summary of `records`, sorted by name, with totals.
pub fn write_summary(out: &mut impl Write, records: &[Statistics]) -> io::Result<()> {
    let mut sorted: Vec<&Statistics> = records.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    writeln!(out, "testdeck summary: {} tests", records.len())?;
    let (mut passed, mut failed, mut skipped) = (0, 0, 0);
    for stats in sorted {
        let verdict = verdict(stats);
        match verdict {
            "FAIL" => failed += 1,
            "SKIP" => skipped += 1,
            _ => passed += 1,
        }
        writeln!(
            out,
            "  {verdict} {} ({} ms) [{}]",
            stats.name,
            stats.duration.as_millis(),
            stage_marks(stats)
        )?;
    }
    writeln!(out, "{passed} passed, {failed} failed, {skipped} skipped")
}
