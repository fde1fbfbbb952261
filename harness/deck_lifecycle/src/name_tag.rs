//! Filter-in-name tagging.
//!
//! Some drivers can carry only a final name per test, not a separate
//! filter. This module packs a filter pattern and a test's real name into
//! one string, `pattern␀name`, and unpacks it again inside the test.
//!
//! This is a workaround with known gaps: the pattern is matched against the
//! bare test name only, and a test filtered this way still starts, asks
//! for parallel scheduling, and then returns early. Prefer the
//! orchestrator's first-class filter.

use regex::Regex;

/// Separates the pattern from the real name.
pub const DELIMITER: char = '\0';

/// Result of [`decode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Decoded<'n> {
    /// The name carried a tag.
    pub tagged: bool,
    /// The tag's pattern matches the real name. Always false if untagged.
    pub matched: bool,
    /// The real name, tag stripped.
    pub name: &'n str,
}

pub fn encode(pattern: &str, name: &str) -> String {
    format!("{pattern}{DELIMITER}{name}")
}

pub fn decode(name: &str) -> Decoded<'_> {
    let Some((pattern, actual)) = name.rsplit_once(DELIMITER) else {
        return Decoded {
            tagged: false,
            matched: false,
            name,
        };
    };

    let matched = match Regex::new(pattern) {
        Ok(re) => re.is_match(actual),
        Err(err) => {
            tracing::warn!(%pattern, %err, "tagged test name has an invalid pattern");
            false
        }
    };
    Decoded {
        tagged: true,
        matched,
        name: actual,
    }
}

/// Remove every `pattern␀` prefix from `text`.
///
/// Tagged names leak into console output through the driver's own
/// headers; this restores the real names.
pub fn strip_tags(text: &str, pattern: &str) -> String {
    text.replace(&format!("{pattern}{DELIMITER}"), "")
}
