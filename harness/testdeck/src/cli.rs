//! Argument parsing for `testdeck-demo`.

use std::fmt;

pub const USAGE: &str = "\
Usage: testdeck-demo [PATTERN] [options]

Runs the bundled demo suite. PATTERN is a regular expression matched
against test names (default: run everything).

Options:
  --print-output   Echo captured test output to stdout while running
  --json           Print the statistics records as JSON
  --report         Print one `<index> <failed> <name>` line per record
  -h, --help       Show this message";

/// Parsed command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[expect(
    clippy::struct_excessive_bools,
    reason = "each bool is an independent command-line switch"
)]
pub struct DemoOptions {
    pub pattern: Option<String>,
    pub print_output: bool,
    pub json: bool,
    pub report: bool,
    pub help: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArgError {
    UnknownFlag(String),
    ExtraPattern(String),
}

impl fmt::Display for ArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgError::UnknownFlag(flag) => write!(f, "unknown option `{flag}`"),
            ArgError::ExtraPattern(arg) => {
                write!(f, "unexpected argument `{arg}`: only one PATTERN is accepted")
            }
        }
    }
}

impl std::error::Error for ArgError {}

impl DemoOptions {
    /// Parse arguments, excluding the program name. Flags may appear
    /// before or after the pattern.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, ArgError> {
        let mut options = DemoOptions::default();
        for arg in args {
            let arg = arg.as_ref();
            match arg {
                "--print-output" => options.print_output = true,
                "--json" => options.json = true,
                "--report" => options.report = true,
                "-h" | "--help" => options.help = true,
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    return Err(ArgError::UnknownFlag(flag.to_string()));
                }
                pattern => {
                    if options.pattern.is_some() {
                        return Err(ArgError::ExtraPattern(pattern.to_string()));
                    }
                    options.pattern = Some(pattern.to_string());
                }
            }
        }
        Ok(options)
    }
}
