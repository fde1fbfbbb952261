//! Run configuration.
//!
//! [`EnvConfig`] reads the environment a test job was launched with;
//! [`RunnerConfig`] holds the orchestrator toggles derived from it (or set
//! by hand).

use thiserror::Error;

const ENV_DEVELOPMENT: &str = "development";

pub const KEY_ENV: &str = "ENV";
pub const KEY_GCP_PROJECT_ID: &str = "GCP_PROJECT_ID";
pub const KEY_PRINT_OUTPUT_TO_EVENT_LOG: &str = "PRINT_OUTPUT_TO_EVENT_LOG";
pub const KEY_RUN_AS: &str = "RUN_AS";
pub const KEY_DB_URL: &str = "DB_URL";
pub const KEY_JOB_NAME: &str = "JOB_NAME";
pub const KEY_POD_NAME: &str = "POD_NAME";
pub const KEY_KUBERNETES_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";
pub const KEY_TELEPRESENCE_ROOT: &str = "TELEPRESENCE_ROOT";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("validation failed: invalid env is specified: {0:?}")]
    InvalidEnv(String),

    #[error("failed to read {key}: {value:?} is not a boolean")]
    InvalidBool { key: &'static str, value: String },
}

/// How the tests are being run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunAs {
    /// A developer machine. Results are only printed.
    Local,
    /// A one-shot cluster job. Results are meant to be persisted.
    Job,
}

impl RunAs {
    pub fn as_str(self) -> &'static str {
        match self {
            RunAs::Local => "local",
            RunAs::Job => "job",
        }
    }
}

impl std::fmt::Display for RunAs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settings read from environment variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnvConfig {
    /// Always `development`; anything else is rejected.
    pub env: String,
    pub gcp_project_id: Option<String>,
    /// Relay live test output to the event log.
    pub print_output_to_event_log: bool,
    /// Explicit override of the run mode.
    pub run_as: Option<String>,
    /// Where results are persisted. Unset means results only reach the logs.
    pub db_url: Option<String>,
    pub job_name: Option<String>,
    pub pod_name: Option<String>,
    pub in_kubernetes: bool,
    pub in_telepresence: bool,
}

impl EnvConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let config = EnvConfig {
            env: non_empty(KEY_ENV).unwrap_or_else(|| ENV_DEVELOPMENT.to_owned()),
            gcp_project_id: non_empty(KEY_GCP_PROJECT_ID),
            print_output_to_event_log: match non_empty(KEY_PRINT_OUTPUT_TO_EVENT_LOG) {
                Some(value) => parse_bool(KEY_PRINT_OUTPUT_TO_EVENT_LOG, &value)?,
                None => false,
            },
            run_as: non_empty(KEY_RUN_AS),
            db_url: non_empty(KEY_DB_URL),
            job_name: non_empty(KEY_JOB_NAME),
            pod_name: non_empty(KEY_POD_NAME),
            in_kubernetes: lookup(KEY_KUBERNETES_SERVICE_HOST).is_some(),
            in_telepresence: lookup(KEY_TELEPRESENCE_ROOT).is_some(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.env != ENV_DEVELOPMENT {
            return Err(ConfigError::InvalidEnv(self.env.clone()));
        }
        Ok(())
    }

    /// Resolve the run mode.
    ///
    /// An explicit `RUN_AS=job` wins; any other explicit value means local.
    /// Otherwise a Kubernetes pod that is not a Telepresence session is a
    /// job.
    pub fn run_as(&self) -> RunAs {
        match self.run_as.as_deref() {
            Some("job") => RunAs::Job,
            Some(other) => {
                if other != "local" {
                    tracing::warn!(run_as = other, "unknown RUN_AS value, running as local");
                }
                RunAs::Local
            }
            None if self.in_kubernetes && !self.in_telepresence => RunAs::Job,
            None => RunAs::Local,
        }
    }

    /// Whether the results database looks like a production one.
    pub fn looks_like_production(&self) -> bool {
        self.db_url
            .as_deref()
            .is_some_and(|url| url.to_lowercase().contains("prod"))
    }
}

/// Accepts the spellings `1 t T TRUE true True 0 f F FALSE false False`.
fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            key,
            value: value.to_owned(),
        }),
    }
}

/// Orchestrator toggles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunnerConfig {
    /// Only run tests whose name matches this regular expression.
    pub filter: Option<String>,
    /// Tee captured output to the real stdout while it is captured.
    pub print_to_stdout: bool,
    /// Tee captured output to the event logger.
    pub print_output_to_event_log: bool,
    /// Filter by tagging test names instead of dropping tests.
    pub match_workaround: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            filter: None,
            print_to_stdout: true,
            print_output_to_event_log: false,
            match_workaround: false,
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        RunnerConfig::default()
    }

    /// Defaults plus the toggles the environment controls.
    pub fn from_env_config(env: &EnvConfig) -> Self {
        RunnerConfig::default().print_output_to_event_log(env.print_output_to_event_log)
    }

    #[must_use]
    pub fn filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn print_to_stdout(mut self, yes: bool) -> Self {
        self.print_to_stdout = yes;
        self
    }

    #[must_use]
    pub fn print_output_to_event_log(mut self, yes: bool) -> Self {
        self.print_output_to_event_log = yes;
        self
    }

    #[must_use]
    pub fn match_workaround(mut self, yes: bool) -> Self {
        self.match_workaround = yes;
        self
    }
}
