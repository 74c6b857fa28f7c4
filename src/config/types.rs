use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for StarPlan
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Fetch retry and timeout policy
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchConfig {
    /// Attempts per page before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Linear backoff unit in seconds; attempt n waits (n+1) units
    #[serde(rename = "backoff-unit-secs", default = "default_backoff_unit")]
    pub backoff_unit_secs: u64,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs", default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_unit_secs: default_backoff_unit(),
            timeout_secs: default_timeout(),
        }
    }
}

impl FetchConfig {
    pub fn backoff_unit(&self) -> Duration {
        Duration::from_secs(self.backoff_unit_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Pause range between institutions during the scanning phase
///
/// The pause keeps the scraper under the target server's soft rate limit;
/// shortening it materially increases busy-page failures.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PacingConfig {
    #[serde(rename = "min-delay-secs", default = "default_min_delay")]
    pub min_delay_secs: f64,

    #[serde(rename = "max-delay-secs", default = "default_max_delay")]
    pub max_delay_secs: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: default_min_delay(),
            max_delay_secs: default_max_delay(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Directory where exported files are written
    #[serde(rename = "directory", default = "default_output_directory")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_unit() -> u64 {
    2
}

fn default_timeout() -> u64 {
    15
}

fn default_min_delay() -> f64 {
    1.0
}

fn default_max_delay() -> f64 {
    3.0
}

fn default_output_directory() -> String {
    ".".to_string()
}
