//! Layered configuration for the core.
//!
//! §6 requires no environment variable to be necessary for correct
//! operation; every field here has a built-in default, and only the storage
//! path is supplied explicitly by the host. Layering order, lowest to
//! highest precedence: built-in defaults, an optional TOML file, then
//! `TIMEFILES_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix recognised by [`TimeFilesConfig::from_env`].
pub const ENV_PREFIX: &str = "TIMEFILES_";

/// Errors raised while loading an optional TOML override file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file exists but could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path of the file that failed to read.
        path: String,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// The file's contents are not valid TOML for this shape.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        path: String,
        /// Underlying TOML decode failure.
        source: toml::de::Error,
    },
}

/// Rest-advisor rule thresholds (§4.F), overridable for tuning or tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RestAdvisorThresholds {
    /// R1: focus seconds at or above this suggest the 15-minute rest.
    pub long_focus_seconds: i64,
    /// R2: focus seconds at or above this (below `long_focus_seconds`) suggest 8 minutes.
    pub medium_focus_seconds: i64,
    /// R3: focus seconds at or above this (below `medium_focus_seconds`) suggest 3 minutes.
    pub short_focus_seconds: i64,
    /// R4: switches within 30 minutes at or above this suggest 8 minutes.
    pub fragmented_switch_count: i64,
    /// R5: deviation ratio at or above this, combined with a minimum focus, suggests 3 minutes.
    pub overrun_deviation_ratio: f64,
    /// R5: minimum focus seconds required for the overrun rule to fire.
    pub overrun_minimum_focus_seconds: i64,
    /// R6: focus seconds below this, with few switches, suggest no rest.
    pub quick_task_focus_seconds: i64,
    /// R6: switch count below this, combined with short focus, suggest no rest.
    pub quick_task_switch_count: i64,
    /// Pause gaps shorter than this many seconds do not end a focus block.
    pub focus_gap_merge_seconds: i64,
    /// Window, in seconds, used to count recent task switches.
    pub switch_window_seconds: i64,
}

impl Default for RestAdvisorThresholds {
    fn default() -> Self {
        Self {
            long_focus_seconds: 5400,
            medium_focus_seconds: 3000,
            short_focus_seconds: 900,
            fragmented_switch_count: 5,
            overrun_deviation_ratio: 0.5,
            overrun_minimum_focus_seconds: 1200,
            quick_task_focus_seconds: 600,
            quick_task_switch_count: 3,
            focus_gap_merge_seconds: 120,
            switch_window_seconds: 1800,
        }
    }
}

impl RestAdvisorThresholds {
    fn apply_overrides(&mut self, overrides: RestAdvisorOverrides) {
        if let Some(value) = overrides.long_focus_seconds {
            self.long_focus_seconds = value;
        }
        if let Some(value) = overrides.medium_focus_seconds {
            self.medium_focus_seconds = value;
        }
        if let Some(value) = overrides.short_focus_seconds {
            self.short_focus_seconds = value;
        }
        if let Some(value) = overrides.fragmented_switch_count {
            self.fragmented_switch_count = value;
        }
        if let Some(value) = overrides.overrun_deviation_ratio {
            self.overrun_deviation_ratio = value;
        }
        if let Some(value) = overrides.overrun_minimum_focus_seconds {
            self.overrun_minimum_focus_seconds = value;
        }
        if let Some(value) = overrides.quick_task_focus_seconds {
            self.quick_task_focus_seconds = value;
        }
        if let Some(value) = overrides.quick_task_switch_count {
            self.quick_task_switch_count = value;
        }
        if let Some(value) = overrides.focus_gap_merge_seconds {
            self.focus_gap_merge_seconds = value;
        }
        if let Some(value) = overrides.switch_window_seconds {
            self.switch_window_seconds = value;
        }
    }

    fn env_overrides() -> RestAdvisorOverrides {
        RestAdvisorOverrides {
            long_focus_seconds: parsed_env("REST_ADVISOR_LONG_FOCUS_SECONDS"),
            medium_focus_seconds: parsed_env("REST_ADVISOR_MEDIUM_FOCUS_SECONDS"),
            short_focus_seconds: parsed_env("REST_ADVISOR_SHORT_FOCUS_SECONDS"),
            fragmented_switch_count: parsed_env("REST_ADVISOR_FRAGMENTED_SWITCH_COUNT"),
            overrun_deviation_ratio: parsed_env("REST_ADVISOR_OVERRUN_DEVIATION_RATIO"),
            overrun_minimum_focus_seconds: parsed_env("REST_ADVISOR_OVERRUN_MINIMUM_FOCUS_SECONDS"),
            quick_task_focus_seconds: parsed_env("REST_ADVISOR_QUICK_TASK_FOCUS_SECONDS"),
            quick_task_switch_count: parsed_env("REST_ADVISOR_QUICK_TASK_SWITCH_COUNT"),
            focus_gap_merge_seconds: parsed_env("REST_ADVISOR_FOCUS_GAP_MERGE_SECONDS"),
            switch_window_seconds: parsed_env("REST_ADVISOR_SWITCH_WINDOW_SECONDS"),
        }
    }
}

/// Partial override set for [`RestAdvisorThresholds`], as read from a TOML
/// file or assembled from environment variables. Absent fields leave the
/// current value untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct RestAdvisorOverrides {
    long_focus_seconds: Option<i64>,
    medium_focus_seconds: Option<i64>,
    short_focus_seconds: Option<i64>,
    fragmented_switch_count: Option<i64>,
    overrun_deviation_ratio: Option<f64>,
    overrun_minimum_focus_seconds: Option<i64>,
    quick_task_focus_seconds: Option<i64>,
    quick_task_switch_count: Option<i64>,
    focus_gap_merge_seconds: Option<i64>,
    switch_window_seconds: Option<i64>,
}

/// Partial override set for [`TimeFilesConfig`], as read from a TOML file.
/// Absent fields leave the current value untouched; `database_url` is
/// overridable here too since hosts may prefer file-based configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
struct FileOverrides {
    database_url: Option<String>,
    writer_pool_size: Option<u32>,
    reader_pool_size: Option<u32>,
    #[serde(default)]
    rest_advisor: RestAdvisorOverrides,
}

/// Top-level configuration for a [`crate::command::CommandSurface`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TimeFilesConfig {
    /// Path to the SQLite database file, or `:memory:`. Supplied by the host.
    pub database_url: String,
    /// Writer pool size; SQLite allows only one writer, default 1.
    pub writer_pool_size: u32,
    /// Reader pool size for concurrent `get_overview`/`ping` queries.
    pub reader_pool_size: u32,
    /// Rest advisor rule thresholds.
    pub rest_advisor: RestAdvisorThresholds,
}

impl TimeFilesConfig {
    /// Creates configuration pointing at `database_url` with all other
    /// tunables at their defaults.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            writer_pool_size: 1,
            reader_pool_size: 4,
            rest_advisor: RestAdvisorThresholds::default(),
        }
    }

    /// Overlays a TOML file's values, if present, on top of the current
    /// configuration. A missing file is not an error, since the file is
    /// optional per §10.2; a present-but-malformed file is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigFileError`] if the file exists but cannot be read, or
    /// cannot be parsed as TOML matching this shape.
    pub fn with_file_overrides(mut self, path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let file_path = path.as_ref();
        let contents = match std::fs::read_to_string(file_path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(self),
            Err(source) => {
                return Err(ConfigFileError::Read {
                    path: file_path.display().to_string(),
                    source,
                });
            }
        };
        let overrides: FileOverrides = toml::from_str(&contents).map_err(|source| ConfigFileError::Parse {
            path: file_path.display().to_string(),
            source,
        })?;

        if let Some(value) = overrides.database_url {
            self.database_url = value;
        }
        if let Some(value) = overrides.writer_pool_size {
            self.writer_pool_size = value;
        }
        if let Some(value) = overrides.reader_pool_size {
            self.reader_pool_size = value;
        }
        self.rest_advisor.apply_overrides(overrides.rest_advisor);
        Ok(self)
    }

    /// Overlays process environment variables (`TIMEFILES_*`) on top of the
    /// current values. Unset or unparsable variables are left unchanged.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(value) = std::env::var(format!("{ENV_PREFIX}DATABASE_URL")) {
            self.database_url = value;
        }
        if let Some(value) = parsed_env("WRITER_POOL_SIZE") {
            self.writer_pool_size = value;
        }
        if let Some(value) = parsed_env("READER_POOL_SIZE") {
            self.reader_pool_size = value;
        }
        self.rest_advisor.apply_overrides(RestAdvisorThresholds::env_overrides());
        self
    }
}

fn parsed_env<T: std::str::FromStr>(suffix: &str) -> Option<T> {
    std::env::var(format!("{ENV_PREFIX}{suffix}"))
        .ok()
        .and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_rule_table() {
        let thresholds = RestAdvisorThresholds::default();
        assert_eq!(thresholds.long_focus_seconds, 5400);
        assert_eq!(thresholds.medium_focus_seconds, 3000);
        assert_eq!(thresholds.short_focus_seconds, 900);
        assert_eq!(thresholds.fragmented_switch_count, 5);
        assert!((thresholds.overrun_deviation_ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(thresholds.overrun_minimum_focus_seconds, 1200);
        assert_eq!(thresholds.quick_task_focus_seconds, 600);
        assert_eq!(thresholds.quick_task_switch_count, 3);
        assert_eq!(thresholds.focus_gap_merge_seconds, 120);
    }

    #[test]
    fn new_config_does_not_require_env_vars() {
        let config = TimeFilesConfig::new(":memory:");
        assert_eq!(config.database_url, ":memory:");
        assert_eq!(config.writer_pool_size, 1);
        assert_eq!(config.reader_pool_size, 4);
    }

    #[test]
    fn missing_config_file_is_not_an_error() {
        let config = TimeFilesConfig::new(":memory:")
            .with_file_overrides("/nonexistent/timefiles.toml")
            .expect("missing file is a no-op");
        assert_eq!(config.reader_pool_size, 4);
    }

    #[test]
    fn malformed_config_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("timefiles.toml");
        std::fs::write(&path, "reader_pool_size = \"not a number\"").expect("write");

        let err = TimeFilesConfig::new(":memory:")
            .with_file_overrides(&path)
            .expect_err("malformed toml");
        assert!(matches!(err, ConfigFileError::Parse { .. }));
    }

    #[test]
    fn config_file_overrides_pool_sizes_and_thresholds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("timefiles.toml");
        std::fs::write(
            &path,
            r#"
            reader_pool_size = 8

            [rest_advisor]
            long_focus_seconds = 7200
            "#,
        )
        .expect("write");

        let config = TimeFilesConfig::new(":memory:")
            .with_file_overrides(&path)
            .expect("parse override file");
        assert_eq!(config.reader_pool_size, 8);
        assert_eq!(config.writer_pool_size, 1);
        assert_eq!(config.rest_advisor.long_focus_seconds, 7200);
        assert_eq!(config.rest_advisor.medium_focus_seconds, 3000);
    }
}
