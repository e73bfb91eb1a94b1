use std::path::PathBuf;
use std::time::Duration;

use custom_resource_core::log_level::LogLevel;
use custom_resource_core::metrics::METRICS_ENDPOINT;

pub const DEFAULT_SCRATCH_DIR: &str = "/tmp/ui";
pub const DEFAULT_DELETE_RETRY_DELAY_SECONDS: u64 = 30;

/// Process-wide handler configuration, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    pub log_level: LogLevel,
    pub scratch_dir: PathBuf,
    pub delete_retry_delay: Duration,
    pub metrics_endpoint: String,
    pub log_stream_name: Option<String>,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::from_setting(None),
            scratch_dir: PathBuf::from(DEFAULT_SCRATCH_DIR),
            delete_retry_delay: Duration::from_secs(DEFAULT_DELETE_RETRY_DELAY_SECONDS),
            metrics_endpoint: METRICS_ENDPOINT.to_string(),
            log_stream_name: None,
        }
    }
}

impl HandlerSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Self {
            log_level: LogLevel::from_setting(lookup("LOG_LEVEL").as_deref()),
            scratch_dir: non_empty("UI_SCRATCH_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            delete_retry_delay: non_empty("DELETE_RETRY_DELAY_SECONDS")
                .and_then(|value| value.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.delete_retry_delay),
            metrics_endpoint: non_empty("METRICS_ENDPOINT").unwrap_or(defaults.metrics_endpoint),
            log_stream_name: non_empty("AWS_LAMBDA_LOG_STREAM_NAME"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key: &str| values.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let settings = HandlerSettings::from_lookup(|_| None);
        assert_eq!(settings, HandlerSettings::default());
        assert_eq!(settings.log_level, LogLevel::Error);
        assert_eq!(settings.delete_retry_delay, Duration::from_secs(30));
    }

    #[test]
    fn reads_overrides() {
        let settings = HandlerSettings::from_lookup(lookup_from(&[
            ("LOG_LEVEL", "info"),
            ("UI_SCRATCH_DIR", "/tmp/custom"),
            ("DELETE_RETRY_DELAY_SECONDS", "5"),
            ("METRICS_ENDPOINT", "http://localhost:9000/generic"),
            ("AWS_LAMBDA_LOG_STREAM_NAME", "2026/10/19/[$LATEST]abc"),
        ]));

        assert_eq!(settings.log_level, LogLevel::Info);
        assert_eq!(settings.scratch_dir, PathBuf::from("/tmp/custom"));
        assert_eq!(settings.delete_retry_delay, Duration::from_secs(5));
        assert_eq!(settings.metrics_endpoint, "http://localhost:9000/generic");
        assert_eq!(
            settings.log_stream_name.as_deref(),
            Some("2026/10/19/[$LATEST]abc")
        );
    }

    #[test]
    fn invalid_values_fall_back() {
        let settings = HandlerSettings::from_lookup(lookup_from(&[
            ("LOG_LEVEL", "loud"),
            ("DELETE_RETRY_DELAY_SECONDS", "soon"),
            ("UI_SCRATCH_DIR", " "),
        ]));
        assert_eq!(settings.log_level, LogLevel::Error);
        assert_eq!(settings.delete_retry_delay, Duration::from_secs(30));
        assert_eq!(settings.scratch_dir, PathBuf::from(DEFAULT_SCRATCH_DIR));
    }
}
