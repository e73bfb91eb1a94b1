/// Log verbosity accepted in `LOG_LEVEL`, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

pub const DEFAULT_LOG_LEVEL: LogLevel = LogLevel::Error;

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Resolves a raw setting; missing or unrecognized values fall back to ERROR.
    pub fn from_setting(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return DEFAULT_LOG_LEVEL;
        };
        match value.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Self::Debug,
            "INFO" => Self::Info,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" => Self::Critical,
            _ => DEFAULT_LOG_LEVEL,
        }
    }

    pub fn enables(self, level: LogLevel) -> bool {
        level >= self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels_case_insensitively() {
        assert_eq!(LogLevel::from_setting(Some("debug")), LogLevel::Debug);
        assert_eq!(LogLevel::from_setting(Some("Info")), LogLevel::Info);
        assert_eq!(LogLevel::from_setting(Some("WARNING")), LogLevel::Warning);
        assert_eq!(LogLevel::from_setting(Some("critical")), LogLevel::Critical);
    }

    #[test]
    fn defaults_to_error_when_missing_or_unknown() {
        assert_eq!(LogLevel::from_setting(None), LogLevel::Error);
        assert_eq!(LogLevel::from_setting(Some("verbose")), LogLevel::Error);
        assert_eq!(LogLevel::from_setting(Some("")), LogLevel::Error);
    }

    #[test]
    fn threshold_filters_less_severe_levels() {
        assert!(LogLevel::Error.enables(LogLevel::Critical));
        assert!(LogLevel::Error.enables(LogLevel::Error));
        assert!(!LogLevel::Error.enables(LogLevel::Info));
        assert!(LogLevel::Debug.enables(LogLevel::Debug));
    }
}
