use custom_resource_core::log_level::LogLevel;
use serde_json::{json, Value};

/// Structured stderr logger scoped to one handler component.
///
/// Built once per invocation from the resolved `LOG_LEVEL` and passed to each
/// component explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Logger {
    component: &'static str,
    threshold: LogLevel,
}

impl Logger {
    pub fn new(component: &'static str, threshold: LogLevel) -> Self {
        Self {
            component,
            threshold,
        }
    }

    pub fn with_component(self, component: &'static str) -> Self {
        Self { component, ..self }
    }

    pub fn debug(&self, event: &str, details: Value) {
        self.emit(LogLevel::Debug, event, details);
    }

    pub fn info(&self, event: &str, details: Value) {
        self.emit(LogLevel::Info, event, details);
    }

    pub fn warning(&self, event: &str, details: Value) {
        self.emit(LogLevel::Warning, event, details);
    }

    pub fn error(&self, event: &str, details: Value) {
        self.emit(LogLevel::Error, event, details);
    }

    fn emit(&self, level: LogLevel, event: &str, details: Value) {
        if let Some(line) = self.render(level, event, details) {
            eprintln!("{line}");
        }
    }

    fn render(&self, level: LogLevel, event: &str, details: Value) -> Option<String> {
        if !self.threshold.enables(level) {
            return None;
        }
        Some(
            json!({
                "component": self.component,
                "level": level.as_str(),
                "event": event,
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "details": details,
            })
            .to_string(),
        )
    }
}
