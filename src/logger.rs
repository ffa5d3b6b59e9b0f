use std::sync::Arc;

use serde_json::Value;

use crate::config::{LogLevel, TelemetryOptions};
use crate::env::Environment;

/// Diagnostic logger used by the launcher itself.
///
/// This is not the application's telemetry pipeline: it only reports what the
/// launcher is doing while it assembles the configuration, and the failures it
/// finds.
pub trait DiagLogger: Send + Sync {
    fn debug(&self, message: &str, record: &Value);
    fn error(&self, message: &str);
}

/// Forwards launcher diagnostics to the `tracing` facade.
///
/// With no subscriber installed the events are dropped.
#[derive(Debug, Clone, Copy)]
pub struct TracingLogger {
    level: LogLevel,
}

impl TracingLogger {
    pub fn new(level: LogLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl DiagLogger for TracingLogger {
    fn debug(&self, message: &str, record: &Value) {
        if self.level >= LogLevel::Debug {
            tracing::debug!(target: "otel_launcher", %record, "{message}");
        }
    }

    fn error(&self, message: &str) {
        if self.level >= LogLevel::Error {
            tracing::error!(target: "otel_launcher", "{message}");
        }
    }
}

/// Pick the launcher's logger.
///
/// A caller-supplied logger is used as is. Otherwise a [`TracingLogger`] is
/// built at the caller's log level, else `OTEL_LOG_LEVEL`, else info.
pub fn setup_logger(
    logger: Option<&Arc<dyn DiagLogger>>,
    options: &TelemetryOptions,
    env: &Environment,
) -> Arc<dyn DiagLogger> {
    if let Some(logger) = logger {
        return Arc::clone(logger);
    }

    Arc::new(TracingLogger::new(resolve_log_level(options, env)))
}

/// Caller's level, else `OTEL_LOG_LEVEL`, else info
pub fn resolve_log_level(options: &TelemetryOptions, env: &Environment) -> LogLevel {
    options
        .log_level
        .or_else(|| env.options().log_level)
        .unwrap_or_default()
}
