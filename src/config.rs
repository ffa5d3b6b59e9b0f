use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use opentelemetry_otlp::{MetricExporter, SpanExporter};
use opentelemetry_sdk::Resource;
use serde::{Deserialize, Serialize};
use tracing::level_filters::LevelFilter;

use crate::instrumentation::Instrumentation;
use crate::logger::DiagLogger;
use crate::propagation::Propagator;
use crate::validate::FailureHandler;

/// Default SaaS trace ingest endpoint. Reporting here requires an access token.
pub const DEFAULT_SPAN_ENDPOINT: &str = "https://ingest.lightstep.com/traces/otlp/v0.6";

/// Default SaaS metric ingest endpoint
pub const DEFAULT_METRIC_ENDPOINT: &str = "https://ingest.lightstep.com/metrics/otlp/v0.6";

/// Propagation format used when none is configured
pub const DEFAULT_PROPAGATORS: &str = "b3";

/// Verbosity of the launcher's diagnostic logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    None,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Verbose,
    All,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Verbose => "verbose",
            Self::All => "all",
        }
    }

    /// Equivalent `tracing` level filter
    pub fn level_filter(&self) -> LevelFilter {
        match self {
            Self::None => LevelFilter::OFF,
            Self::Error => LevelFilter::ERROR,
            Self::Warn => LevelFilter::WARN,
            Self::Info => LevelFilter::INFO,
            Self::Debug => LevelFilter::DEBUG,
            Self::Verbose | Self::All => LevelFilter::TRACE,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "error" => Ok(Self::Error),
            "warn" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "verbose" => Ok(Self::Verbose),
            "all" => Ok(Self::All),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Plain-data launcher options.
///
/// One value of this type is one configuration layer (defaults, environment or
/// caller). Every field is optional: an absent field does not take part in the
/// merge, so a lower layer's value shows through.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TelemetryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_endpoint: Option<String>,
    /// Comma-delimited propagation formats, e.g. `b3,tracecontext`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub propagators: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_host_enabled: Option<bool>,
}

impl TelemetryOptions {
    /// Vendor defaults, the lowest-precedence layer
    pub fn defaults() -> Self {
        Self {
            span_endpoint: Some(DEFAULT_SPAN_ENDPOINT.to_string()),
            metric_endpoint: Some(DEFAULT_METRIC_ENDPOINT.to_string()),
            propagators: Some(DEFAULT_PROPAGATORS.to_string()),
            metrics_enabled: Some(false),
            metrics_host_enabled: Some(true),
            ..Self::default()
        }
    }

    /// Copy safe to log: the access token is masked.
    pub fn redacted(&self) -> Self {
        Self {
            access_token: self.access_token.as_ref().map(|_| "<redacted>".to_string()),
            ..self.clone()
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        non_empty(&self.access_token)
    }

    pub fn service_name(&self) -> Option<&str> {
        non_empty(&self.service_name)
    }

    pub fn service_version(&self) -> Option<&str> {
        non_empty(&self.service_version)
    }

    pub fn metrics_enabled(&self) -> bool {
        self.metrics_enabled.unwrap_or(false)
    }

    pub fn metrics_host_enabled(&self) -> bool {
        self.metrics_host_enabled.unwrap_or(true)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Caller-facing configuration: option values plus extension points.
///
/// Every extension point left as `None` is filled in by the launcher. A value
/// supplied here is never replaced.
#[derive(Default)]
pub struct TelemetryConfig {
    pub options: TelemetryOptions,
    pub logger: Option<Arc<dyn DiagLogger>>,
    pub failure_handler: Option<FailureHandler>,
    pub resource: Option<Resource>,
    pub trace_exporter: Option<SpanExporter>,
    pub metric_exporter: Option<MetricExporter>,
    pub propagator: Option<Propagator>,
    pub instrumentations: Option<Vec<Arc<dyn Instrumentation>>>,
}

impl TelemetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: TelemetryOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.options.access_token = Some(token.into());
        self
    }

    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.options.service_name = Some(name.into());
        self
    }

    pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
        self.options.service_version = Some(version.into());
        self
    }

    pub fn with_span_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.options.span_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_metric_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.options.metric_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_propagators(mut self, propagators: impl Into<String>) -> Self {
        self.options.propagators = Some(propagators.into());
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.options.log_level = Some(level);
        self
    }

    pub fn with_metrics_enabled(mut self, enabled: bool) -> Self {
        self.options.metrics_enabled = Some(enabled);
        self
    }

    pub fn with_metrics_host_enabled(mut self, enabled: bool) -> Self {
        self.options.metrics_host_enabled = Some(enabled);
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn DiagLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn with_failure_handler(mut self, handler: FailureHandler) -> Self {
        self.failure_handler = Some(handler);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    pub fn with_trace_exporter(mut self, exporter: SpanExporter) -> Self {
        self.trace_exporter = Some(exporter);
        self
    }

    pub fn with_metric_exporter(mut self, exporter: MetricExporter) -> Self {
        self.metric_exporter = Some(exporter);
        self
    }

    pub fn with_propagator(mut self, propagator: Propagator) -> Self {
        self.propagator = Some(propagator);
        self
    }

    pub fn with_instrumentations(mut self, instrumentations: Vec<Arc<dyn Instrumentation>>) -> Self {
        self.instrumentations = Some(instrumentations);
        self
    }
}

impl fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("options", &self.options.redacted())
            .field("logger", &self.logger.is_some())
            .field("failure_handler", &self.failure_handler.is_some())
            .field("resource", &self.resource)
            .field("trace_exporter", &self.trace_exporter.is_some())
            .field("metric_exporter", &self.metric_exporter.is_some())
            .field("propagator", &self.propagator)
            .field(
                "instrumentations",
                &self
                    .instrumentations
                    .as_ref()
                    .map(|list| list.iter().map(|i| i.name()).collect::<Vec<_>>()),
            )
            .finish()
    }
}
