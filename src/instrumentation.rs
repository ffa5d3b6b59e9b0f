use std::sync::Arc;

use opentelemetry::trace::TracerProvider;
use opentelemetry::InstrumentationScope;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::{LogLevel, TelemetryConfig, TelemetryOptions};
use crate::error::LauncherError;

/// Something that hooks the application into the tracer provider once the
/// SDK has started.
pub trait Instrumentation: Send + Sync {
    fn name(&self) -> &str;

    fn install(
        &self,
        provider: &SdkTracerProvider,
        options: &TelemetryOptions,
    ) -> Result<(), LauncherError>;
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Pretty human-readable format with colors (for local dev)
    #[default]
    Pretty,
    /// JSON structured format (for cloud environments)
    Json,
}

/// Bridges `tracing` spans into OpenTelemetry and prints events.
///
/// Installs the global `tracing` subscriber, so it can only succeed once per
/// process.
#[derive(Debug, Clone, Default)]
pub struct TracingInstrumentation {
    log_format: LogFormat,
}

impl TracingInstrumentation {
    pub fn new(log_format: LogFormat) -> Self {
        Self { log_format }
    }

    pub fn json() -> Self {
        Self::new(LogFormat::Json)
    }

    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Instrumentation for TracingInstrumentation {
    fn name(&self) -> &str {
        "tracing"
    }

    fn install(
        &self,
        provider: &SdkTracerProvider,
        options: &TelemetryOptions,
    ) -> Result<(), LauncherError> {
        let otel_layer = build_otel_layer(provider, options);
        let filter = build_filter(options.log_level.unwrap_or_default());
        let registry = tracing_subscriber::registry().with(filter).with(otel_layer);

        match self.log_format {
            LogFormat::Pretty => registry.with(build_pretty_layer()).try_init(),
            LogFormat::Json => registry.with(build_json_layer()).try_init(),
        }
        .map_err(|e| LauncherError::Init(e.to_string()))
    }
}

/// OpenTelemetry layer whose tracer scope is the service name and version
pub fn build_otel_layer<S>(
    provider: &SdkTracerProvider,
    options: &TelemetryOptions,
) -> OpenTelemetryLayer<S, opentelemetry_sdk::trace::Tracer>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let name = options
        .service_name()
        .unwrap_or(env!("CARGO_PKG_NAME"))
        .to_string();
    let mut scope = InstrumentationScope::builder(name);
    if let Some(version) = options.service_version() {
        scope = scope.with_version(version.to_string());
    }

    tracing_opentelemetry::layer().with_tracer(provider.tracer_with_scope(scope.build()))
}

/// Build the JSON fmt layer for structured logging (cloud environments)
pub fn build_json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_ansi(false)
}

/// Build the pretty fmt layer for human-readable output (local dev)
pub fn build_pretty_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
}

/// `RUST_LOG` if set, else the launcher log level
pub fn build_filter(level: LogLevel) -> EnvFilter {
    build_filter_from(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(), level)
}

/// `directives` if present and valid, else `level`
pub fn build_filter_from(directives: Option<&str>, level: LogLevel) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(level.level_filter().to_string()))
}

pub fn default_instrumentations() -> Vec<Arc<dyn Instrumentation>> {
    vec![Arc::new(TracingInstrumentation::default())]
}

/// Fill in the default instrumentations unless the caller supplied a list,
/// including an empty one.
pub fn configure_instrumentations(config: &mut TelemetryConfig) {
    if config.instrumentations.is_none() {
        config.instrumentations = Some(default_instrumentations());
    }
}
