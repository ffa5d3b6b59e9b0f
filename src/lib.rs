//! OpenTelemetry launcher with vendor defaults.
//!
//! Turns a small set of options, from code or from the environment, into a
//! configured OpenTelemetry SDK: OTLP/HTTP exporters carrying the access
//! token, a resource with service and host attributes, propagators, and the
//! `tracing` bridge.
//!
//! # Features
//!
//! - `host-metrics` (default): register host gauges when metrics are enabled
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use otel_launcher::{configure_telemetry, TelemetryConfig};
//!
//! # fn main() -> Result<(), otel_launcher::LauncherError> {
//! let mut sdk = configure_telemetry(
//!     TelemetryConfig::new()
//!         .with_service_name("my-service")
//!         .with_service_version("1.0.0"),
//! )?;
//! sdk.start()?;
//! // ...
//! sdk.shutdown()?;
//! # Ok(())
//! # }
//! ```
//!
//! Options set in code take precedence over the environment, which takes
//! precedence over the defaults.
//!
//! # Environment Variables
//!
//! | Variable | Option | Default |
//! |----------|--------|---------|
//! | `LS_ACCESS_TOKEN` | `access_token` | - |
//! | `LS_SERVICE_NAME` | `service_name` | - |
//! | `LS_SERVICE_VERSION` | `service_version` | - |
//! | `OTEL_EXPORTER_OTLP_SPAN_ENDPOINT` | `span_endpoint` | `https://ingest.lightstep.com/traces/otlp/v0.6` |
//! | `OTEL_EXPORTER_OTLP_METRIC_ENDPOINT` | `metric_endpoint` | `https://ingest.lightstep.com/metrics/otlp/v0.6` |
//! | `OTEL_PROPAGATORS` | `propagators` | `b3` |
//! | `OTEL_LOG_LEVEL` | `log_level` | `info` |
//! | `LS_METRICS_ENABLED` | `metrics_enabled` | `false` |
//! | `LS_METRICS_HOST_ENABLED` | `metrics_host_enabled` | `true` |
//! | `HOSTNAME` | `host.name` resource attribute | OS host name |
//!
//! # Module Structure
//!
//! - [`launcher`]: Entry points
//! - [`config`]: Option and configuration types
//! - [`env`]: Environment variable source
//! - [`merge`]: Layered option merge
//! - [`validate`]: Validation and failure handlers
//! - [`resource`]: Resource construction
//! - [`propagation`]: Propagator resolution
//! - [`exporter`]: OTLP exporters
//! - [`instrumentation`]: Instrumentations, including the `tracing` bridge
//! - [`sdk`]: The configured SDK handle
//! - [`logger`]: The launcher's own diagnostic logger
//! - [`error`]: Error types

pub mod config;
pub mod env;
pub mod error;
pub mod exporter;
#[cfg(feature = "host-metrics")]
pub mod host_metrics;
pub mod instrumentation;
pub mod launcher;
pub mod logger;
pub mod merge;
pub mod propagation;
pub mod resource;
pub mod sdk;
pub mod validate;

// Re-exports
pub use config::{LogLevel, TelemetryConfig, TelemetryOptions};
pub use env::Environment;
pub use error::LauncherError;
pub use instrumentation::{Instrumentation, LogFormat, TracingInstrumentation};
pub use launcher::{configure_telemetry, configure_telemetry_with_env};
pub use logger::{DiagLogger, TracingLogger};
pub use propagation::{PropagationFormat, Propagator};
pub use sdk::TelemetrySdk;
pub use validate::FailureHandler;
