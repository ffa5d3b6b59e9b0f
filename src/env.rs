//! Environment variable source for launcher options.
//!
//! The recognized variables form a closed set, see [`ALIASES`]. The
//! environment is captured once into an [`Environment`] snapshot so a single
//! configuration call reads one consistent view.

use std::collections::HashMap;
use std::env;

use crate::config::TelemetryOptions;

/// Host name override consulted by the resource builder
pub const HOSTNAME_VAR: &str = "HOSTNAME";

/// Option field an environment variable feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionField {
    AccessToken,
    ServiceName,
    ServiceVersion,
    SpanEndpoint,
    MetricEndpoint,
    Propagators,
    LogLevel,
    MetricsHostEnabled,
    MetricsEnabled,
}

/// Environment variable name to option field
pub const ALIASES: &[(&str, OptionField)] = &[
    ("LS_ACCESS_TOKEN", OptionField::AccessToken),
    ("LS_SERVICE_NAME", OptionField::ServiceName),
    ("LS_SERVICE_VERSION", OptionField::ServiceVersion),
    ("OTEL_EXPORTER_OTLP_SPAN_ENDPOINT", OptionField::SpanEndpoint),
    ("OTEL_EXPORTER_OTLP_METRIC_ENDPOINT", OptionField::MetricEndpoint),
    ("OTEL_PROPAGATORS", OptionField::Propagators),
    ("OTEL_LOG_LEVEL", OptionField::LogLevel),
    ("LS_METRICS_HOST_ENABLED", OptionField::MetricsHostEnabled),
    ("LS_METRICS_ENABLED", OptionField::MetricsEnabled),
];

/// Snapshot of environment variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Capture the current process environment
    pub fn from_process() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    /// Build from explicit name/value pairs
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Value of `name` if set and non-empty
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Options layer built from the recognized variables.
    ///
    /// Only variables that are present and non-empty produce a field. Flags are
    /// `true` only for the exact literal `"true"`. A log level that does not
    /// name a known level leaves the field absent.
    pub fn options(&self) -> TelemetryOptions {
        let mut options = TelemetryOptions::default();

        for (name, field) in ALIASES {
            let Some(value) = self.get(name) else {
                continue;
            };

            match field {
                OptionField::AccessToken => options.access_token = Some(value.to_string()),
                OptionField::ServiceName => options.service_name = Some(value.to_string()),
                OptionField::ServiceVersion => options.service_version = Some(value.to_string()),
                OptionField::SpanEndpoint => options.span_endpoint = Some(value.to_string()),
                OptionField::MetricEndpoint => options.metric_endpoint = Some(value.to_string()),
                OptionField::Propagators => options.propagators = Some(value.to_string()),
                OptionField::LogLevel => options.log_level = value.parse().ok(),
                OptionField::MetricsHostEnabled => {
                    options.metrics_host_enabled = Some(value == "true")
                }
                OptionField::MetricsEnabled => options.metrics_enabled = Some(value == "true"),
            }
        }

        options
    }
}
