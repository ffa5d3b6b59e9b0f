use std::collections::HashMap;

use opentelemetry_otlp::{MetricExporter, Protocol, SpanExporter, WithExportConfig, WithHttpConfig};
use tracing::debug;

use crate::config::{TelemetryConfig, DEFAULT_METRIC_ENDPOINT, DEFAULT_SPAN_ENDPOINT};
use crate::error::LauncherError;

/// Header carrying the access token on export requests
pub const ACCESS_TOKEN_HEADER: &str = "Lightstep-Access-Token";

/// Export request headers. No token means no header at all.
pub fn auth_headers(access_token: Option<&str>) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    if let Some(token) = access_token {
        headers.insert(ACCESS_TOKEN_HEADER.to_string(), token.to_string());
    }
    headers
}

/// OTLP/HTTP span exporter. The endpoint is not checked here beyond what the
/// exporter builder itself rejects.
pub fn build_trace_exporter(
    endpoint: &str,
    headers: HashMap<String, String>,
) -> Result<SpanExporter, LauncherError> {
    debug!(endpoint, "Building OTLP/HTTP span exporter");
    let exporter = SpanExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .with_headers(headers)
        .build()?;
    Ok(exporter)
}

/// OTLP/HTTP metric exporter
pub fn build_metric_exporter(
    endpoint: &str,
    headers: HashMap<String, String>,
) -> Result<MetricExporter, LauncherError> {
    debug!(endpoint, "Building OTLP/HTTP metric exporter");
    let exporter = MetricExporter::builder()
        .with_http()
        .with_protocol(Protocol::HttpBinary)
        .with_endpoint(endpoint)
        .with_headers(headers)
        .build()?;
    Ok(exporter)
}

/// Fill in the trace exporter, and the metric exporter when metrics are on.
/// Exporters the caller supplied are left alone.
pub fn configure_exporters(config: &mut TelemetryConfig) -> Result<(), LauncherError> {
    let options = &config.options;

    if config.trace_exporter.is_none() {
        let endpoint = options
            .span_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_SPAN_ENDPOINT);
        config.trace_exporter = Some(build_trace_exporter(
            endpoint,
            auth_headers(options.access_token()),
        )?);
    }

    if options.metrics_enabled() && config.metric_exporter.is_none() {
        let endpoint = options
            .metric_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_METRIC_ENDPOINT);
        config.metric_exporter = Some(build_metric_exporter(
            endpoint,
            auth_headers(options.access_token()),
        )?);
    }

    Ok(())
}
