use serde_json::Value;

use crate::config::TelemetryOptions;
use crate::logger::DiagLogger;

/// Merge the three option layers, caller over environment over defaults.
///
/// The merge is shallow: a field present in a higher layer replaces the lower
/// one whole. Each input layer and the result are reported as debug records.
pub fn coalesce(
    defaults: &TelemetryOptions,
    env: &TelemetryOptions,
    caller: &TelemetryOptions,
    logger: &dyn DiagLogger,
) -> TelemetryOptions {
    let merged = overlay(overlay(defaults.clone(), env), caller);

    logger.debug("Default config", &record(defaults));
    logger.debug("Config from environment", &record(env));
    logger.debug("Config from code", &record(caller));
    logger.debug("Merged config", &record(&merged));

    merged
}

/// `base` with every field present in `top` replaced
pub fn overlay(base: TelemetryOptions, top: &TelemetryOptions) -> TelemetryOptions {
    let top = top.clone();
    TelemetryOptions {
        access_token: top.access_token.or(base.access_token),
        service_name: top.service_name.or(base.service_name),
        service_version: top.service_version.or(base.service_version),
        span_endpoint: top.span_endpoint.or(base.span_endpoint),
        metric_endpoint: top.metric_endpoint.or(base.metric_endpoint),
        propagators: top.propagators.or(base.propagators),
        log_level: top.log_level.or(base.log_level),
        metrics_enabled: top.metrics_enabled.or(base.metrics_enabled),
        metrics_host_enabled: top.metrics_host_enabled.or(base.metrics_host_enabled),
    }
}

fn record(options: &TelemetryOptions) -> Value {
    serde_json::to_value(options.redacted()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogLevel, DEFAULT_SPAN_ENDPOINT};
    use crate::logger::testing::RecordingLogger;

    fn layer(service_name: Option<&str>, span_endpoint: Option<&str>) -> TelemetryOptions {
        TelemetryOptions {
            service_name: service_name.map(str::to_string),
            span_endpoint: span_endpoint.map(str::to_string),
            ..TelemetryOptions::default()
        }
    }

    #[test]
    fn caller_wins_over_environment_and_defaults() {
        let logger = RecordingLogger::default();
        let defaults = layer(Some("default"), Some("http://default"));
        let env = layer(Some("env"), Some("http://env"));
        let caller = layer(Some("caller"), None);

        let merged = coalesce(&defaults, &env, &caller, &logger);

        assert_eq!(merged.service_name.as_deref(), Some("caller"));
        assert_eq!(merged.span_endpoint.as_deref(), Some("http://env"));
    }

    #[test]
    fn defaults_show_through_when_nothing_overrides() {
        let logger = RecordingLogger::default();

        let merged = coalesce(
            &TelemetryOptions::defaults(),
            &TelemetryOptions::default(),
            &TelemetryOptions::default(),
            &logger,
        );

        assert_eq!(merged, TelemetryOptions::defaults());
        assert_eq!(merged.span_endpoint.as_deref(), Some(DEFAULT_SPAN_ENDPOINT));
    }

    #[test]
    fn every_present_caller_field_is_kept() {
        let logger = RecordingLogger::default();
        let caller = TelemetryOptions {
            access_token: Some("c".repeat(32)),
            service_name: Some("svc".to_string()),
            service_version: Some("2.0".to_string()),
            span_endpoint: Some("http://caller/traces".to_string()),
            metric_endpoint: Some("http://caller/metrics".to_string()),
            propagators: Some("tracecontext".to_string()),
            log_level: Some(LogLevel::Warn),
            metrics_enabled: Some(true),
            metrics_host_enabled: Some(false),
        };
        let env = TelemetryOptions {
            access_token: Some("e".repeat(32)),
            service_name: Some("env-svc".to_string()),
            service_version: Some("1.0".to_string()),
            span_endpoint: Some("http://env/traces".to_string()),
            metric_endpoint: Some("http://env/metrics".to_string()),
            propagators: Some("b3".to_string()),
            log_level: Some(LogLevel::Debug),
            metrics_enabled: Some(false),
            metrics_host_enabled: Some(true),
        };

        let merged = coalesce(&TelemetryOptions::defaults(), &env, &caller, &logger);

        assert_eq!(merged, caller);
    }

    #[test]
    fn explicit_false_flag_overrides_lower_true() {
        let base = TelemetryOptions {
            metrics_host_enabled: Some(true),
            ..TelemetryOptions::default()
        };
        let top = TelemetryOptions {
            metrics_host_enabled: Some(false),
            ..TelemetryOptions::default()
        };

        assert_eq!(overlay(base, &top).metrics_host_enabled, Some(false));
    }

    #[test]
    fn emits_four_debug_records_in_order() {
        let logger = RecordingLogger::default();

        coalesce(
            &TelemetryOptions::defaults(),
            &TelemetryOptions::default(),
            &TelemetryOptions::default(),
            &logger,
        );

        assert_eq!(
            logger.debug_messages(),
            vec![
                "Default config",
                "Config from environment",
                "Config from code",
                "Merged config",
            ]
        );
    }

    #[test]
    fn debug_records_redact_the_token() {
        let logger = RecordingLogger::default();
        let caller = TelemetryOptions {
            access_token: Some("x".repeat(32)),
            ..TelemetryOptions::default()
        };

        coalesce(
            &TelemetryOptions::defaults(),
            &TelemetryOptions::default(),
            &caller,
            &logger,
        );

        let records = logger.debug.lock().unwrap();
        let (_, merged) = records.last().unwrap();
        assert_eq!(merged["accessToken"], "<redacted>");
        assert_eq!(merged["propagators"], "b3");
    }
}
