use std::sync::Arc;

use crate::config::{TelemetryOptions, DEFAULT_SPAN_ENDPOINT};
use crate::error::LauncherError;
use crate::logger::DiagLogger;

/// Called with a message for each configuration problem found.
///
/// Returning `Err` aborts the configuration call with that error. Returning
/// `Ok(())` lets the launcher carry on, so a handler can collect or merely
/// warn about problems.
pub type FailureHandler = Arc<dyn Fn(&str) -> Result<(), LauncherError> + Send + Sync>;

/// Access token lengths issued by the vendor
pub const VALID_TOKEN_LENGTHS: [usize; 3] = [32, 84, 104];

/// Logs the message at error level and fails with [`LauncherError::Config`].
///
/// With the default [`TracingLogger`](crate::logger::TracingLogger) the log
/// line only shows up if the application installed a `tracing` subscriber
/// before configuring; the launcher's own subscriber is installed later, on
/// start. The returned error carries the same message either way.
pub fn default_failure_handler(logger: Arc<dyn DiagLogger>) -> FailureHandler {
    Arc::new(move |message: &str| {
        logger.error(message);
        Err(LauncherError::Config(message.to_string()))
    })
}

/// Run the upfront checks known to catch broken setups.
///
/// Checks run in a fixed order and each reports through `fail` at most once.
pub fn validate(options: &TelemetryOptions, fail: &FailureHandler) -> Result<(), LauncherError> {
    validate_token(options, fail)?;
    validate_service_name(options, fail)?;
    Ok(())
}

/// The token is only mandatory for the default SaaS endpoint; satellites may
/// not need one. A token that is present must have a known length.
fn validate_token(options: &TelemetryOptions, fail: &FailureHandler) -> Result<(), LauncherError> {
    let span_endpoint = options.span_endpoint.as_deref();

    let Some(token) = options.access_token() else {
        if span_endpoint == Some(DEFAULT_SPAN_ENDPOINT) {
            fail(&format!(
                "Invalid configuration: access token missing, must be set when reporting to {DEFAULT_SPAN_ENDPOINT}. \
                 Set LS_ACCESS_TOKEN env var or configure access_token in code"
            ))?;
        }
        return Ok(());
    };

    if !VALID_TOKEN_LENGTHS.contains(&token.chars().count()) {
        fail("Invalid configuration: access token length incorrect. Ensure token is set correctly")?;
    }

    Ok(())
}

fn validate_service_name(
    options: &TelemetryOptions,
    fail: &FailureHandler,
) -> Result<(), LauncherError> {
    if options.service_name().is_none() {
        fail(
            "Invalid configuration: service name missing. \
             Set LS_SERVICE_NAME env var or configure service_name in code",
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::logger::testing::RecordingLogger;

    fn collecting_handler() -> (FailureHandler, Arc<Mutex<Vec<String>>>) {
        let messages = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        let handler: FailureHandler = Arc::new(move |message: &str| {
            sink.lock().unwrap().push(message.to_string());
            Ok(())
        });
        (handler, messages)
    }

    fn options(token: Option<&str>, service_name: Option<&str>) -> TelemetryOptions {
        TelemetryOptions {
            access_token: token.map(str::to_string),
            service_name: service_name.map(str::to_string),
            ..TelemetryOptions::defaults()
        }
    }

    #[test]
    fn valid_configuration_passes() {
        let (fail, messages) = collecting_handler();
        let token = "x".repeat(32);

        validate(&options(Some(&token), Some("svc")), &fail).unwrap();

        assert!(messages.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_token_fails_for_default_endpoint() {
        let (fail, messages) = collecting_handler();

        validate(&options(None, Some("svc")), &fail).unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Invalid configuration: access token missing"));
        assert!(messages[0].contains(DEFAULT_SPAN_ENDPOINT));
    }

    #[test]
    fn missing_token_is_fine_for_satellite() {
        let (fail, messages) = collecting_handler();
        let mut options = options(None, Some("svc"));
        options.span_endpoint = Some("http://localhost:8360".to_string());

        validate(&options, &fail).unwrap();

        assert!(messages.lock().unwrap().is_empty());
    }

    #[test]
    fn accepts_exactly_the_known_token_lengths() {
        for len in 0..=128 {
            let (fail, messages) = collecting_handler();
            let mut options = options(None, Some("svc"));
            options.access_token = Some("t".repeat(len));
            options.span_endpoint = Some("http://localhost:8360".to_string());

            validate(&options, &fail).unwrap();

            let expect_valid = len == 0 || VALID_TOKEN_LENGTHS.contains(&len);
            assert_eq!(
                messages.lock().unwrap().is_empty(),
                expect_valid,
                "token length {len}"
            );
        }
    }

    #[test]
    fn token_length_counts_characters_not_content() {
        let (fail, messages) = collecting_handler();
        let token = "é".repeat(32);

        validate(&options(Some(&token), Some("svc")), &fail).unwrap();

        assert!(messages.lock().unwrap().is_empty());
    }

    #[test]
    fn bad_token_length_reports_format_error() {
        let (fail, messages) = collecting_handler();

        validate(&options(Some("short"), Some("svc")), &fail).unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Invalid configuration: access token length incorrect"));
    }

    #[test]
    fn missing_service_name_fails_regardless_of_token() {
        let (fail, messages) = collecting_handler();
        let token = "x".repeat(84);

        validate(&options(Some(&token), None), &fail).unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("Invalid configuration: service name missing"));
    }

    #[test]
    fn non_raising_handler_sees_every_violation_in_order() {
        let (fail, messages) = collecting_handler();

        validate(&options(None, None), &fail).unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("access token missing"));
        assert!(messages[1].contains("service name missing"));
    }

    #[test]
    fn default_handler_logs_and_stops_at_first_failure() {
        let logger = Arc::new(RecordingLogger::default());
        let fail = default_failure_handler(logger.clone());

        let err = validate(&options(None, None), &fail).unwrap_err();

        assert!(err.is_config());
        assert!(err.to_string().contains("access token missing"));
        assert_eq!(logger.errors().len(), 1);
    }
}
