use std::sync::Arc;

use crate::config::{TelemetryConfig, TelemetryOptions};
use crate::env::Environment;
use crate::error::LauncherError;
use crate::exporter::configure_exporters;
use crate::instrumentation::configure_instrumentations;
use crate::logger::setup_logger;
use crate::merge::coalesce;
use crate::propagation::configure_propagation;
use crate::resource::build_resource;
use crate::sdk::TelemetrySdk;
use crate::validate::{default_failure_handler, validate};

/// Configure telemetry from the caller's config and the process environment.
///
/// Returns an SDK that is configured but not started.
pub fn configure_telemetry(config: TelemetryConfig) -> Result<TelemetrySdk, LauncherError> {
    configure_telemetry_with_env(config, &Environment::from_process())
}

/// Same as [`configure_telemetry`], reading variables from `env` instead of
/// the process environment.
///
/// Order matters: the logger is set up first so every later step can report,
/// and validation runs on the merged options before anything is built.
pub fn configure_telemetry_with_env(
    mut config: TelemetryConfig,
    env: &Environment,
) -> Result<TelemetrySdk, LauncherError> {
    let logger = setup_logger(config.logger.as_ref(), &config.options, env);
    let fail = match &config.failure_handler {
        Some(handler) => Arc::clone(handler),
        None => default_failure_handler(Arc::clone(&logger)),
    };

    config.options = coalesce(
        &TelemetryOptions::defaults(),
        &env.options(),
        &config.options,
        logger.as_ref(),
    );

    validate(&config.options, &fail)?;

    config.resource = Some(build_resource(&config.options, config.resource.as_ref(), env));
    configure_propagation(&mut config, &fail)?;
    configure_exporters(&mut config)?;
    configure_instrumentations(&mut config);

    Ok(TelemetrySdk::new(config, logger))
}
