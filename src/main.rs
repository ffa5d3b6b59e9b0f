use otel_launcher::{configure_telemetry, LauncherError, TelemetryConfig};
use tracing::info;

#[tracing::instrument]
fn greet(user: &str) -> String {
    info!(user, "Greeting user");
    format!("Hello, {user}!")
}

/// Configures telemetry from `LS_*`/`OTEL_*` variables and emits one span.
fn main() -> Result<(), LauncherError> {
    let mut sdk = configure_telemetry(TelemetryConfig::new())?;
    sdk.start()?;

    let user = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "anonymous".to_string());
    println!("{}", greet(&user));

    sdk.shutdown()
}
