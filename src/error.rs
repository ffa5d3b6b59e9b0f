use opentelemetry_otlp::ExporterBuildError;
use opentelemetry_sdk::error::OTelSdkError;

#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    /// Raised by the default failure handler. The message is the one passed
    /// to the handler, e.g. `Invalid configuration: service name missing. ...`
    #[error("{0}")]
    Config(String),
    #[error(transparent)]
    Exporter(#[from] ExporterBuildError),
    #[error(transparent)]
    Sdk(#[from] OTelSdkError),
    #[error("Initialization error: {0}")]
    Init(String),
}

impl LauncherError {
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
