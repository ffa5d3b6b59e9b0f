use std::fmt;
use std::sync::Arc;

use opentelemetry::global;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use serde_json::json;

use crate::config::TelemetryConfig;
use crate::error::LauncherError;
#[cfg(feature = "host-metrics")]
use crate::host_metrics::HostMetrics;
use crate::logger::DiagLogger;

/// Configured, not yet started, telemetry pipeline.
///
/// Owns the fully resolved [`TelemetryConfig`]. Nothing is installed globally
/// until [`start`](Self::start) is called.
pub struct TelemetrySdk {
    config: TelemetryConfig,
    logger: Arc<dyn DiagLogger>,
    tracer_provider: Option<SdkTracerProvider>,
    meter_provider: Option<SdkMeterProvider>,
    #[cfg(feature = "host-metrics")]
    host_metrics: Option<HostMetrics>,
    started: bool,
    exhausted: bool,
}

impl TelemetrySdk {
    pub fn new(config: TelemetryConfig, logger: Arc<dyn DiagLogger>) -> Self {
        Self {
            config,
            logger,
            tracer_provider: None,
            meter_provider: None,
            #[cfg(feature = "host-metrics")]
            host_metrics: None,
            started: false,
            exhausted: false,
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn tracer_provider(&self) -> Option<&SdkTracerProvider> {
        self.tracer_provider.as_ref()
    }

    pub fn meter_provider(&self) -> Option<&SdkMeterProvider> {
        self.meter_provider.as_ref()
    }

    /// Start the pipeline: build the providers, install instrumentations
    /// against them, then make them global and run the post-start phase
    /// (host metrics).
    ///
    /// Exporters are moved into the providers, so a started SDK's config no
    /// longer holds them and an SDK starts at most once, whether or not the
    /// first start succeeded. Nothing global is touched until every
    /// instrumentation installed; if one fails the new providers are shut
    /// down.
    pub fn start(&mut self) -> Result<(), LauncherError> {
        if self.started {
            return Err(LauncherError::Init("telemetry SDK already started".to_string()));
        }
        if self.exhausted {
            return Err(LauncherError::Init(
                "telemetry SDK cannot be restarted, configure a new one".to_string(),
            ));
        }

        self.exhausted = true;
        let (tracer_provider, meter_provider) = self.start_providers();

        if let Err(err) = self.install_instrumentations(&tracer_provider) {
            self.discard(tracer_provider, meter_provider);
            return Err(err);
        }

        self.install_globals(tracer_provider, meter_provider);
        self.post_start();

        self.started = true;
        Ok(())
    }

    fn start_providers(&mut self) -> (SdkTracerProvider, Option<SdkMeterProvider>) {
        let resource = self
            .config
            .resource
            .clone()
            .unwrap_or_else(|| Resource::builder_empty().build());

        let mut tracer_builder = SdkTracerProvider::builder().with_resource(resource.clone());
        if let Some(exporter) = self.config.trace_exporter.take() {
            tracer_builder = tracer_builder.with_batch_exporter(exporter);
        }

        let meter_provider = self.config.options.metrics_enabled().then(|| {
            let mut meter_builder = SdkMeterProvider::builder().with_resource(resource);
            if let Some(exporter) = self.config.metric_exporter.take() {
                meter_builder = meter_builder.with_periodic_exporter(exporter);
            }
            meter_builder.build()
        });

        (tracer_builder.build(), meter_provider)
    }

    fn install_instrumentations(&self, provider: &SdkTracerProvider) -> Result<(), LauncherError> {
        for instrumentation in self.config.instrumentations.iter().flatten() {
            instrumentation.install(provider, &self.config.options)?;
            self.logger.debug(
                "Installed instrumentation",
                &json!({ "name": instrumentation.name() }),
            );
        }
        Ok(())
    }

    fn install_globals(
        &mut self,
        tracer_provider: SdkTracerProvider,
        meter_provider: Option<SdkMeterProvider>,
    ) {
        global::set_tracer_provider(tracer_provider.clone());
        self.tracer_provider = Some(tracer_provider);

        if let Some(meter_provider) = meter_provider {
            global::set_meter_provider(meter_provider.clone());
            self.meter_provider = Some(meter_provider);
        }

        if let Some(propagator) = &self.config.propagator {
            global::set_text_map_propagator(propagator.clone());
        }

        self.logger.debug(
            "Started providers",
            &json!({
                "metrics": self.meter_provider.is_some(),
                "propagator": self.config.propagator.as_ref().map(|p| {
                    p.formats().iter().map(|f| f.as_str()).collect::<Vec<_>>()
                }),
            }),
        );
    }

    fn discard(&self, tracer_provider: SdkTracerProvider, meter_provider: Option<SdkMeterProvider>) {
        if let Err(e) = tracer_provider.shutdown() {
            self.logger
                .error(&format!("Failed to shutdown tracer provider: {e}"));
        }
        if let Some(Err(e)) = meter_provider.map(|p| p.shutdown()) {
            self.logger
                .error(&format!("Failed to shutdown meter provider: {e}"));
        }
    }

    /// Runs once the meter provider is live.
    fn post_start(&mut self) {
        let options = &self.config.options;
        if !(options.metrics_enabled() && options.metrics_host_enabled()) {
            return;
        }

        #[cfg(feature = "host-metrics")]
        if let Some(provider) = &self.meter_provider {
            use opentelemetry::metrics::MeterProvider;

            let meter = provider.meter(env!("CARGO_PKG_NAME"));
            self.host_metrics = Some(HostMetrics::register(&meter));
            self.logger.debug("Registered host metrics", &serde_json::Value::Null);
        }

        #[cfg(not(feature = "host-metrics"))]
        self.logger.debug(
            "Host metrics requested but the host-metrics feature is disabled",
            &serde_json::Value::Null,
        );
    }

    /// Flush and shut down both providers. Both are shut down even if the
    /// first one fails; the first error is returned.
    pub fn shutdown(&mut self) -> Result<(), LauncherError> {
        #[cfg(feature = "host-metrics")]
        {
            self.host_metrics = None;
        }

        let traces = self.tracer_provider.take().map(|p| p.shutdown());
        let metrics = self.meter_provider.take().map(|p| p.shutdown());
        self.started = false;

        traces.transpose()?;
        metrics.transpose()?;
        Ok(())
    }
}

impl fmt::Debug for TelemetrySdk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelemetrySdk")
            .field("config", &self.config)
            .field("started", &self.started)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::config::TelemetryOptions;
    use crate::exporter::build_trace_exporter;
    use crate::instrumentation::Instrumentation;
    use crate::logger::testing::RecordingLogger;

    #[derive(Default)]
    struct RecordingInstrumentation {
        name: &'static str,
        installs: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Instrumentation for RecordingInstrumentation {
        fn name(&self) -> &str {
            self.name
        }

        fn install(
            &self,
            _provider: &SdkTracerProvider,
            _options: &TelemetryOptions,
        ) -> Result<(), LauncherError> {
            self.installs.lock().unwrap().push(self.name);
            Ok(())
        }
    }

    struct FailingInstrumentation;

    impl Instrumentation for FailingInstrumentation {
        fn name(&self) -> &str {
            "failing"
        }

        fn install(
            &self,
            _provider: &SdkTracerProvider,
            _options: &TelemetryOptions,
        ) -> Result<(), LauncherError> {
            Err(LauncherError::Init("subscriber already set".to_string()))
        }
    }

    fn local_config() -> TelemetryConfig {
        let exporter =
            build_trace_exporter("http://localhost:4318/v1/traces", Default::default()).unwrap();
        TelemetryConfig::new()
            .with_service_name("sdk-test")
            .with_trace_exporter(exporter)
            .with_instrumentations(Vec::new())
    }

    fn sdk(config: TelemetryConfig) -> TelemetrySdk {
        TelemetrySdk::new(config, Arc::new(RecordingLogger::default()))
    }

    #[test]
    fn new_sdk_is_not_started() {
        let sdk = sdk(local_config());

        assert!(!sdk.is_started());
        assert!(sdk.tracer_provider().is_none());
        assert!(sdk.config().trace_exporter.is_some());
    }

    #[test]
    fn start_builds_tracer_provider_and_consumes_exporter() {
        let mut sdk = sdk(local_config());

        sdk.start().unwrap();

        assert!(sdk.is_started());
        assert!(sdk.tracer_provider().is_some());
        assert!(sdk.meter_provider().is_none());
        assert!(sdk.config().trace_exporter.is_none());
        assert!(sdk.shutdown().is_ok());
    }

    #[test]
    fn start_twice_is_an_error() {
        let mut sdk = sdk(local_config());

        sdk.start().unwrap();
        let err = sdk.start().unwrap_err();

        assert!(matches!(err, LauncherError::Init(_)));
        let _ = sdk.shutdown();
    }

    #[test]
    fn start_builds_meter_provider_when_metrics_enabled() {
        let mut config = local_config().with_metrics_enabled(true);
        config.options.metrics_host_enabled = Some(true);
        let mut sdk = sdk(config);

        sdk.start().unwrap();

        assert!(sdk.meter_provider().is_some());
        let _ = sdk.shutdown();
    }

    #[test]
    fn instrumentations_install_in_order() {
        let installs = Arc::new(Mutex::new(Vec::new()));
        let first: Arc<dyn Instrumentation> = Arc::new(RecordingInstrumentation {
            name: "first",
            installs: Arc::clone(&installs),
        });
        let second: Arc<dyn Instrumentation> = Arc::new(RecordingInstrumentation {
            name: "second",
            installs: Arc::clone(&installs),
        });
        let mut sdk = sdk(local_config().with_instrumentations(vec![first, second]));

        sdk.start().unwrap();

        assert_eq!(*installs.lock().unwrap(), vec!["first", "second"]);
        let _ = sdk.shutdown();
    }

    #[test]
    fn restart_after_shutdown_is_an_error() {
        let mut sdk = sdk(local_config());

        sdk.start().unwrap();
        sdk.shutdown().unwrap();
        let err = sdk.start().unwrap_err();

        assert!(matches!(err, LauncherError::Init(_)));
        assert!(sdk.tracer_provider().is_none());
    }

    #[test]
    fn shutdown_before_start_is_a_no_op() {
        let mut sdk = sdk(local_config());

        assert!(sdk.shutdown().is_ok());
    }

    #[test]
    fn failed_instrumentation_leaves_sdk_unstarted_and_unusable() {
        let installs = Arc::new(Mutex::new(Vec::new()));
        let after: Arc<dyn Instrumentation> = Arc::new(RecordingInstrumentation {
            name: "after",
            installs: Arc::clone(&installs),
        });
        let logger = Arc::new(RecordingLogger::default());
        let config = local_config()
            .with_metrics_enabled(true)
            .with_instrumentations(vec![Arc::new(FailingInstrumentation), after]);
        let mut sdk = TelemetrySdk::new(config, logger.clone());

        let err = sdk.start().unwrap_err();

        assert!(matches!(err, LauncherError::Init(ref m) if m == "subscriber already set"));
        assert!(!sdk.is_started());
        assert!(sdk.tracer_provider().is_none());
        assert!(sdk.meter_provider().is_none());
        assert!(installs.lock().unwrap().is_empty());
        assert!(!logger
            .debug_messages()
            .iter()
            .any(|message| message == "Started providers"));

        let retry = sdk.start().unwrap_err();

        assert!(matches!(retry, LauncherError::Init(ref m) if m.contains("cannot be restarted")));
        assert!(!sdk.is_started());
        assert!(sdk.shutdown().is_ok());
    }
}
