//! Propagator resolution from a comma-delimited list of format names.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use opentelemetry::propagation::text_map_propagator::FieldIter;
use opentelemetry::propagation::{Extractor, Injector, TextMapCompositePropagator, TextMapPropagator};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::{BaggagePropagator, TraceContextPropagator};
use opentelemetry_zipkin::{B3Encoding, Propagator as B3Propagator};

use crate::config::{TelemetryConfig, DEFAULT_PROPAGATORS};
use crate::error::LauncherError;
use crate::validate::FailureHandler;

/// Supported propagation formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropagationFormat {
    /// B3, multi-header (`x-b3-*`)
    B3,
    /// B3, single `b3` header
    B3Single,
    /// W3C `traceparent`/`tracestate`
    TraceContext,
    /// W3C `baggage`
    Baggage,
}

impl PropagationFormat {
    pub const SUPPORTED: &'static str = "b3, b3single, baggage, tracecontext";

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::B3 => "b3",
            Self::B3Single => "b3single",
            Self::TraceContext => "tracecontext",
            Self::Baggage => "baggage",
        }
    }

    /// Fresh propagator instance for this format
    pub fn build(&self) -> Box<dyn TextMapPropagator + Send + Sync> {
        match self {
            Self::B3 => Box::new(B3Propagator::with_encoding(B3Encoding::MultipleHeader)),
            Self::B3Single => Box::new(SingleHeaderB3::new()),
            Self::TraceContext => Box::new(TraceContextPropagator::new()),
            Self::Baggage => Box::new(BaggagePropagator::new()),
        }
    }
}

impl fmt::Display for PropagationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropagationFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "b3" => Ok(Self::B3),
            "b3single" => Ok(Self::B3Single),
            "tracecontext" => Ok(Self::TraceContext),
            // older name of the W3C baggage format
            "baggage" | "correlationcontext" => Ok(Self::Baggage),
            other => Err(format!(
                "Invalid configuration: unknown propagator specified: {other}. Supported propagators are: {}",
                Self::SUPPORTED
            )),
        }
    }
}

const B3_SINGLE_HEADER: &str = "b3";

/// B3 that injects only the single `b3` header.
///
/// The zipkin propagator writes the `x-b3-*` headers for every encoding, so
/// injection goes through [`SingleHeaderInjector`]. Extraction is unchanged.
#[derive(Debug)]
struct SingleHeaderB3 {
    inner: B3Propagator,
    fields: Vec<String>,
}

impl SingleHeaderB3 {
    fn new() -> Self {
        Self {
            inner: B3Propagator::with_encoding(B3Encoding::SingleHeader),
            fields: vec![B3_SINGLE_HEADER.to_string()],
        }
    }
}

impl TextMapPropagator for SingleHeaderB3 {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        self.inner
            .inject_context(cx, &mut SingleHeaderInjector { inner: injector })
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        self.inner.extract_with_context(cx, extractor)
    }

    fn fields(&self) -> FieldIter<'_> {
        FieldIter::new(&self.fields)
    }
}

/// Drops every key but `b3`
struct SingleHeaderInjector<'a> {
    inner: &'a mut dyn Injector,
}

impl Injector for SingleHeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        if key == B3_SINGLE_HEADER {
            self.inner.set(key, value);
        }
    }
}

/// Shared text-map propagator, as stored in [`TelemetryConfig`].
///
/// Cloning shares the underlying instance.
#[derive(Clone)]
pub struct Propagator {
    inner: Arc<dyn TextMapPropagator + Send + Sync>,
    formats: Vec<PropagationFormat>,
}

impl Propagator {
    /// Wrap a caller-built propagator
    pub fn new<P>(propagator: P) -> Self
    where
        P: TextMapPropagator + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(propagator),
            formats: Vec::new(),
        }
    }

    fn from_formats(formats: Vec<PropagationFormat>) -> Option<Self> {
        let inner: Arc<dyn TextMapPropagator + Send + Sync> = match formats.as_slice() {
            [] => return None,
            [single] => Arc::from(single.build()),
            many => Arc::new(TextMapCompositePropagator::new(
                many.iter().map(PropagationFormat::build).collect(),
            )),
        };
        Some(Self { inner, formats })
    }

    /// Formats this propagator was resolved from, in priority order. Empty for
    /// caller-built propagators.
    pub fn formats(&self) -> &[PropagationFormat] {
        &self.formats
    }

    pub fn is_composite(&self) -> bool {
        self.formats.len() > 1
    }

    /// Whether both handles share one instance
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Propagator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Propagator")
            .field("formats", &self.formats)
            .field("inner", &self.inner)
            .finish()
    }
}

impl TextMapPropagator for Propagator {
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector) {
        self.inner.inject_context(cx, injector)
    }

    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context {
        self.inner.extract_with_context(cx, extractor)
    }

    fn fields(&self) -> FieldIter<'_> {
        self.inner.fields()
    }
}

/// Format tokens of a propagator list; absent or blank means `b3`.
pub fn parse_propagators(list: Option<&str>) -> Vec<&str> {
    let list = match list {
        Some(list) if !list.trim().is_empty() => list,
        _ => DEFAULT_PROPAGATORS,
    };
    list.split(',').map(str::trim).collect()
}

/// Resolve a propagator list into one propagator.
///
/// Unknown names are reported through `fail`; when it returns `Ok` they are
/// left out. Duplicates are kept. `None` when no name resolved.
pub fn resolve_propagators(
    list: Option<&str>,
    fail: &FailureHandler,
) -> Result<Option<Propagator>, LauncherError> {
    let mut formats = Vec::new();
    for token in parse_propagators(list) {
        match token.parse::<PropagationFormat>() {
            Ok(format) => formats.push(format),
            Err(message) => fail(&message)?,
        }
    }
    Ok(Propagator::from_formats(formats))
}

/// Fill in `config.propagator` from the `propagators` option unless the caller
/// already set one.
pub fn configure_propagation(
    config: &mut TelemetryConfig,
    fail: &FailureHandler,
) -> Result<(), LauncherError> {
    if config.propagator.is_some() {
        return Ok(());
    }
    config.propagator = resolve_propagators(config.options.propagators.as_deref(), fail)?;
    Ok(())
}
