use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{HOST_NAME, SERVICE_NAME, SERVICE_VERSION};

use crate::config::TelemetryOptions;
use crate::env::{Environment, HOSTNAME_VAR};

/// Host name for the resource: `HOSTNAME` if set, else what the OS reports
pub fn resolve_host_name(env: &Environment) -> Option<String> {
    if let Some(host) = env.get(HOSTNAME_VAR) {
        return Some(host.to_string());
    }
    hostname::get()
        .ok()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Identifying attributes computed by the launcher
pub fn base_attributes(options: &TelemetryOptions, env: &Environment) -> Vec<KeyValue> {
    let mut attrs = vec![service_name_attribute(options)];

    if let Some(version) = options.service_version() {
        attrs.push(KeyValue::new(SERVICE_VERSION, version.to_string()));
    }

    if let Some(host) = resolve_host_name(env) {
        attrs.push(KeyValue::new(HOST_NAME, host));
    }

    attrs
}

/// Build the resource, letting caller-supplied attributes override the
/// computed ones.
///
/// `service.name` is the exception: it always carries the resolved service
/// name, since that is the value validation checked. A caller wanting another
/// name sets it in the options.
pub fn build_resource(
    options: &TelemetryOptions,
    caller: Option<&Resource>,
    env: &Environment,
) -> Resource {
    let mut builder = Resource::builder_empty().with_attributes(base_attributes(options, env));

    if let Some(caller) = caller {
        builder = builder
            .with_attributes(
                caller
                    .iter()
                    .map(|(key, value)| KeyValue::new(key.clone(), value.clone())),
            )
            .with_attribute(service_name_attribute(options));
    }

    builder.build()
}

fn service_name_attribute(options: &TelemetryOptions) -> KeyValue {
    KeyValue::new(
        SERVICE_NAME,
        options.service_name().unwrap_or_default().to_string(),
    )
}
