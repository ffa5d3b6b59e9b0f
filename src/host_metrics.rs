//! Host-level metrics registered after the meter provider has started.

use std::sync::{Arc, Mutex};

use opentelemetry::metrics::{Meter, ObservableGauge};
use opentelemetry::KeyValue;
use sysinfo::System;

pub const MEMORY_USAGE: &str = "system.memory.usage";
pub const LOAD_AVERAGE_1M: &str = "system.cpu.load_average.1m";

/// Observable host gauges. Values are sampled on each collection.
pub struct HostMetrics {
    _memory: ObservableGauge<u64>,
    _load: ObservableGauge<f64>,
}

impl HostMetrics {
    pub fn register(meter: &Meter) -> Self {
        let system = Arc::new(Mutex::new(System::new()));

        let memory = meter
            .u64_observable_gauge(MEMORY_USAGE)
            .with_description("Host memory by state")
            .with_unit("By")
            .with_callback(move |observer| {
                if let Ok(mut sys) = system.lock() {
                    sys.refresh_memory();
                    observer.observe(sys.used_memory(), &[KeyValue::new("state", "used")]);
                    observer.observe(sys.free_memory(), &[KeyValue::new("state", "free")]);
                }
            })
            .build();

        let load = meter
            .f64_observable_gauge(LOAD_AVERAGE_1M)
            .with_description("Host load average over one minute")
            .with_unit("{thread}")
            .with_callback(|observer| observer.observe(System::load_average().one, &[]))
            .build();

        Self {
            _memory: memory,
            _load: load,
        }
    }
}

impl std::fmt::Debug for HostMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostMetrics")
            .field("instruments", &[MEMORY_USAGE, LOAD_AVERAGE_1M])
            .finish()
    }
}
