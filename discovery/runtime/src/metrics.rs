use prometheus_client::{
    metrics::histogram::Histogram,
    registry::{Registry, Unit},
};
use std::time::Duration;

/// Observes the latency of each discovery phase.
pub trait Metrics: Send + Sync {
    fn observe_api_server_call(&self, elapsed: Duration);

    fn observe_cloud_call(&self, elapsed: Duration);

    fn observe_total(&self, elapsed: Duration);
}

/// Prometheus histograms of discovery latencies.
#[derive(Clone, Debug)]
pub struct DiscoveryMetrics {
    apiserver: Histogram,
    cloud: Histogram,
    total: Histogram,
}

/// Discards all observations.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopMetrics;

const BUCKETS: [f64; 8] = [0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 15.0, 20.0];

// === impl DiscoveryMetrics ===

impl DiscoveryMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let apiserver = Histogram::new(BUCKETS.iter().copied());
        reg.register_with_unit(
            "apiserver_request_duration",
            "A histogram of latencies for apiserver API resource requests",
            Unit::Seconds,
            apiserver.clone(),
        );

        let cloud = Histogram::new(BUCKETS.iter().copied());
        reg.register_with_unit(
            "cloud_operations_request_duration",
            "A histogram of latencies for Azure get operations requests",
            Unit::Seconds,
            cloud.clone(),
        );

        let total = Histogram::new(BUCKETS.iter().copied());
        reg.register_with_unit(
            "total_duration",
            "A histogram of latencies for complete resource discoveries",
            Unit::Seconds,
            total.clone(),
        );

        Self {
            apiserver,
            cloud,
            total,
        }
    }
}

impl Metrics for DiscoveryMetrics {
    fn observe_api_server_call(&self, elapsed: Duration) {
        self.apiserver.observe(elapsed.as_secs_f64());
    }

    fn observe_cloud_call(&self, elapsed: Duration) {
        self.cloud.observe(elapsed.as_secs_f64());
    }

    fn observe_total(&self, elapsed: Duration) {
        self.total.observe(elapsed.as_secs_f64());
    }
}

// === impl NoopMetrics ===

impl Metrics for NoopMetrics {
    fn observe_api_server_call(&self, _: Duration) {}

    fn observe_cloud_call(&self, _: Duration) {}

    fn observe_total(&self, _: Duration) {}
}
