use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub backend_requests_total: IntCounterVec,
    pub backend_request_latency_seconds: HistogramVec,
    pub location_reports_total: IntCounterVec,
    pub optimistic_rollbacks_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let backend_requests_total = IntCounterVec::new(
            Opts::new(
                "backend_requests_total",
                "Backend requests by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )
        .expect("valid backend_requests_total metric");

        let backend_request_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "backend_request_latency_seconds",
                "Latency of backend requests in seconds",
            ),
            &["endpoint"],
        )
        .expect("valid backend_request_latency_seconds metric");

        let location_reports_total = IntCounterVec::new(
            Opts::new("location_reports_total", "Location reports by outcome"),
            &["outcome"],
        )
        .expect("valid location_reports_total metric");

        let optimistic_rollbacks_total = IntCounter::new(
            "optimistic_rollbacks_total",
            "Local order copies restored after a rejected update",
        )
        .expect("valid optimistic_rollbacks_total metric");

        registry
            .register(Box::new(backend_requests_total.clone()))
            .expect("register backend_requests_total");
        registry
            .register(Box::new(backend_request_latency_seconds.clone()))
            .expect("register backend_request_latency_seconds");
        registry
            .register(Box::new(location_reports_total.clone()))
            .expect("register location_reports_total");
        registry
            .register(Box::new(optimistic_rollbacks_total.clone()))
            .expect("register optimistic_rollbacks_total");

        Self {
            registry,
            backend_requests_total,
            backend_request_latency_seconds,
            location_reports_total,
            optimistic_rollbacks_total,
        }
    }

    pub fn observe_request(&self, endpoint: &str, ok: bool, elapsed_secs: f64) {
        let outcome = if ok { "success" } else { "error" };
        self.backend_requests_total
            .with_label_values(&[endpoint, outcome])
            .inc();
        self.backend_request_latency_seconds
            .with_label_values(&[endpoint])
            .observe(elapsed_secs);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::Metrics;

    #[test]
    fn encodes_observed_requests() {
        let metrics = Metrics::new();
        metrics.observe_request("orders.list", true, 0.05);
        metrics.location_reports_total.with_label_values(&["error"]).inc();

        let text = metrics.encode().unwrap();
        assert!(text.contains("backend_requests_total"));
        assert!(text.contains("endpoint=\"orders.list\""));
        assert!(text.contains("location_reports_total"));
    }
}
