//! Application metrics collection and reporting.

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        "overlay_layer_loads_total",
        "Finished layer loads by layer and outcome"
    );
    describe_histogram!(
        "overlay_load_duration_seconds",
        Unit::Seconds,
        "Time from fetch start to Ready/Failed"
    );
    describe_counter!(
        "overlay_inspect_requests_total",
        "Click-to-inspect requests"
    );
    describe_counter!("overlay_renders_total", "Overlay PNG renders by layer");
    describe_histogram!(
        "overlay_render_duration_seconds",
        Unit::Seconds,
        "Classification plus PNG encoding time"
    );
}

/// Record the end of one layer load.
pub fn record_layer_load(layer: &str, outcome: &'static str, duration: Duration) {
    counter!(
        "overlay_layer_loads_total",
        "layer" => layer.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("overlay_load_duration_seconds", "layer" => layer.to_string())
        .record(duration.as_secs_f64());
}

/// Request-level counters, also mirrored into the `metrics` recorder.
#[derive(Debug)]
pub struct MetricsCollector {
    pub inspect_requests: AtomicU64,
    pub inspect_no_data: AtomicU64,
    pub renders_total: AtomicU64,
    pub render_errors: AtomicU64,
    render_time_us: AtomicU64,
    render_time_max_us: AtomicU64,
    start_time: Instant,
}

/// Point-in-time view for `/api/metrics`.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub inspect_requests: u64,
    pub inspect_no_data: u64,
    pub renders_total: u64,
    pub render_errors: u64,
    pub render_avg_ms: f64,
    pub render_max_ms: f64,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            inspect_requests: AtomicU64::new(0),
            inspect_no_data: AtomicU64::new(0),
            renders_total: AtomicU64::new(0),
            render_errors: AtomicU64::new(0),
            render_time_us: AtomicU64::new(0),
            render_time_max_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record an inspect request
    pub fn record_inspect(&self, no_data: bool) {
        self.inspect_requests.fetch_add(1, Ordering::Relaxed);
        if no_data {
            self.inspect_no_data.fetch_add(1, Ordering::Relaxed);
        }
        let result = if no_data { "no_data" } else { "value" };
        counter!("overlay_inspect_requests_total", "result" => result).increment(1);
    }

    /// Record an overlay render
    pub fn record_render(&self, layer: &str, duration: Duration, success: bool) {
        self.renders_total.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.render_errors.fetch_add(1, Ordering::Relaxed);
        }
        let us = duration.as_micros() as u64;
        self.render_time_us.fetch_add(us, Ordering::Relaxed);
        self.render_time_max_us.fetch_max(us, Ordering::Relaxed);

        counter!("overlay_renders_total", "layer" => layer.to_string()).increment(1);
        histogram!("overlay_render_duration_seconds").record(duration.as_secs_f64());
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let renders = self.renders_total.load(Ordering::Relaxed);
        let total_us = self.render_time_us.load(Ordering::Relaxed);
        MetricsSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            inspect_requests: self.inspect_requests.load(Ordering::Relaxed),
            inspect_no_data: self.inspect_no_data.load(Ordering::Relaxed),
            renders_total: renders,
            render_errors: self.render_errors.load(Ordering::Relaxed),
            render_avg_ms: if renders == 0 {
                0.0
            } else {
                total_us as f64 / renders as f64 / 1000.0
            },
            render_max_ms: self.render_time_max_us.load(Ordering::Relaxed) as f64 / 1000.0,
        }
    }
}
