//! Metrics and observability utilities
//!
//! Provides Prometheus metrics with SLO-aligned histograms
//! and standardized naming conventions.

use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit,
};

/// Metrics prefix for all DealBridge metrics
pub const METRICS_PREFIX: &str = "dealbridge";

/// SLO-aligned histogram buckets for operation latency (in seconds),
/// installed into the Prometheus exporter at gateway startup.
/// Targets: P50 < 50ms, P99 < 150ms
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001,  // 1ms
    0.005,  // 5ms
    0.010,  // 10ms
    0.025,  // 25ms
    0.050,  // 50ms - P50 target
    0.075,  // 75ms
    0.100,  // 100ms
    0.150,  // 150ms - P99 target
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Workflow metrics
    describe_counter!(
        format!("{}_transitions_total", METRICS_PREFIX),
        Unit::Count,
        "Total executed status transitions"
    );

    describe_counter!(
        format!("{}_transition_conflicts_total", METRICS_PREFIX),
        Unit::Count,
        "Transitions lost to an optimistic-concurrency conflict"
    );

    // Search metrics
    describe_counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of search queries"
    );

    describe_histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Search query latency in seconds"
    );

    describe_gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of results returned from search"
    );

    // Notification metrics
    describe_counter!(
        format!("{}_notifications_total", METRICS_PREFIX),
        Unit::Count,
        "Lifecycle notifications emitted"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record an executed (or conflicted) transition
pub fn record_transition(action: &str, conflicted: bool) {
    if conflicted {
        counter!(
            format!("{}_transition_conflicts_total", METRICS_PREFIX),
            "action" => action.to_string()
        )
        .increment(1);
    } else {
        counter!(
            format!("{}_transitions_total", METRICS_PREFIX),
            "action" => action.to_string()
        )
        .increment(1);
    }
}

/// Helper to record search metrics
pub fn record_search(duration_secs: f64, mode: &str, result_count: usize) {
    counter!(
        format!("{}_search_queries_total", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_search_duration_seconds", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .record(duration_secs);

    gauge!(
        format!("{}_search_results_count", METRICS_PREFIX),
        "mode" => mode.to_string()
    )
    .set(result_count as f64);
}

/// Helper to record a notification attempt
pub fn record_notification(event: &str, success: bool) {
    let status = if success { "success" } else { "error" };
    counter!(
        format!("{}_notifications_total", METRICS_PREFIX),
        "event" => event.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latency_buckets() {
        // Verify buckets are sorted and contain SLO targets
        let mut prev = 0.0;
        for &bucket in LATENCY_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }

        // P50 target (50ms) should be in buckets
        assert!(LATENCY_BUCKETS.contains(&0.050));
        // P99 target (150ms) should be in buckets
        assert!(LATENCY_BUCKETS.contains(&0.150));
    }

    #[test]
    fn test_recording_without_exporter_is_safe() {
        // No recorder installed in tests; helpers must be no-ops, not panics
        record_transition("draft_to_under_review", false);
        record_transition("draft_to_under_review", true);
        record_search(0.012, "filtered", 3);
        record_notification("review_decided", false);
    }
}
