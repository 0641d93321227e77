use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all application metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // Pre-register counters so they appear even before the first increment.
    counter!("wagers_placed_total").absolute(0);
    counter!("wagers_rejected_total").absolute(0);
    counter!("statistics_refreshes_total").absolute(0);
    counter!("degraded_snapshots_total").absolute(0);
    counter!("reveals_total").absolute(0);
    counter!("payouts_claimed_total").absolute(0);

    // Pre-register gauges at zero.
    gauge!("tracked_markets").set(0.0);

    handle
}
