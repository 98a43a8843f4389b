use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    metrics::describe_counter!(
        "chat_relay_requests_total",
        "Chat relay requests by outcome"
    );
    metrics::describe_counter!(
        "command_marker_calls_total",
        "Command markers resolved through the workflow webhook, by outcome"
    );
    metrics::describe_counter!("pdf_generation_total", "PDF generation attempts by outcome");
}

/// Prometheus text exposition, empty when no recorder was installed.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(PrometheusHandle::render)
        .unwrap_or_default()
}
