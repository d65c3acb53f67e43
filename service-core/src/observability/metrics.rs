use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static METRICS_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder behind the `metrics` facade.
///
/// Safe to call repeatedly; only the first call installs a recorder. If another
/// recorder was installed elsewhere the exporter stays disabled and rendering
/// reports that instead.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!("Prometheus recorder not installed: {}", e);
            None
        }
    });
}

/// Current metrics in Prometheus text exposition format.
pub fn render_metrics() -> String {
    METRICS_HANDLE
        .get()
        .and_then(|handle| handle.as_ref())
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}
