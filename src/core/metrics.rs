use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    describe();
    Ok(())
}

fn describe() {
    metrics::describe_counter!(
        "assessment_sessions_started_total",
        "Assessment sessions opened by students"
    );
    metrics::describe_counter!(
        "assessment_sessions_completed_total",
        "Assessment sessions that reached a graded result"
    );
    metrics::describe_counter!(
        "assessment_sessions_expired_total",
        "Assessment sessions closed by the deadline sweep"
    );
    metrics::describe_counter!(
        "assessment_results_passed_total",
        "Graded results at or above the passing score"
    );
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
