// SPDX-FileCopyrightText: 2026 Streakbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade. `streakbot serve` installs the Prometheus
//! exporter with [`install_prometheus`]; without it every call is a no-op.

use std::net::SocketAddr;

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use streakbot_core::StreakbotError;

/// Install the Prometheus recorder and serve `/metrics` on `listen_addr`.
///
/// Only one recorder can be installed per process. Must be called inside a
/// Tokio runtime, which drives the HTTP listener.
pub fn install_prometheus(listen_addr: SocketAddr) -> Result<(), StreakbotError> {
    PrometheusBuilder::new()
        .with_http_listener(listen_addr)
        .install()
        .map_err(|e| StreakbotError::Internal(format!("failed to install Prometheus exporter: {e}")))?;

    register_metrics();

    tracing::info!(%listen_addr, "prometheus metrics exporter installed");
    Ok(())
}

/// Register all Streakbot metric descriptions.
pub fn register_metrics() {
    describe_counter!("streakbot_messages_total", "Inbound messages handled");
    describe_counter!("streakbot_streak_markers_total", "Streak markers by outcome");
    describe_counter!("streakbot_quest_completions_total", "Quest completions recorded");
    describe_counter!(
        "streakbot_dropped_messages_total",
        "Messages dropped after store retries were exhausted"
    );
    describe_counter!("streakbot_job_runs_total", "Periodic job runs by job and outcome");
}

pub fn record_message() {
    metrics::counter!("streakbot_messages_total").increment(1);
}

pub fn record_streak_marker(accepted: bool) {
    let outcome = if accepted { "accepted" } else { "rejected" };
    metrics::counter!("streakbot_streak_markers_total", "outcome" => outcome).increment(1);
}

pub fn record_quest_completion() {
    metrics::counter!("streakbot_quest_completions_total").increment(1);
}

pub fn record_dropped_message() {
    metrics::counter!("streakbot_dropped_messages_total").increment(1);
}

pub fn record_job_run(job: &'static str, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!("streakbot_job_runs_total", "job" => job, "outcome" => outcome).increment(1);
}
