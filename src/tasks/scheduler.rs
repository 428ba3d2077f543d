use anyhow::{Context, Result};
use rand::Rng;
use tokio::sync::watch;
use tokio::time::{interval, sleep, Duration};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;

/// Runs the background maintenance loops until a shutdown signal arrives.
/// The only loop today is the deadline sweep; the lazy expiry check in the
/// session engine keeps reads correct even when this worker is down.
pub(crate) async fn run(state: AppState) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweep = tokio::spawn(sweep_loop(state.clone(), shutdown_rx));

    tracing::info!(
        interval_seconds = state.settings().assessment().sweep_interval_seconds,
        batch_size = state.settings().assessment().sweep_batch_size,
        "Session sweep worker started"
    );

    crate::core::shutdown::shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        tracing::warn!("Failed to broadcast shutdown signal to background tasks");
    }

    if let Err(err) = sweep.await {
        tracing::error!(error = %err, "Background task join failed");
    }

    Ok(())
}

async fn sweep_loop(state: AppState, mut shutdown: watch::Receiver<bool>) {
    let interval_seconds = state.settings().assessment().sweep_interval_seconds;

    // Stagger replicas so they do not all sweep on the same tick
    let jitter = rand::thread_rng().gen_range(0..interval_seconds.max(1));
    tokio::select! {
        _ = shutdown.changed() => return,
        _ = sleep(Duration::from_secs(jitter)) => {}
    }

    let mut tick = interval(Duration::from_secs(interval_seconds));
    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = tick.tick() => {
                if let Err(err) = expire_overdue_sessions(&state).await {
                    tracing::error!(error = %err, "expire_overdue_sessions failed");
                }
            }
        }
    }
}

/// One sweep pass. Drains every overdue in-progress session in batches; each
/// batch uses the same conditional update as the lazy path, so a session the
/// API expired first is simply no longer matched.
pub(crate) async fn expire_overdue_sessions(state: &AppState) -> Result<()> {
    let batch_size = state.settings().assessment().sweep_batch_size as i64;
    let mut expired = 0u64;

    loop {
        let flipped =
            repositories::sessions::expire_overdue(state.db(), primitive_now_utc(), batch_size)
                .await
                .context("Failed to expire overdue sessions")?;
        expired += flipped;
        if flipped < batch_size as u64 {
            break;
        }
    }

    if expired > 0 {
        tracing::info!(expired_sessions = expired, "Closed overdue sessions");
    }
    metrics::counter!("assessment_sessions_expired_total").increment(expired);

    Ok(())
}
