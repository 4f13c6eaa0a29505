//! Graceful shutdown: wait for SIGINT/SIGTERM, then clear the node's
//! `running` flag (spec.md §5 — both the accept loop and the liveness
//! sweeper observe it at their next poll/wake).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};

/// Resolves once SIGINT or SIGTERM is received.
pub async fn wait_for_signal() {
    let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("received SIGINT (Ctrl+C)");
        }
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM");
        }
    }
}

/// Waits for a shutdown signal, then clears `running` so background loops exit.
pub async fn shutdown_on_signal(running: Arc<AtomicBool>) {
    wait_for_signal().await;
    tracing::info!("shutting down...");
    running.store(false, Ordering::SeqCst);
}
