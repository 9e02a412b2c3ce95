use tokio::select;
use tracing::info;

/// Waits until the process is asked to stop: Ctrl+C anywhere, SIGTERM on unix.
pub async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                select! {
                    _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C"),
                    _ = terminate.recv() => info!("Received SIGTERM"),
                }
                return;
            }
            Err(e) => tracing::warn!("Can't listen for SIGTERM {e:?}"),
        }
    }

    let _ = tokio::signal::ctrl_c().await;
    info!("Received Ctrl+C");
}
