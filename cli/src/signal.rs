use makex_core::Cancellation;
use tokio::signal;

/// Cancels the build on Ctrl-C or SIGTERM.
pub fn spawn_interrupt_handler(cancel: Cancellation) {
    tokio::spawn(async move {
        tokio::select! {
            res = signal::ctrl_c() => {
                if let Err(e) = res {
                    tracing::warn!(error = %e, "cannot listen for Ctrl-C");
                    return;
                }
                tracing::info!("received Ctrl-C");
            }
            _ = wait_for_sigterm() => {
                tracing::info!("received SIGTERM");
            }
        }
        cancel.cancel();
    });
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot listen for SIGTERM");
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
