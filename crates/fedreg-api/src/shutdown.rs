//! Shutdown coordination between the signal listener and the server

use std::sync::Arc;
use tokio::sync::watch;

/// Latched shutdown flag
///
/// Once triggered it stays triggered: waiters that start late return
/// immediately.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    flag: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Create an untriggered signal
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
        }
    }

    /// Request shutdown
    pub fn trigger(&self) {
        if !self.flag.send_replace(true) {
            tracing::info!("Shutdown requested");
        }
    }

    /// Whether shutdown was requested
    pub fn is_triggered(&self) -> bool {
        *self.flag.borrow()
    }

    /// Resolve once shutdown is requested
    pub async fn wait(&self) {
        let mut rx = self.flag.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn terminate() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

#[cfg(not(unix))]
async fn terminate() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "Ctrl+C")
}

/// Trigger `shutdown` on SIGINT or SIGTERM (Ctrl+C elsewhere)
pub async fn listen_for_signals(shutdown: ShutdownSignal) {
    match terminate().await {
        Ok(name) => {
            tracing::info!(signal = name, "Received termination signal");
            shutdown.trigger();
        }
        Err(e) => {
            tracing::error!(error = %e, "Cannot listen for termination signals");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_waiters() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_triggered());

        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.wait().await }
        });
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn test_late_waiter_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        signal.trigger();

        tokio::time::timeout(Duration::from_millis(100), signal.wait())
            .await
            .unwrap();
    }
}
