//! Process-wide consumption gate.
//!
//! Holds two flags behind a reader/writer lock: `healthy`, replaced by
//! every reading received on the health channel, and `shutting_down`,
//! latched permanently by the completion signal. Workers read the flags
//! on every iteration; the single listener task owns the receiving side
//! of both channels and never blocks either of them.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct GateState {
    healthy: bool,
    shutting_down: bool,
}

pub struct HealthGate {
    state: RwLock<GateState>,
}

impl HealthGate {
    /// Starts unhealthy; consumption is suspended until the first green
    /// reading arrives.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: RwLock::new(GateState::default()),
        })
    }

    pub fn is_healthy(&self) -> bool {
        self.state.read().healthy
    }

    pub fn is_shutting_down(&self) -> bool {
        self.state.read().shutting_down
    }

    /// Spawn the listener that feeds the gate. The sending halves stay
    /// with the lifecycle controller; dropping the shutdown sender also
    /// counts as a shutdown request.
    pub fn listen(
        self: &Arc<Self>,
        mut health_rx: mpsc::Receiver<bool>,
        mut shutdown_rx: oneshot::Receiver<()>,
    ) -> JoinHandle<()> {
        let gate = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    reading = health_rx.recv() => {
                        match reading {
                            Some(healthy) => {
                                let mut state = gate.state.write();
                                if state.healthy != healthy {
                                    debug!(healthy, "Health gate flipped");
                                }
                                state.healthy = healthy;
                            }
                            None => break,
                        }
                    }
                    _ = &mut shutdown_rx, if !gate.is_shutting_down() => {
                        info!("Shutdown requested, workers will drain");
                        gate.state.write().shutting_down = true;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn readings_replace_the_health_flag() {
        let gate = HealthGate::new();
        let (health_tx, health_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();
        let _listener = gate.listen(health_rx, shutdown_rx);

        assert!(!gate.is_healthy());

        health_tx.send(true).await.unwrap();
        settle().await;
        assert!(gate.is_healthy());

        health_tx.send(false).await.unwrap();
        settle().await;
        assert!(!gate.is_healthy());
    }

    #[tokio::test]
    async fn completion_signal_latches_shutdown() {
        let gate = HealthGate::new();
        let (health_tx, health_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let _listener = gate.listen(health_rx, shutdown_rx);

        shutdown_tx.send(()).unwrap();
        settle().await;
        assert!(gate.is_shutting_down());

        // Health readings still drain after shutdown
        health_tx.send(true).await.unwrap();
        settle().await;
        assert!(gate.is_healthy());
        assert!(gate.is_shutting_down());
    }

    #[tokio::test]
    async fn dropped_shutdown_sender_counts_as_shutdown() {
        let gate = HealthGate::new();
        let (_health_tx, health_rx) = mpsc::channel::<bool>(4);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let _listener = gate.listen(health_rx, shutdown_rx);

        drop(shutdown_tx);
        settle().await;
        assert!(gate.is_shutting_down());
    }
}
