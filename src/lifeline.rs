// CLASSIFICATION: COMMUNITY
// Filename: lifeline.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! One-shot termination signal for providers and workforces.

use std::sync::Arc;

use tokio::sync::watch;

/// Owner side of a termination signal. Clones share the same signal.
#[derive(Debug, Clone)]
pub struct Lifeline {
    tx: Arc<watch::Sender<bool>>,
}

impl Lifeline {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Fire the signal. Returns `true` only for the call that fired it.
    pub fn kill(&self) -> bool {
        self.tx.send_if_modified(|dead| {
            if *dead {
                false
            } else {
                *dead = true;
                true
            }
        })
    }

    #[must_use]
    pub fn is_dead(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to the signal. Dropping the returned value unsubscribes.
    pub fn subscribe(&self) -> DeathSignal {
        DeathSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for Lifeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Listener side of a [`Lifeline`].
#[derive(Debug)]
pub struct DeathSignal {
    rx: watch::Receiver<bool>,
}

impl DeathSignal {
    /// Whether the lifeline has already fired. Never blocks.
    #[must_use]
    pub fn has_fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the lifeline fires or every owner handle is gone.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|dead| *dead).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_fires_once() {
        let lifeline = Lifeline::new();
        assert!(!lifeline.is_dead());
        assert!(lifeline.kill());
        assert!(!lifeline.kill());
        assert!(lifeline.is_dead());
    }

    #[test]
    fn signal_reports_firing_without_waiting() {
        let lifeline = Lifeline::new();
        let signal = lifeline.subscribe();
        assert!(!signal.has_fired());
        lifeline.kill();
        assert!(signal.has_fired());
    }

    #[tokio::test]
    async fn late_subscriber_sees_death() {
        let lifeline = Lifeline::new();
        lifeline.kill();
        lifeline.subscribe().wait().await;
    }

    #[tokio::test]
    async fn subscriber_wakes_on_kill() {
        let lifeline = Lifeline::new();
        let signal = lifeline.subscribe();
        let waiter = tokio::spawn(signal.wait());
        lifeline.clone().kill();
        waiter.await.unwrap();
    }
}
