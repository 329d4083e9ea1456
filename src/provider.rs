// CLASSIFICATION: COMMUNITY
// Filename: provider.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Registered worker providers.
//!
//! A provider is a remote connection that completed the registration
//! handshake. The queen only needs its identity, its advertised attributes
//! and a way to learn when it goes away.

use std::fmt;
use std::sync::Arc;

use log::{debug, info, trace};
use tokio::sync::mpsc;

use crate::lifeline::{DeathSignal, Lifeline};
use crate::protocol::Attributes;
use crate::transport::Connection;

/// Identifier of a registered provider. Stable for the connection lifetime.
pub type ProviderId = String;

/// Contract the queen relies on for every registered provider.
pub trait WorkerProvider: Send + Sync + 'static {
    fn id(&self) -> &str;

    fn attributes(&self) -> &Attributes;

    /// Terminate the provider. Its death signal must fire as a result.
    fn kill(&self);

    /// Subscribe to the provider's one-shot death signal.
    fn dead(&self) -> DeathSignal;
}

impl fmt::Debug for dyn WorkerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerProvider")
            .field("id", &self.id())
            .field("attributes", self.attributes())
            .finish()
    }
}

/// Provider backed by a transport connection.
pub struct RemoteWorkerProvider {
    id: ProviderId,
    attributes: Attributes,
    connection: Arc<dyn Connection>,
    lifeline: Lifeline,
}

impl RemoteWorkerProvider {
    /// Promote a registered connection to a provider.
    ///
    /// Takes over the remaining inbound stream. Must be called from within a
    /// tokio runtime.
    pub fn spawn(
        connection: Arc<dyn Connection>,
        attributes: Attributes,
        inbound: mpsc::Receiver<String>,
    ) -> Arc<Self> {
        let provider = Arc::new(Self {
            id: connection.id().to_owned(),
            attributes,
            connection,
            lifeline: Lifeline::new(),
        });
        tokio::spawn(drain_inbound(
            provider.id.clone(),
            inbound,
            provider.lifeline.clone(),
        ));
        provider
    }
}

// Frames after registration belong to work dispatch, which is handled
// elsewhere; the stream is only watched for closure.
async fn drain_inbound(id: ProviderId, mut inbound: mpsc::Receiver<String>, lifeline: Lifeline) {
    let dead = lifeline.subscribe().wait();
    tokio::pin!(dead);
    loop {
        tokio::select! {
            frame = inbound.recv() => match frame {
                Some(frame) => {
                    trace!("provider {id} sent {} bytes after registration", frame.len());
                }
                None => {
                    debug!("provider {id} connection closed");
                    lifeline.kill();
                    return;
                }
            },
            () = &mut dead => return,
        }
    }
}

impl WorkerProvider for RemoteWorkerProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn kill(&self) {
        if self.lifeline.kill() {
            info!("killing provider {}", self.id);
            self.connection.disconnect();
        }
    }

    fn dead(&self) -> DeathSignal {
        self.lifeline.subscribe()
    }
}

impl fmt::Debug for RemoteWorkerProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteWorkerProvider")
            .field("id", &self.id)
            .field("attributes", &self.attributes)
            .field("dead", &self.lifeline.is_dead())
            .finish()
    }
}
