// CLASSIFICATION: COMMUNITY
// Filename: handshake.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Registration handshake for freshly accepted connections.
//!
//! A connection has `timeout` to send a `register` message. Anything else
//! it sends in the meantime is ignored. On time out the connection is
//! disconnected and never reaches the registry.

use std::time::Duration;

use log::{debug, warn};

use super::Queen;
use crate::protocol::ProviderMessage;
use crate::provider::RemoteWorkerProvider;
use crate::transport::IncomingConnection;

/// Terminal state of one handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Registered,
    TimedOut,
    /// The peer hung up before registering.
    Closed,
}

pub(crate) async fn run(
    queen: Queen,
    incoming: IncomingConnection,
    timeout: Duration,
) -> HandshakeOutcome {
    let IncomingConnection {
        connection,
        mut inbound,
    } = incoming;
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        let frame = tokio::select! {
            frame = inbound.recv() => frame,
            () = &mut deadline => {
                warn!("{} did not register within {:?}, disconnecting", connection.id(), timeout);
                connection.disconnect();
                return HandshakeOutcome::TimedOut;
            }
        };
        let Some(frame) = frame else {
            debug!("{} closed before registering", connection.id());
            return HandshakeOutcome::Closed;
        };
        match ProviderMessage::decode(&frame) {
            Ok(ProviderMessage::Register(attributes)) => {
                let provider = RemoteWorkerProvider::spawn(connection.clone(), attributes, inbound);
                if let Err(err) = queen.add_worker_provider(provider).await {
                    warn!("dropping {}: {err}", connection.id());
                    connection.disconnect();
                }
                return HandshakeOutcome::Registered;
            }
            Ok(ProviderMessage::Unknown(code)) => {
                debug!("{} sent type {code} before registering, ignored", connection.id());
            }
            Err(err) => {
                debug!("{} sent an unreadable frame, ignored: {err}", connection.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueenConfig;
    use crate::protocol::Attributes;
    use crate::transport::memory::MemoryEndpoint;
    use crate::workforce::PooledWorkforceFactory;
    use std::sync::Arc;

    async fn handshake(
        queen: &Queen,
        incoming: &mut tokio::sync::mpsc::Receiver<IncomingConnection>,
        timeout: Duration,
    ) -> HandshakeOutcome {
        let connection = incoming.recv().await.unwrap();
        run(queen.clone(), connection, timeout).await
    }

    fn queen() -> Queen {
        Queen::new(QueenConfig::default(), Arc::new(PooledWorkforceFactory::new()))
    }

    #[tokio::test(start_paused = true)]
    async fn outcomes() {
        let queen = queen();
        let (endpoint, mut incoming) = MemoryEndpoint::new();

        let silent = endpoint.connect().await.unwrap();
        let outcome = handshake(&queen, &mut incoming, Duration::from_millis(5)).await;
        assert_eq!(outcome, HandshakeOutcome::TimedOut);
        assert_eq!(silent.disconnect_count(), 1);

        let quitter = endpoint.connect().await.unwrap();
        quitter.close();
        let outcome = handshake(&queen, &mut incoming, Duration::from_secs(5)).await;
        assert_eq!(outcome, HandshakeOutcome::Closed);
        assert_eq!(quitter.disconnect_count(), 0);

        let worker = endpoint.connect().await.unwrap();
        worker.send("[3, {}]").await.unwrap();
        worker.register(Attributes::new()).await.unwrap();
        let outcome = handshake(&queen, &mut incoming, Duration::from_secs(5)).await;
        assert_eq!(outcome, HandshakeOutcome::Registered);
        assert!(queen.get_worker_provider(worker.id()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn registration_with_a_stopped_queen_disconnects() {
        let queen = queen();
        queen.kill().await.unwrap();
        let (endpoint, mut incoming) = MemoryEndpoint::new();
        let worker = endpoint.connect().await.unwrap();
        worker.register(Attributes::new()).await.unwrap();

        let outcome = handshake(&queen, &mut incoming, Duration::from_secs(5)).await;
        assert_eq!(outcome, HandshakeOutcome::Registered);
        assert_eq!(worker.disconnect_count(), 1);
    }
}
