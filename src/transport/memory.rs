// CLASSIFICATION: COMMUNITY
// Filename: memory.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! In-process transport built on tokio channels.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use log::debug;
use serde_json::Value;
use tokio::sync::mpsc;

use super::{Connection, IncomingConnection, INBOUND_CAPACITY};
use crate::error::TransportError;
use crate::protocol::{Attributes, Envelope, ProviderMessage};

/// Accepting side of the in-process transport.
#[derive(Debug)]
pub struct MemoryEndpoint {
    accepted: mpsc::Sender<IncomingConnection>,
    next_id: AtomicU64,
}

impl MemoryEndpoint {
    /// Create an endpoint and the receiver to hand to the queen.
    pub fn new() -> (Self, mpsc::Receiver<IncomingConnection>) {
        let (accepted, incoming) = mpsc::channel(INBOUND_CAPACITY);
        let endpoint = Self {
            accepted,
            next_id: AtomicU64::new(0),
        };
        (endpoint, incoming)
    }

    /// Open a new connection towards the queen.
    pub async fn connect(&self) -> Result<MemoryPeer, TransportError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, inbound) = mpsc::channel(INBOUND_CAPACITY);
        let link = Arc::new(MemoryLink {
            id: format!("memory-{n}"),
            sender: Mutex::new(Some(tx)),
            disconnects: AtomicUsize::new(0),
        });
        let connection: Arc<dyn Connection> = link.clone();
        self.accepted
            .send(IncomingConnection {
                connection,
                inbound,
            })
            .await
            .map_err(|_| TransportError::Closed)?;
        Ok(MemoryPeer { link })
    }
}

#[derive(Debug)]
struct MemoryLink {
    id: String,
    sender: Mutex<Option<mpsc::Sender<String>>>,
    disconnects: AtomicUsize,
}

impl MemoryLink {
    fn hang_up(&self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
    }
}

impl Connection for MemoryLink {
    fn id(&self) -> &str {
        &self.id
    }

    fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        debug!("memory connection {} disconnected", self.id);
        self.hang_up();
    }
}

/// Remote end of an in-process connection.
#[derive(Debug, Clone)]
pub struct MemoryPeer {
    link: Arc<MemoryLink>,
}

impl MemoryPeer {
    pub fn id(&self) -> &str {
        &self.link.id
    }

    /// Send a raw text frame.
    pub async fn send(&self, frame: impl Into<String>) -> Result<(), TransportError> {
        let sender = self
            .link
            .sender
            .lock()
            .ok()
            .and_then(|sender| sender.clone())
            .ok_or(TransportError::Closed)?;
        sender
            .send(frame.into())
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Send a `register` message carrying `attributes`.
    pub async fn register(&self, attributes: Attributes) -> Result<(), TransportError> {
        self.send(ProviderMessage::Register(attributes).encode()).await
    }

    /// Send an arbitrary envelope.
    pub async fn send_envelope(
        &self,
        type_code: u64,
        payload: Value,
    ) -> Result<(), TransportError> {
        self.send(Envelope { type_code, payload }.encode()).await
    }

    /// Hang up from the peer side.
    pub fn close(&self) {
        self.link.hang_up();
    }

    /// How many times the queen side forced this connection closed.
    pub fn disconnect_count(&self) -> usize {
        self.link.disconnects.load(Ordering::SeqCst)
    }
}
