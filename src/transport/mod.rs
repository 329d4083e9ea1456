// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Transport boundary.
//!
//! A transport hands the queen [`IncomingConnection`]s over a channel. Each
//! one carries the connection handle and a stream of inbound text frames;
//! the stream closing means the peer is gone.

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

pub mod memory;
pub mod tcp;

/// Capacity of the per-connection inbound frame queue.
pub const INBOUND_CAPACITY: usize = 64;

/// Handle onto one accepted connection.
pub trait Connection: Send + Sync + 'static {
    /// Transport assigned identifier, unique for the endpoint's lifetime.
    fn id(&self) -> &str;

    /// Force the connection closed. Repeated calls are no-ops.
    fn disconnect(&self);
}

/// A freshly accepted connection and its inbound frames.
pub struct IncomingConnection {
    pub connection: Arc<dyn Connection>,
    pub inbound: mpsc::Receiver<String>,
}

impl fmt::Debug for IncomingConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncomingConnection")
            .field("id", &self.connection.id())
            .finish()
    }
}
