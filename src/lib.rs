// CLASSIFICATION: COMMUNITY
// Filename: lib.rs v1.1
// Date Modified: 2026-10-15
// Author: Lukas Bower

//! Queen coordinator for remote worker providers.
//!
//! Connections arrive from a transport, register through a bounded
//! handshake and become [`WorkerProvider`]s. Workforces are assembled from
//! the registered providers either once at creation or continuously as
//! providers come and go.

/// Error types.
pub mod error;

/// Queen configuration (defaults, environment, TOML).
pub mod config;

/// Wire message types exchanged before registration.
pub mod protocol;

/// One-shot termination signals.
pub mod lifeline;

/// Registered providers.
pub mod provider;

/// Workforce collaborator contracts and the pooled default.
pub mod workforce;

/// Transport boundary plus in-memory and TCP transports.
pub mod transport;

/// Registry actor, handshake and event surface.
pub mod queen;

pub use config::QueenConfig;
pub use error::{ConfigError, ProtocolError, QueenError, TransportError, WorkforceError};
pub use lifeline::{DeathSignal, Lifeline};
pub use protocol::{Attributes, Envelope, ProviderMessage, WorkerProviderMessageType};
pub use provider::{ProviderId, RemoteWorkerProvider, WorkerProvider};
pub use queen::{EventSubscription, Queen, QueenEvent, QueenEventKind, QueenEvents};
pub use workforce::{
    Population, PopulationStrategy, PooledWorkforce, PooledWorkforceFactory, Workforce,
    WorkforceFactory, WorkforceId, WorkforceOptions,
};
