// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.5
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Queen coordinator.
//!
//! The registry lives inside a single actor task. [`Queen`] is a cheap
//! cloneable handle that sends commands to it, so every insert, eviction
//! and population call happens in one serialized order. Lifecycle events
//! are published from inside the same step as the mutation they describe.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::{mpsc, oneshot};

use crate::config::QueenConfig;
use crate::error::{QueenError, WorkforceError};
use crate::provider::WorkerProvider;
use crate::transport::IncomingConnection;
use crate::workforce::{Workforce, WorkforceFactory, WorkforceOptions};

pub mod events;
pub mod handshake;
mod registry;

pub use events::{EventSubscription, QueenEvent, QueenEventKind, QueenEvents};
pub use handshake::HandshakeOutcome;

use events::EventBus;
use registry::Registry;

pub(crate) enum Command {
    AddWorkerProvider(Arc<dyn WorkerProvider>, oneshot::Sender<()>),
    GetWorkerProvider(String, oneshot::Sender<Option<Arc<dyn WorkerProvider>>>),
    GetWorkerProviders(oneshot::Sender<Vec<Arc<dyn WorkerProvider>>>),
    GetWorkforce(
        WorkforceOptions,
        oneshot::Sender<Result<Arc<dyn Workforce>, WorkforceError>>,
    ),
    ProviderDead { id: String, generation: u64 },
    WorkforceDead { id: String, generation: u64 },
    Kill(oneshot::Sender<()>),
}

/// Handle onto a running queen.
#[derive(Clone)]
pub struct Queen {
    commands: mpsc::UnboundedSender<Command>,
    events: QueenEvents,
    registration_timeout_ms: Arc<AtomicU64>,
    base_path: Arc<str>,
}

impl Queen {
    /// Start a queen without a transport. Providers are added directly
    /// through [`Queen::add_worker_provider`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: QueenConfig, factory: Arc<dyn WorkforceFactory>) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        let bus = EventBus::new();
        let registry = Registry::new(bus.clone(), commands.downgrade(), config.default_population);
        tokio::spawn(run(registry, factory, rx));
        info!(
            "queen started (registration timeout {:?}, default population {})",
            config.registration_timeout, config.default_population
        );
        Self {
            commands,
            events: QueenEvents::new(bus),
            registration_timeout_ms: Arc::new(AtomicU64::new(duration_ms(
                config.registration_timeout,
            ))),
            base_path: Arc::from(config.base_path.as_str()),
        }
    }

    /// Start a queen that accepts connections from `incoming` and runs the
    /// registration handshake on each of them.
    pub fn spawn(
        config: QueenConfig,
        factory: Arc<dyn WorkforceFactory>,
        incoming: mpsc::Receiver<IncomingConnection>,
    ) -> Self {
        let queen = Self::new(config, factory);
        tokio::spawn(accept(queen.clone(), incoming));
        queen
    }

    /// Observe-only event surface.
    pub fn events(&self) -> QueenEvents {
        self.events.clone()
    }

    pub fn registration_timeout(&self) -> Duration {
        Duration::from_millis(self.registration_timeout_ms.load(Ordering::SeqCst))
    }

    /// Change the registration deadline for connections accepted from now on.
    pub fn set_registration_timeout(&self, timeout: Duration) {
        self.registration_timeout_ms
            .store(duration_ms(timeout), Ordering::SeqCst);
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, QueenError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .map_err(|_| QueenError::Stopped)?;
        rx.await.map_err(|_| QueenError::Stopped)
    }

    /// Admit a provider and announce it with a `workerProvider` event.
    pub async fn add_worker_provider(
        &self,
        provider: Arc<dyn WorkerProvider>,
    ) -> Result<(), QueenError> {
        self.request(|ack| Command::AddWorkerProvider(provider, ack))
            .await
    }

    /// Look up a live provider. `Ok(None)` when it is not registered.
    pub async fn get_worker_provider(
        &self,
        id: &str,
    ) -> Result<Option<Arc<dyn WorkerProvider>>, QueenError> {
        let id = id.to_owned();
        self.request(|reply| Command::GetWorkerProvider(id, reply))
            .await
    }

    /// All live providers in registration order.
    pub async fn get_worker_providers(&self) -> Result<Vec<Arc<dyn WorkerProvider>>, QueenError> {
        self.request(Command::GetWorkerProviders).await
    }

    /// Create, start and populate a workforce.
    ///
    /// Factory failures are returned as [`QueenError::Workforce`].
    pub async fn get_workforce(
        &self,
        options: WorkforceOptions,
    ) -> Result<Arc<dyn Workforce>, QueenError> {
        let created = self
            .request(|reply| Command::GetWorkforce(options, reply))
            .await?;
        Ok(created?)
    }

    /// Kill every workforce and provider, emit `dead` and stop the queen.
    /// Killing a queen that already stopped is a no-op.
    pub async fn kill(&self) -> Result<(), QueenError> {
        match self.request(Command::Kill).await {
            Ok(()) | Err(QueenError::Stopped) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for Queen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queen")
            .field("running", &self.is_running())
            .field("registration_timeout", &self.registration_timeout())
            .field("base_path", &self.base_path)
            .finish()
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn run(
    mut registry: Registry,
    factory: Arc<dyn WorkforceFactory>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    while let Some(command) = commands.recv().await {
        registry.reap();
        match command {
            Command::AddWorkerProvider(provider, ack) => {
                registry.admit_provider(provider);
                let _ = ack.send(());
            }
            Command::GetWorkerProvider(id, reply) => {
                let _ = reply.send(registry.provider(&id));
            }
            Command::GetWorkerProviders(reply) => {
                let _ = reply.send(registry.providers());
            }
            Command::GetWorkforce(options, reply) => {
                let _ = reply.send(registry.create_workforce(factory.as_ref(), options));
            }
            Command::ProviderDead { id, generation } => {
                registry.evict_provider(&id, Some(generation));
            }
            Command::WorkforceDead { id, generation } => {
                registry.evict_workforce(&id, Some(generation));
            }
            Command::Kill(ack) => {
                registry.kill_all();
                let _ = ack.send(());
                break;
            }
        }
    }
    debug!("queen actor stopped");
}

async fn accept(queen: Queen, mut incoming: mpsc::Receiver<IncomingConnection>) {
    loop {
        let connection = tokio::select! {
            connection = incoming.recv() => connection,
            () = queen.commands.closed() => break,
        };
        let Some(connection) = connection else {
            break;
        };
        let timeout = queen.registration_timeout();
        debug!("{} awaiting registration", connection.connection.id());
        tokio::spawn(handshake::run(queen.clone(), connection, timeout));
    }
    debug!("queen stopped accepting connections");
}
