// CLASSIFICATION: COMMUNITY
// Filename: events.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Lifecycle events published by the queen.
//!
//! [`QueenEvents`] is the observe-only half of the queen. It can hand out
//! subscriptions but cannot mutate the registry.
//!
//! Every subscriber owns an unbounded queue, so a slow reader never loses
//! events. Closed subscribers are pruned on the next publish.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use tokio::sync::mpsc;

use crate::provider::{ProviderId, WorkerProvider};
use crate::workforce::{Workforce, WorkforceId};

/// Lifecycle notification.
#[derive(Clone)]
pub enum QueenEvent {
    /// A provider was admitted to the registry.
    WorkerProvider(Arc<dyn WorkerProvider>),
    /// A provider was evicted. Carries the id only.
    WorkerProviderDead(ProviderId),
    /// A workforce was created and started.
    Workforce(Arc<dyn Workforce>),
    /// A workforce was evicted.
    WorkforceDead(WorkforceId),
    /// The queen shut down. Always the last event.
    Dead,
}

/// Discriminant of [`QueenEvent`], used to filter subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueenEventKind {
    WorkerProvider,
    WorkerProviderDead,
    Workforce,
    WorkforceDead,
    Dead,
}

impl QueenEventKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::WorkerProvider => "workerProvider",
            Self::WorkerProviderDead => "workerProviderDead",
            Self::Workforce => "workforce",
            Self::WorkforceDead => "workforceDead",
            Self::Dead => "dead",
        }
    }
}

impl QueenEvent {
    pub fn kind(&self) -> QueenEventKind {
        match self {
            Self::WorkerProvider(_) => QueenEventKind::WorkerProvider,
            Self::WorkerProviderDead(_) => QueenEventKind::WorkerProviderDead,
            Self::Workforce(_) => QueenEventKind::Workforce,
            Self::WorkforceDead(_) => QueenEventKind::WorkforceDead,
            Self::Dead => QueenEventKind::Dead,
        }
    }
}

impl fmt::Debug for QueenEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.kind().name();
        match self {
            Self::WorkerProvider(p) => write!(f, "{name}({})", p.id()),
            Self::Workforce(w) => write!(f, "{name}({})", w.id()),
            Self::WorkerProviderDead(id) | Self::WorkforceDead(id) => write!(f, "{name}({id})"),
            Self::Dead => f.write_str(name),
        }
    }
}

#[derive(Default)]
struct BusState {
    subscribers: Vec<mpsc::UnboundedSender<QueenEvent>>,
    closed: bool,
}

/// Fan-out point shared by the registry (publisher) and the facade.
#[derive(Clone, Default)]
pub(crate) struct EventBus {
    state: Arc<Mutex<BusState>>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attach(&self) -> mpsc::UnboundedReceiver<QueenEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state();
        if !state.closed {
            state.subscribers.push(tx);
        }
        rx
    }

    /// Deliver `event` to every live subscriber.
    pub(crate) fn publish(&self, event: &QueenEvent) {
        let mut state = self.state();
        let before = state.subscribers.len();
        state
            .subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
        let pruned = before - state.subscribers.len();
        if pruned > 0 {
            debug!("pruned {pruned} closed event subscribers");
        }
    }

    /// End every subscription once its queued events are read.
    pub(crate) fn close(&self) {
        let mut state = self.state();
        state.closed = true;
        state.subscribers.clear();
    }
}

/// Observe-only handle onto the queen's lifecycle events.
#[derive(Clone)]
pub struct QueenEvents {
    bus: EventBus,
}

impl QueenEvents {
    pub(crate) fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> EventSubscription {
        EventSubscription {
            rx: self.bus.attach(),
            filter: None,
        }
    }

    /// Receive only events of `kind` emitted from now on.
    pub fn on(&self, kind: QueenEventKind) -> EventSubscription {
        EventSubscription {
            rx: self.bus.attach(),
            filter: Some(kind),
        }
    }
}

impl fmt::Debug for QueenEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueenEvents").finish_non_exhaustive()
    }
}

/// A live subscription. Dropping it removes the listener.
pub struct EventSubscription {
    rx: mpsc::UnboundedReceiver<QueenEvent>,
    filter: Option<QueenEventKind>,
}

impl EventSubscription {
    fn wants(&self, event: &QueenEvent) -> bool {
        self.filter.map_or(true, |kind| kind == event.kind())
    }

    /// Wait for the next matching event. `None` once the queen is gone.
    pub async fn recv(&mut self) -> Option<QueenEvent> {
        loop {
            let event = self.rx.recv().await?;
            if self.wants(&event) {
                return Some(event);
            }
        }
    }

    /// Return the next matching event that is already queued.
    pub fn try_recv(&mut self) -> Option<QueenEvent> {
        while let Ok(event) = self.rx.try_recv() {
            if self.wants(&event) {
                return Some(event);
            }
        }
        None
    }

    /// Equivalent to dropping the subscription.
    pub fn unsubscribe(self) {}
}

impl fmt::Debug for EventSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSubscription")
            .field("filter", &self.filter)
            .finish()
    }
}
