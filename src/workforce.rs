// CLASSIFICATION: COMMUNITY
// Filename: workforce.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Workforce collaborator contracts.
//!
//! The queen drives a workforce's lifecycle (create, start, populate, kill)
//! and watches for its death. How a workforce schedules work onto the
//! providers it is given is its own business.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::WorkforceError;
use crate::lifeline::{DeathSignal, Lifeline};
use crate::provider::{ProviderId, WorkerProvider};

/// Identifier of a workforce.
pub type WorkforceId = String;

/// How a workforce is kept supplied with providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopulationStrategy {
    /// One snapshot of the registry at creation, nothing afterwards.
    Once,
    /// Snapshot at creation, then every provider join and departure.
    Continuous,
}

impl PopulationStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Continuous => "continuous",
        }
    }
}

impl FromStr for PopulationStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "once" => Ok(Self::Once),
            "continuous" => Ok(Self::Continuous),
            other => Err(format!("unknown population strategy {other:?}")),
        }
    }
}

impl fmt::Display for PopulationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options accepted by [`crate::Queen::get_workforce`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WorkforceOptions {
    /// Population strategy. `None` uses the queen's configured default.
    #[serde(default)]
    pub populate: Option<PopulationStrategy>,
    /// Opaque settings forwarded to the factory untouched.
    #[serde(default)]
    pub settings: Value,
}

impl WorkforceOptions {
    pub fn once() -> Self {
        Self::with_populate(PopulationStrategy::Once)
    }

    pub fn continuous() -> Self {
        Self::with_populate(PopulationStrategy::Continuous)
    }

    pub fn with_populate(strategy: PopulationStrategy) -> Self {
        Self {
            populate: Some(strategy),
            ..Self::default()
        }
    }
}

/// Membership update handed to [`Workforce::populate`].
#[derive(Clone)]
pub enum Population {
    /// Every provider registered at creation time, in registration order.
    Snapshot(Vec<Arc<dyn WorkerProvider>>),
    /// A provider registered after creation (continuous only).
    Joined(Arc<dyn WorkerProvider>),
    /// A provider left the registry (continuous only).
    Departed(ProviderId),
}

impl fmt::Debug for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Snapshot(providers) => f
                .debug_tuple("Snapshot")
                .field(&providers.iter().map(|p| p.id()).collect::<Vec<_>>())
                .finish(),
            Self::Joined(provider) => f.debug_tuple("Joined").field(&provider.id()).finish(),
            Self::Departed(id) => f.debug_tuple("Departed").field(id).finish(),
        }
    }
}

/// Pool of workers assembled from providers.
pub trait Workforce: Send + Sync + 'static {
    fn id(&self) -> &str;

    fn populate(&self, population: Population);

    fn start(&self);

    /// Terminate the workforce. Its death signal must fire as a result.
    fn kill(&self);

    fn dead(&self) -> DeathSignal;
}

impl fmt::Debug for dyn Workforce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workforce").field("id", &self.id()).finish()
    }
}

/// Builds workforces on behalf of the queen.
pub trait WorkforceFactory: Send + Sync + 'static {
    fn create(&self, options: &WorkforceOptions) -> Result<Arc<dyn Workforce>, WorkforceError>;
}

/// In-process workforce that tracks the providers it has been given.
pub struct PooledWorkforce {
    id: WorkforceId,
    members: Mutex<Vec<Arc<dyn WorkerProvider>>>,
    running: AtomicBool,
    lifeline: Lifeline,
}

impl PooledWorkforce {
    pub fn new(id: impl Into<WorkforceId>) -> Self {
        Self {
            id: id.into(),
            members: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
            lifeline: Lifeline::new(),
        }
    }

    /// Current member providers, in the order they were added.
    pub fn members(&self) -> Vec<Arc<dyn WorkerProvider>> {
        self.members
            .lock()
            .map(|members| members.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Workforce for PooledWorkforce {
    fn id(&self) -> &str {
        &self.id
    }

    fn populate(&self, population: Population) {
        if self.lifeline.is_dead() {
            debug!("workforce {} ignoring {:?} after death", self.id, population);
            return;
        }
        let Ok(mut members) = self.members.lock() else {
            return;
        };
        match population {
            Population::Snapshot(providers) => *members = providers,
            Population::Joined(provider) => {
                if !members.iter().any(|m| m.id() == provider.id()) {
                    members.push(provider);
                }
            }
            Population::Departed(id) => members.retain(|m| m.id() != id),
        }
        debug!("workforce {} now has {} providers", self.id, members.len());
    }

    fn start(&self) {
        if !self.lifeline.is_dead() && !self.running.swap(true, Ordering::SeqCst) {
            info!("workforce {} started", self.id);
        }
    }

    fn kill(&self) {
        if self.lifeline.kill() {
            self.running.store(false, Ordering::SeqCst);
            if let Ok(mut members) = self.members.lock() {
                members.clear();
            }
            info!("workforce {} killed", self.id);
        }
    }

    fn dead(&self) -> DeathSignal {
        self.lifeline.subscribe()
    }
}

/// Factory producing [`PooledWorkforce`] instances with sequential ids.
#[derive(Debug, Default)]
pub struct PooledWorkforceFactory {
    next_id: AtomicU64,
}

impl PooledWorkforceFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkforceFactory for PooledWorkforceFactory {
    fn create(&self, _options: &WorkforceOptions) -> Result<Arc<dyn Workforce>, WorkforceError> {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Arc::new(PooledWorkforce::new(format!("workforce-{n}"))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Attributes;

    struct StubProvider {
        id: String,
        attributes: Attributes,
        lifeline: Lifeline,
    }

    impl WorkerProvider for StubProvider {
        fn id(&self) -> &str {
            &self.id
        }
        fn attributes(&self) -> &Attributes {
            &self.attributes
        }
        fn kill(&self) {
            self.lifeline.kill();
        }
        fn dead(&self) -> DeathSignal {
            self.lifeline.subscribe()
        }
    }

    fn stub(id: &str) -> Arc<dyn WorkerProvider> {
        Arc::new(StubProvider {
            id: id.into(),
            attributes: Attributes::new(),
            lifeline: Lifeline::new(),
        })
    }

    fn ids(workforce: &PooledWorkforce) -> Vec<String> {
        workforce.members().iter().map(|p| p.id().to_owned()).collect()
    }

    #[test]
    fn options_deserialize_strategy_names() {
        let opts: WorkforceOptions = serde_json::from_str(r#"{"populate":"continuous"}"#).unwrap();
        assert_eq!(opts.populate, Some(PopulationStrategy::Continuous));
        let opts: WorkforceOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts.populate, None);
        assert!(serde_json::from_str::<WorkforceOptions>(r#"{"populate":"sometimes"}"#).is_err());
        assert_eq!("once".parse::<PopulationStrategy>(), Ok(PopulationStrategy::Once));
        assert!("never".parse::<PopulationStrategy>().is_err());
    }

    #[test]
    fn pooled_workforce_applies_population_updates() {
        let wf = PooledWorkforce::new("wf");
        wf.populate(Population::Snapshot(vec![stub("a"), stub("b")]));
        wf.populate(Population::Joined(stub("c")));
        wf.populate(Population::Joined(stub("a")));
        wf.populate(Population::Departed("b".into()));
        assert_eq!(ids(&wf), vec!["a", "c"]);
    }

    #[test]
    fn pooled_workforce_lifecycle() {
        let wf = PooledWorkforce::new("wf");
        assert!(!wf.is_running());
        wf.start();
        assert!(wf.is_running());
        wf.kill();
        assert!(!wf.is_running());
        wf.start();
        assert!(!wf.is_running());
        wf.populate(Population::Joined(stub("late")));
        assert!(wf.members().is_empty());
    }

    #[test]
    fn factory_assigns_sequential_ids() {
        let factory = PooledWorkforceFactory::new();
        let a = factory.create(&WorkforceOptions::default()).unwrap();
        let b = factory.create(&WorkforceOptions::once()).unwrap();
        assert_eq!(a.id(), "workforce-1");
        assert_eq!(b.id(), "workforce-2");
    }
}
