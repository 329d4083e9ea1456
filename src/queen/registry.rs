// CLASSIFICATION: COMMUNITY
// Filename: registry.rs v0.2
// Author: Lukas Bower
// Date Modified: 2026-10-15

//! Registry of live providers and workforces.
//!
//! Owned by the queen actor and never shared. Each entry carries the task
//! watching its death signal; removing the entry aborts that task, so an
//! evicted entity can never produce another event.
//!
//! Entries also keep their own signal so the actor can [`Registry::reap`]
//! the dead before serving a command, even when the watcher's notice is
//! still queued.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::events::{EventBus, QueenEvent};
use super::Command;
use crate::error::WorkforceError;
use crate::lifeline::DeathSignal;
use crate::provider::WorkerProvider;
use crate::workforce::{
    Population, PopulationStrategy, Workforce, WorkforceFactory, WorkforceOptions,
};

/// Death watcher bound to a registry entry.
struct Watch(JoinHandle<()>);

impl Drop for Watch {
    fn drop(&mut self) {
        self.0.abort();
    }
}

struct ProviderEntry {
    provider: Arc<dyn WorkerProvider>,
    generation: u64,
    signal: DeathSignal,
    _watch: Watch,
}

struct WorkforceEntry {
    workforce: Arc<dyn Workforce>,
    strategy: PopulationStrategy,
    generation: u64,
    signal: DeathSignal,
    _watch: Watch,
}

pub(crate) struct Registry {
    providers: Vec<ProviderEntry>,
    workforces: Vec<WorkforceEntry>,
    events: EventBus,
    commands: mpsc::WeakUnboundedSender<Command>,
    default_population: PopulationStrategy,
    next_generation: u64,
}

impl Registry {
    pub(crate) fn new(
        events: EventBus,
        commands: mpsc::WeakUnboundedSender<Command>,
        default_population: PopulationStrategy,
    ) -> Self {
        Self {
            providers: Vec::new(),
            workforces: Vec::new(),
            events,
            commands,
            default_population,
            next_generation: 0,
        }
    }

    fn emit(&self, event: QueenEvent) {
        self.events.publish(&event);
    }

    fn watch(&self, signal: DeathSignal, on_death: Command) -> Watch {
        let commands = self.commands.clone();
        Watch(tokio::spawn(async move {
            signal.wait().await;
            if let Some(commands) = commands.upgrade() {
                let _ = commands.send(on_death);
            }
        }))
    }

    fn generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    /// Evict every entry whose death signal already fired.
    pub(crate) fn reap(&mut self) {
        let providers: Vec<(String, u64)> = self
            .providers
            .iter()
            .filter(|entry| entry.signal.has_fired())
            .map(|entry| (entry.provider.id().to_owned(), entry.generation))
            .collect();
        for (id, generation) in providers {
            self.evict_provider(&id, Some(generation));
        }

        let workforces: Vec<(String, u64)> = self
            .workforces
            .iter()
            .filter(|entry| entry.signal.has_fired())
            .map(|entry| (entry.workforce.id().to_owned(), entry.generation))
            .collect();
        for (id, generation) in workforces {
            self.evict_workforce(&id, Some(generation));
        }
    }

    pub(crate) fn provider(&self, id: &str) -> Option<Arc<dyn WorkerProvider>> {
        self.providers
            .iter()
            .find(|entry| entry.provider.id() == id)
            .map(|entry| entry.provider.clone())
    }

    /// Registered providers in registration order.
    pub(crate) fn providers(&self) -> Vec<Arc<dyn WorkerProvider>> {
        self.providers.iter().map(|entry| entry.provider.clone()).collect()
    }

    pub(crate) fn admit_provider(&mut self, provider: Arc<dyn WorkerProvider>) {
        let id = provider.id().to_owned();
        let previous = self
            .providers
            .iter()
            .find(|entry| entry.provider.id() == id)
            .map(|entry| Arc::ptr_eq(&entry.provider, &provider));
        match previous {
            Some(true) => {
                debug!("provider {id} already registered");
                return;
            }
            Some(false) => {
                warn!("provider id {id} re-registered, evicting the previous instance");
                self.evict_provider(&id, None);
            }
            None => {}
        }

        let generation = self.generation();
        let watch = self.watch(
            provider.dead(),
            Command::ProviderDead {
                id: id.clone(),
                generation,
            },
        );
        self.providers.push(ProviderEntry {
            provider: provider.clone(),
            generation,
            signal: provider.dead(),
            _watch: watch,
        });
        info!("provider {id} registered ({} active)", self.providers.len());
        self.emit(QueenEvent::WorkerProvider(provider.clone()));

        for entry in &self.workforces {
            if entry.strategy == PopulationStrategy::Continuous {
                debug!("workforce {} joined by {id}", entry.workforce.id());
                entry.workforce.populate(Population::Joined(provider.clone()));
            }
        }
    }

    /// Remove a provider. With `generation` set, only the matching
    /// registration is removed. Unknown ids are ignored.
    pub(crate) fn evict_provider(&mut self, id: &str, generation: Option<u64>) {
        let Some(index) = self.providers.iter().position(|entry| {
            entry.provider.id() == id && generation.map_or(true, |g| g == entry.generation)
        }) else {
            debug!("provider {id} already evicted");
            return;
        };
        drop(self.providers.remove(index));
        info!("provider {id} evicted ({} active)", self.providers.len());

        for entry in &self.workforces {
            if entry.strategy == PopulationStrategy::Continuous {
                entry.workforce.populate(Population::Departed(id.to_owned()));
            }
        }
        self.emit(QueenEvent::WorkerProviderDead(id.to_owned()));
    }

    pub(crate) fn create_workforce(
        &mut self,
        factory: &dyn WorkforceFactory,
        options: WorkforceOptions,
    ) -> Result<Arc<dyn Workforce>, WorkforceError> {
        let workforce = factory.create(&options)?;
        let strategy = options.populate.unwrap_or(self.default_population);
        let id = workforce.id().to_owned();

        let generation = self.generation();
        let watch = self.watch(
            workforce.dead(),
            Command::WorkforceDead {
                id: id.clone(),
                generation,
            },
        );
        self.workforces.push(WorkforceEntry {
            workforce: workforce.clone(),
            strategy,
            generation,
            signal: workforce.dead(),
            _watch: watch,
        });
        workforce.start();
        info!("workforce {id} started with {strategy} population");
        self.emit(QueenEvent::Workforce(workforce.clone()));

        let snapshot = self.providers();
        debug!("workforce {id} populated with {} providers", snapshot.len());
        workforce.populate(Population::Snapshot(snapshot));
        Ok(workforce)
    }

    pub(crate) fn evict_workforce(&mut self, id: &str, generation: Option<u64>) {
        let Some(index) = self.workforces.iter().position(|entry| {
            entry.workforce.id() == id && generation.map_or(true, |g| g == entry.generation)
        }) else {
            debug!("workforce {id} already evicted");
            return;
        };
        drop(self.workforces.remove(index));
        info!("workforce {id} evicted ({} active)", self.workforces.len());
        self.emit(QueenEvent::WorkforceDead(id.to_owned()));
    }

    /// Kill every workforce and provider, evict them, then announce death.
    pub(crate) fn kill_all(&mut self) {
        for entry in &self.workforces {
            entry.workforce.kill();
        }
        for entry in &self.providers {
            entry.provider.kill();
        }
        while let Some(entry) = self.workforces.pop() {
            let id = entry.workforce.id().to_owned();
            drop(entry);
            self.emit(QueenEvent::WorkforceDead(id));
        }
        while let Some(entry) = self.providers.pop() {
            let id = entry.provider.id().to_owned();
            drop(entry);
            self.emit(QueenEvent::WorkerProviderDead(id));
        }
        info!("queen dead");
        self.emit(QueenEvent::Dead);
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.events.close();
    }
}
