// CLASSIFICATION: COMMUNITY
// Filename: mod.rs v0.1
// Date Modified: 2026-10-15
// Author: Lukas Bower

//! Shared mocks for the queen integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hivequeen::{
    Attributes, DeathSignal, EventSubscription, Lifeline, Population, Queen, QueenConfig,
    QueenEvent, QueenEvents, WorkerProvider, Workforce, WorkforceError, WorkforceFactory,
    WorkforceOptions,
};
use serde_json::json;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Pointer identity across concrete and trait-object `Arc`s.
pub fn same<T: ?Sized, U: ?Sized>(a: &Arc<T>, b: &Arc<U>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

pub async fn next_event(sub: &mut EventSubscription) -> QueenEvent {
    tokio::time::timeout(Duration::from_secs(5), sub.recv())
        .await
        .expect("timed out waiting for queen event")
        .expect("queen event stream closed")
}

/// Drain a subscription until the queen is gone.
pub async fn drain(mut sub: EventSubscription) -> Vec<QueenEvent> {
    let mut events = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(5), sub.recv()).await {
        events.push(event);
    }
    events
}

pub struct MockProvider {
    id: String,
    attributes: Attributes,
    lifeline: Lifeline,
    kills: AtomicUsize,
}

impl MockProvider {
    pub fn new(id: &str) -> Arc<Self> {
        let mut attributes = Attributes::new();
        attributes.insert("name".into(), json!("Test"));
        Arc::new(Self {
            id: id.into(),
            attributes,
            lifeline: Lifeline::new(),
            kills: AtomicUsize::new(0),
        })
    }

    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

impl WorkerProvider for MockProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    fn kill(&self) {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.lifeline.kill();
    }

    fn dead(&self) -> DeathSignal {
        self.lifeline.subscribe()
    }
}

pub fn describe(population: &Population) -> String {
    match population {
        Population::Snapshot(providers) => format!(
            "snapshot[{}]",
            providers.iter().map(|p| p.id()).collect::<Vec<_>>().join(",")
        ),
        Population::Joined(provider) => format!("joined:{}", provider.id()),
        Population::Departed(id) => format!("departed:{id}"),
    }
}

type Observer = Arc<Mutex<EventSubscription>>;

pub struct RecordingWorkforce {
    id: String,
    populations: Mutex<Vec<Population>>,
    starts: AtomicUsize,
    kills: AtomicUsize,
    lifeline: Lifeline,
    journal: Arc<Mutex<Vec<String>>>,
    observer: Option<Observer>,
}

impl RecordingWorkforce {
    pub fn populations(&self) -> Vec<Population> {
        self.populations.lock().unwrap().clone()
    }

    pub fn described(&self) -> Vec<String> {
        self.populations().iter().map(describe).collect()
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

impl Workforce for RecordingWorkforce {
    fn id(&self) -> &str {
        &self.id
    }

    fn populate(&self, population: Population) {
        let mut journal = self.journal.lock().unwrap();
        if let Some(observer) = &self.observer {
            let mut sub = observer.lock().unwrap();
            while let Some(event) = sub.try_recv() {
                journal.push(format!("event:{event:?}"));
            }
        }
        journal.push(format!("populate:{}", describe(&population)));
        self.populations.lock().unwrap().push(population);
    }

    fn start(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn kill(&self) {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.lifeline.kill();
    }

    fn dead(&self) -> DeathSignal {
        self.lifeline.subscribe()
    }
}

/// Factory that keeps every workforce it built.
#[derive(Default)]
pub struct RecordingFactory {
    created: Mutex<Vec<Arc<RecordingWorkforce>>>,
    options: Mutex<Vec<WorkforceOptions>>,
    next_id: AtomicU64,
    fail_next: AtomicBool,
    observer: Mutex<Option<Observer>>,
    journal: Arc<Mutex<Vec<String>>>,
}

impl RecordingFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn last(&self) -> Arc<RecordingWorkforce> {
        self.created
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no workforce created")
    }

    pub fn all(&self) -> Vec<Arc<RecordingWorkforce>> {
        self.created.lock().unwrap().clone()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    pub fn last_options(&self) -> Option<WorkforceOptions> {
        self.options.lock().unwrap().last().cloned()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Let workforces built from now on record queued events in the journal
    /// before each populate call.
    pub fn observe(&self, events: &QueenEvents) {
        *self.observer.lock().unwrap() = Some(Arc::new(Mutex::new(events.subscribe())));
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }
}

impl WorkforceFactory for RecordingFactory {
    fn create(&self, options: &WorkforceOptions) -> Result<Arc<dyn Workforce>, WorkforceError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(WorkforceError::Create("factory refused".into()));
        }
        self.options.lock().unwrap().push(options.clone());
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let workforce = Arc::new(RecordingWorkforce {
            id: format!("wf-{n}"),
            populations: Mutex::new(Vec::new()),
            starts: AtomicUsize::new(0),
            kills: AtomicUsize::new(0),
            lifeline: Lifeline::new(),
            journal: self.journal.clone(),
            observer: self.observer.lock().unwrap().clone(),
        });
        self.created.lock().unwrap().push(workforce.clone());
        Ok(workforce)
    }
}

pub fn start_queen(config: QueenConfig) -> (Queen, Arc<RecordingFactory>) {
    init_logging();
    let factory = RecordingFactory::new();
    let queen = Queen::new(config, factory.clone());
    (queen, factory)
}
