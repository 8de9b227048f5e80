//! Progressive resource loader.
//!
//! Deferred targets are registered with either a concrete resource
//! reference or a component name resolved through a [`ComponentRegistry`].
//! The first visibility transition triggers exactly one resolution; the
//! target then stays terminally loaded or failed, and later transitions are
//! ignored. Every resolution records a `lazy-loading` sample carrying its
//! duration and outcome.

use crate::collectors::Subscription;
use crate::core::{CollectorState, MetricCategory, MetricSample, Result, SampleDetail, VitalsError};
use crate::host::{EventSource, VisibilityEvent};
use crate::storage::MetricStore;
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;

/// Opaque handle to an instantiated component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentHandle {
    /// Registered component name.
    pub name: String,
}

/// Factory producing one component instance.
pub type ComponentFactory = Arc<dyn Fn() -> Result<ComponentHandle> + Send + Sync>;

/// Maps component names to factories.
///
/// Resolution is async: a registry backed by late-bound loading suspends
/// only the caller awaiting it.
#[async_trait]
pub trait ComponentRegistry: Send + Sync {
    /// Look up the factory for `name`.
    async fn resolve(&self, name: &str) -> Result<ComponentFactory>;
}

/// Registry holding factories registered up front.
#[derive(Default)]
pub struct InMemoryRegistry {
    factories: DashMap<String, ComponentFactory>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register(&self, name: &str, factory: ComponentFactory) {
        self.factories.insert(name.to_owned(), factory);
    }
}

#[async_trait]
impl ComponentRegistry for InMemoryRegistry {
    async fn resolve(&self, name: &str) -> Result<ComponentFactory> {
        self.factories
            .get(name)
            .map(|f| Arc::clone(f.value()))
            .ok_or_else(|| VitalsError::ComponentNotFound(name.to_owned()))
    }
}

/// What a deferred target resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LazySource {
    /// Concrete resource reference assigned on visibility.
    Resource(String),
    /// Component name resolved through the registry.
    Component(String),
}

/// Lifecycle of one registered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// Registered, not yet visible.
    Pending,
    /// Resolution in flight.
    Loading,
    /// Resolved; terminal.
    Loaded,
    /// Resolution failed; terminal, never retried.
    Failed,
}

struct TargetEntry {
    source: LazySource,
    phase: LoadPhase,
}

/// Visibility-triggered, one-shot loader feeding the `lazy-loading` series.
pub struct LazyLoader {
    store: Arc<MetricStore>,
    targets: Arc<Mutex<HashMap<String, TargetEntry>>>,
    subscription: Mutex<Option<Subscription<VisibilityEvent>>>,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    state: Mutex<CollectorState>,
}

impl LazyLoader {
    pub(crate) fn new(store: Arc<MetricStore>) -> Self {
        Self {
            store,
            targets: Arc::new(Mutex::new(HashMap::new())),
            subscription: Mutex::new(None),
            tasks: Arc::new(Mutex::new(Vec::new())),
            state: Mutex::new(CollectorState::unavailable("not initialized")),
        }
    }

    pub(crate) fn start(
        &self,
        source: Option<&Arc<dyn EventSource<VisibilityEvent>>>,
        capability: bool,
        enabled: bool,
        registry: Option<Arc<dyn ComponentRegistry>>,
    ) {
        if !enabled {
            *self.state.lock() = CollectorState::unavailable("lazy loading disabled");
            return;
        }
        let Some(source) = source.filter(|_| capability) else {
            *self.state.lock() = CollectorState::unavailable("intersection observer unavailable");
            tracing::debug!("lazy loader inactive: no visibility source");
            return;
        };

        let store = Arc::clone(&self.store);
        let targets = Arc::clone(&self.targets);
        let tasks = Arc::clone(&self.tasks);

        let token = source.subscribe(Arc::new(move |event: &VisibilityEvent| {
            Self::on_visibility(&store, &targets, &tasks, registry.as_ref(), event);
        }));

        *self.subscription.lock() = Some(Subscription::new(Arc::clone(source), token));
        *self.state.lock() = CollectorState::active();
    }

    /// Register a deferred target. Replaces any previous registration for
    /// the same id, resetting it to pending.
    pub fn register(&self, target: &str, source: LazySource) {
        self.targets.lock().insert(target.to_owned(), TargetEntry {
            source,
            phase: LoadPhase::Pending,
        });
    }

    /// Current phase of a registered target.
    pub fn phase(&self, target: &str) -> Option<LoadPhase> {
        self.targets.lock().get(target).map(|e| e.phase)
    }

    /// Await all in-flight component resolutions.
    pub async fn flush(&self) {
        let handles: Vec<_> = self.tasks.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    fn on_visibility(
        store: &Arc<MetricStore>,
        targets: &Arc<Mutex<HashMap<String, TargetEntry>>>,
        tasks: &Mutex<Vec<JoinHandle<()>>>,
        registry: Option<&Arc<dyn ComponentRegistry>>,
        event: &VisibilityEvent,
    ) {
        if !event.visible {
            return;
        }

        let source = {
            let mut targets = targets.lock();
            let Some(entry) = targets.get_mut(&event.target) else {
                tracing::debug!(target = %event.target, "visibility for unregistered target");
                return;
            };
            if entry.phase != LoadPhase::Pending {
                // One-shot: anything past pending never re-triggers.
                return;
            }
            entry.phase = LoadPhase::Loading;
            entry.source.clone()
        };

        let started = Instant::now();
        match source {
            LazySource::Resource(resource) => {
                // Assigning the concrete reference is immediate.
                tracing::debug!(target = %event.target, %resource, "lazy resource resolved");
                Self::finish(store, targets, &event.target, started, Ok(()));
            },
            LazySource::Component(name) => {
                let Some(registry) = registry.cloned() else {
                    Self::finish(
                        store,
                        targets,
                        &event.target,
                        started,
                        Err(VitalsError::lazy_load(
                            event.target.clone(),
                            "no component registry configured",
                        )),
                    );
                    return;
                };

                let store = Arc::clone(store);
                let targets = Arc::clone(targets);
                let target = event.target.clone();
                tasks.lock().push(tokio::spawn(async move {
                    let outcome = registry
                        .resolve(&name)
                        .await
                        .and_then(|factory| factory())
                        .map(|_handle| ());
                    Self::finish(&store, &targets, &target, started, outcome);
                }));
            },
        }
    }

    fn finish(
        store: &Arc<MetricStore>,
        targets: &Arc<Mutex<HashMap<String, TargetEntry>>>,
        target: &str,
        started: Instant,
        outcome: Result<()>,
    ) {
        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        let (phase, success, error) = match outcome {
            Ok(()) => (LoadPhase::Loaded, true, None),
            Err(error) => {
                tracing::warn!(target, %error, "lazy load failed");
                (LoadPhase::Failed, false, Some(error.to_string()))
            },
        };

        store.record(
            MetricCategory::LazyLoading,
            target,
            MetricSample::new(duration_ms, SampleDetail::LazyLoad {
                target: target.to_owned(),
                success,
                error,
            }),
        );

        if let Some(entry) = targets.lock().get_mut(target) {
            entry.phase = phase;
        }
    }

    pub(crate) fn stop(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.release();
            self.state.lock().active = false;
        }
        for handle in self.tasks.lock().drain(..) {
            handle.abort();
        }
        self.targets.lock().clear();
    }

    pub(crate) fn state(&self) -> CollectorState {
        *self.state.lock()
    }
}
