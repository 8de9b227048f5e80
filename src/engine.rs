//! Engine facade wiring collectors, storage, alerting and actuation.

use crate::alerts::{AlertManager, AlertSink};
use crate::budget::check_budget;
use crate::capability::{Capabilities, CapabilityProvider};
use crate::collectors::{
    CollectorContext, FrameCollector, LoadCollector, MemoryCollector, MutationCollector,
    NetworkInstrument, SharedBudget, TaskInstrument,
};
use crate::core::{
    Alert, AlertKind, BudgetReport, CollectorKind, CollectorState, EngineConfig, MetricCategory,
    PerformanceBudget, PerformanceSummary, Priority, Result,
};
use crate::host::HostHooks;
use crate::lazy::{ComponentRegistry, LazyLoader};
use crate::recommend;
use crate::storage::{MetricStore, MetricsSnapshot};
use crate::actuator::{Actuator, AppliedAction};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Runtime performance observability and adaptive optimization engine.
///
/// Construct with [`PerfEngine::new`], arm with [`init`](Self::init), read
/// through [`metrics`](Self::metrics) / [`alerts`](Self::alerts) /
/// [`performance_summary`](Self::performance_summary), and tear down with
/// the idempotent [`cleanup`](Self::cleanup).
pub struct PerfEngine {
    config: EngineConfig,
    capabilities: Capabilities,
    hooks: HostHooks,
    registry: Option<Arc<dyn ComponentRegistry>>,
    budget: SharedBudget,
    store: Arc<MetricStore>,
    alerts: Arc<AlertManager>,
    load: LoadCollector,
    frames: FrameCollector,
    tasks: Arc<TaskInstrument>,
    mutations: MutationCollector,
    network: Arc<NetworkInstrument>,
    memory: MemoryCollector,
    lazy: Arc<LazyLoader>,
    actuator: Actuator,
    initialized: AtomicBool,
}

impl PerfEngine {
    /// Create an engine over the given hooks.
    ///
    /// Capabilities are detected from which hooks the host supplied; the
    /// provider is never re-queried afterward.
    pub fn new(config: EngineConfig, hooks: HostHooks) -> Result<Self> {
        let capabilities = Capabilities::detect(&hooks);
        Self::with_capabilities(config, hooks, capabilities, None, None)
    }

    /// Create an engine with an explicit capability provider, a notification
    /// sink, and an optional component registry.
    pub fn with_capabilities(
        config: EngineConfig,
        hooks: HostHooks,
        provider: impl CapabilityProvider,
        sink: Option<AlertSink>,
        registry: Option<Arc<dyn ComponentRegistry>>,
    ) -> Result<Self> {
        config.validate()?;
        let capabilities = Capabilities::from_provider(&provider);

        let store = Arc::new(MetricStore::new());
        let alerts = Arc::new(match sink {
            Some(sink) => AlertManager::new().with_sink(sink),
            None => AlertManager::new(),
        });
        let budget: SharedBudget = Arc::new(RwLock::new(config.budget));

        let ctx = CollectorContext {
            store: Arc::clone(&store),
            alerts: Arc::clone(&alerts),
            budget: Arc::clone(&budget),
            policy: config.policy,
        };

        let actuator = Actuator::new(
            Arc::clone(&store),
            Arc::clone(&alerts),
            config.policy,
            hooks.optimization.clone(),
        );

        Ok(Self {
            load: LoadCollector::new(ctx.clone(), config.bundle_analysis),
            frames: FrameCollector::new(ctx.clone()),
            tasks: Arc::new(TaskInstrument::new(Arc::clone(&store), config.policy)),
            mutations: MutationCollector::new(ctx.clone()),
            network: Arc::new(NetworkInstrument::new(Arc::clone(&store))),
            memory: MemoryCollector::new(ctx, config.memory_poll_interval),
            lazy: Arc::new(LazyLoader::new(Arc::clone(&store))),
            actuator,
            config,
            capabilities,
            hooks,
            registry,
            budget,
            store,
            alerts,
            initialized: AtomicBool::new(false),
        })
    }

    /// Start every collector whose capability is present.
    ///
    /// A collector with a missing capability marks itself inactive; that is
    /// informational, not an error. Calling `init` on a running engine is a
    /// no-op.
    pub fn init(&self) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("starting performance engine");

        let caps = &self.capabilities;
        self.load
            .start(self.hooks.timing.as_ref(), caps.performance_timing);
        self.frames
            .start(self.hooks.frames.as_ref(), caps.frame_callback);
        self.mutations
            .start(self.hooks.mutations.as_ref(), caps.mutation_observer);
        self.network.set_active(caps.network_hook);
        self.memory.start(
            self.hooks.memory.as_ref(),
            caps.memory_introspection,
            self.config.memory_monitoring,
        );
        self.lazy.start(
            self.hooks.visibility.as_ref(),
            caps.intersection_observer,
            self.config.lazy_loading,
            self.registry.clone(),
        );

        for (kind, state) in self.collector_states() {
            if !state.active {
                tracing::info!(
                    collector = ?kind,
                    reason = state.reason.unwrap_or("unknown"),
                    "collector inactive"
                );
            }
        }
    }

    /// Snapshot of recorded metrics, scoped to one category or all of them.
    pub fn metrics(&self, category: Option<MetricCategory>) -> MetricsSnapshot {
        self.store.snapshot(category)
    }

    /// Alerts of one kind, or the whole log, in insertion order.
    pub fn alerts(&self, kind: Option<AlertKind>) -> Vec<Alert> {
        self.alerts.get(kind)
    }

    /// Aggregate summary: totals, budget evaluation and recommendations.
    ///
    /// With `auto_optimization` enabled, a summary containing a
    /// high-priority recommendation triggers one best-effort optimization
    /// pass before returning.
    pub fn performance_summary(&self) -> PerformanceSummary {
        let recommendations = recommend::derive(&self.alerts, &self.store, &self.config.policy);

        if self.config.auto_optimization
            && recommendations.iter().any(|r| r.priority == Priority::High)
        {
            tracing::info!("auto-optimization triggered by high-priority recommendation");
            self.actuator.apply();
        }

        PerformanceSummary {
            total_metrics: self.store.total_samples(),
            total_alerts: self.alerts.len(),
            categories: self.store.categories(),
            budget_status: self.budget_report(),
            recommendations,
        }
    }

    fn budget_report(&self) -> BudgetReport {
        let budget = *self.budget.read();
        BudgetReport {
            load_time: check_budget(
                &self.store,
                MetricCategory::Load,
                "page-load",
                budget.load_time_ms,
            ),
            memory_usage: check_budget(
                &self.store,
                MetricCategory::Memory,
                "used",
                budget.memory_usage_bytes as f64,
            ),
            bundle_size: check_budget(
                &self.store,
                MetricCategory::Bundle,
                "total-size",
                budget.bundle_size_bytes as f64,
            ),
            render_time: check_budget(
                &self.store,
                MetricCategory::Rendering,
                "frame-time",
                budget.render_time_ms,
            ),
        }
    }

    /// Execute the actions mapped from the current recommendations.
    pub fn apply_optimizations(&self) -> Vec<AppliedAction> {
        self.actuator.apply()
    }

    /// Replace the performance budget for the running session.
    pub fn reconfigure_budget(&self, budget: PerformanceBudget) {
        tracing::info!(?budget, "performance budget reconfigured");
        *self.budget.write() = budget;
    }

    /// The opt-in request wrapper feeding the `network` category.
    pub fn network_instrument(&self) -> Arc<NetworkInstrument> {
        Arc::clone(&self.network)
    }

    /// The opt-in callback wrapper feeding `runtime/long-task`.
    pub fn task_instrument(&self) -> Arc<TaskInstrument> {
        Arc::clone(&self.tasks)
    }

    /// The progressive resource loader.
    pub fn lazy_loader(&self) -> Arc<LazyLoader> {
        Arc::clone(&self.lazy)
    }

    /// Capability snapshot taken at construction.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Activation state of every collector.
    pub fn collector_states(&self) -> Vec<(CollectorKind, CollectorState)> {
        vec![
            (CollectorKind::Load, self.load.state()),
            (CollectorKind::FrameRate, self.frames.state()),
            (CollectorKind::LongTask, CollectorState::active()),
            (CollectorKind::Mutation, self.mutations.state()),
            (CollectorKind::Network, self.network.state()),
            (CollectorKind::Memory, self.memory.state()),
            (CollectorKind::LazyLoader, self.lazy.state()),
        ]
    }

    /// Poll the memory probe immediately, outside the interval schedule.
    pub fn poll_memory_now(&self) {
        self.memory.poll_now();
    }

    /// Disconnect every subscription and timer and clear all recorded data.
    ///
    /// Idempotent: a second call finds nothing to release and succeeds.
    pub fn cleanup(&self) {
        if !self.initialized.swap(false, Ordering::SeqCst) {
            // Already clean; clearing again is harmless.
            self.store.clear();
            self.alerts.clear();
            return;
        }
        tracing::info!("cleaning up performance engine");

        self.load.stop();
        self.frames.stop();
        self.mutations.stop();
        self.network.set_active(false);
        self.memory.stop();
        self.lazy.stop();

        self.store.clear();
        self.alerts.clear();
    }
}

impl Drop for PerfEngine {
    fn drop(&mut self) {
        self.cleanup();
    }
}
