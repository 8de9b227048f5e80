//! Tree-mutation collector.
//!
//! Subscribes to batched mutation notifications; batches over the policy
//! limit are recorded as `runtime/dom-mutations` samples and raise
//! `high-dom-mutations`.

use super::{CollectorContext, Subscription};
use crate::core::{AlertData, AlertKind, CollectorState, MetricCategory, MetricSample, SampleDetail};
use crate::host::{EventSource, MutationBatch};
use parking_lot::Mutex;
use std::sync::Arc;

/// Flags mutation storms from batched host notifications.
pub struct MutationCollector {
    ctx: CollectorContext,
    subscription: Mutex<Option<Subscription<MutationBatch>>>,
    state: Mutex<CollectorState>,
}

impl MutationCollector {
    pub(crate) fn new(ctx: CollectorContext) -> Self {
        Self {
            ctx,
            subscription: Mutex::new(None),
            state: Mutex::new(CollectorState::unavailable("not initialized")),
        }
    }

    pub(crate) fn start(
        &self,
        source: Option<&Arc<dyn EventSource<MutationBatch>>>,
        capability: bool,
    ) {
        let Some(source) = source.filter(|_| capability) else {
            *self.state.lock() = CollectorState::unavailable("mutation observer unavailable");
            tracing::debug!("mutation collector inactive: no mutation source");
            return;
        };

        let ctx = self.ctx.clone();
        let token = source.subscribe(Arc::new(move |batch: &MutationBatch| {
            Self::on_batch(&ctx, batch);
        }));

        *self.subscription.lock() = Some(Subscription::new(Arc::clone(source), token));
        *self.state.lock() = CollectorState::active();
    }

    fn on_batch(ctx: &CollectorContext, batch: &MutationBatch) {
        let limit = ctx.policy.mutation_batch_limit;
        if batch.count <= limit {
            return;
        }

        ctx.store.record(
            MetricCategory::Runtime,
            "dom-mutations",
            MetricSample::new(batch.count as f64, SampleDetail::MutationBatch {
                count: batch.count,
            }),
        );
        ctx.alerts.add(AlertKind::HighDomMutations, AlertData::MutationFlood {
            count: batch.count,
            threshold: limit,
        });
    }

    pub(crate) fn stop(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.release();
            self.state.lock().active = false;
        }
    }

    pub(crate) fn state(&self) -> CollectorState {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertManager;
    use crate::core::{CollectorPolicy, PerformanceBudget};
    use crate::host::ManualEventSource;
    use crate::storage::MetricStore;
    use parking_lot::RwLock;

    fn harness() -> (MutationCollector, Arc<ManualEventSource<MutationBatch>>, CollectorContext) {
        let ctx = CollectorContext {
            store: Arc::new(MetricStore::new()),
            alerts: Arc::new(AlertManager::new()),
            budget: Arc::new(RwLock::new(PerformanceBudget::default())),
            policy: CollectorPolicy::default(),
        };
        let collector = MutationCollector::new(ctx.clone());
        let source: Arc<ManualEventSource<MutationBatch>> = Arc::new(ManualEventSource::new());
        let dyn_source: Arc<dyn EventSource<MutationBatch>> = Arc::clone(&source) as _;
        collector.start(Some(&dyn_source), true);
        (collector, source, ctx)
    }

    #[test]
    fn test_batch_over_limit_records_and_alerts() {
        let (_collector, source, ctx) = harness();

        source.emit(&MutationBatch { count: 150 });

        let sample = ctx
            .store
            .latest(MetricCategory::Runtime, "dom-mutations")
            .unwrap();
        assert_eq!(sample.value, 150.0);

        let raised = ctx.alerts.get(Some(AlertKind::HighDomMutations));
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].data, AlertData::MutationFlood {
            count: 150,
            threshold: 100,
        });
    }

    #[test]
    fn test_batch_at_limit_ignored() {
        let (_collector, source, ctx) = harness();

        source.emit(&MutationBatch { count: 100 });

        assert_eq!(ctx.store.series_len(MetricCategory::Runtime, "dom-mutations"), 0);
        assert!(ctx.alerts.is_empty());
    }

    #[test]
    fn test_inactive_without_capability() {
        let ctx = CollectorContext {
            store: Arc::new(MetricStore::new()),
            alerts: Arc::new(AlertManager::new()),
            budget: Arc::new(RwLock::new(PerformanceBudget::default())),
            policy: CollectorPolicy::default(),
        };
        let collector = MutationCollector::new(ctx);
        collector.start(None, false);
        assert!(!collector.state().active);
    }
}
