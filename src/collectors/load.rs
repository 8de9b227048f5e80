//! Load timing collector, with optional bundle payload accounting.

use super::{CollectorContext, Subscription};
use crate::core::{AlertData, AlertKind, CollectorState, MetricCategory, MetricSample, SampleDetail};
use crate::host::{EventSource, TimingEntry};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default)]
struct BundleTotals {
    bytes: u64,
    resources: u32,
    crossed: bool,
}

/// Subscribes to timing/resource completion events; records a `load` sample
/// per entry and raises `load-time-exceeded` when an entry overruns the load
/// budget. With bundle analysis enabled, script/stylesheet payloads
/// accumulate into `bundle/total-size` and `bundle-size-exceeded` fires once
/// when the running total crosses the bundle budget.
pub struct LoadCollector {
    ctx: CollectorContext,
    bundle_analysis: bool,
    subscription: Mutex<Option<Subscription<TimingEntry>>>,
    state: Mutex<CollectorState>,
}

impl LoadCollector {
    pub(crate) fn new(ctx: CollectorContext, bundle_analysis: bool) -> Self {
        Self {
            ctx,
            bundle_analysis,
            subscription: Mutex::new(None),
            state: Mutex::new(CollectorState::unavailable("not initialized")),
        }
    }

    pub(crate) fn start(
        &self,
        source: Option<&Arc<dyn EventSource<TimingEntry>>>,
        capability: bool,
    ) {
        let Some(source) = source.filter(|_| capability) else {
            *self.state.lock() = CollectorState::unavailable("performance timing API unavailable");
            tracing::debug!("load collector inactive: no timing source");
            return;
        };

        let ctx = self.ctx.clone();
        let bundle_analysis = self.bundle_analysis;
        let totals = Arc::new(Mutex::new(BundleTotals::default()));

        let token = source.subscribe(Arc::new(move |entry: &TimingEntry| {
            Self::on_entry(&ctx, bundle_analysis, &totals, entry);
        }));

        *self.subscription.lock() = Some(Subscription::new(Arc::clone(source), token));
        *self.state.lock() = CollectorState::active();
    }

    fn on_entry(
        ctx: &CollectorContext,
        bundle_analysis: bool,
        totals: &Mutex<BundleTotals>,
        entry: &TimingEntry,
    ) {
        ctx.store.record(
            MetricCategory::Load,
            &entry.name,
            MetricSample::new(entry.duration_ms, SampleDetail::LoadEntry {
                entry: entry.name.clone(),
            }),
        );

        let load_budget = ctx.budget.read().load_time_ms;
        if entry.duration_ms > load_budget {
            ctx.alerts.add(AlertKind::LoadTimeExceeded, AlertData::BudgetOverrun {
                metric: entry.name.clone(),
                actual: entry.duration_ms,
                budget: load_budget,
            });
        }

        if bundle_analysis && entry.kind.counts_toward_bundle() {
            Self::account_bundle(ctx, totals, entry);
        }
    }

    fn account_bundle(ctx: &CollectorContext, totals: &Mutex<BundleTotals>, entry: &TimingEntry) {
        let mut totals = totals.lock();
        totals.bytes += entry.transfer_size;
        totals.resources += 1;

        ctx.store.record(
            MetricCategory::Bundle,
            "total-size",
            MetricSample::new(totals.bytes as f64, SampleDetail::Bundle {
                resources: totals.resources,
            }),
        );

        let bundle_budget = ctx.budget.read().bundle_size_bytes;
        if !totals.crossed && totals.bytes > bundle_budget {
            // Alert on the crossing only, not on every entry after it.
            totals.crossed = true;
            ctx.alerts.add(AlertKind::BundleSizeExceeded, AlertData::BudgetOverrun {
                metric: "bundle-size".to_owned(),
                actual: totals.bytes as f64,
                budget: bundle_budget as f64,
            });
        }
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
