//! Memory collector.
//!
//! Polls the host memory probe on a fixed interval. Each reading lands in
//! `memory/used`; `memory-budget-exceeded` and `high-memory-usage` are
//! evaluated independently and may both fire from one reading.

use super::CollectorContext;
use crate::core::{AlertData, AlertKind, CollectorState, MetricCategory, MetricSample, SampleDetail};
use crate::host::MemoryProbe;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Interval-driven heap sampler.
pub struct MemoryCollector {
    ctx: CollectorContext,
    interval: Duration,
    probe: Mutex<Option<Arc<dyn MemoryProbe>>>,
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<JoinHandle<()>>>,
    state: Mutex<CollectorState>,
}

impl MemoryCollector {
    pub(crate) fn new(ctx: CollectorContext, interval: Duration) -> Self {
        Self {
            ctx,
            interval,
            probe: Mutex::new(None),
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            state: Mutex::new(CollectorState::unavailable("not initialized")),
        }
    }

    pub(crate) fn start(
        &self,
        probe: Option<&Arc<dyn MemoryProbe>>,
        capability: bool,
        enabled: bool,
    ) {
        if !enabled {
            *self.state.lock() = CollectorState::unavailable("memory monitoring disabled");
            return;
        }
        let Some(probe) = probe.filter(|_| capability) else {
            *self.state.lock() = CollectorState::unavailable("memory introspection unavailable");
            tracing::debug!("memory collector inactive: no memory probe");
            return;
        };

        *self.probe.lock() = Some(Arc::clone(probe));
        self.shutdown.store(false, Ordering::Relaxed);

        let ctx = self.ctx.clone();
        let probe = Arc::clone(probe);
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would sample at startup; skip it so
            // readings land on interval boundaries.
            ticker.tick().await;
            while !shutdown.load(Ordering::Relaxed) {
                ticker.tick().await;
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                Self::sample_once(&ctx, probe.as_ref());
            }
        });

        *self.handle.lock() = Some(handle);
        *self.state.lock() = CollectorState::active();
    }

    /// Sample the probe immediately, outside the interval schedule.
    pub(crate) fn poll_now(&self) {
        let probe = self.probe.lock().clone();
        if let Some(probe) = probe {
            Self::sample_once(&self.ctx, probe.as_ref());
        }
    }

    fn sample_once(ctx: &CollectorContext, probe: &dyn MemoryProbe) {
        let Some(snapshot) = probe.sample() else {
            tracing::debug!("memory probe returned no reading");
            return;
        };

        let percentage = snapshot.percentage();
        ctx.store.record(
            MetricCategory::Memory,
            "used",
            MetricSample::new(snapshot.used as f64, SampleDetail::Memory {
                snapshot,
                percentage,
            }),
        );

        let budget = ctx.budget.read().memory_usage_bytes;
        if snapshot.used > budget {
            ctx.alerts.add(AlertKind::MemoryBudgetExceeded, AlertData::BudgetOverrun {
                metric: "memory".to_owned(),
                actual: snapshot.used as f64,
                budget: budget as f64,
            });
        }
        // Pressure is judged against the host limit, independent of budget.
        if percentage > ctx.policy.memory_pressure_percent {
            ctx.alerts.add(AlertKind::HighMemoryUsage, AlertData::ThresholdOverrun {
                actual: percentage,
                threshold: ctx.policy.memory_pressure_percent,
            });
        }
    }

    pub(crate) fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.lock().take() {
            handle.abort();
            self.state.lock().active = false;
        }
        *self.probe.lock() = None;
    }

    pub(crate) fn state(&self) -> CollectorState {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertManager;
    use crate::core::{CollectorPolicy, MemorySnapshot, PerformanceBudget};
    use crate::storage::MetricStore;
    use parking_lot::RwLock;

    struct FixedProbe(Option<MemorySnapshot>);

    impl MemoryProbe for FixedProbe {
        fn sample(&self) -> Option<MemorySnapshot> {
            self.0
        }
    }

    fn harness(budget_bytes: u64, probe: FixedProbe) -> (MemoryCollector, CollectorContext) {
        let ctx = CollectorContext {
            store: Arc::new(MetricStore::new()),
            alerts: Arc::new(AlertManager::new()),
            budget: Arc::new(RwLock::new(PerformanceBudget {
                memory_usage_bytes: budget_bytes,
                ..PerformanceBudget::default()
            })),
            policy: CollectorPolicy::default(),
        };
        let collector = MemoryCollector::new(ctx.clone(), Duration::from_secs(5));
        let probe: Arc<dyn MemoryProbe> = Arc::new(probe);
        collector.start(Some(&probe), true, true);
        (collector, ctx)
    }

    #[tokio::test]
    async fn test_budget_alert_without_pressure_alert() {
        // used 60 of limit 100 with budget 50: over budget, under 80% pressure.
        let (collector, ctx) = harness(
            50,
            FixedProbe(Some(MemorySnapshot {
                used: 60,
                total: 80,
                limit: 100,
            })),
        );
        collector.poll_now();

        assert_eq!(ctx.alerts.get(Some(AlertKind::MemoryBudgetExceeded)).len(), 1);
        assert!(ctx.alerts.get(Some(AlertKind::HighMemoryUsage)).is_empty());

        let sample = ctx.store.latest(MetricCategory::Memory, "used").unwrap();
        assert_eq!(sample.value, 60.0);
        collector.stop();
    }

    #[tokio::test]
    async fn test_both_alerts_from_one_reading() {
        let (collector, ctx) = harness(
            50,
            FixedProbe(Some(MemorySnapshot {
                used: 90,
                total: 95,
                limit: 100,
            })),
        );
        collector.poll_now();

        assert_eq!(ctx.alerts.get(Some(AlertKind::MemoryBudgetExceeded)).len(), 1);
        assert_eq!(ctx.alerts.get(Some(AlertKind::HighMemoryUsage)).len(), 1);
        collector.stop();
    }

    #[tokio::test]
    async fn test_probe_without_reading_records_nothing() {
        let (collector, ctx) = harness(50, FixedProbe(None));
        collector.poll_now();

        assert_eq!(ctx.store.total_samples(), 0);
        assert!(ctx.alerts.is_empty());
        collector.stop();
    }

    #[tokio::test]
    async fn test_disabled_by_option() {
        let ctx = CollectorContext {
            store: Arc::new(MetricStore::new()),
            alerts: Arc::new(AlertManager::new()),
            budget: Arc::new(RwLock::new(PerformanceBudget::default())),
            policy: CollectorPolicy::default(),
        };
        let collector = MemoryCollector::new(ctx, Duration::from_secs(5));
        let probe: Arc<dyn MemoryProbe> = Arc::new(FixedProbe(None));
        collector.start(Some(&probe), true, false);

        let state = collector.state();
        assert!(!state.active);
        assert_eq!(state.reason, Some("memory monitoring disabled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_sampling() {
        let (collector, ctx) = harness(
            u64::MAX,
            FixedProbe(Some(MemorySnapshot {
                used: 10,
                total: 20,
                limit: 100,
            })),
        );

        // Let the spawned sampler register its interval before advancing.
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(11)).await;
        // Let the sampler task run its pending ticks.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }

        assert!(ctx.store.series_len(MetricCategory::Memory, "used") >= 2);
        collector.stop();
    }
}
