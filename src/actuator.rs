//! Optimization actuator.
//!
//! Re-derives the current recommendations and executes the action mapped to
//! each one. Every action is best-effort and isolated: a failing hook is
//! logged and the remaining actions still run.

use crate::alerts::AlertManager;
use crate::core::{Action, CollectorPolicy, Result};
use crate::host::OptimizationHooks;
use crate::recommend;
use crate::storage::MetricStore;
use std::sync::Arc;

/// Series length the memory action trims the store down to.
const TRIMMED_SERIES_LEN: usize = 50;

/// Outcome of one executed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedAction {
    /// Action that ran.
    pub action: Action,
    /// Whether it completed without error.
    pub ok: bool,
}

/// Executes corrective actions derived from the current alert log.
pub struct Actuator {
    store: Arc<MetricStore>,
    alerts: Arc<AlertManager>,
    policy: CollectorPolicy,
    hooks: Option<Arc<dyn OptimizationHooks>>,
}

impl Actuator {
    pub(crate) fn new(
        store: Arc<MetricStore>,
        alerts: Arc<AlertManager>,
        policy: CollectorPolicy,
        hooks: Option<Arc<dyn OptimizationHooks>>,
    ) -> Self {
        Self {
            store,
            alerts,
            policy,
            hooks,
        }
    }

    /// Derive recommendations and execute each mapped action.
    pub fn apply(&self) -> Vec<AppliedAction> {
        let recommendations = recommend::derive(&self.alerts, &self.store, &self.policy);
        let mut applied = Vec::with_capacity(recommendations.len());

        for recommendation in recommendations {
            let action = recommendation.action;
            let result = self.execute(action);
            if let Err(error) = &result {
                tracing::error!(
                    action = action.as_str(),
                    %error,
                    "optimization action failed"
                );
            } else {
                tracing::info!(action = action.as_str(), "optimization action applied");
            }
            applied.push(AppliedAction {
                action,
                ok: result.is_ok(),
            });
        }

        applied
    }

    fn execute(&self, action: Action) -> Result<()> {
        match action {
            Action::OptimizeMemory => {
                // Trimming always happens; the host hint is on top.
                self.store.trim_all(TRIMMED_SERIES_LEN);
                self.hook(|h| h.hint_memory_pressure())
            },
            Action::OptimizeRendering => self.hook(|h| h.throttle_rendering()),
            Action::OptimizeJavascript => self.hook(|h| h.defer_background_tasks()),
            Action::OptimizeDom => self.hook(|h| h.batch_dom_updates()),
        }
    }

    fn hook(&self, f: impl FnOnce(&dyn OptimizationHooks) -> Result<()>) -> Result<()> {
        match &self.hooks {
            Some(hooks) => f(hooks.as_ref()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AlertData, AlertKind, MetricCategory, MetricSample, VitalsError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingHooks {
        memory: AtomicUsize,
        rendering: AtomicUsize,
        fail_rendering: bool,
        dom: AtomicUsize,
    }

    impl CountingHooks {
        fn new(fail_rendering: bool) -> Self {
            Self {
                memory: AtomicUsize::new(0),
                rendering: AtomicUsize::new(0),
                fail_rendering,
                dom: AtomicUsize::new(0),
            }
        }
    }

    impl OptimizationHooks for CountingHooks {
        fn hint_memory_pressure(&self) -> Result<()> {
            self.memory.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }

        fn throttle_rendering(&self) -> Result<()> {
            self.rendering.fetch_add(1, Ordering::Relaxed);
            if self.fail_rendering {
                return Err(VitalsError::optimization("optimize-rendering", "host rejected"));
            }
            Ok(())
        }

        fn batch_dom_updates(&self) -> Result<()> {
            self.dom.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    fn actuator(hooks: Option<Arc<dyn OptimizationHooks>>) -> (Actuator, Arc<MetricStore>, Arc<AlertManager>) {
        let store = Arc::new(MetricStore::new());
        let alerts = Arc::new(AlertManager::new());
        let actuator = Actuator::new(
            Arc::clone(&store),
            Arc::clone(&alerts),
            CollectorPolicy::default(),
            hooks,
        );
        (actuator, store, alerts)
    }

    fn raise_memory_pressure(alerts: &AlertManager) {
        alerts.add(AlertKind::HighMemoryUsage, AlertData::ThresholdOverrun {
            actual: 92.0,
            threshold: 80.0,
        });
    }

    #[test]
    fn test_no_recommendations_no_actions() {
        let (actuator, _store, _alerts) = actuator(None);
        assert!(actuator.apply().is_empty());
    }

    #[test]
    fn test_memory_action_trims_series() {
        let (actuator, store, alerts) = actuator(None);
        raise_memory_pressure(&alerts);
        for i in 0..100 {
            store.record(MetricCategory::Network, "fetch", MetricSample::plain(i as f64));
        }

        let applied = actuator.apply();
        assert_eq!(applied, vec![AppliedAction {
            action: Action::OptimizeMemory,
            ok: true,
        }]);
        assert_eq!(store.series_len(MetricCategory::Network, "fetch"), 50);
    }

    #[test]
    fn test_failing_action_does_not_stop_others() {
        let hooks = Arc::new(CountingHooks::new(true));
        let (actuator, _store, alerts) = actuator(Some(Arc::clone(&hooks) as _));

        raise_memory_pressure(&alerts);
        alerts.add(AlertKind::LowFps, AlertData::ThresholdOverrun {
            actual: 15.0,
            threshold: 30.0,
        });
        alerts.add(AlertKind::HighDomMutations, AlertData::MutationFlood {
            count: 200,
            threshold: 100,
        });

        let applied = actuator.apply();
        assert_eq!(applied.len(), 3);
        assert!(applied[0].ok); // memory
        assert!(!applied[1].ok); // rendering hook failed
        assert!(applied[2].ok); // dom still ran

        assert_eq!(hooks.memory.load(Ordering::Relaxed), 1);
        assert_eq!(hooks.rendering.load(Ordering::Relaxed), 1);
        assert_eq!(hooks.dom.load(Ordering::Relaxed), 1);
    }
}
