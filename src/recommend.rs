//! Recommendation derivation.
//!
//! A stateless pass over the current alert log and metric store. Rules are
//! evaluated in fixed table order; output order is rule order, not alert
//! recency. Several rules may fire from one pass.

use crate::alerts::AlertManager;
use crate::core::{
    Action, AlertKind, CollectorPolicy, MetricCategory, Priority, Recommendation,
    RecommendationKind,
};
use crate::storage::MetricStore;

/// Derive the current prioritized recommendations.
pub fn derive(
    alerts: &AlertManager,
    store: &MetricStore,
    policy: &CollectorPolicy,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if alerts.contains(AlertKind::HighMemoryUsage) {
        out.push(Recommendation {
            kind: RecommendationKind::Memory,
            priority: Priority::High,
            message: "Heap usage is near the host limit; release caches and trim retained data"
                .to_owned(),
            action: Action::OptimizeMemory,
        });
    }

    if alerts.contains(AlertKind::LowFps) {
        out.push(Recommendation {
            kind: RecommendationKind::Rendering,
            priority: Priority::High,
            message: "Frame rate dropped below the configured floor; reduce per-frame work"
                .to_owned(),
            action: Action::OptimizeRendering,
        });
    }

    let long_tasks = store.series_len(MetricCategory::Runtime, "long-task");
    if long_tasks > policy.long_task_recommendation_count {
        out.push(Recommendation {
            kind: RecommendationKind::Javascript,
            priority: Priority::Medium,
            message: format!(
                "{long_tasks} long tasks recorded; split or defer main-loop callbacks"
            ),
            action: Action::OptimizeJavascript,
        });
    }

    if alerts.contains(AlertKind::HighDomMutations) {
        out.push(Recommendation {
            kind: RecommendationKind::Dom,
            priority: Priority::Medium,
            message: "Large mutation batches observed; coalesce tree updates".to_owned(),
            action: Action::OptimizeDom,
        });
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{AlertData, MetricSample, SampleDetail, TaskKind};

    fn policy() -> CollectorPolicy {
        CollectorPolicy::default()
    }

    fn long_task_sample(ms: f64) -> MetricSample {
        MetricSample::new(ms, SampleDetail::LongTask {
            task: TaskKind::Timeout,
        })
    }

    #[test]
    fn test_no_signals_no_recommendations() {
        let alerts = AlertManager::new();
        let store = MetricStore::new();
        assert!(derive(&alerts, &store, &policy()).is_empty());
    }

    #[test]
    fn test_long_task_rule_threshold() {
        let alerts = AlertManager::new();
        let store = MetricStore::new();

        // Exactly the threshold does not fire; one more does.
        for _ in 0..5 {
            store.record(MetricCategory::Runtime, "long-task", long_task_sample(60.0));
        }
        assert!(derive(&alerts, &store, &policy()).is_empty());

        store.record(MetricCategory::Runtime, "long-task", long_task_sample(60.0));
        let recs = derive(&alerts, &store, &policy());
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].kind, RecommendationKind::Javascript);
        assert_eq!(recs[0].priority, Priority::Medium);
        assert_eq!(recs[0].action, Action::OptimizeJavascript);
    }

    #[test]
    fn test_rule_table_order() {
        let alerts = AlertManager::new();
        let store = MetricStore::new();

        // Raise dom first, then memory; output still follows table order.
        alerts.add(AlertKind::HighDomMutations, AlertData::MutationFlood {
            count: 150,
            threshold: 100,
        });
        alerts.add(AlertKind::HighMemoryUsage, AlertData::ThresholdOverrun {
            actual: 92.0,
            threshold: 80.0,
        });
        alerts.add(AlertKind::LowFps, AlertData::ThresholdOverrun {
            actual: 18.0,
            threshold: 30.0,
        });

        let recs = derive(&alerts, &store, &policy());
        let kinds: Vec<_> = recs.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![
            RecommendationKind::Memory,
            RecommendationKind::Rendering,
            RecommendationKind::Dom,
        ]);
        assert_eq!(recs[0].priority, Priority::High);
        assert_eq!(recs[2].priority, Priority::Medium);
    }

    #[test]
    fn test_budget_alerts_alone_do_not_recommend() {
        let alerts = AlertManager::new();
        let store = MetricStore::new();
        alerts.add(AlertKind::MemoryBudgetExceeded, AlertData::BudgetOverrun {
            metric: "memory".to_owned(),
            actual: 60.0,
            budget: 50.0,
        });

        // Only the pressure alert drives the memory recommendation.
        assert!(derive(&alerts, &store, &policy()).is_empty());
    }
}
