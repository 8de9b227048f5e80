//! Budget evaluation.
//!
//! A pure function over the current store snapshot: the representative value
//! is the latest recorded sample for the metric, classified against the
//! configured threshold. No internal state.

use crate::core::{BudgetCheck, BudgetStatus, MetricCategory};
use crate::storage::MetricStore;

/// Classify the latest `(category, name)` sample against `budget`.
///
/// `Unknown` when no sample exists yet, `Exceeded` iff the value is strictly
/// over budget, `Within` otherwise.
pub fn check_budget(
    store: &MetricStore,
    category: MetricCategory,
    name: &str,
    budget: f64,
) -> BudgetCheck {
    match store.latest(category, name) {
        None => BudgetCheck {
            status: BudgetStatus::Unknown,
            value: None,
            budget,
            percentage: None,
        },
        Some(sample) => {
            let status = if sample.value > budget {
                BudgetStatus::Exceeded
            } else {
                BudgetStatus::Within
            };
            let percentage = if budget > 0.0 {
                Some(sample.value / budget * 100.0)
            } else {
                None
            };
            BudgetCheck {
                status,
                value: Some(sample.value),
                budget,
                percentage,
            }
        },
    }
}
