//! Long-task instrumentation.
//!
//! There is no safe way to intercept every deferred callback in the host,
//! so call sites opt in: wrap the callback in [`TaskInstrument::run`] (or
//! time it yourself and call [`TaskInstrument::record_duration`]). Wrapped
//! callbacks that overrun the policy threshold are recorded as `long-task`
//! samples tagged with the primitive kind.

use crate::core::{CollectorPolicy, MetricCategory, MetricSample, SampleDetail, TaskKind};
use crate::storage::MetricStore;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

/// Explicit wall-clock wrapper for deferred-execution callbacks.
pub struct TaskInstrument {
    store: Arc<MetricStore>,
    policy: CollectorPolicy,
}

impl TaskInstrument {
    pub(crate) fn new(store: Arc<MetricStore>, policy: CollectorPolicy) -> Self {
        Self { store, policy }
    }

    /// Run a callback, measuring its wall-clock execution time.
    pub fn run<R>(&self, task: TaskKind, f: impl FnOnce() -> R) -> R {
        let start = Instant::now();
        let out = f();
        self.record_duration(task, start.elapsed().as_secs_f64() * 1000.0);
        out
    }

    /// Run a future, measuring wall-clock time from poll start to completion.
    ///
    /// Suspension time counts: a task that parks the main loop and a task
    /// that awaits for the same period look identical to the host.
    pub async fn run_async<F: Future>(&self, task: TaskKind, fut: F) -> F::Output {
        let start = Instant::now();
        let out = fut.await;
        self.record_duration(task, start.elapsed().as_secs_f64() * 1000.0);
        out
    }

    /// Record an externally measured callback duration.
    pub fn record_duration(&self, task: TaskKind, duration_ms: f64) {
        if duration_ms <= self.policy.long_task_ms {
            return;
        }
        tracing::debug!(task = task.as_str(), duration_ms, "long task detected");
        self.store.record(
            MetricCategory::Runtime,
            "long-task",
            MetricSample::new(duration_ms, SampleDetail::LongTask { task }),
        );
    }
}
