//! Core domain types for the observability engine.
//!
//! Samples, alerts and recommendations are plain data: collectors produce
//! them, the store and alert log hold them, and the summary serializes them.

use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Metric categories tracked by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricCategory {
    /// Page/resource load timing.
    Load,
    /// Main-loop runtime signals (long tasks, mutation churn).
    Runtime,
    /// Request timing and failures.
    Network,
    /// Frame rate and frame time.
    Rendering,
    /// Heap usage.
    Memory,
    /// Accumulated script/stylesheet payload.
    Bundle,
    /// Deferred resource/component resolution timing.
    LazyLoading,
}

impl MetricCategory {
    /// All categories, in declaration order.
    pub const ALL: [MetricCategory; 7] = [
        MetricCategory::Load,
        MetricCategory::Runtime,
        MetricCategory::Network,
        MetricCategory::Rendering,
        MetricCategory::Memory,
        MetricCategory::Bundle,
        MetricCategory::LazyLoading,
    ];

    /// Kebab-case name used in snapshots and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Load => "load",
            MetricCategory::Runtime => "runtime",
            MetricCategory::Network => "network",
            MetricCategory::Rendering => "rendering",
            MetricCategory::Memory => "memory",
            MetricCategory::Bundle => "bundle",
            MetricCategory::LazyLoading => "lazy-loading",
        }
    }
}

impl std::fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time heap reading from the host's memory probe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySnapshot {
    /// Bytes currently in use.
    pub used: u64,
    /// Bytes currently allocated.
    pub total: u64,
    /// Maximum bytes the host will allow.
    pub limit: u64,
}

impl MemorySnapshot {
    /// Used heap as a percentage of the limit. Zero when the limit is unknown.
    pub fn percentage(&self) -> f64 {
        if self.limit == 0 {
            0.0
        } else {
            self.used as f64 / self.limit as f64 * 100.0
        }
    }
}

/// Kind of deferred-execution primitive a long task ran under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// One-shot deferred callback.
    Timeout,
    /// Repeating deferred callback.
    Interval,
    /// Idle-time or other deferred work.
    Deferred,
}

impl TaskKind {
    /// Tag recorded on long-task samples.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Timeout => "timeout",
            TaskKind::Interval => "interval",
            TaskKind::Deferred => "deferred",
        }
    }
}

/// Category-specific payload attached to a sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum SampleDetail {
    /// No extra fields beyond value/timestamp.
    None,
    /// Timing entry observed by the load collector.
    LoadEntry {
        /// Entry name reported by the host timing source.
        entry: String,
    },
    /// One closed frame-rate window.
    FrameWindow {
        /// Frames counted in the window.
        frames: u32,
        /// Window length in milliseconds.
        elapsed_ms: u64,
    },
    /// A wrapped callback that overran the long-task threshold.
    LongTask {
        /// Primitive the callback ran under.
        task: TaskKind,
    },
    /// A mutation batch that overran the batch limit.
    MutationBatch {
        /// Mutations in the batch.
        count: u64,
    },
    /// A completed instrumented request.
    NetworkSuccess {
        /// Request URL.
        url: String,
        /// Response status code.
        status: u16,
        /// Response size in bytes.
        bytes: u64,
    },
    /// A failed instrumented request.
    NetworkFailure {
        /// Request URL.
        url: String,
        /// Failure description.
        error: String,
    },
    /// One memory probe reading.
    Memory {
        /// The probe snapshot.
        snapshot: MemorySnapshot,
        /// `used / limit` as a percentage.
        percentage: f64,
    },
    /// Outcome of one lazy-load resolution.
    LazyLoad {
        /// Registered target id.
        target: String,
        /// Whether resolution succeeded.
        success: bool,
        /// Failure description when it did not.
        error: Option<String>,
    },
    /// Running bundle payload total.
    Bundle {
        /// Resources accumulated so far.
        resources: u32,
    },
}

/// One recorded metric observation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSample {
    /// Primary numeric value (duration ms, fps, bytes, ...).
    pub value: f64,
    /// Milliseconds since the Unix epoch at record time.
    pub timestamp_ms: u64,
    /// Category-specific fields.
    pub detail: SampleDetail,
}

impl MetricSample {
    /// Sample with the current wall-clock timestamp.
    pub fn new(value: f64, detail: SampleDetail) -> Self {
        Self {
            value,
            timestamp_ms: now_millis(),
            detail,
        }
    }

    /// Bare sample with no category-specific fields.
    pub fn plain(value: f64) -> Self {
        Self::new(value, SampleDetail::None)
    }
}

/// Kinds of budget/threshold violations the engine raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertKind {
    /// A load entry overran `budget.load_time_ms`.
    LoadTimeExceeded,
    /// A frame window fell under the minimum fps.
    LowFps,
    /// A mutation batch overran the batch limit.
    HighDomMutations,
    /// Heap usage overran `budget.memory_usage_bytes`.
    MemoryBudgetExceeded,
    /// Heap usage overran the pressure percentage.
    HighMemoryUsage,
    /// Accumulated bundle payload crossed `budget.bundle_size_bytes`.
    BundleSizeExceeded,
}

impl AlertKind {
    /// Kebab-case alert type name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::LoadTimeExceeded => "load-time-exceeded",
            AlertKind::LowFps => "low-fps",
            AlertKind::HighDomMutations => "high-dom-mutations",
            AlertKind::MemoryBudgetExceeded => "memory-budget-exceeded",
            AlertKind::HighMemoryUsage => "high-memory-usage",
            AlertKind::BundleSizeExceeded => "bundle-size-exceeded",
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured payload carried by an alert.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AlertData {
    /// A metric overran its configured budget.
    BudgetOverrun {
        /// Which metric overran.
        metric: String,
        /// Observed value.
        actual: f64,
        /// Configured budget.
        budget: f64,
    },
    /// A value crossed a fixed policy threshold.
    ThresholdOverrun {
        /// Observed value.
        actual: f64,
        /// Policy threshold.
        threshold: f64,
    },
    /// A mutation batch exceeded the batch limit.
    MutationFlood {
        /// Mutations in the batch.
        count: u64,
        /// Policy batch limit.
        threshold: u64,
    },
}

/// A recorded budget/threshold violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    /// Opaque token, unique for the log's lifetime.
    pub id: String,
    /// Violation kind.
    pub kind: AlertKind,
    /// Structured violation payload.
    pub data: AlertData,
    /// Milliseconds since the Unix epoch at creation.
    pub timestamp_ms: u64,
}

/// Recommendation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Informational.
    Low,
    /// Worth addressing soon.
    Medium,
    /// Actively degrading the application.
    High,
}

/// Corrective action a recommendation maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Trim stored series and hint memory pressure to the host.
    OptimizeMemory,
    /// Throttle non-essential rendering work.
    OptimizeRendering,
    /// Defer background tasks off the main loop.
    OptimizeJavascript,
    /// Coalesce pending tree updates.
    OptimizeDom,
}

impl Action {
    /// Kebab-case action tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::OptimizeMemory => "optimize-memory",
            Action::OptimizeRendering => "optimize-rendering",
            Action::OptimizeJavascript => "optimize-javascript",
            Action::OptimizeDom => "optimize-dom",
        }
    }
}

/// Subsystem a recommendation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    /// Heap pressure.
    Memory,
    /// Frame rate.
    Rendering,
    /// Main-loop blocking work.
    Javascript,
    /// Tree mutation churn.
    Dom,
}

/// A derived, prioritized corrective suggestion. Recomputed on each query,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// Subsystem the suggestion targets.
    pub kind: RecommendationKind,
    /// How urgent the suggestion is.
    pub priority: Priority,
    /// Human-readable explanation.
    pub message: String,
    /// Action tag the actuator executes.
    pub action: Action,
}

/// Tri-state outcome of a budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetStatus {
    /// Latest value is at or under budget.
    Within,
    /// Latest value is over budget.
    Exceeded,
    /// No sample recorded yet.
    Unknown,
}

/// Result of evaluating one metric against its budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetCheck {
    /// Classification of the latest value.
    pub status: BudgetStatus,
    /// Latest recorded value, if any.
    pub value: Option<f64>,
    /// Configured budget.
    pub budget: f64,
    /// `value / budget` as a percentage, if a value exists.
    pub percentage: Option<f64>,
}

/// Budget evaluation for every configured budget field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetReport {
    /// `load/page-load` against `load_time_ms`.
    pub load_time: BudgetCheck,
    /// `memory/used` against `memory_usage_bytes`.
    pub memory_usage: BudgetCheck,
    /// `bundle/total-size` against `bundle_size_bytes`.
    pub bundle_size: BudgetCheck,
    /// `rendering/frame-time` against `render_time_ms`.
    pub render_time: BudgetCheck,
}

/// Aggregate view returned by `PerfEngine::performance_summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSummary {
    /// Samples currently held across all series.
    pub total_metrics: usize,
    /// Alerts currently held in the log.
    pub total_alerts: usize,
    /// Categories with at least one sample.
    pub categories: Vec<MetricCategory>,
    /// Per-budget-field evaluation.
    pub budget_status: BudgetReport,
    /// Current derived recommendations.
    pub recommendations: Vec<Recommendation>,
}

/// Activation state of one collector, set once at `init`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectorState {
    /// Whether the collector started.
    pub active: bool,
    /// Why it did not, when inactive.
    pub reason: Option<&'static str>,
}

impl CollectorState {
    /// An active collector.
    pub fn active() -> Self {
        Self {
            active: true,
            reason: None,
        }
    }

    /// A collector that never started because its capability is absent.
    pub fn unavailable(reason: &'static str) -> Self {
        Self {
            active: false,
            reason: Some(reason),
        }
    }
}

/// The six collectors plus the lazy loader, for state introspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollectorKind {
    /// Load timing collector.
    Load,
    /// Frame-rate collector.
    FrameRate,
    /// Long-task instrument.
    LongTask,
    /// Tree-mutation collector.
    Mutation,
    /// Network instrument.
    Network,
    /// Memory collector.
    Memory,
    /// Progressive resource loader.
    LazyLoader,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names() {
        assert_eq!(MetricCategory::LazyLoading.as_str(), "lazy-loading");
        assert_eq!(MetricCategory::ALL.len(), 7);
    }

    #[test]
    fn test_memory_percentage() {
        let snap = MemorySnapshot {
            used: 60,
            total: 80,
            limit: 100,
        };
        assert!((snap.percentage() - 60.0).abs() < f64::EPSILON);

        let unbounded = MemorySnapshot {
            used: 60,
            total: 80,
            limit: 0,
        };
        assert_eq!(unbounded.percentage(), 0.0);
    }

    #[test]
    fn test_alert_kind_names() {
        assert_eq!(AlertKind::LoadTimeExceeded.as_str(), "load-time-exceeded");
        assert_eq!(AlertKind::HighDomMutations.as_str(), "high-dom-mutations");
    }

    #[test]
    fn test_alert_data_serializes_flat() {
        let data = AlertData::ThresholdOverrun {
            actual: 24.0,
            threshold: 30.0,
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["actual"], 24.0);
        assert_eq!(json["threshold"], 30.0);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
    }
}
