//! Vitals - Runtime performance observability and adaptive optimization.
//!
//! Vitals watches an application through explicit host hooks, keeps a
//! bounded in-memory window of what it saw, and turns violations of a
//! configurable performance budget into alerts, recommendations and
//! best-effort corrective actions.
//!
//! # Features
//!
//! - **Signal Collectors**: load timing, frame rate, long tasks, tree
//!   mutations, network requests and heap usage
//! - **Bounded Storage**: fixed-capacity FIFO series, no unbounded growth
//! - **Budget Evaluation**: per-metric budget checks with a replaceable budget
//! - **Adaptive Optimization**: prioritized recommendations mapped to
//!   host-provided corrective hooks
//! - **Progressive Loading**: visibility-triggered one-shot resource and
//!   component resolution
//!
//! # Architecture
//!
//! - `host`: the boundary the embedding runtime implements
//! - `capability`: one-time detection of which hooks exist
//! - `collectors`: event subscribers normalizing host signals into samples
//! - `storage`: bounded metric series
//! - `alerts`: capped alert log with an optional notification sink
//! - `engine`: the [`PerfEngine`] facade tying it together
//!
//! # Example
//!
//! ```no_run
//! use vitals::{EngineConfig, HostHooks, PerfEngine};
//!
//! # fn main() -> vitals::Result<()> {
//! let engine = PerfEngine::new(EngineConfig::default(), HostHooks::default())?;
//! engine.init();
//! let summary = engine.performance_summary();
//! println!("{} metrics recorded", summary.total_metrics);
//! engine.cleanup();
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod actuator;
pub mod alerts;
pub mod budget;
pub mod capability;
pub mod collectors;
pub mod core;
pub mod engine;
pub mod host;
pub mod lazy;
pub mod recommend;
pub mod storage;

// Re-export the types most embedders touch.
pub use crate::capability::{Capabilities, CapabilityProvider};
pub use crate::core::{
    Alert, AlertKind, CollectorKind, CollectorPolicy, EngineConfig, MetricCategory,
    PerformanceBudget, PerformanceSummary, Result, VitalsError,
};
pub use crate::engine::PerfEngine;
pub use crate::host::HostHooks;
