//! Core domain types, configuration and error handling.

pub mod config;
pub mod error;
pub mod types;

pub use config::{CollectorPolicy, EngineConfig, PerformanceBudget};
pub use error::{Result, VitalsError};
pub use types::{
    Action, Alert, AlertData, AlertKind, BudgetCheck, BudgetReport, BudgetStatus, CollectorKind,
    CollectorState, MemorySnapshot, MetricCategory, MetricSample, PerformanceSummary, Priority,
    Recommendation, RecommendationKind, SampleDetail, TaskKind,
};
