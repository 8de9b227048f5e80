//! Configuration for the observability engine.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Validation and defaults
//! - A replaceable performance budget

use crate::core::{Result, VitalsError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Run one best-effort optimization pass when a summary derives a
    /// high-priority recommendation.
    pub auto_optimization: bool,
    /// Start the periodic memory collector.
    pub memory_monitoring: bool,
    /// Accumulate script/stylesheet payload into the bundle series.
    pub bundle_analysis: bool,
    /// Start the progressive resource loader.
    pub lazy_loading: bool,
    /// Thresholds metrics are expected to stay under.
    pub budget: PerformanceBudget,
    /// Collector policy constants.
    pub policy: CollectorPolicy,
    /// How often the memory probe is sampled.
    #[serde(with = "humantime_serde")]
    pub memory_poll_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_optimization: false,
            memory_monitoring: true,
            bundle_analysis: false,
            lazy_loading: true,
            budget: PerformanceBudget::default(),
            policy: CollectorPolicy::default(),
            memory_poll_interval: Duration::from_secs(5),
        }
    }
}

/// Thresholds a monitored application is expected to stay under.
///
/// Fixed at construction; replaceable only through
/// [`PerfEngine::reconfigure_budget`](crate::engine::PerfEngine::reconfigure_budget).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceBudget {
    /// Maximum acceptable load-entry duration in milliseconds.
    pub load_time_ms: f64,
    /// Maximum acceptable heap usage in bytes.
    pub memory_usage_bytes: u64,
    /// Maximum acceptable accumulated bundle payload in bytes.
    pub bundle_size_bytes: u64,
    /// Maximum acceptable frame time in milliseconds.
    pub render_time_ms: f64,
}

impl Default for PerformanceBudget {
    fn default() -> Self {
        Self {
            load_time_ms: 3000.0,
            memory_usage_bytes: 50 * 1024 * 1024,
            bundle_size_bytes: 250 * 1024,
            render_time_ms: 16.0,
        }
    }
}

/// Collector threshold constants.
///
/// These were undocumented magic numbers in earlier designs; they are kept
/// as explicit, overridable policy here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorPolicy {
    /// Frame-rate floor below which `low-fps` fires.
    pub min_fps: f64,
    /// Wall-clock duration above which a wrapped callback is a long task.
    pub long_task_ms: f64,
    /// Mutation batch size above which `high-dom-mutations` fires.
    pub mutation_batch_limit: u64,
    /// Heap percentage above which `high-memory-usage` fires.
    pub memory_pressure_percent: f64,
    /// Long-task sample count above which the javascript recommendation fires.
    pub long_task_recommendation_count: usize,
}

impl Default for CollectorPolicy {
    fn default() -> Self {
        Self {
            min_fps: 30.0,
            long_task_ms: 50.0,
            mutation_batch_limit: 100,
            memory_pressure_percent: 80.0,
            long_task_recommendation_count: 5,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.budget.load_time_ms <= 0.0 {
            return Err(VitalsError::config("budget.load_time_ms must be positive"));
        }
        if self.budget.render_time_ms <= 0.0 {
            return Err(VitalsError::config("budget.render_time_ms must be positive"));
        }
        if self.budget.memory_usage_bytes == 0 {
            return Err(VitalsError::config("budget.memory_usage_bytes must be positive"));
        }
        if self.budget.bundle_size_bytes == 0 {
            return Err(VitalsError::config("budget.bundle_size_bytes must be positive"));
        }
        if self.policy.min_fps <= 0.0 {
            return Err(VitalsError::config("policy.min_fps must be positive"));
        }
        if self.policy.long_task_ms <= 0.0 {
            return Err(VitalsError::config("policy.long_task_ms must be positive"));
        }
        if self.policy.memory_pressure_percent <= 0.0 || self.policy.memory_pressure_percent > 100.0
        {
            return Err(VitalsError::config(
                "policy.memory_pressure_percent must be within (0, 100]",
            ));
        }
        if self.memory_poll_interval.is_zero() {
            return Err(VitalsError::config("memory_poll_interval must be non-zero"));
        }
        Ok(())
    }

    /// Builder-style budget override.
    pub fn with_budget(mut self, budget: PerformanceBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Builder-style policy override.
    pub fn with_policy(mut self, policy: CollectorPolicy) -> Self {
        self.policy = policy;
        self
    }
}
