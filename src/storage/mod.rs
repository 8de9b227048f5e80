//! Bounded in-memory metric storage.
//!
//! Every `(category, name)` pair owns one FIFO series capped at
//! [`SERIES_CAPACITY`] samples; recording into a full series evicts the
//! oldest entry. All mutation happens inside collector callbacks, which the
//! host scheduler serializes, so the concurrent map is there for shared
//! read access rather than contended writes.

use crate::core::{MetricCategory, MetricSample};
use dashmap::DashMap;
use std::collections::{HashMap, VecDeque};

/// Maximum samples retained per series.
pub const SERIES_CAPACITY: usize = 100;

/// Key addressing one series in the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    /// Metric category.
    pub category: MetricCategory,
    /// Metric name within the category.
    pub name: String,
}

impl SeriesKey {
    fn new(category: MetricCategory, name: &str) -> Self {
        Self {
            category,
            name: name.to_owned(),
        }
    }
}

/// Ordered, bounded sequence of samples for one metric.
#[derive(Debug, Clone)]
pub struct MetricSeries {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl MetricSeries {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest when full.
    fn push(&mut self, sample: MetricSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Drop everything but the newest `keep` samples.
    fn trim_to(&mut self, keep: usize) {
        while self.samples.len() > keep {
            self.samples.pop_front();
        }
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recently recorded sample.
    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }

    /// Samples in insertion order.
    pub fn to_vec(&self) -> Vec<MetricSample> {
        self.samples.iter().cloned().collect()
    }
}

/// Snapshot of the store: category -> name -> samples in insertion order.
pub type MetricsSnapshot = HashMap<MetricCategory, HashMap<String, Vec<MetricSample>>>;

/// Category/name-keyed bounded time series, owned by one engine instance.
#[derive(Debug, Default)]
pub struct MetricStore {
    series: DashMap<SeriesKey, MetricSeries>,
}

impl MetricStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            series: DashMap::new(),
        }
    }

    /// Append a sample to `(category, name)`, trimming to capacity.
    pub fn record(&self, category: MetricCategory, name: &str, sample: MetricSample) {
        tracing::trace!(
            category = category.as_str(),
            name,
            value = sample.value,
            "recording metric"
        );
        self.series
            .entry(SeriesKey::new(category, name))
            .or_insert_with(|| MetricSeries::with_capacity(SERIES_CAPACITY))
            .push(sample);
    }

    /// Latest sample for `(category, name)`, if any.
    pub fn latest(&self, category: MetricCategory, name: &str) -> Option<MetricSample> {
        self.series
            .get(&SeriesKey::new(category, name))
            .and_then(|s| s.latest().cloned())
    }

    /// Number of samples currently held for `(category, name)`.
    pub fn series_len(&self, category: MetricCategory, name: &str) -> usize {
        self.series
            .get(&SeriesKey::new(category, name))
            .map_or(0, |s| s.len())
    }

    /// Samples for `(category, name)` in insertion order.
    pub fn samples(&self, category: MetricCategory, name: &str) -> Vec<MetricSample> {
        self.series
            .get(&SeriesKey::new(category, name))
            .map_or_else(Vec::new, |s| s.to_vec())
    }

    /// Snapshot of everything, or of one category.
    pub fn snapshot(&self, category: Option<MetricCategory>) -> MetricsSnapshot {
        let mut out: MetricsSnapshot = HashMap::new();
        for entry in self.series.iter() {
            let key = entry.key();
            if let Some(wanted) = category {
                if key.category != wanted {
                    continue;
                }
            }
            if entry.value().is_empty() {
                continue;
            }
            out.entry(key.category)
                .or_default()
                .insert(key.name.clone(), entry.value().to_vec());
        }
        out
    }

    /// Categories with at least one sample, in declaration order.
    pub fn categories(&self) -> Vec<MetricCategory> {
        MetricCategory::ALL
            .into_iter()
            .filter(|c| {
                self.series
                    .iter()
                    .any(|e| e.key().category == *c && !e.value().is_empty())
            })
            .collect()
    }

    /// Total samples held across all series.
    pub fn total_samples(&self) -> usize {
        self.series.iter().map(|e| e.value().len()).sum()
    }

    /// Trim every series to its newest `keep` samples.
    pub fn trim_all(&self, keep: usize) {
        for mut entry in self.series.iter_mut() {
            entry.value_mut().trim_to(keep);
        }
    }

    /// Drop every series.
    pub fn clear(&self) {
        self.series.clear();
    }
}
