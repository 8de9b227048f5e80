//! Bounded append-only alert log.
//!
//! Budget and threshold violations are recorded here rather than raised as
//! errors. The log holds at most [`ALERT_LOG_CAPACITY`] alerts, evicting the
//! oldest first, and optionally forwards each new alert synchronously to a
//! host-provided sink.

use crate::core::types::now_millis;
use crate::core::{Alert, AlertData, AlertKind};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum alerts retained in the log.
pub const ALERT_LOG_CAPACITY: usize = 50;

/// Notification sink invoked synchronously with each new alert.
///
/// The sink must not panic; the engine calls it on the recording callback's
/// stack and does not guard beyond logging.
pub type AlertSink = Box<dyn Fn(&Alert) + Send + Sync>;

/// Bounded FIFO log of budget/threshold violations.
pub struct AlertManager {
    log: Mutex<VecDeque<Alert>>,
    seq: AtomicU64,
    sink: Option<AlertSink>,
    capacity: usize,
}

impl AlertManager {
    /// Create a log with no notification sink.
    pub fn new() -> Self {
        Self::with_capacity(ALERT_LOG_CAPACITY)
    }

    fn with_capacity(capacity: usize) -> Self {
        Self {
            log: Mutex::new(VecDeque::with_capacity(capacity)),
            seq: AtomicU64::new(0),
            sink: None,
            capacity,
        }
    }

    /// Attach a notification sink invoked with every subsequent alert.
    pub fn with_sink(mut self, sink: AlertSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Record a new alert and notify the sink.
    ///
    /// The id combines a monotonic sequence with a random token, so ids are
    /// opaque and never reused within the process.
    pub fn add(&self, kind: AlertKind, data: AlertData) -> Alert {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let alert = Alert {
            id: format!("{seq:04x}-{:016x}", rand::random::<u64>()),
            kind,
            data,
            timestamp_ms: now_millis(),
        };

        tracing::warn!(alert = kind.as_str(), id = %alert.id, "performance alert raised");

        {
            let mut log = self.log.lock();
            if log.len() == self.capacity {
                log.pop_front();
            }
            log.push_back(alert.clone());
        }

        if let Some(sink) = &self.sink {
            sink(&alert);
        }

        alert
    }

    /// Alerts of one kind, or all alerts, in insertion order.
    pub fn get(&self, kind: Option<AlertKind>) -> Vec<Alert> {
        let log = self.log.lock();
        match kind {
            Some(kind) => log.iter().filter(|a| a.kind == kind).cloned().collect(),
            None => log.iter().cloned().collect(),
        }
    }

    /// Whether any alert of `kind` is currently in the log.
    pub fn contains(&self, kind: AlertKind) -> bool {
        self.log.lock().iter().any(|a| a.kind == kind)
    }

    /// Number of alerts currently held.
    pub fn len(&self) -> usize {
        self.log.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.log.lock().is_empty()
    }

    /// Empty the log.
    pub fn clear(&self) {
        self.log.lock().clear();
    }
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AlertManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertManager")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
