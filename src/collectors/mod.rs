//! Signal collectors.
//!
//! Six independent units, each activated only if its required host
//! capability is present, each normalizing raw host events into metric
//! samples. Collectors share the store, the alert log and the replaceable
//! budget through a [`CollectorContext`]; none of them ever propagates an
//! error out of a handler.

pub mod frames;
pub mod load;
pub mod memory;
pub mod mutations;
pub mod network;
pub mod tasks;

pub use frames::FrameCollector;
pub use load::LoadCollector;
pub use memory::MemoryCollector;
pub use mutations::MutationCollector;
pub use network::{FetchOutcome, NetworkInstrument};
pub use tasks::TaskInstrument;

use crate::alerts::AlertManager;
use crate::core::{CollectorPolicy, PerformanceBudget};
use crate::host::{EventSource, SubscriptionToken};
use crate::storage::MetricStore;
use parking_lot::RwLock;
use std::sync::Arc;

/// Budget shared between the engine and its collectors; replaced in place by
/// `reconfigure_budget`.
pub type SharedBudget = Arc<RwLock<PerformanceBudget>>;

/// Shared dependencies handed to every collector.
#[derive(Clone)]
pub(crate) struct CollectorContext {
    pub store: Arc<MetricStore>,
    pub alerts: Arc<AlertManager>,
    pub budget: SharedBudget,
    pub policy: CollectorPolicy,
}

/// One live subscription, released exactly once.
pub(crate) struct Subscription<E> {
    source: Arc<dyn EventSource<E>>,
    token: SubscriptionToken,
}

impl<E> Subscription<E> {
    pub(crate) fn new(source: Arc<dyn EventSource<E>>, token: SubscriptionToken) -> Self {
        Self { source, token }
    }

    pub(crate) fn release(self) {
        self.source.unsubscribe(self.token);
    }
}
