//! Host boundary: explicit hooks the embedding runtime hands to the engine.
//!
//! Nothing here patches a global symbol. The host constructs whatever event
//! sources and probes its runtime supports, bundles them into [`HostHooks`],
//! and the engine subscribes at `init` and unsubscribes exactly once at
//! `cleanup`. A runtime without some hook simply leaves it out, which
//! deactivates the matching collector.

use crate::core::{MemorySnapshot, Result};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handler invoked for each event published by a source.
///
/// Handlers run on the publisher's call stack; the host scheduler is expected
/// to serialize event delivery, so handlers never observe overlapping calls.
pub type EventHandler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Token identifying one subscription, released via
/// [`EventSource::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(u64);

/// Push-based event feed the engine can subscribe to.
pub trait EventSource<E>: Send + Sync {
    /// Register a handler; every subsequent event is delivered to it.
    fn subscribe(&self, handler: EventHandler<E>) -> SubscriptionToken;

    /// Remove a previously registered handler. Unknown tokens are ignored.
    fn unsubscribe(&self, token: SubscriptionToken);
}

/// In-process [`EventSource`] driven by explicit [`emit`](Self::emit) calls.
///
/// Backs tests and embedders whose runtime has no native observer type.
pub struct ManualEventSource<E> {
    next_token: AtomicU64,
    handlers: RwLock<Vec<(SubscriptionToken, EventHandler<E>)>>,
}

impl<E> ManualEventSource<E> {
    /// Create an empty source.
    pub fn new() -> Self {
        Self {
            next_token: AtomicU64::new(1),
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Deliver an event to every current subscriber, in subscription order.
    pub fn emit(&self, event: &E) {
        let handlers = self.handlers.read().clone();
        for (_, handler) in &handlers {
            handler(event);
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.handlers.read().len()
    }
}

impl<E> Default for ManualEventSource<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Send + Sync> EventSource<E> for ManualEventSource<E> {
    fn subscribe(&self, handler: EventHandler<E>) -> SubscriptionToken {
        let token = SubscriptionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        self.handlers.write().push((token, handler));
        token
    }

    fn unsubscribe(&self, token: SubscriptionToken) {
        self.handlers.write().retain(|(t, _)| *t != token);
    }
}

/// Resource class reported by the host timing source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    /// Top-level navigation / page load.
    Navigation,
    /// Script payload.
    Script,
    /// Stylesheet payload.
    Stylesheet,
    /// Image payload.
    Image,
    /// Programmatic request.
    Fetch,
    /// Anything else.
    Other,
}

impl ResourceKind {
    /// Whether this resource counts toward the bundle payload total.
    pub fn counts_toward_bundle(&self) -> bool {
        matches!(self, ResourceKind::Script | ResourceKind::Stylesheet)
    }
}

/// One completed timing entry from the host.
#[derive(Debug, Clone, PartialEq)]
pub struct TimingEntry {
    /// Entry name (resource URL or `"page-load"` for navigation).
    pub name: String,
    /// Resource class.
    pub kind: ResourceKind,
    /// Completion duration in milliseconds.
    pub duration_ms: f64,
    /// Transferred bytes, zero when unknown.
    pub transfer_size: u64,
}

/// One frame callback tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTick {
    /// Host-provided frame timestamp in milliseconds.
    pub timestamp_ms: u64,
}

/// One batched mutation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationBatch {
    /// Mutations observed in the batch.
    pub count: u64,
}

/// A visibility transition for a registered lazy target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityEvent {
    /// Target id the transition applies to.
    pub target: String,
    /// Whether the target became visible.
    pub visible: bool,
}

/// Heap introspection hook.
pub trait MemoryProbe: Send + Sync {
    /// Read the current heap state, `None` when the host cannot say.
    fn sample(&self) -> Option<MemorySnapshot>;
}

/// Best-effort corrective hooks the actuator calls into.
///
/// Default implementations are no-ops so hosts implement only what they
/// support. A returned error is logged and isolated; it never stops the
/// remaining actions.
pub trait OptimizationHooks: Send + Sync {
    /// Hint that caches should be dropped and allocations trimmed.
    fn hint_memory_pressure(&self) -> Result<()> {
        Ok(())
    }

    /// Throttle non-essential rendering work.
    fn throttle_rendering(&self) -> Result<()> {
        Ok(())
    }

    /// Defer background/low-priority tasks off the main loop.
    fn defer_background_tasks(&self) -> Result<()> {
        Ok(())
    }

    /// Coalesce pending tree updates into batches.
    fn batch_dom_updates(&self) -> Result<()> {
        Ok(())
    }
}

/// Everything the host exposes to one engine instance.
///
/// One engine owns its hooks exclusively; two engines sharing a source would
/// double-record every event.
#[derive(Clone, Default)]
pub struct HostHooks {
    /// Timing/resource completion events.
    pub timing: Option<Arc<dyn EventSource<TimingEntry>>>,
    /// Frame callback ticks.
    pub frames: Option<Arc<dyn EventSource<FrameTick>>>,
    /// Batched mutation notifications.
    pub mutations: Option<Arc<dyn EventSource<MutationBatch>>>,
    /// Visibility transitions for lazy targets.
    pub visibility: Option<Arc<dyn EventSource<VisibilityEvent>>>,
    /// Heap introspection.
    pub memory: Option<Arc<dyn MemoryProbe>>,
    /// Whether call sites route requests through the network instrument.
    pub network_instrumentation: bool,
    /// Corrective hooks for the actuator.
    pub optimization: Option<Arc<dyn OptimizationHooks>>,
}

impl std::fmt::Debug for HostHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostHooks")
            .field("timing", &self.timing.is_some())
            .field("frames", &self.frames.is_some())
            .field("mutations", &self.mutations.is_some())
            .field("visibility", &self.visibility.is_some())
            .field("memory", &self.memory.is_some())
            .field("network_instrumentation", &self.network_instrumentation)
            .field("optimization", &self.optimization.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_manual_source_delivers_in_order() {
        let source = ManualEventSource::<MutationBatch>::new();
        let seen = Arc::new(RwLock::new(Vec::new()));

        let seen_clone = Arc::clone(&seen);
        source.subscribe(Arc::new(move |batch: &MutationBatch| {
            seen_clone.write().push(batch.count);
        }));

        source.emit(&MutationBatch { count: 1 });
        source.emit(&MutationBatch { count: 2 });

        assert_eq!(*seen.read(), vec![1, 2]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let source = ManualEventSource::<FrameTick>::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = Arc::clone(&hits);
        let token = source.subscribe(Arc::new(move |_: &FrameTick| {
            hits_clone.fetch_add(1, Ordering::Relaxed);
        }));

        source.emit(&FrameTick { timestamp_ms: 1 });
        source.unsubscribe(token);
        source.emit(&FrameTick { timestamp_ms: 2 });

        assert_eq!(hits.load(Ordering::Relaxed), 1);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn test_unknown_token_ignored() {
        let source = ManualEventSource::<FrameTick>::new();
        let token = source.subscribe(Arc::new(|_: &FrameTick| {}));
        source.unsubscribe(token);
        // Releasing again is a no-op.
        source.unsubscribe(token);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn test_bundle_resource_kinds() {
        assert!(ResourceKind::Script.counts_toward_bundle());
        assert!(ResourceKind::Stylesheet.counts_toward_bundle());
        assert!(!ResourceKind::Image.counts_toward_bundle());
        assert!(!ResourceKind::Navigation.counts_toward_bundle());
    }
}
