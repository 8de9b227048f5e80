//! Host capability detection.
//!
//! Each collector needs one host feature; the flags here are computed once
//! and never re-probed. A collector whose flag is false marks itself
//! inactive at `init` — that is informational, not an error.

use crate::host::HostHooks;

/// Reports which host runtime observation features exist.
pub trait CapabilityProvider: Send + Sync {
    /// Timing/resource completion events are available.
    fn has_performance_timing(&self) -> bool;
    /// Frame callbacks are available.
    fn has_frame_callback(&self) -> bool;
    /// Batched mutation notifications are available.
    fn has_mutation_observer(&self) -> bool;
    /// Visibility observation is available.
    fn has_intersection_observer(&self) -> bool;
    /// Heap introspection is available.
    fn has_memory_introspection(&self) -> bool;
    /// Call sites route requests through the network instrument.
    fn has_network_hook(&self) -> bool;
}

/// Immutable snapshot of the six capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// Timing/resource completion events.
    pub performance_timing: bool,
    /// Frame callbacks.
    pub frame_callback: bool,
    /// Batched mutation notifications.
    pub mutation_observer: bool,
    /// Visibility observation.
    pub intersection_observer: bool,
    /// Heap introspection.
    pub memory_introspection: bool,
    /// Instrumented request routing.
    pub network_hook: bool,
}

impl Capabilities {
    /// Derive capabilities from which hooks the host actually supplied.
    pub fn detect(hooks: &HostHooks) -> Self {
        Self {
            performance_timing: hooks.timing.is_some(),
            frame_callback: hooks.frames.is_some(),
            mutation_observer: hooks.mutations.is_some(),
            intersection_observer: hooks.visibility.is_some(),
            memory_introspection: hooks.memory.is_some(),
            network_hook: hooks.network_instrumentation,
        }
    }

    /// Snapshot a custom provider into flags.
    pub fn from_provider(provider: &dyn CapabilityProvider) -> Self {
        Self {
            performance_timing: provider.has_performance_timing(),
            frame_callback: provider.has_frame_callback(),
            mutation_observer: provider.has_mutation_observer(),
            intersection_observer: provider.has_intersection_observer(),
            memory_introspection: provider.has_memory_introspection(),
            network_hook: provider.has_network_hook(),
        }
    }
}

impl CapabilityProvider for Capabilities {
    fn has_performance_timing(&self) -> bool {
        self.performance_timing
    }
    fn has_frame_callback(&self) -> bool {
        self.frame_callback
    }
    fn has_mutation_observer(&self) -> bool {
        self.mutation_observer
    }
    fn has_intersection_observer(&self) -> bool {
        self.intersection_observer
    }
    fn has_memory_introspection(&self) -> bool {
        self.memory_introspection
    }
    fn has_network_hook(&self) -> bool {
        self.network_hook
    }
}
