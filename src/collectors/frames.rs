//! Frame-rate collector.
//!
//! Maintains a rolling one-second window over successive frame callbacks.
//! When the window closes it records the measured fps and mean frame time,
//! raises `low-fps` under the configured floor, and resets.

use super::{CollectorContext, Subscription};
use crate::core::{AlertData, AlertKind, CollectorState, MetricCategory, MetricSample, SampleDetail};
use crate::host::{EventSource, FrameTick};
use parking_lot::Mutex;
use std::sync::Arc;

const WINDOW_MS: u64 = 1000;

#[derive(Default)]
struct FrameWindow {
    start_ms: u64,
    frames: u32,
}

/// Rolling-window fps measurement over host frame callbacks.
pub struct FrameCollector {
    ctx: CollectorContext,
    subscription: Mutex<Option<Subscription<FrameTick>>>,
    state: Mutex<CollectorState>,
}

impl FrameCollector {
    pub(crate) fn new(ctx: CollectorContext) -> Self {
        Self {
            ctx,
            subscription: Mutex::new(None),
            state: Mutex::new(CollectorState::unavailable("not initialized")),
        }
    }

    pub(crate) fn start(&self, source: Option<&Arc<dyn EventSource<FrameTick>>>, capability: bool) {
        let Some(source) = source.filter(|_| capability) else {
            *self.state.lock() = CollectorState::unavailable("frame callback unavailable");
            tracing::debug!("frame-rate collector inactive: no frame source");
            return;
        };

        let ctx = self.ctx.clone();
        let window = Arc::new(Mutex::new(FrameWindow::default()));

        let token = source.subscribe(Arc::new(move |tick: &FrameTick| {
            Self::on_tick(&ctx, &window, tick);
        }));

        *self.subscription.lock() = Some(Subscription::new(Arc::clone(source), token));
        *self.state.lock() = CollectorState::active();
    }

    fn on_tick(ctx: &CollectorContext, window: &Mutex<FrameWindow>, tick: &FrameTick) {
        let mut window = window.lock();

        if window.start_ms == 0 {
            // First tick anchors the window; frames are counted from here.
            window.start_ms = tick.timestamp_ms;
            return;
        }

        window.frames += 1;
        let elapsed_ms = tick.timestamp_ms.saturating_sub(window.start_ms);
        if elapsed_ms < WINDOW_MS || window.frames == 0 {
            return;
        }

        let fps = f64::from(window.frames) * 1000.0 / elapsed_ms as f64;
        ctx.store.record(
            MetricCategory::Rendering,
            "fps",
            MetricSample::new(fps, SampleDetail::FrameWindow {
                frames: window.frames,
                elapsed_ms,
            }),
        );
        ctx.store.record(
            MetricCategory::Rendering,
            "frame-time",
            MetricSample::new(elapsed_ms as f64 / f64::from(window.frames), SampleDetail::None),
        );

        if fps < ctx.policy.min_fps {
            ctx.alerts.add(AlertKind::LowFps, AlertData::ThresholdOverrun {
                actual: fps,
                threshold: ctx.policy.min_fps,
            });
        }

        window.start_ms = tick.timestamp_ms;
        window.frames = 0;
    }

    pub(crate) fn stop(&self) {
        if let Some(subscription) = self.subscription.lock().take() {
            subscription.release();
            self.state.lock().active = false;
        }
    }

    pub(crate) fn state(&self) -> CollectorState {
        *self.state.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::AlertManager;
    use crate::core::{CollectorPolicy, PerformanceBudget};
    use crate::host::ManualEventSource;
    use crate::storage::MetricStore;
    use parking_lot::RwLock;

    fn harness() -> (FrameCollector, Arc<ManualEventSource<FrameTick>>, CollectorContext) {
        let ctx = CollectorContext {
            store: Arc::new(MetricStore::new()),
            alerts: Arc::new(AlertManager::new()),
            budget: Arc::new(RwLock::new(PerformanceBudget::default())),
            policy: CollectorPolicy::default(),
        };
        let collector = FrameCollector::new(ctx.clone());
        let source: Arc<ManualEventSource<FrameTick>> = Arc::new(ManualEventSource::new());
        let dyn_source: Arc<dyn EventSource<FrameTick>> = Arc::clone(&source) as _;
        collector.start(Some(&dyn_source), true);
        (collector, source, ctx)
    }

    fn drive(source: &ManualEventSource<FrameTick>, start: u64, step: u64, ticks: u64) {
        for i in 0..=ticks {
            source.emit(&FrameTick {
                timestamp_ms: start + i * step,
            });
        }
    }

    #[test]
    fn test_fps_measured_over_window() {
        let (_collector, source, ctx) = harness();

        // 60 frames across exactly one second.
        drive(&source, 0, 1000 / 60 + 1, 60);

        let fps = ctx.store.latest(MetricCategory::Rendering, "fps").unwrap();
        assert!(fps.value > 55.0 && fps.value <= 61.0, "fps was {}", fps.value);
        assert!(ctx.alerts.get(Some(AlertKind::LowFps)).is_empty());
    }

    #[test]
    fn test_low_fps_alert() {
        let (_collector, source, ctx) = harness();

        // 20 frames across one second.
        drive(&source, 0, 50, 20);

        let fps = ctx.store.latest(MetricCategory::Rendering, "fps").unwrap();
        assert!((fps.value - 20.0).abs() < 0.5);

        let raised = ctx.alerts.get(Some(AlertKind::LowFps));
        assert_eq!(raised.len(), 1);
        assert!(matches!(
            raised[0].data,
            AlertData::ThresholdOverrun { threshold, .. } if threshold == 30.0
        ));

        let frame_time = ctx
            .store
            .latest(MetricCategory::Rendering, "frame-time")
            .unwrap();
        assert!((frame_time.value - 50.0).abs() < 1.0);
    }

    #[test]
    fn test_window_resets_each_second() {
        let (_collector, source, ctx) = harness();

        // Two back-to-back one-second windows.
        drive(&source, 0, 50, 20);
        drive(&source, 1050, 50, 20);

        assert_eq!(ctx.store.series_len(MetricCategory::Rendering, "fps"), 2);
        assert_eq!(ctx.alerts.get(Some(AlertKind::LowFps)).len(), 2);
    }

    #[test]
    fn test_no_sample_before_window_closes() {
        let (_collector, source, ctx) = harness();

        drive(&source, 0, 50, 10); // only half a second
        assert_eq!(ctx.store.series_len(MetricCategory::Rendering, "fps"), 0);
    }
}
