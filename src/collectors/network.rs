//! Network instrumentation.
//!
//! Instead of replacing a global fetch symbol, the engine hands out a
//! [`NetworkInstrument`] that call sites route requests through. Successful
//! requests land in `network/fetch`, failures in `network/fetch-error`,
//! both carrying the wall-clock duration.

use crate::core::{CollectorState, MetricCategory, MetricSample, SampleDetail};
use crate::storage::MetricStore;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Outcome of a completed request, as the caller's transport reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Response status code.
    pub status: u16,
    /// Response size in bytes.
    pub bytes: u64,
}

/// Opt-in request wrapper feeding the `network` category.
pub struct NetworkInstrument {
    store: Arc<MetricStore>,
    active: AtomicBool,
}

impl NetworkInstrument {
    pub(crate) fn new(store: Arc<MetricStore>) -> Self {
        Self {
            store,
            active: AtomicBool::new(false),
        }
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Relaxed);
    }

    pub(crate) fn state(&self) -> CollectorState {
        if self.active.load(Ordering::Relaxed) {
            CollectorState::active()
        } else {
            CollectorState::unavailable("network hook unavailable")
        }
    }

    /// Time a request future and record its outcome.
    ///
    /// Returns the transport's result untouched; recording happens on the
    /// caller's stack after the future resolves.
    pub async fn measure<F, E>(&self, url: &str, request: F) -> Result<FetchOutcome, E>
    where
        F: Future<Output = Result<FetchOutcome, E>>,
        E: std::fmt::Display,
    {
        let start = Instant::now();
        let result = request.await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(outcome) => self.record_success(url, duration_ms, outcome.status, outcome.bytes),
            Err(error) => self.record_failure(url, duration_ms, &error.to_string()),
        }
        result
    }

    /// Record a completed request measured by the caller.
    pub fn record_success(&self, url: &str, duration_ms: f64, status: u16, bytes: u64) {
        if !self.active.load(Ordering::Relaxed) {
            return;
        }
        self.store.record(
            MetricCategory::Network,
            "fetch",
            MetricSample::new(duration_ms, SampleDetail::NetworkSuccess {
                url: url.to_owned(),
                status,
                bytes,
            }),
        );
    }

    /// Record a failed request measured by the caller.
    pub fn record_failure(&self, url: &str, duration_ms: f64, error: &str) {
        if !self.active.load(Ordering::Relaxed) {
            return;
        }
        tracing::debug!(url, duration_ms, error, "instrumented request failed");
        self.store.record(
            MetricCategory::Network,
            "fetch-error",
            MetricSample::new(duration_ms, SampleDetail::NetworkFailure {
                url: url.to_owned(),
                error: error.to_owned(),
            }),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instrument() -> (Arc<NetworkInstrument>, Arc<MetricStore>) {
        let store = Arc::new(MetricStore::new());
        let instrument = Arc::new(NetworkInstrument::new(Arc::clone(&store)));
        instrument.set_active(true);
        (instrument, store)
    }

    #[tokio::test]
    async fn test_measure_success() {
        let (instrument, store) = instrument();

        let result: Result<FetchOutcome, String> = instrument
            .measure("https://api.example/users", async {
                Ok(FetchOutcome {
                    status: 200,
                    bytes: 2048,
                })
            })
            .await;

        assert!(result.is_ok());
        let sample = store.latest(MetricCategory::Network, "fetch").unwrap();
        assert!(matches!(
            &sample.detail,
            SampleDetail::NetworkSuccess { url, status: 200, bytes: 2048 }
                if url == "https://api.example/users"
        ));
        assert_eq!(store.series_len(MetricCategory::Network, "fetch-error"), 0);
    }

    #[tokio::test]
    async fn test_measure_failure() {
        let (instrument, store) = instrument();

        let result: Result<FetchOutcome, String> = instrument
            .measure("https://api.example/users", async {
                Err("connection reset".to_owned())
            })
            .await;

        assert!(result.is_err());
        let sample = store.latest(MetricCategory::Network, "fetch-error").unwrap();
        assert!(matches!(
            &sample.detail,
            SampleDetail::NetworkFailure { error, .. } if error == "connection reset"
        ));
        assert_eq!(store.series_len(MetricCategory::Network, "fetch"), 0);
    }

    #[test]
    fn test_inactive_instrument_records_nothing() {
        let store = Arc::new(MetricStore::new());
        let instrument = NetworkInstrument::new(Arc::clone(&store));

        instrument.record_success("https://api.example", 12.0, 200, 100);
        instrument.record_failure("https://api.example", 12.0, "refused");

        assert_eq!(store.total_samples(), 0);
        assert!(!instrument.state().active);
    }
}
