use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Point-in-time copy of the recorder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub processed: usize,
    pub dropped: usize,
    pub exported: usize,
    pub export_failures: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_processed(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.processed += 1;
        }
    }

    pub fn record_dropped(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.dropped += 1;
        }
    }

    pub fn record_export(&self, ok: bool) {
        if let Ok(mut metrics) = self.inner.lock() {
            if ok {
                metrics.exported += 1;
            } else {
                metrics.export_failures += 1;
            }
        }
    }

    pub fn snapshot(&self) -> Metrics {
        self.inner.lock().map(|metrics| *metrics).unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
