use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::time::{Instant, MissedTickBehavior};

use crate::foundation::core::ImageDimensions;
use crate::metrics::memory::MemoryProbe;

const MIB: f64 = 1024.0 * 1024.0;

/// Memory readings over one run, in MiB.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUsage {
    /// Reading taken when tracking started.
    #[serde(rename = "initialMB")]
    pub initial_mb: f64,
    /// Highest reading seen while the run was in flight.
    #[serde(rename = "peakMB")]
    pub peak_mb: f64,
    /// Reading taken when tracking finished.
    #[serde(rename = "finalMB")]
    pub final_mb: f64,
}

/// Input and processed raster sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ImageSizes {
    /// Dimensions of the decoded input.
    pub original: ImageDimensions,
    /// Dimensions actually segmented (after optimization).
    pub processed: ImageDimensions,
}

/// Frozen diagnostics for one pipeline run.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingMetrics {
    /// Wall-clock start, milliseconds since the Unix epoch.
    pub start_time: u64,
    /// Wall-clock end, milliseconds since the Unix epoch.
    pub end_time: u64,
    /// Elapsed monotonic time in milliseconds.
    pub duration_ms: u64,
    /// Omitted when no memory probe is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<MemoryUsage>,
    /// Raster sizes.
    pub image_size: ImageSizes,
}

/// Stopwatch plus background peak-memory sampler.
///
/// Sampling runs as a detached task on the current tokio runtime (when there
/// is one) and never blocks the tracked work. The sampler stops when the
/// tracker is finished or dropped.
pub struct PerformanceTracker {
    started: Instant,
    start_time: u64,
    original: ImageDimensions,
    processed: ImageDimensions,
    probe: Arc<dyn MemoryProbe>,
    initial: Option<u64>,
    peak: Arc<AtomicU64>,
    sampler: Option<tokio::task::JoinHandle<()>>,
}

impl PerformanceTracker {
    /// Start timing and, when the probe reports anything, sampling every `interval`.
    pub fn start(
        original: ImageDimensions,
        probe: Arc<dyn MemoryProbe>,
        interval: Duration,
    ) -> Self {
        let initial = probe.current_bytes();
        let peak = Arc::new(AtomicU64::new(initial.unwrap_or(0)));

        let sampler = match (initial, tokio::runtime::Handle::try_current()) {
            (Some(_), Ok(handle)) => Some(handle.spawn(sample_peak(
                Arc::clone(&probe),
                Arc::clone(&peak),
                interval.max(Duration::from_millis(1)),
            ))),
            _ => None,
        };
        tracing::debug!(
            probe = probe.name(),
            sampling = sampler.is_some(),
            "performance tracking started"
        );

        Self {
            started: Instant::now(),
            start_time: unix_millis(),
            original,
            processed: original,
            probe,
            initial,
            peak,
            sampler,
        }
    }

    /// Record the dimensions that were actually processed.
    pub fn update_processed_dimensions(&mut self, dims: ImageDimensions) {
        self.processed = dims;
    }

    /// Take one reading now, outside the sampling schedule.
    pub fn sample_now(&self) {
        if let Some(bytes) = self.probe.current_bytes() {
            self.peak.fetch_max(bytes, Ordering::Relaxed);
        }
    }

    /// Stop sampling and freeze the metrics.
    pub fn finish(mut self) -> ProcessingMetrics {
        if let Some(task) = self.sampler.take() {
            task.abort();
        }
        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let memory_usage = self.initial.map(|initial| {
            let last = self.probe.current_bytes().unwrap_or(initial);
            let peak = self.peak.load(Ordering::Relaxed).max(initial).max(last);
            MemoryUsage {
                initial_mb: initial as f64 / MIB,
                peak_mb: peak as f64 / MIB,
                final_mb: last as f64 / MIB,
            }
        });

        let metrics = ProcessingMetrics {
            start_time: self.start_time,
            end_time: self.start_time.saturating_add(duration_ms),
            duration_ms,
            memory_usage,
            image_size: ImageSizes {
                original: self.original,
                processed: self.processed,
            },
        };
        tracing::debug!(
            duration_ms,
            peak_mb = ?metrics.memory_usage.map(|m| m.peak_mb),
            "performance tracking finished"
        );
        metrics
    }
}

impl Drop for PerformanceTracker {
    fn drop(&mut self) {
        if let Some(task) = self.sampler.take() {
            task.abort();
        }
    }
}

async fn sample_peak(probe: Arc<dyn MemoryProbe>, peak: Arc<AtomicU64>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if let Some(bytes) = probe.current_bytes() {
            peak.fetch_max(bytes, Ordering::Relaxed);
        }
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/metrics/tracker.rs"]
mod tests;
