use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;
use crate::error::QualityError;

/// One reading of the JS heap. Ephemeral: the sampler keeps only the most
/// recent value and the policy never looks further back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    pub used_mb: f64,
    pub limit_mb: f64,
    pub percent: f64,
    pub timestamp_ms: u64,
}

impl MemorySample {
    /// Returns `None` for unusable readings (non-positive or non-finite
    /// limit), which callers treat the same as no sample at all.
    pub fn new(used_mb: f64, limit_mb: f64, timestamp_ms: u64) -> Option<Self> {
        if !limit_mb.is_finite() || limit_mb <= 0.0 || !used_mb.is_finite() || used_mb < 0.0 {
            return None;
        }
        Some(MemorySample {
            used_mb,
            limit_mb,
            percent: used_mb / limit_mb * 100.0,
            timestamp_ms,
        })
    }
}

/// Heap introspection seam. Returns `None` on platforms without usable heap
/// counters; the controller then runs on the size-driven branches only.
pub trait HeapMonitor {
    fn sample(&mut self, now_ms: u64) -> Option<MemorySample>;
}

impl<M: HeapMonitor + ?Sized> HeapMonitor for Box<M> {
    fn sample(&mut self, now_ms: u64) -> Option<MemorySample> {
        (**self).sample(now_ms)
    }
}

/// Interval-gated polling wrapper around a `HeapMonitor`. Low-end devices
/// poll every 10 s, everything else every 5 s.
pub struct MemorySampler<M> {
    monitor: M,
    interval_ms: u64,
    last_poll_ms: Option<u64>,
    latest: Option<MemorySample>,
    unsupported_logged: bool,
}

impl<M: HeapMonitor> MemorySampler<M> {
    pub fn new(monitor: M, device: DeviceClass) -> Self {
        MemorySampler {
            monitor,
            interval_ms: device.sample_interval_ms(),
            last_poll_ms: None,
            latest: None,
            unsupported_logged: false,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Polls the monitor if the interval has elapsed. Returns a fresh sample
    /// only on the ticks where one was actually taken.
    pub fn poll(&mut self, now_ms: u64) -> Option<MemorySample> {
        let due = match self.last_poll_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.interval_ms,
        };
        if !due {
            return None;
        }
        self.last_poll_ms = Some(now_ms);
        match self.monitor.sample(now_ms) {
            Some(sample) => {
                debug!(
                    "heap {:.1} MB / {:.1} MB ({:.1}%)",
                    sample.used_mb, sample.limit_mb, sample.percent
                );
                self.latest = Some(sample);
                Some(sample)
            }
            None => {
                if !self.unsupported_logged {
                    warn!(
                        "{}; size-driven degradation only",
                        QualityError::UnsupportedPlatform
                    );
                    self.unsupported_logged = true;
                }
                None
            }
        }
    }

    pub fn latest(&self) -> Option<&MemorySample> {
        self.latest.as_ref()
    }
}
