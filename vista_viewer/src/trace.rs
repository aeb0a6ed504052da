//! Heap monitors for the headless host: a replay of a recorded trace, and
//! the null monitor standing in for platforms with no heap introspection.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use vista_quality::{HeapMonitor, MemorySample};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TraceEntry {
    pub at_ms: u64,
    pub used_mb: f64,
    pub limit_mb: f64,
}

/// Replays a recorded heap trace: sampling at time T returns the latest
/// entry at or before T, exactly what a live `performance.memory` read
/// would have seen.
pub struct TraceMonitor {
    entries: Vec<TraceEntry>,
}

impl TraceMonitor {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading memory trace {}", path.display()))?;
        let entries: Vec<TraceEntry> = serde_json::from_str(&data)
            .with_context(|| format!("parsing memory trace {}", path.display()))?;
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(mut entries: Vec<TraceEntry>) -> Self {
        entries.sort_by_key(|entry| entry.at_ms);
        TraceMonitor { entries }
    }
}

impl HeapMonitor for TraceMonitor {
    fn sample(&mut self, now_ms: u64) -> Option<MemorySample> {
        let entry = self
            .entries
            .iter()
            .take_while(|entry| entry.at_ms <= now_ms)
            .last()?;
        MemorySample::new(entry.used_mb, entry.limit_mb, now_ms)
    }
}

/// No heap counters on this platform; the controller runs size-only.
pub struct NullMonitor;

impl HeapMonitor for NullMonitor {
    fn sample(&mut self, _now_ms: u64) -> Option<MemorySample> {
        None
    }
}
