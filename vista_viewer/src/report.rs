use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use vista_quality::{
    Action, ActionOutcome, ActionSource, DegradationLevel, DeviceClass, OptimizationFlag,
    ShadowMode,
};
use vista_scene::ModelStats;

/// One applied (or attempted) action, stamped with the tick it ran on.
#[derive(Debug, Clone, Serialize)]
pub struct ActionRecord {
    pub tick: u32,
    pub source: ActionSource,
    pub action: Action,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionRecord {
    pub fn from_outcome(tick: u32, outcome: ActionOutcome) -> Self {
        ActionRecord {
            tick,
            source: outcome.source,
            action: outcome.action,
            ok: outcome.ok,
            error: outcome.error,
        }
    }
}

/// End-of-session summary written as pretty JSON, the regression surface
/// the integration tests assert against.
#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub scene: String,
    pub device: DeviceClass,
    pub ticks: u32,
    pub final_level: DegradationLevel,
    pub applied_flags: Vec<OptimizationFlag>,
    pub aggressive_enabled: bool,
    pub pixel_ratio: f32,
    pub shadow_mode: ShadowMode,
    pub canvas_scale: f32,
    pub gc_requests: u32,
    pub hidden_meshes: usize,
    pub culled_meshes: usize,
    pub hidden_layers: usize,
    pub stats: ModelStats,
    pub actions: Vec<ActionRecord>,
}

impl SessionReport {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serializing session report")?;
        fs::write(path, &json)
            .with_context(|| format!("writing session report to {}", path.display()))?;
        Ok(())
    }
}
