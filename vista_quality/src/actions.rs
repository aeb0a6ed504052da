use serde::Serialize;

use vista_scene::{AttributeKind, MapSlot};

use crate::backend::ShadowMode;
use crate::level::{DegradationLevel, TextureQuality};
use crate::state::OptimizationFlag;

/// Fixed application order for degradation work. Plans are always emitted
/// geometry first, renderer settings last, so the end state of a tick is
/// deterministic no matter which triggers fired together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPhase {
    Geometry,
    Materials,
    Visibility,
    Renderer,
}

/// One degradation primitive. Scene-wide actions are fanned out over the
/// backend's mesh views when applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    DropAttributes {
        attributes: Vec<AttributeKind>,
        /// Dropped as well, but only on meshes without a normal map.
        keep_if_normal_mapped: Vec<AttributeKind>,
        min_vertices: u32,
    },
    RecomputeNormals {
        min_vertices: u32,
    },
    InstallLod,
    SetTextureQuality {
        quality: TextureQuality,
    },
    StripMapSlots {
        slots: Vec<MapSlot>,
    },
    ReplaceMaterials {
        flat_shading: bool,
    },
    DisableTransparency,
    SetFlatShading,
    DisableMeshShadows,
    HideTinyMeshes {
        max_vertices: u32,
    },
    RestoreVisibility,
    SetPixelRatio {
        ratio: f32,
    },
    SetShadowMode {
        mode: ShadowMode,
    },
    SetCanvasScale {
        scale: f32,
    },
    RequestGc,
}

impl Action {
    pub fn phase(&self) -> ActionPhase {
        match self {
            Action::DropAttributes { .. }
            | Action::RecomputeNormals { .. }
            | Action::InstallLod => ActionPhase::Geometry,
            Action::SetTextureQuality { .. }
            | Action::StripMapSlots { .. }
            | Action::ReplaceMaterials { .. }
            | Action::DisableTransparency
            | Action::SetFlatShading
            | Action::DisableMeshShadows => ActionPhase::Materials,
            Action::HideTinyMeshes { .. } | Action::RestoreVisibility => ActionPhase::Visibility,
            Action::SetPixelRatio { .. }
            | Action::SetShadowMode { .. }
            | Action::SetCanvasScale { .. }
            | Action::RequestGc => ActionPhase::Renderer,
        }
    }
}

/// What a plan entry is on behalf of: a one-shot flag, a level advance, or
/// the user-toggle restore path. Commit is per source — a source whose
/// actions all succeeded is recorded, a partly failed one is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    Flag(OptimizationFlag),
    Level(DegradationLevel),
    Restore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanEntry {
    pub source: ActionSource,
    pub action: Action,
}

/// The delta `evaluate` hands back: everything not yet applied for the
/// current inputs, already in phase order. An empty plan means the state
/// machine has nothing left to do — the idempotence tests key off that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    level: DegradationLevel,
    entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn new(level: DegradationLevel) -> Self {
        Plan {
            level,
            entries: Vec::new(),
        }
    }

    /// Target level once the plan lands; never below the level it was
    /// created with.
    pub fn level(&self) -> DegradationLevel {
        self.level
    }

    pub fn raise_level(&mut self, level: DegradationLevel) {
        if level > self.level {
            self.level = level;
        }
    }

    /// Appends an entry, dropping exact duplicates (two branches firing in
    /// the same tick often request the same renderer cap).
    pub fn push(&mut self, source: ActionSource, action: Action) {
        if self.entries.iter().any(|e| e.action == action) {
            return;
        }
        self.entries.push(PlanEntry { source, action });
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn sort_by_phase(&mut self) {
        self.entries.sort_by_key(|e| e.action.phase());
    }

    pub fn contains(&self, action: &Action) -> bool {
        self.entries.iter().any(|e| &e.action == action)
    }
}
