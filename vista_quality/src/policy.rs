//! The trigger table: pure derivation of a degradation plan from the
//! current state plus the tick's inputs. Size and memory are independent
//! axes; each branch fires once per model, and the strictest active
//! constraint wins wherever they overlap (pixel ratio, shadow mode,
//! texture tier).

use std::collections::BTreeSet;

use vista_scene::{AttributeKind, MapSlot, ModelProfile};

use crate::actions::{Action, ActionSource, Plan};
use crate::backend::ShadowMode;
use crate::device::{DeviceClass, Viewport};
use crate::level::{DegradationLevel, SizeClass, TextureQuality};
use crate::sample::MemorySample;
use crate::state::{OptimizationFlag, OptimizationState};

pub const HIGH_MEMORY_PERCENT: f64 = 85.0;
pub const EMERGENCY_PERCENT: f64 = 90.0;

/// Meshes below this are hidden outright by the critical branch.
const CRITICAL_TINY_VERTEX_LIMIT: u32 = 10;
/// The emergency branch hides a little more aggressively.
const EMERGENCY_TINY_VERTEX_LIMIT: u32 = 20;
/// The large branch only strips attributes from heavyweight meshes.
const LARGE_STRIP_VERTEX_MIN: u32 = 10_000;
/// The emergency strip skips meshes too small to matter.
const EMERGENCY_STRIP_VERTEX_MIN: u32 = 1_000;
const CRITICAL_CANVAS_SCALE: f32 = 0.8;
const EMERGENCY_CANVAS_SCALE: f32 = 0.75;

pub struct PolicyInputs<'a> {
    pub profile: &'a ModelProfile,
    pub sample: Option<&'a MemorySample>,
    pub viewport: Viewport,
    pub device: DeviceClass,
}

/// The renderer pixel ratio is the min of every active cap: device ceiling,
/// size-driven caps, memory-driven caps, and the small-screen cap.
pub fn effective_pixel_ratio(device: DeviceClass, flags: &BTreeSet<OptimizationFlag>) -> f32 {
    let mut ratio = device.max_pixel_ratio();
    if flags.contains(&OptimizationFlag::Large) {
        ratio = ratio.min(1.5);
    }
    for flag in [
        OptimizationFlag::Critical,
        OptimizationFlag::HighMemory,
        OptimizationFlag::Emergency,
        OptimizationFlag::SmallScreen,
    ] {
        if flags.contains(&flag) {
            ratio = ratio.min(1.0);
        }
    }
    ratio
}

/// Strictest shadow constraint wins; with nothing active the device default
/// stands.
pub fn effective_shadow_mode(device: DeviceClass, flags: &BTreeSet<OptimizationFlag>) -> ShadowMode {
    let off = [
        OptimizationFlag::Critical,
        OptimizationFlag::HighMemory,
        OptimizationFlag::Emergency,
        OptimizationFlag::SmallScreen,
    ];
    if off.iter().any(|flag| flags.contains(flag)) {
        return ShadowMode::Off;
    }
    if flags.contains(&OptimizationFlag::Large) {
        return ShadowMode::Basic;
    }
    device.default_shadow_mode()
}

/// Level a source advances the session to once its actions land.
pub fn source_target_level(source: ActionSource) -> Option<DegradationLevel> {
    match source {
        ActionSource::Flag(OptimizationFlag::Critical) => Some(DegradationLevel::Critical),
        ActionSource::Flag(OptimizationFlag::Large) => Some(DegradationLevel::High),
        ActionSource::Flag(OptimizationFlag::HighMemory) => Some(DegradationLevel::High),
        ActionSource::Flag(OptimizationFlag::Emergency) => Some(DegradationLevel::Emergency),
        ActionSource::Flag(OptimizationFlag::SmallScreen) => None,
        ActionSource::Level(level) => Some(level),
        ActionSource::Restore => None,
    }
}

/// Computes the action delta for one tick. Pure: no logging, no clock, no
/// backend access, so every trigger combination is table-testable.
pub fn evaluate(state: &OptimizationState, inputs: &PolicyInputs<'_>) -> Plan {
    let mut plan = Plan::new(state.level);
    if !state.aggressive_enabled {
        return plan;
    }

    let size = SizeClass::from_profile(inputs.profile);
    let mut flags = state.applied_flags.clone();
    let mut level = state.level;

    // Preventive, size-driven rung. At most one fires per model; a rung that
    // already ran never re-fires because the flag (or the level, for the
    // moderate rung) stays behind.
    match size {
        SizeClass::Critical if !flags.contains(&OptimizationFlag::Critical) => {
            flags.insert(OptimizationFlag::Critical);
            push_critical(&mut plan, inputs.device, size, &flags);
            level = level.max(DegradationLevel::Critical);
        }
        SizeClass::Large if !flags.contains(&OptimizationFlag::Large) => {
            flags.insert(OptimizationFlag::Large);
            push_large(&mut plan, inputs.device, size, &flags);
            level = level.max(DegradationLevel::High);
        }
        SizeClass::Moderate if state.level < DegradationLevel::Moderate => {
            push_moderate(&mut plan, inputs.device, size);
            level = level.max(DegradationLevel::Moderate);
        }
        _ => {}
    }

    // Reactive, memory-driven rung.
    if let Some(sample) = inputs.sample {
        if sample.percent > EMERGENCY_PERCENT && !flags.contains(&OptimizationFlag::Emergency) {
            flags.insert(OptimizationFlag::Emergency);
            push_emergency(&mut plan, inputs.device, size, &flags);
            level = level.max(DegradationLevel::Emergency);
        } else if sample.percent > HIGH_MEMORY_PERCENT
            && level <= DegradationLevel::High
            && !flags.contains(&OptimizationFlag::HighMemory)
        {
            flags.insert(OptimizationFlag::HighMemory);
            push_high_memory(&mut plan, inputs.device, size, &flags);
            level = level.max(DegradationLevel::High);
        }
    }

    // Small screens cap the renderer regardless of the other axes.
    if inputs.viewport.is_small() && !flags.contains(&OptimizationFlag::SmallScreen) {
        flags.insert(OptimizationFlag::SmallScreen);
        push_small_screen(&mut plan, inputs.device, size, &flags);
    }

    plan.raise_level(level);
    plan.sort_by_phase();
    plan
}

/// The re-enable path: derive afresh from model size alone, exactly the two
/// heavy rungs. Memory pressure is intentionally not consulted here; the
/// next sample re-escalates through `evaluate` if it needs to.
pub fn rederive(
    state: &OptimizationState,
    profile: &ModelProfile,
    device: DeviceClass,
) -> Plan {
    let mut plan = Plan::new(state.level);
    let size = SizeClass::from_profile(profile);
    let mut flags = state.applied_flags.clone();
    match size {
        SizeClass::Critical => {
            flags.insert(OptimizationFlag::Critical);
            push_critical(&mut plan, device, size, &flags);
            plan.raise_level(DegradationLevel::Critical);
        }
        SizeClass::Large => {
            flags.insert(OptimizationFlag::Large);
            push_large(&mut plan, device, size, &flags);
            plan.raise_level(DegradationLevel::High);
        }
        _ => {}
    }
    plan.sort_by_phase();
    plan
}

/// The disable path: bring back everything the aggressive branches took
/// away and return the renderer to its device defaults.
pub fn restore_plan(device: DeviceClass) -> Plan {
    let mut plan = Plan::new(DegradationLevel::None);
    let source = ActionSource::Restore;
    plan.push(source, Action::RestoreVisibility);
    plan.push(
        source,
        Action::SetPixelRatio {
            ratio: device.max_pixel_ratio(),
        },
    );
    plan.push(
        source,
        Action::SetShadowMode {
            mode: device.default_shadow_mode(),
        },
    );
    plan.push(source, Action::SetCanvasScale { scale: 1.0 });
    plan.sort_by_phase();
    plan
}

fn push_critical(
    plan: &mut Plan,
    device: DeviceClass,
    size: SizeClass,
    flags: &BTreeSet<OptimizationFlag>,
) {
    let source = ActionSource::Flag(OptimizationFlag::Critical);
    plan.push(
        source,
        Action::DropAttributes {
            attributes: vec![AttributeKind::Color, AttributeKind::Uv2],
            keep_if_normal_mapped: vec![AttributeKind::Tangent, AttributeKind::Bitangent],
            min_vertices: 0,
        },
    );
    plan.push(source, Action::InstallLod);
    plan.push(
        source,
        Action::SetTextureQuality {
            quality: TextureQuality::Extreme.resolve(device, size),
        },
    );
    plan.push(source, Action::ReplaceMaterials { flat_shading: true });
    plan.push(
        source,
        Action::HideTinyMeshes {
            max_vertices: CRITICAL_TINY_VERTEX_LIMIT,
        },
    );
    plan.push(
        source,
        Action::SetPixelRatio {
            ratio: effective_pixel_ratio(device, flags),
        },
    );
    plan.push(
        source,
        Action::SetShadowMode {
            mode: effective_shadow_mode(device, flags),
        },
    );
    plan.push(
        source,
        Action::SetCanvasScale {
            scale: CRITICAL_CANVAS_SCALE,
        },
    );
    plan.push(source, Action::RequestGc);
}

fn push_large(
    plan: &mut Plan,
    device: DeviceClass,
    size: SizeClass,
    flags: &BTreeSet<OptimizationFlag>,
) {
    let source = ActionSource::Flag(OptimizationFlag::Large);
    plan.push(
        source,
        Action::DropAttributes {
            attributes: vec![AttributeKind::Color],
            keep_if_normal_mapped: vec![AttributeKind::Tangent],
            min_vertices: LARGE_STRIP_VERTEX_MIN,
        },
    );
    plan.push(
        source,
        Action::SetTextureQuality {
            quality: TextureQuality::High.resolve(device, size),
        },
    );
    plan.push(
        source,
        Action::StripMapSlots {
            slots: vec![MapSlot::Env, MapSlot::Light, MapSlot::Ao, MapSlot::Emissive],
        },
    );
    plan.push(source, Action::SetFlatShading);
    plan.push(source, Action::DisableTransparency);
    plan.push(
        source,
        Action::SetPixelRatio {
            ratio: effective_pixel_ratio(device, flags),
        },
    );
    plan.push(
        source,
        Action::SetShadowMode {
            mode: effective_shadow_mode(device, flags),
        },
    );
}

fn push_moderate(plan: &mut Plan, device: DeviceClass, size: SizeClass) {
    let source = ActionSource::Level(DegradationLevel::Moderate);
    plan.push(
        source,
        Action::SetTextureQuality {
            quality: TextureQuality::Medium.resolve(device, size),
        },
    );
    plan.push(source, Action::DisableTransparency);
    plan.push(source, Action::DisableMeshShadows);
}

fn push_high_memory(
    plan: &mut Plan,
    device: DeviceClass,
    size: SizeClass,
    flags: &BTreeSet<OptimizationFlag>,
) {
    let source = ActionSource::Flag(OptimizationFlag::HighMemory);
    plan.push(
        source,
        Action::SetTextureQuality {
            quality: TextureQuality::High.resolve(device, size),
        },
    );
    plan.push(
        source,
        Action::StripMapSlots {
            slots: vec![MapSlot::Env],
        },
    );
    plan.push(source, Action::DisableMeshShadows);
    plan.push(
        source,
        Action::SetPixelRatio {
            ratio: effective_pixel_ratio(device, flags),
        },
    );
    plan.push(
        source,
        Action::SetShadowMode {
            mode: effective_shadow_mode(device, flags),
        },
    );
}

fn push_emergency(
    plan: &mut Plan,
    device: DeviceClass,
    size: SizeClass,
    flags: &BTreeSet<OptimizationFlag>,
) {
    let source = ActionSource::Flag(OptimizationFlag::Emergency);
    plan.push(
        source,
        Action::DropAttributes {
            attributes: vec![
                AttributeKind::Normal,
                AttributeKind::Uv,
                AttributeKind::Uv2,
                AttributeKind::Color,
                AttributeKind::Tangent,
                AttributeKind::Bitangent,
            ],
            keep_if_normal_mapped: Vec::new(),
            min_vertices: EMERGENCY_STRIP_VERTEX_MIN,
        },
    );
    plan.push(
        source,
        Action::RecomputeNormals {
            min_vertices: EMERGENCY_STRIP_VERTEX_MIN,
        },
    );
    plan.push(
        source,
        Action::SetTextureQuality {
            quality: TextureQuality::Extreme.resolve(device, size),
        },
    );
    plan.push(source, Action::ReplaceMaterials { flat_shading: false });
    plan.push(
        source,
        Action::HideTinyMeshes {
            max_vertices: EMERGENCY_TINY_VERTEX_LIMIT,
        },
    );
    plan.push(
        source,
        Action::SetPixelRatio {
            ratio: effective_pixel_ratio(device, flags),
        },
    );
    plan.push(
        source,
        Action::SetShadowMode {
            mode: effective_shadow_mode(device, flags),
        },
    );
    plan.push(
        source,
        Action::SetCanvasScale {
            scale: EMERGENCY_CANVAS_SCALE,
        },
    );
    plan.push(source, Action::RequestGc);
}

fn push_small_screen(
    plan: &mut Plan,
    device: DeviceClass,
    size: SizeClass,
    flags: &BTreeSet<OptimizationFlag>,
) {
    let source = ActionSource::Flag(OptimizationFlag::SmallScreen);
    plan.push(
        source,
        Action::SetTextureQuality {
            quality: TextureQuality::High.resolve(device, size),
        },
    );
    plan.push(
        source,
        Action::StripMapSlots {
            slots: vec![MapSlot::Env],
        },
    );
    plan.push(source, Action::DisableMeshShadows);
    plan.push(
        source,
        Action::SetPixelRatio {
            ratio: effective_pixel_ratio(device, flags),
        },
    );
    plan.push(
        source,
        Action::SetShadowMode {
            mode: effective_shadow_mode(device, flags),
        },
    );
}
