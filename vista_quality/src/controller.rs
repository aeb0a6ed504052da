use std::collections::BTreeSet;

use log::warn;
use serde::Serialize;

use vista_scene::ModelProfile;

use crate::actions::{Action, ActionSource, Plan};
use crate::backend::{BackendError, MaterialReplacement, MeshView, RenderBackend};
use crate::device::{DeviceClass, Viewport};
use crate::error::QualityError;
use crate::lod;
use crate::policy::{self, PolicyInputs};
use crate::sample::MemorySample;
use crate::state::OptimizationState;

/// What happened to one plan entry during apply. Failures carry the error
/// text for the session report.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutcome {
    pub source: ActionSource,
    pub action: Action,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Single authority over render-quality reductions for one loaded model.
/// Owns the optimization state; everything else reaches it through
/// `evaluate`/`apply` and the two user toggles.
pub struct QualityController {
    profile: ModelProfile,
    device: DeviceClass,
    state: OptimizationState,
}

impl QualityController {
    pub fn new(profile: ModelProfile, device: DeviceClass) -> Self {
        if let Err(err) = profile.validate() {
            let err = QualityError::InvalidProfile(err);
            warn!("{err}; size-driven branches stay off");
        }
        QualityController {
            profile,
            device,
            state: OptimizationState::default(),
        }
    }

    pub fn profile(&self) -> &ModelProfile {
        &self.profile
    }

    pub fn device(&self) -> DeviceClass {
        self.device
    }

    pub fn state(&self) -> &OptimizationState {
        &self.state
    }

    /// Pure planning step: the delta of actions not yet applied for these
    /// inputs. Never fails; a best-effort plan always comes back.
    pub fn evaluate(&self, sample: Option<&MemorySample>, viewport: Viewport) -> Plan {
        policy::evaluate(
            &self.state,
            &PolicyInputs {
                profile: &self.profile,
                sample,
                viewport,
                device: self.device,
            },
        )
    }

    /// Runs a plan against the backend in its fixed phase order. A failing
    /// action is logged and skipped; the flags whose actions all succeeded
    /// are committed, anything else stays pending and re-emerges from the
    /// next `evaluate`.
    pub fn apply<B: RenderBackend + ?Sized>(
        &mut self,
        plan: &Plan,
        backend: &mut B,
    ) -> Vec<ActionOutcome> {
        let mut outcomes = Vec::with_capacity(plan.len());
        let mut failed_sources: BTreeSet<ActionSource> = BTreeSet::new();

        for entry in plan.entries() {
            match apply_action(&entry.action, backend) {
                Ok(()) => outcomes.push(ActionOutcome {
                    source: entry.source,
                    action: entry.action.clone(),
                    ok: true,
                    error: None,
                }),
                Err(err) => {
                    let err = QualityError::from(err);
                    warn!("skipping degradation action, will retry: {err}");
                    failed_sources.insert(entry.source);
                    outcomes.push(ActionOutcome {
                        source: entry.source,
                        action: entry.action.clone(),
                        ok: false,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        for entry in plan.entries() {
            if failed_sources.contains(&entry.source) {
                continue;
            }
            if let ActionSource::Flag(flag) = entry.source {
                self.state.applied_flags.insert(flag);
            }
            if let Some(level) = policy::source_target_level(entry.source) {
                self.state.advance_level(level);
            }
        }

        outcomes
    }

    /// User toggle: back to unoptimized. Clears every flag, returns the
    /// restore plan (visibility, pixel ratio, shadows, canvas) for the
    /// caller to apply, and leaves the controller dormant until re-enabled.
    pub fn disable_aggressive(&mut self) -> Plan {
        self.state.aggressive_enabled = false;
        self.state.reset();
        policy::restore_plan(self.device)
    }

    /// User toggle: re-enable and re-derive from the model size alone.
    pub fn enable_aggressive(&mut self) -> Plan {
        self.state.aggressive_enabled = true;
        policy::rederive(&self.state, &self.profile, self.device)
    }

    /// Model replaced: fresh profile, pristine state. The aggressive-mode
    /// preference survives, everything else resets.
    pub fn reset(&mut self, profile: ModelProfile) {
        if let Err(err) = profile.validate() {
            let err = QualityError::InvalidProfile(err);
            warn!("{err}; size-driven branches stay off");
        }
        self.profile = profile;
        self.state.reset();
    }
}

/// Runs `op` over every mesh view, remembering the first failure but never
/// stopping early — one broken mesh must not shield the rest of the scene
/// from the pass.
fn for_each_mesh<B, F>(backend: &mut B, mut op: F) -> Result<(), BackendError>
where
    B: RenderBackend + ?Sized,
    F: FnMut(&mut B, &MeshView) -> Result<(), BackendError>,
{
    let views = backend.meshes();
    let mut first_err = None;
    for view in &views {
        if let Err(err) = op(backend, view) {
            first_err.get_or_insert(err);
        }
    }
    match first_err {
        None => Ok(()),
        Some(err) => Err(err),
    }
}

fn apply_action<B: RenderBackend + ?Sized>(
    action: &Action,
    backend: &mut B,
) -> Result<(), BackendError> {
    match action {
        Action::DropAttributes {
            attributes,
            keep_if_normal_mapped,
            min_vertices,
        } => for_each_mesh(backend, |backend, view| {
            if view.vertex_count <= *min_vertices {
                return Ok(());
            }
            let mut result = Ok(());
            for attribute in attributes {
                if let Err(err) = backend.delete_attribute(view.node, *attribute) {
                    if result.is_ok() {
                        result = Err(err);
                    }
                }
            }
            if !view.has_normal_map {
                for attribute in keep_if_normal_mapped {
                    if let Err(err) = backend.delete_attribute(view.node, *attribute) {
                        if result.is_ok() {
                            result = Err(err);
                        }
                    }
                }
            }
            result
        }),
        Action::RecomputeNormals { min_vertices } => for_each_mesh(backend, |backend, view| {
            if view.vertex_count <= *min_vertices {
                return Ok(());
            }
            backend.recompute_normals(view.node)
        }),
        Action::InstallLod => {
            let views = backend.meshes();
            let mut first_err = None;
            for node in lod::plan_chains(&views) {
                if let Err(err) = backend.install_lod(node, lod::standard_chain()) {
                    first_err.get_or_insert(err);
                }
            }
            match first_err {
                None => Ok(()),
                Some(err) => Err(err),
            }
        }
        Action::SetTextureQuality { quality } => {
            let settings = quality.settings();
            let rescale = quality.rescale_rule();
            for_each_mesh(backend, |backend, view| {
                if !view.has_base_texture {
                    return Ok(());
                }
                backend.apply_texture_settings(view.node, settings, rescale)
            })
        }
        Action::StripMapSlots { slots } => {
            for_each_mesh(backend, |backend, view| backend.strip_map_slots(view.node, slots))
        }
        Action::ReplaceMaterials { flat_shading } => for_each_mesh(backend, |backend, view| {
            backend.replace_material(
                view.node,
                MaterialReplacement {
                    flat_shading: *flat_shading,
                },
            )
        }),
        Action::DisableTransparency => {
            for_each_mesh(backend, |backend, view| backend.set_transparent(view.node, false))
        }
        Action::SetFlatShading => {
            for_each_mesh(backend, |backend, view| backend.set_flat_shading(view.node, true))
        }
        Action::DisableMeshShadows => {
            for_each_mesh(backend, |backend, view| backend.set_mesh_shadows(view.node, false))
        }
        Action::HideTinyMeshes { max_vertices } => for_each_mesh(backend, |backend, view| {
            if view.visible && view.vertex_count < *max_vertices {
                backend.set_visible(view.node, false)
            } else {
                Ok(())
            }
        }),
        Action::RestoreVisibility => {
            backend.restore_all_visible();
            Ok(())
        }
        Action::SetPixelRatio { ratio } => {
            backend.set_pixel_ratio(*ratio);
            Ok(())
        }
        Action::SetShadowMode { mode } => {
            backend.set_shadow_mode(*mode);
            Ok(())
        }
        Action::SetCanvasScale { scale } => {
            backend.set_canvas_scale(*scale);
            Ok(())
        }
        Action::RequestGc => {
            backend.request_gc();
            Ok(())
        }
    }
}
