//! Capability contract between the degradation controller and whatever
//! actually renders. The controller never touches a scene graph directly;
//! it plans against the mesh views a backend exposes and mutates through
//! these methods, so the policy stays testable without a renderer.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vista_scene::{AttributeKind, LodChain, MapSlot, NodeId, TextureSettings};

use crate::level::RescaleRule;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} carries no mesh")]
    NotAMesh(NodeId),
    #[error("texture on node {0:?} has not finished loading")]
    TextureNotLoaded(NodeId),
    #[error("attribute {attribute:?} on node {node:?} cannot be removed")]
    ProtectedAttribute {
        node: NodeId,
        attribute: AttributeKind,
    },
}

/// Shadow-map configuration of the renderer as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMode {
    Off,
    Basic,
    PcfSoft,
}

/// Replacement request for a mesh's material: unlit flat color, keeping the
/// original base color when there is one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialReplacement {
    pub flat_shading: bool,
}

/// Read-side summary of one mesh, enough for the controller to decide which
/// mutators to invoke. Produced fresh per apply pass.
#[derive(Debug, Clone)]
pub struct MeshView {
    pub node: NodeId,
    pub vertex_count: u32,
    pub visible: bool,
    pub has_normal_map: bool,
    pub has_base_texture: bool,
    pub translation: Vec3,
    pub bounding_radius: f32,
}

/// Everything the degradation policy is allowed to do to the rendering
/// layer. Mesh-level mutators are fallible and idempotent; renderer-level
/// setters cannot fail.
pub trait RenderBackend {
    /// All meshes in traversal order. This is the traversal seam: the
    /// controller fans scene-wide actions out over these views.
    fn meshes(&self) -> Vec<MeshView>;

    fn delete_attribute(
        &mut self,
        node: NodeId,
        attribute: AttributeKind,
    ) -> Result<(), BackendError>;
    fn recompute_normals(&mut self, node: NodeId) -> Result<(), BackendError>;
    fn replace_material(
        &mut self,
        node: NodeId,
        replacement: MaterialReplacement,
    ) -> Result<(), BackendError>;
    fn strip_map_slots(&mut self, node: NodeId, slots: &[MapSlot]) -> Result<(), BackendError>;
    /// Applies sampler settings and, when a rescale rule is given, shrinks
    /// the base texture. Rescaling an image that has not finished loading
    /// fails so the caller can retry on a later tick.
    fn apply_texture_settings(
        &mut self,
        node: NodeId,
        settings: TextureSettings,
        rescale: Option<RescaleRule>,
    ) -> Result<(), BackendError>;
    fn set_transparent(&mut self, node: NodeId, transparent: bool) -> Result<(), BackendError>;
    fn set_flat_shading(&mut self, node: NodeId, flat: bool) -> Result<(), BackendError>;
    fn set_mesh_shadows(&mut self, node: NodeId, enabled: bool) -> Result<(), BackendError>;
    fn install_lod(&mut self, node: NodeId, chain: LodChain) -> Result<(), BackendError>;
    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), BackendError>;

    /// Undo every visibility change made through `set_visible`.
    fn restore_all_visible(&mut self);

    fn set_pixel_ratio(&mut self, ratio: f32);
    fn set_shadow_mode(&mut self, mode: ShadowMode);
    /// Scales the drawing-buffer resolution relative to the layout size.
    fn set_canvas_scale(&mut self, scale: f32);
    /// Hint that now is a good moment to collect garbage.
    fn request_gc(&mut self);
}
