//! The in-process rendering adapter: a `RenderBackend` over the scene graph
//! plus the handful of renderer knobs the degradation policy touches. Every
//! scene mutation the controller performs in a real browser session goes
//! through here instead, so sessions stay observable and replayable.

use std::collections::BTreeSet;

use vista_quality::{BackendError, MaterialReplacement, MeshView, RenderBackend, ShadowMode};
use vista_scene::{AttributeKind, LodChain, MapSlot, Mesh, NodeId, SceneGraph, TextureSettings};

const TEXTURE_FLOOR_PX: u32 = 32;

pub struct SceneBackend {
    graph: SceneGraph,
    pixel_ratio: f32,
    shadow_mode: ShadowMode,
    canvas_scale: f32,
    gc_requests: u32,
    hidden: BTreeSet<NodeId>,
}

impl SceneBackend {
    pub fn new(graph: SceneGraph) -> Self {
        SceneBackend {
            graph,
            pixel_ratio: 2.0,
            shadow_mode: ShadowMode::PcfSoft,
            canvas_scale: 1.0,
            gc_requests: 0,
            hidden: BTreeSet::new(),
        }
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.pixel_ratio
    }

    pub fn shadow_mode(&self) -> ShadowMode {
        self.shadow_mode
    }

    pub fn canvas_scale(&self) -> f32 {
        self.canvas_scale
    }

    pub fn gc_requests(&self) -> u32 {
        self.gc_requests
    }

    /// Mesh nodes that are not effectively visible (self or any ancestor
    /// hidden), for the end-of-session report.
    pub fn hidden_mesh_count(&self) -> usize {
        let mut hidden = 0;
        for id in self.graph.mesh_nodes() {
            if !self.effectively_visible(id) {
                hidden += 1;
            }
        }
        hidden
    }

    fn effectively_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let Some(node) = self.graph.node(node_id) else {
                return false;
            };
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    fn with_mesh<F>(&mut self, node: NodeId, op: F) -> Result<(), BackendError>
    where
        F: FnOnce(&mut Mesh) -> Result<(), BackendError>,
    {
        let entry = self
            .graph
            .node_mut(node)
            .ok_or(BackendError::UnknownNode(node))?;
        let mesh = entry.mesh.as_mut().ok_or(BackendError::NotAMesh(node))?;
        op(mesh)
    }
}

impl RenderBackend for SceneBackend {
    fn meshes(&self) -> Vec<MeshView> {
        let mut views = Vec::new();
        self.graph.traverse(|id, node| {
            if let Some(mesh) = node.mesh.as_ref() {
                views.push(MeshView {
                    node: id,
                    vertex_count: mesh.vertex_count,
                    visible: node.visible,
                    has_normal_map: mesh.has_normal_map(),
                    has_base_texture: mesh.material.maps.base.is_some(),
                    translation: node.translation,
                    bounding_radius: mesh.bounding_radius,
                });
            }
        });
        views
    }

    fn delete_attribute(
        &mut self,
        node: NodeId,
        attribute: AttributeKind,
    ) -> Result<(), BackendError> {
        if attribute == AttributeKind::Position {
            return Err(BackendError::ProtectedAttribute { node, attribute });
        }
        self.with_mesh(node, |mesh| {
            mesh.delete_attribute(attribute);
            Ok(())
        })
    }

    fn recompute_normals(&mut self, node: NodeId) -> Result<(), BackendError> {
        self.with_mesh(node, |mesh| {
            mesh.attributes.insert(AttributeKind::Normal);
            Ok(())
        })
    }

    fn replace_material(
        &mut self,
        node: NodeId,
        replacement: MaterialReplacement,
    ) -> Result<(), BackendError> {
        self.with_mesh(node, |mesh| {
            mesh.material.flatten(replacement.flat_shading);
            Ok(())
        })
    }

    fn strip_map_slots(&mut self, node: NodeId, slots: &[MapSlot]) -> Result<(), BackendError> {
        self.with_mesh(node, |mesh| {
            for slot in slots {
                mesh.material.maps.clear_slot(*slot);
            }
            Ok(())
        })
    }

    fn apply_texture_settings(
        &mut self,
        node: NodeId,
        settings: TextureSettings,
        rescale: Option<vista_quality::RescaleRule>,
    ) -> Result<(), BackendError> {
        self.with_mesh(node, |mesh| {
            let Some(texture) = mesh.material.maps.base.as_mut() else {
                return Ok(());
            };
            if let Some(rule) = rescale {
                if texture.width > rule.min_width {
                    if !texture.loaded {
                        return Err(BackendError::TextureNotLoaded(node));
                    }
                    texture.rescale(rule.scale, TEXTURE_FLOOR_PX);
                }
            }
            texture.settings = settings;
            Ok(())
        })
    }

    fn set_transparent(&mut self, node: NodeId, transparent: bool) -> Result<(), BackendError> {
        self.with_mesh(node, |mesh| {
            mesh.material.transparent = transparent;
            Ok(())
        })
    }

    fn set_flat_shading(&mut self, node: NodeId, flat: bool) -> Result<(), BackendError> {
        self.with_mesh(node, |mesh| {
            mesh.material.flat_shading = flat;
            Ok(())
        })
    }

    fn set_mesh_shadows(&mut self, node: NodeId, enabled: bool) -> Result<(), BackendError> {
        self.with_mesh(node, |mesh| {
            mesh.cast_shadow = enabled;
            mesh.receive_shadow = enabled;
            Ok(())
        })
    }

    fn install_lod(&mut self, node: NodeId, chain: LodChain) -> Result<(), BackendError> {
        self.with_mesh(node, |mesh| {
            mesh.lod = Some(chain);
            Ok(())
        })
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), BackendError> {
        let entry = self
            .graph
            .node_mut(node)
            .ok_or(BackendError::UnknownNode(node))?;
        entry.visible = visible;
        if visible {
            self.hidden.remove(&node);
        } else {
            self.hidden.insert(node);
        }
        Ok(())
    }

    fn restore_all_visible(&mut self) {
        for index in 0..self.graph.len() {
            if let Some(node) = self.graph.node_mut(NodeId(index as u32)) {
                node.visible = true;
            }
        }
        self.hidden.clear();
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        self.pixel_ratio = ratio;
    }

    fn set_shadow_mode(&mut self, mode: ShadowMode) {
        self.shadow_mode = mode;
    }

    fn set_canvas_scale(&mut self, scale: f32) {
        self.canvas_scale = scale;
    }

    fn request_gc(&mut self) {
        self.gc_requests += 1;
    }
}
