//! In-memory backend and scene builders shared by the unit tests.

use std::collections::BTreeSet;

use glam::Vec3;

use vista_scene::{
    AttributeKind, LodChain, MapSlot, Mesh, Material, NodeId, SceneGraph, Texture,
    TextureSettings,
};

use crate::backend::{BackendError, MaterialReplacement, MeshView, RenderBackend, ShadowMode};
use crate::level::RescaleRule;

const TEXTURE_FLOOR_PX: u32 = 32;

pub struct TestMesh {
    name: String,
    vertices: u32,
    translation: Vec3,
    attributes: Vec<AttributeKind>,
    base_texture: Option<(u32, bool)>,
    normal_mapped: bool,
}

impl TestMesh {
    pub fn new(name: &str, vertices: u32) -> Self {
        TestMesh {
            name: name.to_string(),
            vertices,
            translation: Vec3::ZERO,
            attributes: Vec::new(),
            base_texture: None,
            normal_mapped: false,
        }
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn with_attributes(mut self, names: &[&str]) -> Self {
        self.attributes = names.iter().copied().map(attribute).collect();
        self
    }

    pub fn textured(mut self, width: u32, loaded: bool) -> Self {
        self.base_texture = Some((width, loaded));
        self
    }

    pub fn normal_mapped(mut self) -> Self {
        self.normal_mapped = true;
        self
    }
}

fn attribute(name: &str) -> AttributeKind {
    match name {
        "normal" => AttributeKind::Normal,
        "uv" => AttributeKind::Uv,
        "uv2" => AttributeKind::Uv2,
        "color" => AttributeKind::Color,
        "tangent" => AttributeKind::Tangent,
        "bitangent" => AttributeKind::Bitangent,
        other => panic!("unknown attribute {other}"),
    }
}

/// Flat scene: every mesh a direct child of the root.
pub fn scene_with_meshes(meshes: &[TestMesh]) -> SceneGraph {
    let mut graph = SceneGraph::new("test model");
    for spec in meshes {
        let mut material = Material::default();
        if let Some((width, loaded)) = spec.base_texture {
            let mut texture = Texture::new(width, width);
            texture.loaded = loaded;
            material.maps.base = Some(texture);
        }
        if spec.normal_mapped {
            material.maps.normal = Some(Texture::new(256, 256));
        }
        let mut mesh = Mesh::new(spec.vertices, material);
        for attribute in &spec.attributes {
            mesh.attributes.insert(*attribute);
        }
        graph.add_node(SceneGraph::ROOT, spec.name.clone(), spec.translation, Some(mesh));
    }
    graph
}

/// Minimal graph-backed backend with the renderer knobs as plain fields, so
/// tests can assert end states directly.
pub struct TestBackend {
    pub graph: SceneGraph,
    pub pixel_ratio: f32,
    pub shadow_mode: ShadowMode,
    pub canvas_scale: f32,
    pub gc_requests: u32,
    hidden: BTreeSet<NodeId>,
}

impl TestBackend {
    pub fn new(graph: SceneGraph) -> Self {
        TestBackend {
            graph,
            pixel_ratio: 2.0,
            shadow_mode: ShadowMode::PcfSoft,
            canvas_scale: 1.0,
            gc_requests: 0,
            hidden: BTreeSet::new(),
        }
    }

    fn find(&self, name: &str) -> NodeId {
        let mut found = None;
        self.graph.traverse(|id, node| {
            if node.name == name && found.is_none() {
                found = Some(id);
            }
        });
        found.unwrap_or_else(|| panic!("no node named {name}"))
    }

    pub fn mesh(&self, name: &str) -> &Mesh {
        let id = self.find(name);
        self.graph
            .node(id)
            .and_then(|n| n.mesh.as_ref())
            .unwrap_or_else(|| panic!("node {name} has no mesh"))
    }

    pub fn node_visible(&self, name: &str) -> bool {
        let id = self.find(name);
        self.graph.node(id).map(|n| n.visible).unwrap_or(false)
    }

    /// Marks every texture as finished loading, unblocking rescale retries.
    pub fn finish_texture_loads(&mut self) {
        for id in self.graph.mesh_nodes() {
            if let Some(mesh) = self.graph.node_mut(id).and_then(|n| n.mesh.as_mut()) {
                for slot in [
                    MapSlot::Base,
                    MapSlot::Normal,
                    MapSlot::Env,
                    MapSlot::Light,
                    MapSlot::Ao,
                    MapSlot::Emissive,
                ] {
                    if let Some(texture) = mesh.material.maps.slot_mut(slot).as_mut() {
                        texture.loaded = true;
                    }
                }
            }
        }
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

impl RenderBackend for TestBackend {
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
        rescale: Option<RescaleRule>,
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
