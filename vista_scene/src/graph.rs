use std::collections::BTreeSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::lod::LodChain;
use crate::material::Material;

/// Index of a node in the scene arena. The root is always id 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Vertex attributes a mesh may carry. Position is always present and cannot
/// be deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Position,
    Normal,
    Uv,
    Uv2,
    Color,
    Tangent,
    Bitangent,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertex_count: u32,
    pub attributes: BTreeSet<AttributeKind>,
    pub material: Material,
    pub bounding_radius: f32,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub lod: Option<LodChain>,
}

impl Mesh {
    pub fn new(vertex_count: u32, material: Material) -> Self {
        let mut attributes = BTreeSet::new();
        attributes.insert(AttributeKind::Position);
        Mesh {
            vertex_count,
            attributes,
            material,
            bounding_radius: 1.0,
            cast_shadow: true,
            receive_shadow: true,
            lod: None,
        }
    }

    pub fn has_attribute(&self, kind: AttributeKind) -> bool {
        self.attributes.contains(&kind)
    }

    /// Removes an attribute if present. Returns whether anything was removed.
    pub fn delete_attribute(&mut self, kind: AttributeKind) -> bool {
        self.attributes.remove(&kind)
    }

    pub fn has_normal_map(&self) -> bool {
        self.material.maps.normal.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub visible: bool,
    pub translation: Vec3,
    pub mesh: Option<Mesh>,
}

/// Arena-backed scene graph with a single root. Child order is preserved so
/// traversal (and everything derived from it, like LOD budgets) stays
/// deterministic.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    nodes: Vec<Node>,
}

impl SceneGraph {
    pub const ROOT: NodeId = NodeId(0);

    pub fn new(root_name: impl Into<String>) -> Self {
        SceneGraph {
            nodes: vec![Node {
                name: root_name.into(),
                parent: None,
                children: Vec::new(),
                visible: true,
                translation: Vec3::ZERO,
                mesh: None,
            }],
        }
    }

    pub fn add_node(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        translation: Vec3,
        mesh: Option<Mesh>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            visible: true,
            translation,
            mesh,
        });
        self.nodes[parent.0 as usize].children.push(id);
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0 as usize)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root always exists; an "empty" graph is root-only.
        self.nodes.len() <= 1
    }

    /// Depth-first traversal from the root, children in insertion order.
    pub fn traverse<F>(&self, mut visitor: F)
    where
        F: FnMut(NodeId, &Node),
    {
        self.traverse_from(Self::ROOT, &mut visitor);
    }

    pub fn traverse_from<F>(&self, start: NodeId, visitor: &mut F)
    where
        F: FnMut(NodeId, &Node),
    {
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node(id) else { continue };
            visitor(id, node);
            for child in node.children.iter().rev() {
                stack.push(*child);
            }
        }
    }

    /// Ids of all nodes that carry a mesh, in traversal order.
    pub fn mesh_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.traverse(|id, node| {
            if node.mesh.is_some() {
                out.push(id);
            }
        });
        out
    }
}
