//! JSON snapshot form of a scene graph.
//!
//! Snapshots are how the headless host and the tests get models into the
//! viewer without any format decoding: a flat node list in parent-before-child
//! order, each entry carrying the mesh metadata the degradation policy cares
//! about.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::{AttributeKind, Mesh, NodeId, SceneGraph};
use crate::material::Material;
use crate::profile::ModelProfile;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("node {index} ({name:?}) references parent {parent} which does not precede it")]
    BadParent {
        index: usize,
        name: String,
        parent: u32,
    },
    #[error("snapshot contains no nodes")]
    Empty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshSnapshot {
    pub vertex_count: u32,
    #[serde(default)]
    pub attributes: Vec<AttributeKind>,
    #[serde(default)]
    pub material: Option<Material>,
    #[serde(default = "default_radius")]
    pub bounding_radius: f32,
}

fn default_radius() -> f32 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    /// Index of the parent in the node list; `None` attaches to the root.
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub translation: [f32; 3],
    #[serde(default)]
    pub mesh: Option<MeshSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub name: String,
    /// On-disk size of the source model file, the primary degradation input.
    pub file_size_mb: f64,
    pub nodes: Vec<NodeSnapshot>,
}

impl SceneSnapshot {
    pub fn into_graph(self) -> Result<(SceneGraph, ModelProfile), SnapshotError> {
        if self.nodes.is_empty() {
            return Err(SnapshotError::Empty);
        }
        let mut graph = SceneGraph::new(self.name);
        // Snapshot index -> arena id, filled as nodes are added.
        let mut ids: Vec<NodeId> = Vec::with_capacity(self.nodes.len());
        for (index, entry) in self.nodes.into_iter().enumerate() {
            let parent = match entry.parent {
                None => SceneGraph::ROOT,
                Some(p) => *ids.get(p as usize).ok_or_else(|| SnapshotError::BadParent {
                    index,
                    name: entry.name.clone(),
                    parent: p,
                })?,
            };
            let mesh = entry.mesh.map(|m| {
                let mut mesh = Mesh::new(m.vertex_count, m.material.unwrap_or_default());
                mesh.bounding_radius = m.bounding_radius;
                let mut attributes: BTreeSet<AttributeKind> = m.attributes.into_iter().collect();
                attributes.insert(AttributeKind::Position);
                mesh.attributes = attributes;
                mesh
            });
            let id = graph.add_node(parent, entry.name, Vec3::from(entry.translation), mesh);
            ids.push(id);
        }
        let profile = ModelProfile::from_graph(self.file_size_mb, &graph);
        Ok((graph, profile))
    }

    pub fn from_graph(graph: &SceneGraph, file_size_mb: f64) -> Self {
        let mut nodes = Vec::new();
        let mut index_of = std::collections::BTreeMap::new();
        graph.traverse(|id, node| {
            if id == SceneGraph::ROOT {
                return;
            }
            let parent = node.parent.filter(|p| *p != SceneGraph::ROOT);
            nodes.push(NodeSnapshot {
                name: node.name.clone(),
                parent: parent.and_then(|p| index_of.get(&p).copied()),
                translation: node.translation.to_array(),
                mesh: node.mesh.as_ref().map(|mesh| MeshSnapshot {
                    vertex_count: mesh.vertex_count,
                    attributes: mesh.attributes.iter().copied().collect(),
                    material: Some(mesh.material.clone()),
                    bounding_radius: mesh.bounding_radius,
                }),
            });
            index_of.insert(id, (nodes.len() - 1) as u32);
        });
        SceneSnapshot {
            name: graph
                .node(SceneGraph::ROOT)
                .map(|n| n.name.clone())
                .unwrap_or_default(),
            file_size_mb,
            nodes,
        }
    }
}

/// Reads a snapshot file and builds the graph plus its load-time profile.
pub fn load_scene(path: &Path) -> Result<(SceneGraph, ModelProfile)> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading scene snapshot {}", path.display()))?;
    let snapshot: SceneSnapshot = serde_json::from_str(&data)
        .with_context(|| format!("parsing scene snapshot {}", path.display()))?;
    let built = snapshot
        .into_graph()
        .with_context(|| format!("building scene graph from {}", path.display()))?;
    Ok(built)
}
