use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::SceneGraph;
use crate::layers::LayerSet;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("model size {0} MB is not a positive finite number")]
    InvalidSize(f64),
    #[error("model has no mesh vertices")]
    EmptyModel,
}

/// Load-time facts about a model. Computed once and immutable for the
/// model's lifetime; the degradation policy keys its size branches off this.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelProfile {
    pub size_mb: f64,
    pub vertex_count: u64,
    pub material_count: u32,
}

impl ModelProfile {
    pub fn from_graph(size_mb: f64, graph: &SceneGraph) -> Self {
        let mut vertex_count = 0u64;
        let mut material_count = 0u32;
        graph.traverse(|_, node| {
            if let Some(mesh) = node.mesh.as_ref() {
                vertex_count += u64::from(mesh.vertex_count);
                material_count += 1;
            }
        });
        ModelProfile {
            size_mb,
            vertex_count,
            material_count,
        }
    }

    /// A malformed profile (zero/negative/non-finite size, no geometry) is
    /// not fatal; callers log it and fall back to the unoptimized path.
    pub fn validate(&self) -> Result<(), ProfileError> {
        if !self.size_mb.is_finite() || self.size_mb <= 0.0 {
            return Err(ProfileError::InvalidSize(self.size_mb));
        }
        if self.vertex_count == 0 {
            return Err(ProfileError::EmptyModel);
        }
        Ok(())
    }
}

/// Aggregate counts shown by the stats surface and embedded in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStats {
    pub vertices: u64,
    pub triangles: u64,
    pub meshes: u32,
    pub nodes: u32,
    pub layers: u32,
    pub materials: u32,
    pub textures: u32,
}

impl ModelStats {
    pub fn from_graph(graph: &SceneGraph) -> Self {
        let mut stats = ModelStats {
            vertices: 0,
            triangles: 0,
            meshes: 0,
            nodes: 0,
            layers: 0,
            materials: 0,
            textures: 0,
        };
        graph.traverse(|_, node| {
            stats.nodes += 1;
            if let Some(mesh) = node.mesh.as_ref() {
                stats.meshes += 1;
                stats.vertices += u64::from(mesh.vertex_count);
                stats.triangles += u64::from(mesh.vertex_count / 3);
                stats.materials += 1;
                stats.textures += mesh.material.maps.populated() as u32;
            }
        });
        stats.layers = LayerSet::from_graph(graph).len() as u32;
        stats
    }
}
