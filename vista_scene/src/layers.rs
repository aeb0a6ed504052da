use serde::Serialize;

use crate::graph::{NodeId, SceneGraph};

/// A top-level group under the root. The viewer's layer menu and the
/// complex-model visibility budget both operate on these.
#[derive(Debug, Clone, Serialize)]
pub struct Layer {
    pub node: NodeId,
    pub name: String,
    pub vertex_count: u64,
    pub mesh_count: u32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LayerSet {
    layers: Vec<Layer>,
}

impl LayerSet {
    pub fn from_graph(graph: &SceneGraph) -> Self {
        let Some(root) = graph.node(SceneGraph::ROOT) else {
            return LayerSet::default();
        };
        let layers = root
            .children
            .iter()
            .filter_map(|child| {
                let node = graph.node(*child)?;
                let mut vertex_count = 0u64;
                let mut mesh_count = 0u32;
                graph.traverse_from(*child, &mut |_, n| {
                    if let Some(mesh) = n.mesh.as_ref() {
                        vertex_count += u64::from(mesh.vertex_count);
                        mesh_count += 1;
                    }
                });
                Some(Layer {
                    node: *child,
                    name: node.name.clone(),
                    vertex_count,
                    mesh_count,
                })
            })
            .collect();
        LayerSet { layers }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Layers ordered heaviest-first, used to decide which stay visible
    /// under a visibility budget.
    pub fn largest_first(&self) -> Vec<&Layer> {
        let mut sorted: Vec<&Layer> = self.layers.iter().collect();
        sorted.sort_by(|a, b| b.vertex_count.cmp(&a.vertex_count));
        sorted
    }
}
