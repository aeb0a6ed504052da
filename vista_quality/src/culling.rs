//! Per-tick distance culling for oversized models, plus the layer
//! visibility budget. Both run through the backend like every other
//! mutation, and the culler keeps its own ledger of what it hid so it never
//! resurrects a mesh the degradation passes took away.

use std::collections::BTreeSet;

use glam::Vec3;
use serde::Serialize;

use vista_scene::{LayerSet, NodeId};

use crate::backend::RenderBackend;
use crate::level::SizeClass;

#[derive(Debug, Default, Clone, Copy, Serialize)]
pub struct CullingSummary {
    pub hidden: usize,
    pub restored: usize,
}

/// Hides small meshes far from the camera. Only active for large and
/// critical models; the thresholds tighten with size.
pub struct DistanceCuller {
    rules: &'static [(u32, f32)],
    culled: BTreeSet<NodeId>,
}

impl DistanceCuller {
    /// Vertex-count / distance pairs: a mesh below the count and beyond the
    /// distance is culled.
    pub fn new(size: SizeClass) -> Option<Self> {
        let rules: &'static [(u32, f32)] = match size {
            SizeClass::Critical => &[(100, 20.0), (500, 50.0)],
            SizeClass::Large => &[(50, 50.0)],
            _ => return None,
        };
        Some(DistanceCuller {
            rules,
            culled: BTreeSet::new(),
        })
    }

    pub fn culled_count(&self) -> usize {
        self.culled.len()
    }

    pub fn clear(&mut self) {
        self.culled.clear();
    }

    pub fn pass<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        camera: Vec3,
    ) -> CullingSummary {
        let mut summary = CullingSummary::default();
        for view in backend.meshes() {
            let distance = view.translation.distance(camera);
            let out_of_range = self
                .rules
                .iter()
                .any(|(max_vertices, min_distance)| {
                    view.vertex_count < *max_vertices && distance > *min_distance
                });
            if out_of_range {
                // Hide only what is currently shown; meshes the degradation
                // passes hid are not ours to track.
                if view.visible && !self.culled.contains(&view.node) {
                    if backend.set_visible(view.node, false).is_ok() {
                        self.culled.insert(view.node);
                        summary.hidden += 1;
                    }
                }
            } else if self.culled.remove(&view.node)
                && backend.set_visible(view.node, true).is_ok()
            {
                summary.restored += 1;
            }
        }
        summary
    }
}

/// Keeps the `max_visible` heaviest layers and hides the rest. Returns how
/// many layers were hidden.
pub fn apply_layer_budget<B: RenderBackend + ?Sized>(
    backend: &mut B,
    layers: &LayerSet,
    max_visible: usize,
) -> usize {
    let mut hidden = 0;
    for layer in layers.largest_first().into_iter().skip(max_visible) {
        if backend.set_visible(layer.node, false).is_ok() {
            hidden += 1;
        }
    }
    hidden
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{scene_with_meshes, TestBackend, TestMesh};
    use vista_scene::SceneGraph;

    fn backend() -> TestBackend {
        TestBackend::new(scene_with_meshes(&[
            TestMesh::new("near_small", 50).at(Vec3::new(5.0, 0.0, 0.0)),
            TestMesh::new("far_small", 50).at(Vec3::new(30.0, 0.0, 0.0)),
            TestMesh::new("far_medium", 400).at(Vec3::new(60.0, 0.0, 0.0)),
            TestMesh::new("far_large", 9_000).at(Vec3::new(60.0, 0.0, 0.0)),
        ]))
    }

    #[test]
    fn critical_rules_cull_by_size_and_distance() {
        let mut backend = backend();
        let mut culler = DistanceCuller::new(SizeClass::Critical).expect("culler");
        let summary = culler.pass(&mut backend, Vec3::ZERO);

        assert_eq!(summary.hidden, 2);
        assert!(backend.node_visible("near_small"));
        assert!(!backend.node_visible("far_small"));
        assert!(!backend.node_visible("far_medium"));
        assert!(backend.node_visible("far_large"));
        assert_eq!(culler.culled_count(), 2);
    }

    #[test]
    fn meshes_come_back_when_the_camera_approaches() {
        let mut backend = backend();
        let mut culler = DistanceCuller::new(SizeClass::Critical).expect("culler");
        culler.pass(&mut backend, Vec3::ZERO);
        assert!(!backend.node_visible("far_small"));

        let summary = culler.pass(&mut backend, Vec3::new(30.0, 0.0, 0.0));
        assert!(summary.restored >= 1);
        assert!(backend.node_visible("far_small"));
        assert_eq!(culler.culled_count(), 1);
    }

    #[test]
    fn large_rules_are_gentler() {
        let mut backend = backend();
        let mut culler = DistanceCuller::new(SizeClass::Large).expect("culler");
        let summary = culler.pass(&mut backend, Vec3::ZERO);
        // Only sub-50-vertex meshes beyond 50 units qualify; none here do.
        assert_eq!(summary.hidden, 0);
    }

    #[test]
    fn moderate_models_get_no_culler() {
        assert!(DistanceCuller::new(SizeClass::Moderate).is_none());
        assert!(DistanceCuller::new(SizeClass::None).is_none());
    }

    #[test]
    fn culler_leaves_degradation_hidden_meshes_alone() {
        let mut backend = backend();
        // Hide "far_small" the way a degradation action would.
        let id = backend.meshes()[1].node;
        backend.set_visible(id, false).expect("hide");

        let mut culler = DistanceCuller::new(SizeClass::Critical).expect("culler");
        culler.pass(&mut backend, Vec3::ZERO);
        // The culler claimed far_medium but not the already-hidden mesh.
        assert_eq!(culler.culled_count(), 1);

        // Camera moves in; the culler restores only its own.
        culler.pass(&mut backend, Vec3::new(45.0, 0.0, 0.0));
        assert!(!backend.node_visible("far_small"));
    }

    #[test]
    fn layer_budget_hides_the_lightest_layers() {
        let mut graph = SceneGraph::new("model");
        for (name, vertices) in [("heavy", 9_000u32), ("mid", 4_000), ("light", 100)] {
            let layer = graph.add_node(SceneGraph::ROOT, name, Vec3::ZERO, None);
            graph.add_node(
                layer,
                format!("{name}_mesh"),
                Vec3::ZERO,
                Some(vista_scene::Mesh::new(vertices, Default::default())),
            );
        }
        let layers = LayerSet::from_graph(&graph);
        let mut backend = TestBackend::new(graph);

        let hidden = apply_layer_budget(&mut backend, &layers, 2);
        assert_eq!(hidden, 1);
        assert!(!backend.node_visible("light"));
        assert!(backend.node_visible("heavy"));
        assert!(backend.node_visible("mid"));
    }
}
