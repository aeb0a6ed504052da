use vista_scene::{LodChain, LodDetail, LodLevel, NodeId};

use crate::backend::MeshView;

/// Meshes below this vertex count are not worth a proxy chain.
pub const LOD_VERTEX_THRESHOLD: u32 = 5_000;
/// Hard cap on how many meshes get chains in one pass, to bound the cost of
/// the critical branch on pathological scenes.
pub const LOD_MESH_BUDGET: usize = 50;

/// Full detail up close, a flat-shaded simplification at mid distance, a
/// bounding-box stand-in far out.
pub fn standard_chain() -> LodChain {
    LodChain::new(vec![
        LodLevel {
            distance: 0.0,
            detail: LodDetail::Full,
        },
        LodLevel {
            distance: 50.0,
            detail: LodDetail::Simplified,
        },
        LodLevel {
            distance: 200.0,
            detail: LodDetail::BoundingBox,
        },
    ])
}

/// Picks which meshes receive a chain: the first `LOD_MESH_BUDGET` heavy
/// ones in traversal order.
pub fn plan_chains(meshes: &[MeshView]) -> Vec<NodeId> {
    meshes
        .iter()
        .filter(|view| view.vertex_count > LOD_VERTEX_THRESHOLD)
        .take(LOD_MESH_BUDGET)
        .map(|view| view.node)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn view(node: u32, vertex_count: u32) -> MeshView {
        MeshView {
            node: NodeId(node),
            vertex_count,
            visible: true,
            has_normal_map: false,
            has_base_texture: false,
            translation: Vec3::ZERO,
            bounding_radius: 1.0,
        }
    }

    #[test]
    fn only_heavy_meshes_get_chains() {
        let views = vec![view(1, 4_000), view(2, 5_000), view(3, 5_001)];
        assert_eq!(plan_chains(&views), vec![NodeId(3)]);
    }

    #[test]
    fn budget_caps_the_pass() {
        let views: Vec<MeshView> = (0..80).map(|i| view(i, 10_000)).collect();
        let planned = plan_chains(&views);
        assert_eq!(planned.len(), LOD_MESH_BUDGET);
        assert_eq!(planned[0], NodeId(0));
        assert_eq!(planned[49], NodeId(49));
    }

    #[test]
    fn standard_chain_covers_the_three_detail_levels() {
        let chain = standard_chain();
        assert_eq!(chain.select(10.0).map(|l| l.detail), Some(LodDetail::Full));
        assert_eq!(
            chain.select(60.0).map(|l| l.detail),
            Some(LodDetail::Simplified)
        );
        assert_eq!(
            chain.select(250.0).map(|l| l.detail),
            Some(LodDetail::BoundingBox)
        );
    }
}
