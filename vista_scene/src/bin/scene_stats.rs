use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use vista_scene::{load_scene, LayerSet, ModelStats};

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: scene_stats <scene snapshot JSON>")?;
    let (graph, profile) = load_scene(&path)?;
    let stats = ModelStats::from_graph(&graph);

    println!("{} ({:.1} MB)", path.display(), profile.size_mb);
    println!("  vertices  {:>12}", stats.vertices);
    println!("  triangles {:>12}", stats.triangles);
    println!("  meshes    {:>12}", stats.meshes);
    println!("  nodes     {:>12}", stats.nodes);
    println!("  materials {:>12}", stats.materials);
    println!("  textures  {:>12}", stats.textures);

    let layers = LayerSet::from_graph(&graph);
    println!("  layers    {:>12}", layers.len());
    for layer in layers.largest_first() {
        println!(
            "    {name:<32} {vertices:>10} vertices in {meshes} meshes",
            name = layer.name,
            vertices = layer.vertex_count,
            meshes = layer.mesh_count
        );
    }
    Ok(())
}
