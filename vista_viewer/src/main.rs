use anyhow::{Context, Result};
use clap::Parser;
use vista_quality::HeapMonitor;
use vista_scene::{load_scene, LayerSet, ModelStats};

mod backend;
mod cli;
mod report;
mod session;
mod trace;

use backend::SceneBackend;
use cli::Args;
use session::{Session, SessionConfig};
use trace::{NullMonitor, TraceMonitor};

fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;

    env_logger::init();

    let (graph, profile) = load_scene(&args.scene).context("loading scene snapshot")?;

    if args.stats {
        let stats = ModelStats::from_graph(&graph);
        println!(
            "{} ({:.1} MB): {} vertices, {} triangles, {} meshes, {} nodes",
            args.scene.display(),
            profile.size_mb,
            stats.vertices,
            stats.triangles,
            stats.meshes,
            stats.nodes
        );
        let layers = LayerSet::from_graph(&graph);
        for layer in layers.largest_first() {
            println!(
                "  layer {name:<32} {vertices:>10} vertices",
                name = layer.name,
                vertices = layer.vertex_count
            );
        }
        return Ok(());
    }

    let viewport = cli::parse_viewport(&args.viewport)?;
    let device = args.device();
    let monitor: Box<dyn HeapMonitor> = match args.memory_trace.as_ref() {
        Some(path) => Box::new(TraceMonitor::load(path).context("loading memory trace")?),
        None => Box::new(NullMonitor),
    };

    let config = SessionConfig {
        ticks: args.ticks,
        tick_ms: args.tick_ms,
        viewport,
        device,
        disable_aggressive_at: args.disable_aggressive_at,
        enable_aggressive_at: args.enable_aggressive_at,
        layer_budget: args.layer_budget,
    };
    let session = Session::new(SceneBackend::new(graph), profile, monitor, config);
    let report = session.run();

    println!(
        "Session over {} ticks settled at level {:?} (flags: {:?})",
        report.ticks, report.final_level, report.applied_flags
    );
    println!(
        "  pixel ratio {:.2}, shadow mode {:?}, canvas scale {:.2}, {} hidden meshes, {} culled",
        report.pixel_ratio,
        report.shadow_mode,
        report.canvas_scale,
        report.hidden_meshes,
        report.culled_meshes
    );

    if let Some(path) = args.report_json.as_ref() {
        report.write(path)?;
        println!("Saved session report to {}", path.display());
    }

    Ok(())
}
