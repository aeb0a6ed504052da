use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tempfile::tempdir;

fn write_scene(path: &Path, file_size_mb: f64) -> Result<()> {
    let scene = json!({
        "name": "regression model",
        "file_size_mb": file_size_mb,
        "nodes": [
            { "name": "hull" },
            {
                "name": "plating",
                "parent": 0,
                "mesh": {
                    "vertex_count": 20000,
                    "attributes": ["normal", "uv", "color", "tangent"],
                    "material": {
                        "kind": "standard",
                        "maps": { "base": { "width": 1024, "height": 1024 } }
                    }
                }
            },
            {
                "name": "rivet",
                "parent": 0,
                "translation": [0.0, 0.0, 0.0],
                "mesh": { "vertex_count": 8 }
            },
            {
                "name": "antenna",
                "mesh": { "vertex_count": 900 }
            }
        ]
    });
    fs::write(path, serde_json::to_string_pretty(&scene)?)
        .with_context(|| format!("writing scene to {}", path.display()))
}

fn write_trace(path: &Path, spike_at_ms: u64) -> Result<()> {
    let trace = json!([
        { "at_ms": 0, "used_mb": 400.0, "limit_mb": 2000.0 },
        { "at_ms": spike_at_ms, "used_mb": 1920.0, "limit_mb": 2000.0 }
    ]);
    fs::write(path, serde_json::to_string_pretty(&trace)?)
        .with_context(|| format!("writing trace to {}", path.display()))
}

fn run_viewer(args: &[&str]) -> Result<String> {
    let output = Command::new(env!("CARGO_BIN_EXE_vista_viewer"))
        .args(args)
        .output()
        .context("spawning vista_viewer")?;
    if !output.status.success() {
        let mut transcript = String::from_utf8_lossy(&output.stdout).to_string();
        transcript.push_str(&String::from_utf8_lossy(&output.stderr));
        panic!("vista_viewer exited with {:?}: {}", output.status, transcript);
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

fn load_report(path: &Path) -> Result<Value> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading report {}", path.display()))?;
    serde_json::from_str(&data).context("parsing report JSON")
}

#[test]
fn critical_model_session_report() -> Result<()> {
    let temp = tempdir().context("creating temp dir")?;
    let scene_path = temp.path().join("scene.json");
    let report_path = temp.path().join("report.json");
    write_scene(&scene_path, 350.0)?;

    run_viewer(&[
        "--scene",
        scene_path.to_str().context("scene path utf-8")?,
        "--ticks",
        "10",
        "--device-class",
        "standard",
        "--report-json",
        report_path.to_str().context("report path utf-8")?,
    ])?;

    let report = load_report(&report_path)?;
    assert_eq!(report["final_level"], "critical");
    assert_eq!(report["applied_flags"], json!(["critical"]));
    assert_eq!(report["pixel_ratio"], 1.0);
    assert_eq!(report["shadow_mode"], "off");
    assert_eq!(report["gc_requests"], 1);
    // The plating mesh is heavy enough for an LOD chain.
    let installed_lod = report["actions"]
        .as_array()
        .context("actions array")?
        .iter()
        .any(|record| record["action"]["action"] == "install_lod" && record["ok"] == true);
    assert!(installed_lod, "expected an install_lod record");
    Ok(())
}

#[test]
fn memory_spike_session_report() -> Result<()> {
    let temp = tempdir().context("creating temp dir")?;
    let scene_path = temp.path().join("scene.json");
    let trace_path = temp.path().join("trace.json");
    let report_path = temp.path().join("report.json");
    write_scene(&scene_path, 20.0)?;
    write_trace(&trace_path, 300)?;

    run_viewer(&[
        "--scene",
        scene_path.to_str().context("scene path utf-8")?,
        "--memory-trace",
        trace_path.to_str().context("trace path utf-8")?,
        "--ticks",
        "60",
        "--device-class",
        "standard",
        "--report-json",
        report_path.to_str().context("report path utf-8")?,
    ])?;

    let report = load_report(&report_path)?;
    assert_eq!(report["final_level"], "emergency");
    assert_eq!(report["applied_flags"], json!(["emergency"]));
    assert_eq!(report["pixel_ratio"], 1.0);
    assert_eq!(report["canvas_scale"], 0.75);

    // Emergency work happened exactly once despite sustained pressure.
    let emergency_gcs = report["actions"]
        .as_array()
        .context("actions array")?
        .iter()
        .filter(|record| {
            record["source"] == json!({ "flag": "emergency" })
                && record["action"]["action"] == "request_gc"
        })
        .count();
    assert_eq!(emergency_gcs, 1);
    Ok(())
}

#[test]
fn toggle_session_restores_and_rederives() -> Result<()> {
    let temp = tempdir().context("creating temp dir")?;
    let scene_path = temp.path().join("scene.json");
    let report_path = temp.path().join("report.json");
    write_scene(&scene_path, 150.0)?;

    run_viewer(&[
        "--scene",
        scene_path.to_str().context("scene path utf-8")?,
        "--ticks",
        "30",
        "--device-class",
        "standard",
        "--disable-aggressive-at",
        "10",
        "--enable-aggressive-at",
        "20",
        "--report-json",
        report_path.to_str().context("report path utf-8")?,
    ])?;

    let report = load_report(&report_path)?;
    // Re-derivation lands back on the large branch, not on pristine NONE.
    assert_eq!(report["final_level"], "high");
    assert_eq!(report["applied_flags"], json!(["large"]));
    assert_eq!(report["aggressive_enabled"], true);
    assert_eq!(report["pixel_ratio"], 1.5);
    assert_eq!(report["shadow_mode"], "basic");

    // A restore pass ran when the user disabled aggressive mode.
    let restored = report["actions"]
        .as_array()
        .context("actions array")?
        .iter()
        .any(|record| record["action"]["action"] == "restore_visibility");
    assert!(restored, "expected a restore_visibility record");
    Ok(())
}

#[test]
fn stats_mode_prints_and_exits() -> Result<()> {
    let temp = tempdir().context("creating temp dir")?;
    let scene_path = temp.path().join("scene.json");
    write_scene(&scene_path, 42.0)?;

    let stdout = run_viewer(&[
        "--scene",
        scene_path.to_str().context("scene path utf-8")?,
        "--stats",
    ])?;
    assert!(stdout.contains("20908 vertices"), "stdout was: {stdout}");
    assert!(stdout.contains("layer hull"), "stdout was: {stdout}");
    Ok(())
}
