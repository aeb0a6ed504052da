use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use vista_quality::{DeviceClass, Viewport};

#[derive(Parser, Debug)]
#[command(
    about = "Headless viewer host that replays quality-degradation sessions",
    version
)]
pub struct Args {
    /// Scene snapshot JSON describing the loaded model
    #[arg(long)]
    pub scene: PathBuf,

    /// Recorded heap trace JSON; omit to run without heap introspection
    #[arg(long)]
    pub memory_trace: Option<PathBuf>,

    /// Number of simulated render ticks
    #[arg(long, default_value_t = 60)]
    pub ticks: u32,

    /// Simulated milliseconds per tick
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u64,

    /// Viewport as WIDTHxHEIGHT
    #[arg(long, default_value = "1280x720")]
    pub viewport: String,

    /// Device class override; detected from available parallelism when unset
    #[arg(long, value_enum)]
    pub device_class: Option<DeviceClassArg>,

    /// Disable aggressive optimizations at the given tick
    #[arg(long)]
    pub disable_aggressive_at: Option<u32>,

    /// Re-enable aggressive optimizations at the given tick
    #[arg(long)]
    pub enable_aggressive_at: Option<u32>,

    /// Keep only the N heaviest layers visible after load
    #[arg(long)]
    pub layer_budget: Option<usize>,

    /// Path to write the session report JSON
    #[arg(long)]
    pub report_json: Option<PathBuf>,

    /// Print model statistics and exit
    #[arg(long)]
    pub stats: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DeviceClassArg {
    Standard,
    LowEnd,
}

impl Args {
    pub fn device(&self) -> DeviceClass {
        match self.device_class {
            Some(DeviceClassArg::Standard) => DeviceClass::Standard,
            Some(DeviceClassArg::LowEnd) => DeviceClass::LowEnd,
            None => DeviceClass::detect(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let (Some(disable), Some(enable)) =
            (self.disable_aggressive_at, self.enable_aggressive_at)
        {
            if enable <= disable {
                bail!("--enable-aggressive-at must come after --disable-aggressive-at");
            }
        }
        Ok(())
    }
}

pub fn parse_viewport(raw: &str) -> Result<Viewport> {
    let Some((width, height)) = raw.split_once('x') else {
        bail!("viewport must be WIDTHxHEIGHT, got {raw:?}");
    };
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("bad viewport width in {raw:?}"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("bad viewport height in {raw:?}"))?;
    if width == 0 || height == 0 {
        bail!("viewport sides must be non-zero, got {raw:?}");
    }
    Ok(Viewport::new(width, height))
}
