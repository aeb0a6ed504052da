//! Adaptive render-quality degradation for large models.
//!
//! The viewer keeps oversized models interactive by progressively trading
//! visual quality for memory: dropping vertex attributes, flattening
//! materials, downsampling textures, hiding negligible meshes, and capping
//! renderer settings. This crate owns that policy as an explicit state
//! machine — ordered degradation levels plus one-shot flags — evaluated
//! against the model profile, live heap samples, and the viewport, and
//! applied through the `RenderBackend` capability trait so the rendering
//! layer stays swappable.

pub mod actions;
pub mod backend;
pub mod controller;
pub mod culling;
pub mod device;
pub mod error;
pub mod level;
pub mod lod;
pub mod policy;
pub mod queue;
pub mod sample;
pub mod state;

pub use actions::{Action, ActionPhase, ActionSource, Plan, PlanEntry};
pub use backend::{BackendError, MaterialReplacement, MeshView, RenderBackend, ShadowMode};
pub use controller::{ActionOutcome, QualityController};
pub use culling::{apply_layer_budget, CullingSummary, DistanceCuller};
pub use device::{DeviceClass, Viewport};
pub use error::QualityError;
pub use level::{DegradationLevel, RescaleRule, SizeClass, TextureQuality};
pub use queue::DeferredQueue;
pub use sample::{HeapMonitor, MemorySample, MemorySampler};
pub use state::{OptimizationFlag, OptimizationState};

#[cfg(test)]
pub(crate) mod testutil;
