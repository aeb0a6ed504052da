//! Scene-graph data model for the vista viewer.
//!
//! This crate owns the in-memory shape of a loaded model: the node arena,
//! mesh/material/texture metadata, the load-time profile and statistics, and
//! the JSON snapshot format the host and tests exchange. It deliberately knows
//! nothing about degradation policy; `vista_quality` consumes these types
//! through its backend trait.

pub mod graph;
pub mod layers;
pub mod lod;
pub mod material;
pub mod profile;
pub mod snapshot;

pub use graph::{AttributeKind, Mesh, Node, NodeId, SceneGraph};
pub use layers::{Layer, LayerSet};
pub use lod::{LodChain, LodDetail, LodLevel};
pub use material::{Material, MaterialKind, MaterialMaps, MapSlot, Texture, TextureFilter, TextureSettings};
pub use profile::{ModelProfile, ModelStats, ProfileError};
pub use snapshot::{load_scene, MeshSnapshot, NodeSnapshot, SceneSnapshot, SnapshotError};
