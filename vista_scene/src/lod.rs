use serde::{Deserialize, Serialize};

/// What gets rendered at a given LOD level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LodDetail {
    /// The original mesh, untouched.
    Full,
    /// Flat-shaded, nearest-filtered variant of the mesh.
    Simplified,
    /// Bounding-box stand-in for far viewing distances.
    BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LodLevel {
    /// Camera distance at which this level becomes active.
    pub distance: f32,
    pub detail: LodDetail,
}

/// Distance-ordered chain of detail levels installed on a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LodChain {
    levels: Vec<LodLevel>,
}

impl LodChain {
    pub fn new(mut levels: Vec<LodLevel>) -> Self {
        levels.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        LodChain { levels }
    }

    pub fn levels(&self) -> &[LodLevel] {
        &self.levels
    }

    /// The level active at `distance`: the last one whose threshold has been
    /// passed, or the nearest level when the camera is closer than all of
    /// them.
    pub fn select(&self, distance: f32) -> Option<&LodLevel> {
        let mut active = self.levels.first()?;
        for level in &self.levels {
            if distance >= level.distance {
                active = level;
            }
        }
        Some(active)
    }
}
