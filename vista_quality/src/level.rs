use serde::{Deserialize, Serialize};

use vista_scene::{ModelProfile, TextureFilter, TextureSettings};

use crate::device::DeviceClass;

/// Named tiers of render-quality reduction, ordered by severity. The level
/// of a session only moves forward; the sole way back is the explicit user
/// toggle, which resets the whole state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DegradationLevel {
    None,
    Moderate,
    High,
    Critical,
    Emergency,
}

/// File-size bucket a model falls into, the preventive axis of the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    None,
    Moderate,
    Large,
    Critical,
}

impl SizeClass {
    /// Strict thresholds: 50 MB and 100 MB models stay in the lower bucket.
    /// Profiles that fail validation get no size-driven treatment at all.
    pub fn from_profile(profile: &ModelProfile) -> SizeClass {
        if profile.validate().is_err() {
            return SizeClass::None;
        }
        if profile.size_mb > 300.0 {
            SizeClass::Critical
        } else if profile.size_mb > 100.0 {
            SizeClass::Large
        } else if profile.size_mb > 50.0 {
            SizeClass::Moderate
        } else {
            SizeClass::None
        }
    }
}

/// Texture downsampling tiers. Escalation is monotone: the resolved tier is
/// the max of what the branch asked for, the device-class floor, and the
/// size-driven floor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TextureQuality {
    Low,
    Medium,
    High,
    Extreme,
}

/// Resolution reduction attached to the aggressive texture tiers. Applies
/// only to textures wider than `min_width`; the backend floors the result at
/// 32 px a side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RescaleRule {
    pub scale: f32,
    pub min_width: u32,
}

impl TextureQuality {
    pub fn resolve(self, device: DeviceClass, size: SizeClass) -> TextureQuality {
        let device_floor = match device {
            DeviceClass::LowEnd => TextureQuality::High,
            DeviceClass::Standard => TextureQuality::Low,
        };
        let size_floor = match size {
            SizeClass::Critical => TextureQuality::Extreme,
            SizeClass::Large => TextureQuality::High,
            _ => TextureQuality::Low,
        };
        self.max(device_floor).max(size_floor)
    }

    pub fn settings(self) -> TextureSettings {
        match self {
            TextureQuality::Low => TextureSettings {
                min_filter: TextureFilter::LinearMipmapLinear,
                mag_filter: TextureFilter::Linear,
                generate_mipmaps: true,
                anisotropy: 4,
            },
            TextureQuality::Medium => TextureSettings {
                min_filter: TextureFilter::Linear,
                mag_filter: TextureFilter::Linear,
                generate_mipmaps: false,
                anisotropy: 1,
            },
            TextureQuality::High | TextureQuality::Extreme => TextureSettings {
                min_filter: TextureFilter::Nearest,
                mag_filter: TextureFilter::Nearest,
                generate_mipmaps: false,
                anisotropy: 1,
            },
        }
    }

    pub fn rescale_rule(self) -> Option<RescaleRule> {
        match self {
            TextureQuality::High => Some(RescaleRule {
                scale: 0.5,
                min_width: 512,
            }),
            TextureQuality::Extreme => Some(RescaleRule {
                scale: 0.25,
                min_width: 256,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(size_mb: f64) -> ModelProfile {
        ModelProfile {
            size_mb,
            vertex_count: 1000,
            material_count: 1,
        }
    }

    #[test]
    fn levels_are_totally_ordered() {
        assert!(DegradationLevel::None < DegradationLevel::Moderate);
        assert!(DegradationLevel::Moderate < DegradationLevel::High);
        assert!(DegradationLevel::High < DegradationLevel::Critical);
        assert!(DegradationLevel::Critical < DegradationLevel::Emergency);
    }

    #[test]
    fn size_class_uses_strict_thresholds() {
        assert_eq!(SizeClass::from_profile(&profile(50.0)), SizeClass::None);
        assert_eq!(SizeClass::from_profile(&profile(50.1)), SizeClass::Moderate);
        assert_eq!(SizeClass::from_profile(&profile(100.0)), SizeClass::Moderate);
        assert_eq!(SizeClass::from_profile(&profile(150.0)), SizeClass::Large);
        assert_eq!(SizeClass::from_profile(&profile(300.0)), SizeClass::Large);
        assert_eq!(SizeClass::from_profile(&profile(350.0)), SizeClass::Critical);
    }

    #[test]
    fn invalid_profile_maps_to_no_size_class() {
        assert_eq!(SizeClass::from_profile(&profile(0.0)), SizeClass::None);
        assert_eq!(SizeClass::from_profile(&profile(f64::NAN)), SizeClass::None);
    }

    #[test]
    fn texture_resolution_is_monotone_in_all_floors() {
        // Device floor.
        assert_eq!(
            TextureQuality::Medium.resolve(DeviceClass::LowEnd, SizeClass::None),
            TextureQuality::High
        );
        // Size floors.
        assert_eq!(
            TextureQuality::Medium.resolve(DeviceClass::Standard, SizeClass::Critical),
            TextureQuality::Extreme
        );
        assert_eq!(
            TextureQuality::Medium.resolve(DeviceClass::Standard, SizeClass::Large),
            TextureQuality::High
        );
        // A stronger request never downgrades.
        assert_eq!(
            TextureQuality::Extreme.resolve(DeviceClass::Standard, SizeClass::None),
            TextureQuality::Extreme
        );
    }

    #[test]
    fn aggressive_tiers_carry_rescale_rules() {
        assert!(TextureQuality::Medium.rescale_rule().is_none());
        let high = TextureQuality::High.rescale_rule().expect("rule");
        assert_eq!((high.scale, high.min_width), (0.5, 512));
        let extreme = TextureQuality::Extreme.rescale_rule().expect("rule");
        assert_eq!((extreme.scale, extreme.min_width), (0.25, 256));
    }
}
