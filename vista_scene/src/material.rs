use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureFilter {
    Nearest,
    Linear,
    LinearMipmapLinear,
}

/// Sampling configuration carried beside the pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSettings {
    pub min_filter: TextureFilter,
    pub mag_filter: TextureFilter,
    pub generate_mipmaps: bool,
    pub anisotropy: u8,
}

impl Default for TextureSettings {
    fn default() -> Self {
        TextureSettings {
            min_filter: TextureFilter::LinearMipmapLinear,
            mag_filter: TextureFilter::Linear,
            generate_mipmaps: true,
            anisotropy: 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    /// Whether the image data has finished decoding. Resizing an unloaded
    /// texture is rejected by the backend and retried later.
    #[serde(default = "default_loaded")]
    pub loaded: bool,
    #[serde(default)]
    pub settings: TextureSettings,
}

fn default_loaded() -> bool {
    true
}

impl Texture {
    pub fn new(width: u32, height: u32) -> Self {
        Texture {
            width,
            height,
            loaded: true,
            settings: TextureSettings::default(),
        }
    }

    /// Scales both sides, never dropping below `floor` pixels.
    pub fn rescale(&mut self, scale: f32, floor: u32) {
        self.width = ((self.width as f32 * scale) as u32).max(floor);
        self.height = ((self.height as f32 * scale) as u32).max(floor);
    }
}

/// Texture slots a material may populate, mirroring the usual PBR set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MapSlot {
    Base,
    Normal,
    Env,
    Light,
    Ao,
    Emissive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialMaps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Texture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal: Option<Texture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<Texture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<Texture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ao: Option<Texture>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emissive: Option<Texture>,
}

impl MaterialMaps {
    pub fn slot_mut(&mut self, slot: MapSlot) -> &mut Option<Texture> {
        match slot {
            MapSlot::Base => &mut self.base,
            MapSlot::Normal => &mut self.normal,
            MapSlot::Env => &mut self.env,
            MapSlot::Light => &mut self.light,
            MapSlot::Ao => &mut self.ao,
            MapSlot::Emissive => &mut self.emissive,
        }
    }

    pub fn clear_slot(&mut self, slot: MapSlot) -> bool {
        self.slot_mut(slot).take().is_some()
    }

    pub fn populated(&self) -> usize {
        [
            &self.base,
            &self.normal,
            &self.env,
            &self.light,
            &self.ao,
            &self.emissive,
        ]
        .into_iter()
        .filter(|slot| slot.is_some())
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKind {
    /// Full shaded material with texture maps.
    Standard,
    /// Unlit flat-color replacement installed by the degradation passes.
    FlatColor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub kind: MaterialKind,
    /// Linear RGB base color, preserved across flat-color replacement.
    #[serde(default = "default_color")]
    pub color: [f32; 3],
    #[serde(default)]
    pub transparent: bool,
    #[serde(default)]
    pub flat_shading: bool,
    #[serde(default = "default_fog")]
    pub fog: bool,
    #[serde(default)]
    pub maps: MaterialMaps,
}

fn default_color() -> [f32; 3] {
    // The fallback grey the original replacement materials use.
    [0.8, 0.8, 0.8]
}

fn default_fog() -> bool {
    true
}

impl Default for Material {
    fn default() -> Self {
        Material {
            kind: MaterialKind::Standard,
            color: default_color(),
            transparent: false,
            flat_shading: false,
            fog: true,
            maps: MaterialMaps::default(),
        }
    }
}

impl Material {
    /// Collapses to the unlit flat-color form, keeping the base color and
    /// dropping every texture slot.
    pub fn flatten(&mut self, flat_shading: bool) {
        self.kind = MaterialKind::FlatColor;
        self.flat_shading = flat_shading;
        self.transparent = false;
        self.fog = false;
        self.maps = MaterialMaps::default();
    }
}
