/// Renderer-side scene graph: what is actually on screen this frame
use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use crossterm::style::Color;
use cubedeck_core::hit_test::MeshScene;
use cubedeck_core::texture::Placeholder;
use cubedeck_core::{CubeIndex, CubePose, FaceTexture, MaterialSlot};
use nalgebra::Point3;
use tracing::warn;

/// How one face is painted in ASCII
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceShade {
    /// Captured page, drawn with the snapshot's mean brightness
    Snapshot { luminance: f32 },
    Placeholder { color: Color, label: u8, marker: bool },
}

impl FaceShade {
    pub fn from_texture(texture: &FaceTexture) -> Self {
        match texture {
            FaceTexture::Cached(url) => {
                let luminance = mean_luminance(&url.payload).unwrap_or_else(|| {
                    warn!(mime = %url.mime, "snapshot could not be decoded for shading");
                    0.5
                });
                FaceShade::Snapshot { luminance }
            }
            FaceTexture::Placeholder(placeholder) => Self::placeholder(placeholder),
        }
    }

    fn placeholder(placeholder: &Placeholder) -> Self {
        let (r, g, b) = hue_to_rgb(placeholder.hue);
        FaceShade::Placeholder {
            color: Color::Rgb { r, g, b },
            label: placeholder.label,
            marker: placeholder.marker,
        }
    }
}

impl Default for FaceShade {
    fn default() -> Self {
        FaceShade::Placeholder {
            color: Color::Grey,
            label: 0,
            marker: true,
        }
    }
}

fn mean_luminance(payload: &str) -> Option<f32> {
    let bytes = STANDARD.decode(payload).ok()?;
    let image = image::load_from_memory(&bytes).ok()?.to_luma8();
    let count = image.width() as usize * image.height() as usize;
    if count == 0 {
        return None;
    }
    let total: u64 = image.pixels().map(|pixel| u64::from(pixel.0[0])).sum();
    Some(total as f32 / count as f32 / 255.0)
}

/// Fully saturated colour at half lightness
fn hue_to_rgb(hue: u16) -> (u8, u8, u8) {
    let h = f32::from(hue % 360) / 60.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    let (r, g, b) = match h as u32 {
        0 => (1.0, x, 0.0),
        1 => (x, 1.0, 0.0),
        2 => (0.0, 1.0, x),
        3 => (0.0, x, 1.0),
        4 => (x, 0.0, 1.0),
        _ => (1.0, 0.0, x),
    };
    let channel = |value: f32| (value * 255.0).round() as u8;
    (channel(r), channel(g), channel(b))
}

#[derive(Debug, Clone)]
pub struct Scene {
    pub poses: BTreeMap<CubeIndex, CubePose>,
    pub camera: Point3<f32>,
    shades: BTreeMap<CubeIndex, [FaceShade; MaterialSlot::COUNT]>,
}

impl Scene {
    pub fn new(camera: Point3<f32>) -> Self {
        Self {
            poses: BTreeMap::new(),
            camera,
            shades: BTreeMap::new(),
        }
    }

    pub fn set_shade(&mut self, cube: CubeIndex, slot: MaterialSlot, shade: FaceShade) {
        self.shades.entry(cube).or_default()[slot.get()] = shade;
    }

    pub fn shades(&self, cube: CubeIndex) -> [FaceShade; MaterialSlot::COUNT] {
        self.shades.get(&cube).copied().unwrap_or_default()
    }

    /// Ray caster over the cubes as currently drawn
    pub fn ray_caster(&self) -> MeshScene {
        MeshScene::new(self.poses.iter().map(|(cube, pose)| (*cube, pose)))
    }
}
