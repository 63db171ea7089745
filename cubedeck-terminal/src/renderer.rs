/// ASCII rasterizer for terminal rendering
use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use cubedeck_core::{Camera, FaceIndex, MaterialSlot, Mesh, Triangle};
use nalgebra::{Matrix4, Point3, Vector3};
use std::io::Write;

use crate::scene::FaceShade;

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Depth slack when deciding whether a face label is visible
const LABEL_DEPTH_EPSILON: f32 = 1e-3;

/// ASCII renderer that converts cube meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    color_buffer: Vec<Color>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            color_buffer: vec![Color::Reset; size],
        }
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(' ');
        self.color_buffer.fill(Color::Reset);
    }

    /// Character at a cell, for inspection
    pub fn cell(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// Draw one cube; `shades` is indexed by material slot
    pub fn render_cube(
        &mut self,
        mesh: &Mesh,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        shades: &[FaceShade; MaterialSlot::COUNT],
    ) {
        for (index, triangle) in mesh.triangles.iter().enumerate() {
            let Some(face) = FaceIndex::from_triangle(index) else {
                continue;
            };
            let shade = shades[MaterialSlot::from(face).get()];
            self.render_triangle(&triangle.transformed(model_matrix), camera, shade);
        }
        for face in FaceIndex::ALL {
            if let FaceShade::Placeholder { label, marker, .. } = shades[MaterialSlot::from(face).get()] {
                let glyph = if marker { '+' } else { char::from(b'0' + label % 10) };
                self.stamp_face_label(mesh, model_matrix, camera, face, glyph);
            }
        }
    }

    fn render_triangle(&mut self, triangle: &Triangle, camera: &Camera, shade: FaceShade) {
        // Project vertices to screen space
        let mut screen_coords = Vec::with_capacity(3);
        for vertex in &triangle.vertices {
            match self.project(camera, &vertex.position) {
                Some(coords) => screen_coords.push(coords),
                None => return, // Triangle is clipped
            }
        }

        // Light from the camera
        let normal = triangle.calculate_normal();
        let light_dir: Vector3<f32> = (camera.position - triangle.vertices[0].position).normalize();
        let lighting = normal.dot(&light_dir).max(0.0);
        if lighting <= 0.0 {
            return;
        }

        let (brightness, color) = match shade {
            FaceShade::Snapshot { luminance } => ((0.35 + 0.65 * lighting) * luminance, Color::Green),
            FaceShade::Placeholder { color, .. } => (0.3 + 0.7 * lighting, color),
        };

        // Map brightness to character
        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        let char_index = char_index.clamp(1, LUMINOSITY_RAMP.len() - 1);
        let character = LUMINOSITY_RAMP[char_index];

        // Rasterize triangle using scanline algorithm
        self.rasterize_triangle(&screen_coords, character, color);
    }

    fn project(&self, camera: &Camera, point: &Point3<f32>) -> Option<(f32, f32, f32)> {
        camera.project_to_screen(
            point,
            &Matrix4::identity(),
            self.width as u32,
            self.height as u32,
        )
    }

    /// Put `glyph` at the centre of `face` when that point is not occluded
    fn stamp_face_label(
        &mut self,
        mesh: &Mesh,
        model_matrix: &Matrix4<f32>,
        camera: &Camera,
        face: FaceIndex,
        glyph: char,
    ) {
        let first = (usize::from(face.get()) - 1) * 2;
        let Some(triangles) = mesh.triangles.get(first..first + 2) else {
            return;
        };
        let sum = triangles
            .iter()
            .flat_map(|triangle| triangle.vertices.iter())
            .fold(Vector3::zeros(), |acc, vertex| acc + vertex.position.coords);
        let centre = model_matrix.transform_point(&Point3::from(sum / 6.0));
        let Some((x, y, depth)) = self.project(camera, &centre) else {
            return;
        };
        let (x, y) = (x.floor() as i64, y.floor() as i64);
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        if depth <= self.depth_buffer[idx] + LABEL_DEPTH_EPSILON {
            self.char_buffer[idx] = glyph;
            self.color_buffer[idx] = Color::White;
        }
    }

    fn rasterize_triangle(&mut self, coords: &[(f32, f32, f32)], character: char, color: Color) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        // Scanline rasterization
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                // Barycentric coordinates
                if let Some((w0, w1, w2)) = barycentric(
                    (v0.0, v0.1),
                    (v1.0, v1.1),
                    (v2.0, v2.1),
                    (px, py),
                ) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        // Interpolate depth
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                            self.color_buffer[idx] = color;
                        }
                    }
                }
            }
        }
    }

    /// Overwrite cells with text, clipped to the buffer
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, color: Color) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        for (offset, c) in text.chars().enumerate() {
            let column = x + offset as i32;
            if column < 0 {
                continue;
            }
            if column >= self.width as i32 {
                break;
            }
            let idx = y as usize * self.width + column as usize;
            self.char_buffer[idx] = c;
            self.color_buffer[idx] = color;
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let mut current = None;
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let color = self.color_buffer[idx];
                if current != Some(color) {
                    writer.queue(SetForegroundColor(color))?;
                    current = Some(color);
                }
                writer.queue(Print(self.char_buffer[idx]))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(
    v0: (f32, f32),
    v1: (f32, f32),
    v2: (f32, f32),
    p: (f32, f32),
) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cubedeck_core::CubePose;

    fn render(shades: [FaceShade; 6]) -> AsciiRenderer {
        let camera = Camera::new(80, 40);
        let pose = CubePose::new(Point3::new(0.0, 0.0, -10.0), 8.0);
        let mut renderer = AsciiRenderer::new(80, 40);
        renderer.render_cube(&Mesh::cube(1.0), &pose.model_matrix(), &camera, &shades);
        renderer
    }

    #[test]
    fn test_front_face_fills_centre() {
        let renderer = render([FaceShade::Snapshot { luminance: 1.0 }; 6]);
        assert!(matches!(renderer.cell(40, 20), Some('#' | '%' | '@')));
        assert_eq!(renderer.cell(0, 0), Some(' '));
    }

    #[test]
    fn test_placeholder_label_stamped_on_visible_face() {
        let renderer = render([FaceShade::Placeholder {
            color: Color::Blue,
            label: 2,
            marker: false,
        }; 6]);
        assert_eq!(renderer.cell(40, 20), Some('2'));
    }

    #[test]
    fn test_draw_text_clips() {
        let mut renderer = AsciiRenderer::new(4, 1);
        renderer.draw_text(-1, 0, "abcdef", Color::White);
        assert_eq!(renderer.cell(0, 0), Some('b'));
        assert_eq!(renderer.cell(3, 0), Some('e'));
        renderer.draw_text(0, 5, "zz", Color::White);
    }

    #[test]
    fn test_barycentric_centroid() {
        let (w0, w1, w2) = barycentric((0.0, 0.0), (3.0, 0.0), (0.0, 3.0), (1.0, 1.0)).unwrap();
        assert!((w0 - 1.0 / 3.0).abs() < 1e-5);
        assert!((w1 - 1.0 / 3.0).abs() < 1e-5);
        assert!((w2 - 1.0 / 3.0).abs() < 1e-5);
    }
}
