/// Floating URL label above the active cube
use nalgebra::Matrix4;

use crate::binding::FaceBinding;
use crate::projection::Camera;
use crate::transform::CubePose;

/// Screen pixels between the cube centre and the label anchor
pub const LABEL_OFFSET: f32 = 50.0;

#[derive(Debug, Clone, PartialEq)]
pub struct UrlLabel {
    pub text: String,
    /// Horizontal centre of the label
    pub x: f32,
    /// Bottom edge of the label
    pub y: f32,
}

/// Label for a bound face, or `None` when the face has no page or the
/// cube is off screen
pub fn url_label(binding: &FaceBinding, pose: &CubePose, camera: &Camera) -> Option<UrlLabel> {
    let text = binding.url.clone()?;
    let (width, height) = camera.viewport();
    let (x, y, _) = camera.project_to_screen(&pose.position, &Matrix4::identity(), width, height)?;
    Some(UrlLabel {
        text,
        x,
        y: y - LABEL_OFFSET,
    })
}
