/// Cube poses and the matrices built from them
use std::f32::consts::FRAC_PI_2;

use nalgebra::{Matrix4, Point3, Vector3};

use crate::face::Direction;

/// Rotation around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationState {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl RotationState {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f32, dy: f32, dz: f32) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Copy turned a quarter around the vertical axis
    pub fn quarter_turn(&self, direction: Direction) -> Self {
        let mut turned = *self;
        turned.rotate(0.0, FRAC_PI_2 * direction.sign() as f32, 0.0);
        turned
    }

    pub fn lerp(&self, to: &RotationState, t: f32) -> Self {
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            z: self.z + (to.z - self.z) * t,
        }
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Where a cube sits in the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubePose {
    pub position: Point3<f32>,
    pub scale: f32,
    pub rotation: RotationState,
}

impl CubePose {
    pub fn new(position: Point3<f32>, scale: f32) -> Self {
        Self {
            position,
            scale,
            rotation: RotationState::zero(),
        }
    }

    /// Same rotation, new position and scale
    pub fn moved_to(&self, position: Point3<f32>, scale: f32) -> Self {
        Self {
            position,
            scale,
            rotation: self.rotation,
        }
    }

    pub fn lerp(&self, to: &CubePose, t: f32) -> Self {
        Self {
            position: self.position + (to.position - self.position) * t,
            scale: self.scale + (to.scale - self.scale) * t,
            rotation: self.rotation.lerp(&to.rotation, t),
        }
    }

    /// Translation * rotation * uniform scale
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::translation_matrix(self.position.x, self.position.y, self.position.z)
            * Transform::rotation_matrix(&self.rotation)
            * Transform::scale_matrix(self.scale, self.scale, self.scale)
    }
}

/// Transform builder for 3D transformations
pub struct Transform;

impl Transform {
    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4<f32> {
        let rx = Matrix4::new_rotation(Vector3::new(rotation.x, 0.0, 0.0));
        let ry = Matrix4::new_rotation(Vector3::new(0.0, rotation.y, 0.0));
        let rz = Matrix4::new_rotation(Vector3::new(0.0, 0.0, rotation.z));

        // Apply rotations in order: Z, Y, X
        rz * ry * rx
    }

    pub fn translation_matrix(x: f32, y: f32, z: f32) -> Matrix4<f32> {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    pub fn scale_matrix(sx: f32, sy: f32, sz: f32) -> Matrix4<f32> {
        Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz))
    }
}
