/// Hit-test resolver: pointer position to a face of the active cube
use nalgebra::Matrix4;
use tracing::debug;

use crate::binding::CubeIndex;
use crate::face::FaceIndex;
use crate::geometry::{Mesh, Ray};
use crate::projection::Camera;
use crate::transform::CubePose;

/// One ray/triangle hit reported by the renderer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub cube: CubeIndex,
    pub triangle_index: usize,
    pub distance: f32,
}

/// The renderer's ray intersection facility
pub trait RayCaster {
    /// All hits, nearest first
    fn intersect(&self, ray: &Ray) -> Vec<Intersection>;
}

/// Face of `active` under the viewport point `(x, y)`.
///
/// Only the nearest hit counts; if it belongs to another cube the click
/// is ignored.
pub fn resolve(
    x: f32,
    y: f32,
    camera: &Camera,
    caster: &impl RayCaster,
    active: CubeIndex,
) -> Option<FaceIndex> {
    let (ndc_x, ndc_y) = camera.viewport_to_ndc(x, y);
    let ray = camera.ray_through(ndc_x, ndc_y)?;
    let nearest = caster.intersect(&ray).into_iter().next()?;
    if nearest.cube != active {
        debug!(hit = %nearest.cube, active = %active, "click on inactive cube ignored");
        return None;
    }
    FaceIndex::from_triangle(nearest.triangle_index)
}

/// Unit cubes placed by pose; a reference ray caster for hosts without one
#[derive(Debug, Clone)]
pub struct MeshScene {
    mesh: Mesh,
    instances: Vec<(CubeIndex, Matrix4<f32>)>,
}

impl MeshScene {
    pub fn new<'a>(poses: impl IntoIterator<Item = (CubeIndex, &'a CubePose)>) -> Self {
        Self {
            mesh: Mesh::cube(1.0),
            instances: poses
                .into_iter()
                .map(|(cube, pose)| (cube, pose.model_matrix()))
                .collect(),
        }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn instances(&self) -> &[(CubeIndex, Matrix4<f32>)] {
        &self.instances
    }
}

impl RayCaster for MeshScene {
    fn intersect(&self, ray: &Ray) -> Vec<Intersection> {
        let mut hits: Vec<Intersection> = self
            .instances
            .iter()
            .filter_map(|(cube, model)| {
                self.mesh
                    .raycast(ray, model)
                    .map(|(triangle_index, distance)| Intersection {
                        cube: *cube,
                        triangle_index,
                        distance,
                    })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::Face;
    use nalgebra::Point3;

    struct Fixed(Vec<Intersection>);

    impl RayCaster for Fixed {
        fn intersect(&self, _ray: &Ray) -> Vec<Intersection> {
            self.0.clone()
        }
    }

    fn hit(cube: u32, triangle_index: usize, distance: f32) -> Intersection {
        Intersection {
            cube: CubeIndex(cube),
            triangle_index,
            distance,
        }
    }

    #[test]
    fn test_triangle_five_is_face_three() {
        let camera = Camera::default();
        let caster = Fixed(vec![hit(0, 5, 1.0)]);
        let face = resolve(400.0, 300.0, &camera, &caster, CubeIndex(0));
        assert_eq!(face, FaceIndex::new(3).ok());
    }

    #[test]
    fn test_nearest_hit_on_inactive_cube_is_ignored() {
        let camera = Camera::default();
        let caster = Fixed(vec![hit(1, 0, 1.0), hit(0, 4, 2.0)]);
        assert_eq!(resolve(400.0, 300.0, &camera, &caster, CubeIndex(0)), None);
    }

    #[test]
    fn test_miss_resolves_nothing() {
        let camera = Camera::default();
        assert_eq!(resolve(1.0, 1.0, &camera, &Fixed(Vec::new()), CubeIndex(0)), None);
    }

    #[test]
    fn test_mesh_scene_front_face_under_center() {
        let camera = Camera::new(800, 600);
        let active = CubePose::new(Point3::new(0.0, 0.0, -10.0), 8.0);
        let ring = CubePose::new(Point3::new(15.0, 10.0, -15.0), 4.0);
        let scene = MeshScene::new([(CubeIndex(0), &active), (CubeIndex(1), &ring)]);

        let face = resolve(400.0, 300.0, &camera, &scene, CubeIndex(0)).unwrap();
        assert_eq!(Face::from_index(face), Face::Front);
        assert_eq!(resolve(400.0, 300.0, &camera, &scene, CubeIndex(1)), None);
    }
}
