/// Geometry primitives: triangles, the unit cube mesh and rays
use nalgebra::{Matrix4, Point3, Vector3};

use crate::face::{Face, FaceIndex};

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(position: Point3<f32>, normal: Vector3<f32>) -> Self {
        Self { position, normal }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertices
    pub fn calculate_normal(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).normalize()
    }

    /// Copy with every vertex run through `matrix`
    pub fn transformed(&self, matrix: &Matrix4<f32>) -> Self {
        Self {
            vertices: self.vertices.map(|vertex| Vertex {
                position: matrix.transform_point(&vertex.position),
                normal: matrix.transform_vector(&vertex.normal).normalize(),
            }),
        }
    }

    /// Möller–Trumbore; distance along the ray to the hit, if any
    pub fn intersect(&self, ray: &Ray) -> Option<f32> {
        const EPSILON: f32 = 1e-6;
        let v0 = self.vertices[0].position;
        let edge1 = self.vertices[1].position - v0;
        let edge2 = self.vertices[2].position - v0;

        let p = ray.direction.cross(&edge2);
        let det = edge1.dot(&p);
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = ray.origin - v0;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&edge1);
        let v = ray.direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(&q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

/// A half-line with a unit direction
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}

impl Ray {
    pub fn new(origin: Point3<f32>, direction: Vector3<f32>) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    pub fn at(&self, distance: f32) -> Point3<f32> {
        self.origin + self.direction * distance
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    fn add_quad(&mut self, corners: [[f32; 3]; 4], normal: Vector3<f32>) {
        let [p0, p1, p2, p3] = corners.map(|[x, y, z]| Vertex::new(Point3::new(x, y, z), normal));
        self.add_triangle(Triangle::new(p0, p1, p2));
        self.add_triangle(Triangle::new(p0, p2, p3));
    }

    /// Cube with two triangles per face, ordered by stored face index so
    /// triangles `2k` and `2k + 1` belong to face `k + 1`
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        let mut mesh = Self::with_capacity(12);

        for index in FaceIndex::ALL {
            let face = Face::from_index(index);
            let (corners, normal) = match face {
                Face::Left => (
                    [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
                    -Vector3::x(),
                ),
                Face::Front => (
                    [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
                    Vector3::z(),
                ),
                Face::Back => (
                    [[-h, -h, -h], [-h, h, -h], [h, h, -h], [h, -h, -h]],
                    -Vector3::z(),
                ),
                Face::Top => (
                    [[-h, h, -h], [-h, h, h], [h, h, h], [h, h, -h]],
                    Vector3::y(),
                ),
                Face::Bottom => (
                    [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
                    -Vector3::y(),
                ),
                Face::Right => (
                    [[h, -h, -h], [h, h, -h], [h, h, h], [h, -h, h]],
                    Vector3::x(),
                ),
            };
            mesh.add_quad(corners, normal);
        }

        mesh
    }

    /// Nearest triangle hit by `ray` once the mesh is placed by `model`
    pub fn raycast(&self, ray: &Ray, model: &Matrix4<f32>) -> Option<(usize, f32)> {
        self.triangles
            .iter()
            .enumerate()
            .filter_map(|(index, triangle)| {
                triangle
                    .transformed(model)
                    .intersect(ray)
                    .map(|distance| (index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
