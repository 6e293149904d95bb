// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh data structures

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::transform::{Transform, Transformable};

/// Polygon mesh of triangles and quads sharing a vertex list
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh3D {
    vertices: Vec<Point3<f64>>,
    /// Each face holds 3 or 4 vertex indices
    faces: Vec<Vec<usize>>,
}

impl Mesh3D {
    /// Create a mesh, checking face arity and index bounds
    pub fn new(vertices: Vec<Point3<f64>>, faces: Vec<Vec<usize>>) -> Result<Self> {
        if faces.is_empty() {
            return Err(Error::Degenerate("mesh has no faces".into()));
        }
        for face in &faces {
            if face.len() != 3 && face.len() != 4 {
                return Err(Error::InvalidArgument(format!(
                    "mesh faces must have 3 or 4 vertices, got {}",
                    face.len()
                )));
            }
            if let Some(&index) = face.iter().find(|&&i| i >= vertices.len()) {
                return Err(Error::MeshIndexOutOfRange {
                    index,
                    count: vertices.len(),
                });
            }
        }
        Ok(Self { vertices, faces })
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    #[inline]
    pub fn faces(&self) -> &[Vec<usize>] {
        &self.faces
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Un-normalized cross products per face (length is twice the triangle area)
    fn face_cross(&self, face: &[usize]) -> Vector3<f64> {
        let p = |i: usize| self.vertices[face[i]];
        let mut n = (p(1) - p(0)).cross(&(p(2) - p(0)));
        if face.len() == 4 {
            n += (p(2) - p(0)).cross(&(p(3) - p(0)));
        }
        n
    }

    /// Unit normal of every face (zero for degenerate faces)
    pub fn face_normals(&self) -> Vec<Vector3<f64>> {
        self.faces
            .iter()
            .map(|f| {
                let n = self.face_cross(f);
                let len = n.norm();
                if len > 1e-12 {
                    n / len
                } else {
                    Vector3::zeros()
                }
            })
            .collect()
    }

    /// Area of every face
    pub fn face_areas(&self) -> Vec<f64> {
        self.faces.iter().map(|f| self.face_cross(f).norm() * 0.5).collect()
    }

    pub fn area(&self) -> f64 {
        self.face_areas().iter().sum()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }

    pub fn center(&self) -> Point3<f64> {
        self.bounding_box()
            .map(|bb| bb.center())
            .unwrap_or_else(Point3::origin)
    }


    /// Splits non-planar quads into two triangles and drops faces that
    /// collapse once duplicate and collinear vertices are removed.
    ///
    /// Vertices are kept as they are so face indices stay stable.
    pub fn without_degenerate_faces(&self, tolerance: f64) -> Result<Mesh3D> {
        let mut faces = Vec::with_capacity(self.faces.len());
        for face in &self.faces {
            let parts = if face.len() == 4 && !self.quad_is_planar(face, tolerance) {
                vec![vec![face[0], face[1], face[2]], vec![face[2], face[3], face[0]]]
            } else {
                vec![face.clone()]
            };
            faces.extend(parts.iter().filter_map(|f| self.drop_collinear(f, tolerance)));
        }
        Mesh3D::new(self.vertices.clone(), faces)
    }

    fn quad_is_planar(&self, face: &[usize], tolerance: f64) -> bool {
        let p = |i: usize| self.vertices[face[i]];
        let n = (p(1) - p(0)).cross(&(p(2) - p(0)));
        let len = n.norm();
        if len < 1e-12 {
            return true;
        }
        ((p(3) - p(0)).dot(&n) / len).abs() <= tolerance
    }

    /// Indices left after removing vertices within `tolerance` of the
    /// segment between their neighbours; `None` when fewer than 3 remain.
    fn drop_collinear(&self, face: &[usize], tolerance: f64) -> Option<Vec<usize>> {
        let mut kept = face.to_vec();
        while kept.len() >= 3 {
            let n = kept.len();
            let collinear = (0..n).find(|&i| {
                let prev = &self.vertices[kept[(i + n - 1) % n]];
                let next = &self.vertices[kept[(i + 1) % n]];
                distance_to_segment(&self.vertices[kept[i]], prev, next) <= tolerance
            });
            match collinear {
                Some(i) => {
                    kept.remove(i);
                }
                None => return Some(kept),
            }
        }
        None
    }

    pub fn to_record(&self) -> Mesh3DRecord {
        Mesh3DRecord {
            kind: "Mesh3D".to_string(),
            vertices: self.vertices.iter().map(|p| p.coords.into()).collect(),
            faces: self.faces.clone(),
        }
    }

    pub fn from_record(record: &Mesh3DRecord) -> Result<Self> {
        if record.kind != "Mesh3D" {
            return Err(Error::InvalidRecord(format!(
                "expected Mesh3D, got {}",
                record.kind
            )));
        }
        Self::new(
            record.vertices.iter().map(|c| Point3::from(*c)).collect(),
            record.faces.clone(),
        )
    }
}

impl Transformable for Mesh3D {
    /// Apply a transform to every vertex
    fn transform(&mut self, t: &Transform) {
        for v in self.vertices.iter_mut() {
            *v = t.apply_point(v);
        }
        if t.reverses_orientation() {
            for face in self.faces.iter_mut() {
                face.reverse();
            }
        }
    }
}

fn distance_to_segment(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < 1e-24 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Serialized form of a [`Mesh3D`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh3DRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub vertices: Vec<[f64; 3]>,
    pub faces: Vec<Vec<usize>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_quad() -> Mesh3D {
        Mesh3D::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![vec![0, 1, 2, 3]],
        )
        .unwrap()
    }

    #[test]
    fn quad_area_and_normal() {
        let mesh = unit_quad();
        assert_relative_eq!(mesh.area(), 1.0);
        assert_relative_eq!(mesh.face_normals()[0].z, 1.0);
        assert_relative_eq!(mesh.center().x, 0.5);
    }

    #[test]
    fn rejects_bad_indices() {
        let err = Mesh3D::new(vec![Point3::origin()], vec![vec![0, 1, 2]]).unwrap_err();
        assert_eq!(err, Error::MeshIndexOutOfRange { index: 1, count: 1 });
        assert!(Mesh3D::new(vec![Point3::origin()], vec![vec![0, 0]]).is_err());
    }

    #[test]
    fn degenerate_faces_are_cleaned() {
        let mesh = Mesh3D::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 1.0, 0.5),
                Point3::new(0.5, 0.0, 0.0),
            ],
            vec![
                vec![0, 1, 2, 3],
                vec![1, 4, 5, 2],
                vec![0, 1, 6],
                vec![0, 6, 1, 2],
            ],
        )
        .unwrap();
        let clean = mesh.without_degenerate_faces(0.01).unwrap();
        assert_eq!(
            clean.faces(),
            [vec![0, 1, 2, 3], vec![1, 4, 5], vec![5, 2, 1], vec![0, 1, 2]]
        );
        assert_eq!(clean.vertices().len(), 7);
        assert_relative_eq!(clean.face_areas()[3], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn fully_degenerate_mesh_is_an_error() {
        let mesh = Mesh3D::new(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)],
            vec![vec![0, 1, 2]],
        )
        .unwrap();
        assert!(matches!(mesh.without_degenerate_faces(0.01), Err(Error::Degenerate(_))));
    }

    #[test]
    fn scale_about_origin() {
        let mut mesh = unit_quad();
        mesh.transform(&Transform::scale(2.0, None));
        assert_relative_eq!(mesh.area(), 4.0);
    }
}
