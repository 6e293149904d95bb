// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polyfaces: planar faces welded into a shared vertex list.
//!
//! Edge topology is derived from the face loops. An edge used by exactly
//! one face is naked, by two faces internal, and by more than two
//! non-manifold. A polyface with neither naked nor non-manifold edges
//! encloses a volume.

use std::collections::VecDeque;

use nalgebra::{Point3, Vector3};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::face::Face3D;
use crate::plane::Plane;
use crate::polygon;
use crate::spatial::VertexWelder;
use crate::transform::{Transform, Transformable};

/// A straight segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment3D {
    pub start: Point3<f64>,
    pub end: Point3<f64>,
}

impl LineSegment3D {
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn midpoint(&self) -> Point3<f64> {
        nalgebra::center(&self.start, &self.end)
    }
}

type EdgeKey = (usize, usize);

#[derive(Debug, Clone, Default, PartialEq)]
struct EdgeTopology {
    naked: Vec<EdgeKey>,
    internal: Vec<EdgeKey>,
    non_manifold: Vec<EdgeKey>,
}

/// A set of faces sharing welded vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyface3D {
    vertices: Vec<Point3<f64>>,
    face_indices: Vec<Vec<usize>>,
    edges: EdgeTopology,
}

impl Polyface3D {
    /// Welds the boundaries of `faces` into a polyface. Vertices closer than
    /// `tolerance` become one vertex. Holes are ignored.
    pub fn from_faces(faces: &[Face3D], tolerance: f64) -> Self {
        let mut welder = VertexWelder::new(tolerance);
        let face_indices = faces
            .iter()
            .map(|f| {
                f.boundary()
                    .iter()
                    .map(|p| welder.find_or_insert(p))
                    .collect()
            })
            .collect();
        Self::from_loops(welder.into_vertices(), face_indices)
    }

    /// Axis-aligned box in the coordinate system of `base`, with faces in
    /// the order bottom, front, right, back, left, top.
    pub fn from_box(width: f64, depth: f64, height: f64, base: &Plane) -> Result<Self> {
        if width <= 0.0 || depth <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "box dimensions must be positive, got {} x {} x {}",
                width, depth, height
            )));
        }
        let (o, x, y, z) = (base.origin(), base.x_axis(), base.y_axis(), base.normal());
        let mut vertices = Vec::with_capacity(8);
        for k in 0..2 {
            for j in 0..2 {
                for i in 0..2 {
                    vertices.push(
                        o + x * (i as f64 * width)
                            + y * (j as f64 * depth)
                            + z * (k as f64 * height),
                    );
                }
            }
        }
        let face_indices = vec![
            vec![0, 2, 3, 1],
            vec![0, 1, 5, 4],
            vec![1, 3, 7, 5],
            vec![3, 2, 6, 7],
            vec![2, 0, 4, 6],
            vec![4, 5, 7, 6],
        ];
        Ok(Self::from_loops(vertices, face_indices))
    }

    fn from_loops(vertices: Vec<Point3<f64>>, face_indices: Vec<Vec<usize>>) -> Self {
        let face_indices: Vec<Vec<usize>> = face_indices
            .into_iter()
            .map(|mut l| {
                l.dedup();
                while l.len() > 1 && l.first() == l.last() {
                    l.pop();
                }
                l
            })
            .filter(|l| l.len() >= 3)
            .collect();
        let edges = compute_edges(&face_indices);
        Self {
            vertices,
            face_indices,
            edges,
        }
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn face_indices(&self) -> &[Vec<usize>] {
        &self.face_indices
    }

    pub fn face_count(&self) -> usize {
        self.face_indices.len()
    }

    fn face_points(&self, index: usize) -> Vec<Point3<f64>> {
        self.face_indices[index]
            .iter()
            .map(|&i| self.vertices[i])
            .collect()
    }

    /// Faces rebuilt from the welded vertices.
    pub fn faces(&self) -> Result<Vec<Face3D>> {
        (0..self.face_indices.len())
            .map(|i| Face3D::new(self.face_points(i)))
            .collect()
    }

    fn segments(&self, keys: &[EdgeKey]) -> Vec<LineSegment3D> {
        keys.iter()
            .map(|&(a, b)| LineSegment3D {
                start: self.vertices[a],
                end: self.vertices[b],
            })
            .collect()
    }

    pub fn naked_edges(&self) -> Vec<LineSegment3D> {
        self.segments(&self.edges.naked)
    }

    pub fn internal_edges(&self) -> Vec<LineSegment3D> {
        self.segments(&self.edges.internal)
    }

    pub fn non_manifold_edges(&self) -> Vec<LineSegment3D> {
        self.segments(&self.edges.non_manifold)
    }

    /// Every edge is shared by exactly two faces.
    pub fn is_solid(&self) -> bool {
        !self.face_indices.is_empty()
            && self.edges.naked.is_empty()
            && self.edges.non_manifold.is_empty()
    }

    /// Sum of signed tetrahedra: positive when normals point outward.
    pub fn signed_volume(&self) -> f64 {
        (0..self.face_indices.len())
            .map(|i| loop_volume(&self.face_points(i)))
            .sum()
    }

    pub fn volume(&self) -> f64 {
        self.signed_volume().abs()
    }

    pub fn area(&self) -> f64 {
        (0..self.face_indices.len())
            .map(|i| polygon::newell_normal(&self.face_points(i)).norm() * 0.5)
            .sum()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(&self.vertices)
    }

    pub fn center(&self) -> Point3<f64> {
        self.bounding_box()
            .map(|bb| bb.center())
            .unwrap_or_else(Point3::origin)
    }

    /// Which faces must be reversed so that every face points outward.
    ///
    /// Winding is propagated across shared edges (neighbors must traverse a
    /// shared edge in opposite directions), then each connected shell is
    /// flipped as a whole if its signed volume is negative.
    pub fn outward_flips(&self) -> Vec<bool> {
        let adjacency = edge_uses(&self.face_indices);
        let n = self.face_indices.len();
        let mut flips: Vec<Option<bool>> = vec![None; n];
        let mut shells: Vec<Vec<usize>> = Vec::new();

        for start in 0..n {
            if flips[start].is_some() {
                continue;
            }
            flips[start] = Some(false);
            let mut shell = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(f) = queue.pop_front() {
                let f_flip = flips[f].unwrap_or(false);
                for (a, b) in loop_edges(&self.face_indices[f]) {
                    let f_forward = (a < b) != f_flip;
                    let Some(uses) = adjacency.get(&edge_key(a, b)) else {
                        continue;
                    };
                    for &(g, g_forward) in uses {
                        if g == f || flips[g].is_some() {
                            continue;
                        }
                        flips[g] = Some(g_forward == f_forward);
                        shell.push(g);
                        queue.push_back(g);
                    }
                }
            }
            shells.push(shell);
        }

        let mut result: Vec<bool> = flips.into_iter().map(|f| f.unwrap_or(false)).collect();
        for shell in shells {
            let volume: f64 = shell
                .iter()
                .map(|&i| {
                    let mut pts = self.face_points(i);
                    if result[i] {
                        pts.reverse();
                    }
                    loop_volume(&pts)
                })
                .sum();
            if volume < 0.0 {
                for &i in &shell {
                    result[i] = !result[i];
                }
            }
        }
        result
    }

    /// A copy with every face wound outward, plus the flips applied.
    pub fn with_outward_normals(&self) -> (Polyface3D, Vec<bool>) {
        let flips = self.outward_flips();
        let face_indices = self
            .face_indices
            .iter()
            .zip(&flips)
            .map(|(l, &flip)| {
                let mut l = l.clone();
                if flip {
                    l.reverse();
                }
                l
            })
            .collect();
        (Self::from_loops(self.vertices.clone(), face_indices), flips)
    }

    /// Splits naked edges at naked vertices lying on them (T-junctions
    /// between faces of different subdivision), then recomputes topology.
    pub fn merge_overlapping_edges(&self, tolerance: f64) -> Polyface3D {
        if self.edges.naked.is_empty() {
            return self.clone();
        }
        let mut candidates: Vec<usize> = self
            .edges
            .naked
            .iter()
            .flat_map(|&(a, b)| [a, b])
            .collect();
        candidates.sort_unstable();
        candidates.dedup();

        let naked: FxHashSet<EdgeKey> = self.edges.naked.iter().copied().collect();
        let face_indices = self
            .face_indices
            .iter()
            .map(|l| {
                let mut out = Vec::with_capacity(l.len());
                for (a, b) in loop_edges(l) {
                    out.push(a);
                    if !naked.contains(&edge_key(a, b)) {
                        continue;
                    }
                    let (pa, pb) = (self.vertices[a], self.vertices[b]);
                    let ab = pb - pa;
                    let len_sq = ab.norm_squared();
                    if len_sq < 1e-24 {
                        continue;
                    }
                    let mut on_edge: Vec<(f64, usize)> = candidates
                        .iter()
                        .filter(|&&v| v != a && v != b)
                        .filter_map(|&v| {
                            let t = (self.vertices[v] - pa).dot(&ab) / len_sq;
                            let dist = (self.vertices[v] - (pa + ab * t)).norm();
                            (t > 0.0 && t < 1.0 && dist <= tolerance).then_some((t, v))
                        })
                        .collect();
                    on_edge.sort_by(|x, y| x.0.total_cmp(&y.0));
                    out.extend(on_edge.into_iter().map(|(_, v)| v));
                }
                out
            })
            .collect();
        Self::from_loops(self.vertices.clone(), face_indices)
    }


    pub fn to_record(&self) -> Polyface3DRecord {
        Polyface3DRecord {
            kind: "Polyface3D".to_string(),
            vertices: self.vertices.iter().map(|p| p.coords.into()).collect(),
            face_indices: self.face_indices.clone(),
        }
    }

    pub fn from_record(record: &Polyface3DRecord) -> Result<Self> {
        if record.kind != "Polyface3D" {
            return Err(Error::InvalidRecord(format!(
                "expected Polyface3D, got {}",
                record.kind
            )));
        }
        let count = record.vertices.len();
        if let Some(&index) = record.face_indices.iter().flatten().find(|&&i| i >= count) {
            return Err(Error::MeshIndexOutOfRange { index, count });
        }
        Ok(Self::from_loops(
            record.vertices.iter().map(|c| Point3::from(*c)).collect(),
            record.face_indices.clone(),
        ))
    }
}

impl Transformable for Polyface3D {
    fn transform(&mut self, t: &Transform) {
        for v in self.vertices.iter_mut() {
            *v = t.apply_point(v);
        }
        if t.reverses_orientation() {
            for l in self.face_indices.iter_mut() {
                l.reverse();
            }
            self.edges = compute_edges(&self.face_indices);
        }
    }
}

/// Serialized form of a [`Polyface3D`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyface3DRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub vertices: Vec<[f64; 3]>,
    pub face_indices: Vec<Vec<usize>>,
}

#[inline]
fn edge_key(a: usize, b: usize) -> EdgeKey {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn loop_edges(l: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    (0..l.len()).map(move |i| (l[i], l[(i + 1) % l.len()]))
}

/// Faces using each edge, with whether they traverse it low-to-high.
fn edge_uses(face_indices: &[Vec<usize>]) -> FxHashMap<EdgeKey, Vec<(usize, bool)>> {
    let mut map: FxHashMap<EdgeKey, Vec<(usize, bool)>> = FxHashMap::default();
    for (fi, l) in face_indices.iter().enumerate() {
        for (a, b) in loop_edges(l) {
            map.entry(edge_key(a, b)).or_default().push((fi, a < b));
        }
    }
    map
}

fn compute_edges(face_indices: &[Vec<usize>]) -> EdgeTopology {
    let mut topology = EdgeTopology::default();
    let mut uses: Vec<(EdgeKey, usize)> = edge_uses(face_indices)
        .into_iter()
        .map(|(k, v)| (k, v.len()))
        .collect();
    uses.sort_unstable();
    for (key, count) in uses {
        match count {
            1 => topology.naked.push(key),
            2 => topology.internal.push(key),
            _ => topology.non_manifold.push(key),
        }
    }
    topology
}

fn loop_volume(points: &[Point3<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let p0: Vector3<f64> = points[0].coords;
    let mut sum = 0.0;
    for i in 1..points.len() - 1 {
        sum += p0.dot(&points[i].coords.cross(&points[i + 1].coords));
    }
    sum / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Polyface3D {
        Polyface3D::from_box(1.0, 1.0, 1.0, &Plane::world_xy(Point3::origin())).unwrap()
    }

    #[test]
    fn box_is_solid_and_outward() {
        let pf = unit_box();
        assert!(pf.is_solid());
        assert_eq!(pf.internal_edges().len(), 12);
        assert_relative_eq!(pf.signed_volume(), 1.0, epsilon = 1e-10);
        assert_relative_eq!(pf.area(), 6.0, epsilon = 1e-10);
        assert!(pf.outward_flips().iter().all(|f| !f));
    }

    #[test]
    fn box_face_order_and_normals() {
        let faces = unit_box().faces().unwrap();
        let normals: Vec<_> = faces.iter().map(|f| f.normal()).collect();
        assert_relative_eq!(normals[0].z, -1.0, epsilon = 1e-10);
        assert_relative_eq!(normals[1].y, -1.0, epsilon = 1e-10);
        assert_relative_eq!(normals[2].x, 1.0, epsilon = 1e-10);
        assert_relative_eq!(normals[3].y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(normals[4].x, -1.0, epsilon = 1e-10);
        assert_relative_eq!(normals[5].z, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn open_box_has_naked_edges() {
        let mut faces = unit_box().faces().unwrap();
        faces.pop();
        let pf = Polyface3D::from_faces(&faces, 0.01);
        assert!(!pf.is_solid());
        assert_eq!(pf.naked_edges().len(), 4);
    }

    #[test]
    fn inconsistent_winding_is_repaired() {
        let mut faces = unit_box().faces().unwrap();
        faces[2] = faces[2].flip();
        faces[5] = faces[5].flip();
        let pf = Polyface3D::from_faces(&faces, 0.01);
        assert!(pf.is_solid());
        let flips = pf.outward_flips();
        assert_eq!(flips, vec![false, false, true, false, false, true]);
        let (fixed, _) = pf.with_outward_normals();
        assert_relative_eq!(fixed.signed_volume(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn fully_inverted_box_flips_everything() {
        let faces: Vec<_> = unit_box().faces().unwrap().iter().map(|f| f.flip()).collect();
        let pf = Polyface3D::from_faces(&faces, 0.01);
        assert!(pf.outward_flips().iter().all(|&f| f));
    }

    #[test]
    fn t_junction_is_merged() {
        // A box whose front wall is split in two: the bottom edge of the
        // front faces has a midpoint vertex the floor does not know about.
        let faces = unit_box().faces().unwrap();
        let mut split = faces.clone();
        split[1] = Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 0.0, 0.0),
            Point3::new(0.5, 0.0, 1.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
        .unwrap();
        split.push(
            Face3D::new(vec![
                Point3::new(0.5, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(0.5, 0.0, 1.0),
            ])
            .unwrap(),
        );
        let pf = Polyface3D::from_faces(&split, 0.01);
        assert!(!pf.is_solid());
        let merged = pf.merge_overlapping_edges(0.01);
        assert!(merged.is_solid());
        assert_relative_eq!(merged.volume(), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn reject_bad_box() {
        assert!(Polyface3D::from_box(0.0, 1.0, 1.0, &Plane::world_xy(Point3::origin())).is_err());
    }
}
