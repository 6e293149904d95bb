// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar polygons with optional holes.

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::bool2d;
use crate::bounds::BoundingBox;
use crate::error::{Error, Result};
use crate::fins::{self, FinOptions, FinSpacing};
use crate::mesh::Mesh3D;
use crate::plane::{Plane, PlaneRecord};
use crate::polygon;
use crate::transform::{Transform, Transformable};

/// Angle within which two normals count as parallel for adjacency tests.
const PARALLEL_ANGLE: f64 = 0.0175;

/// A planar polygon in 3D space.
///
/// The plane normal follows the right-hand rule of the boundary loop
/// (Newell's method). Holes are stored in the same space as the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Face3D {
    boundary: Vec<Point3<f64>>,
    holes: Vec<Vec<Point3<f64>>>,
    plane: Plane,
}

impl Face3D {
    /// Creates a face from its boundary vertices.
    ///
    /// Collinear or zero-area inputs are accepted (they fall back to a world
    /// XY plane) so that validation can report them instead of construction.
    pub fn new(boundary: Vec<Point3<f64>>) -> Result<Self> {
        Self::with_holes(boundary, Vec::new())
    }

    /// Creates a face with holes.
    pub fn with_holes(boundary: Vec<Point3<f64>>, holes: Vec<Vec<Point3<f64>>>) -> Result<Self> {
        if boundary.len() < 3 {
            return Err(Error::TooFewVertices(boundary.len()));
        }
        if let Some(hole) = holes.iter().find(|h| h.len() < 3) {
            return Err(Error::TooFewVertices(hole.len()));
        }
        let plane = plane_from_loop(&boundary);
        Ok(Self {
            boundary,
            holes,
            plane,
        })
    }

    /// A rectangle spanned from `origin` along two perpendicular directions.
    pub fn rectangle(
        origin: Point3<f64>,
        x_dir: Vector3<f64>,
        y_dir: Vector3<f64>,
        width: f64,
        height: f64,
    ) -> Result<Self> {
        let (x_len, y_len) = (x_dir.norm(), y_dir.norm());
        if x_len < 1e-12 || y_len < 1e-12 {
            return Err(Error::InvalidArgument("rectangle direction has zero length".into()));
        }
        let x = x_dir / x_len * width;
        let y = y_dir / y_len * height;
        Self::new(vec![origin, origin + x, origin + x + y, origin + y])
    }

    pub fn boundary(&self) -> &[Point3<f64>] {
        &self.boundary
    }

    pub fn holes(&self) -> &[Vec<Point3<f64>>] {
        &self.holes
    }

    pub fn has_holes(&self) -> bool {
        !self.holes.is_empty()
    }

    /// Boundary vertices (holes are not included).
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.boundary
    }

    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    pub fn normal(&self) -> Vector3<f64> {
        *self.plane.normal()
    }

    /// True when the Newell normal vanished (collinear or repeated vertices).
    pub fn is_degenerate(&self) -> bool {
        polygon::newell_normal(&self.boundary).norm() < 1e-12
    }

    fn loop_2d(&self, points: &[Point3<f64>]) -> Vec<Point2<f64>> {
        points.iter().map(|p| self.plane.xyz_to_xy(p)).collect()
    }

    pub fn boundary_2d(&self) -> Vec<Point2<f64>> {
        self.loop_2d(&self.boundary)
    }

    fn all_loops_2d(&self) -> Vec<Vec<Point2<f64>>> {
        std::iter::once(self.boundary_2d())
            .chain(self.holes.iter().map(|h| self.loop_2d(h)))
            .collect()
    }

    /// Area of the boundary minus the area of the holes.
    pub fn area(&self) -> f64 {
        let outer = polygon::newell_normal(&self.boundary).norm() * 0.5;
        let holes: f64 = self
            .holes
            .iter()
            .map(|h| polygon::newell_normal(h).norm() * 0.5)
            .sum();
        (outer - holes).max(0.0)
    }

    pub fn perimeter(&self) -> f64 {
        std::iter::once(&self.boundary)
            .chain(self.holes.iter())
            .map(|pts| loop_length(pts))
            .sum()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        // Non-empty by construction.
        BoundingBox::from_points(&self.boundary).unwrap_or(BoundingBox {
            min: self.boundary[0],
            max: self.boundary[0],
        })
    }

    pub fn min(&self) -> Point3<f64> {
        self.bounding_box().min
    }

    pub fn max(&self) -> Point3<f64> {
        self.bounding_box().max
    }

    /// Center of the bounding box around the boundary.
    pub fn center(&self) -> Point3<f64> {
        self.bounding_box().center()
    }

    /// Area-weighted centroid of the boundary.
    pub fn centroid(&self) -> Point3<f64> {
        self.plane.xy_to_xyz(&polygon::centroid(&self.boundary_2d()))
    }

    /// Angle between the normal and the world Z axis, in radians.
    pub fn tilt(&self) -> f64 {
        self.normal().angle(&Vector3::z())
    }

    /// Largest distance between a vertex and the face plane.
    pub fn planarity_deviation(&self) -> f64 {
        std::iter::once(&self.boundary)
            .chain(self.holes.iter())
            .flat_map(|pts| pts.iter())
            .map(|p| self.plane.distance_to_point(p))
            .fold(0.0, f64::max)
    }

    pub fn is_planar(&self, tolerance: f64) -> bool {
        self.planarity_deviation() <= tolerance
    }

    /// True when any two non-adjacent edges cross in the face plane.
    pub fn is_self_intersecting(&self) -> bool {
        polygon::loops_self_intersect(&self.all_loops_2d(), 1e-12)
    }

    /// True when the boundary winds clockwise around the given direction.
    pub fn is_clockwise(&self, direction: &Vector3<f64>) -> bool {
        polygon::newell_normal(&self.boundary).dot(direction) < 0.0
    }

    /// Same footprint and position within a tolerance, regardless of the
    /// vertex ordering or which way either face points.
    pub fn is_centered_adjacent(&self, other: &Face3D, tolerance: f64) -> bool {
        if (self.center() - other.center()).norm() > tolerance {
            return false;
        }
        let angle = self.normal().angle(&other.normal());
        if angle > PARALLEL_ANGLE && angle < std::f64::consts::PI - PARALLEL_ANGLE {
            return false;
        }
        if self.plane.distance_to_point(&other.center()) > tolerance {
            return false;
        }
        let band = tolerance * self.perimeter().max(other.perimeter());
        (self.area() - other.area()).abs() <= band
    }

    /// True when `sub` is coplanar with this face and lies within its
    /// boundary (and outside its holes).
    pub fn is_sub_face(&self, sub: &Face3D, tolerance: f64, angle_tolerance: f64) -> bool {
        let angle = self.normal().angle(&sub.normal());
        if angle > angle_tolerance && angle < std::f64::consts::PI - angle_tolerance {
            return false;
        }
        if sub
            .boundary
            .iter()
            .any(|p| self.plane.distance_to_point(p) > tolerance)
        {
            return false;
        }
        let outer = self.boundary_2d();
        let holes: Vec<_> = self.holes.iter().map(|h| self.loop_2d(h)).collect();
        sub.boundary.iter().all(|p| {
            let p2 = self.plane.xyz_to_xy(p);
            polygon::contains_point(&p2, &outer, tolerance)
                && !holes
                    .iter()
                    .any(|h| polygon::strictly_contains_point(&p2, h, tolerance))
        })
    }

    /// True when two coplanar faces share interior area.
    pub fn overlaps(&self, other: &Face3D, tolerance: f64) -> bool {
        if !self.plane.is_coplanar(other.plane(), tolerance, PARALLEL_ANGLE) {
            return false;
        }
        bool2d::polygons_overlap(&self.boundary_2d(), &self.loop_2d(&other.boundary), tolerance)
    }

    /// The same face with reversed winding and normal.
    pub fn flip(&self) -> Face3D {
        let mut boundary = self.boundary.clone();
        boundary.reverse();
        let holes = self
            .holes
            .iter()
            .map(|h| h.iter().rev().copied().collect())
            .collect();
        Face3D {
            boundary,
            holes,
            plane: self.plane.flip(),
        }
    }

    /// What remains of this face after cutting out `sub_faces`.
    ///
    /// Sub-faces are projected into the face plane first. Overlapping
    /// sub-faces are removed once, a sub-face touching the boundary notches
    /// it, and one that splits the face yields several faces.
    pub fn punched(&self, sub_faces: &[&Face3D]) -> Vec<Face3D> {
        let cutters: Vec<Vec<Point2<f64>>> = sub_faces
            .iter()
            .map(|sub| self.loop_2d(&sub.boundary))
            .collect();
        let holes: Vec<_> = self.holes.iter().map(|h| self.loop_2d(h)).collect();
        bool2d::difference(&self.boundary_2d(), &holes, &cutters)
            .into_iter()
            .map(|region| Face3D {
                boundary: region.outer.iter().map(|p| self.plane.xy_to_xyz(p)).collect(),
                holes: region
                    .holes
                    .iter()
                    .map(|h| h.iter().map(|p| self.plane.xy_to_xyz(p)).collect())
                    .collect(),
                plane: self.plane,
            })
            .collect()
    }

    /// Sub-faces covering `ratio` of this face, scaled about the centroid.
    pub fn sub_faces_by_ratio(&self, ratio: f64) -> Result<Vec<Face3D>> {
        if !(0.0..1.0).contains(&ratio) {
            return Err(Error::InvalidArgument(format!(
                "ratio must be between 0 and 1, got {}",
                ratio
            )));
        }
        if ratio == 0.0 {
            return Ok(Vec::new());
        }
        let t = Transform::scale(ratio.sqrt(), Some(self.centroid()));
        let mut boundary = self.boundary.clone();
        t.apply_loop(&mut boundary);
        Ok(vec![Face3D::new(boundary)?])
    }

    /// A rectangle of the given size centered horizontally in the face,
    /// `sill_height` above its lowest point. `None` when it does not fit.
    pub fn sub_face_by_width_height(
        &self,
        width: f64,
        height: f64,
        sill_height: f64,
        tolerance: f64,
    ) -> Result<Option<Face3D>> {
        if width <= 0.0 || height <= 0.0 {
            return Err(Error::InvalidArgument(
                "width and height must be positive".into(),
            ));
        }
        let pts = self.boundary_2d();
        let min_y = pts.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let c = polygon::centroid(&pts);
        let (x0, y0) = (c.x - width / 2.0, min_y + sill_height);
        let corners = [
            Point2::new(x0, y0),
            Point2::new(x0 + width, y0),
            Point2::new(x0 + width, y0 + height),
            Point2::new(x0, y0 + height),
        ];
        let sub = Face3D::new(corners.iter().map(|p| self.plane.xy_to_xyz(p)).collect())?;
        if self.is_sub_face(&sub, tolerance, PARALLEL_ANGLE) {
            Ok(Some(sub))
        } else {
            Ok(None)
        }
    }

    /// Louvers or fins cut along contour lines across this face.
    pub fn contour_fins(&self, spacing: FinSpacing, options: &FinOptions) -> Result<Vec<Face3D>> {
        fins::contour_fins(self, spacing, options)
    }

    /// Faces extruded `depth` along the normal from every edge.
    pub fn extruded_border(&self, depth: f64) -> Result<Vec<Face3D>> {
        fins::extruded_border(self, depth)
    }

    /// Triangulates the face (holes included) into a mesh.
    pub fn triangulated(&self) -> Result<Mesh3D> {
        let outer = self.boundary_2d();
        let holes: Vec<_> = self.holes.iter().map(|h| self.loop_2d(h)).collect();
        let indices = polygon::triangulate(&outer, &holes)?;
        let vertices: Vec<Point3<f64>> = self
            .boundary
            .iter()
            .chain(self.holes.iter().flatten())
            .copied()
            .collect();
        let faces = indices.chunks(3).map(|tri| tri.to_vec()).collect();
        Mesh3D::new(vertices, faces)
    }


    pub fn to_record(&self) -> Face3DRecord {
        Face3DRecord {
            kind: "Face3D".to_string(),
            boundary: self.boundary.iter().map(|p| p.coords.into()).collect(),
            holes: if self.holes.is_empty() {
                None
            } else {
                Some(
                    self.holes
                        .iter()
                        .map(|h| h.iter().map(|p| p.coords.into()).collect())
                        .collect(),
                )
            },
            plane: Some(self.plane.to_record()),
        }
    }

    pub fn from_record(record: &Face3DRecord) -> Result<Self> {
        if record.kind != "Face3D" {
            return Err(Error::InvalidRecord(format!(
                "expected Face3D, got {}",
                record.kind
            )));
        }
        let boundary = record.boundary.iter().map(|c| Point3::from(*c)).collect();
        let holes = record
            .holes
            .iter()
            .flatten()
            .map(|h| h.iter().map(|c| Point3::from(*c)).collect())
            .collect();
        Self::with_holes(boundary, holes)
    }
}

impl Transformable for Face3D {
    /// Applies a transform in place.
    fn transform(&mut self, t: &Transform) {
        t.apply_loop(&mut self.boundary);
        for hole in self.holes.iter_mut() {
            t.apply_loop(hole);
        }
        self.plane = plane_from_loop(&self.boundary);
    }
}

/// Serialized form of a [`Face3D`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face3DRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub boundary: Vec<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holes: Option<Vec<Vec<[f64; 3]>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plane: Option<PlaneRecord>,
}

fn loop_length(points: &[Point3<f64>]) -> f64 {
    let n = points.len();
    (0..n).map(|i| (points[(i + 1) % n] - points[i]).norm()).sum()
}

fn plane_from_loop(points: &[Point3<f64>]) -> Plane {
    let n = points.len().max(1) as f64;
    let mean = Point3::from(points.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n);
    Plane::from_normal(polygon::newell_normal(points), mean)
        .unwrap_or_else(|_| Plane::world_xy(mean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn wall(x0: f64, width: f64, height: f64) -> Face3D {
        Face3D::new(vec![
            Point3::new(x0, 0.0, 0.0),
            Point3::new(x0 + width, 0.0, 0.0),
            Point3::new(x0 + width, 0.0, height),
            Point3::new(x0, 0.0, height),
        ])
        .unwrap()
    }

    /// Rectangle in the same plane as `wall`, starting `z0` above the ground.
    fn rect(x0: f64, z0: f64, width: f64, height: f64) -> Face3D {
        Face3D::rectangle(
            Point3::new(x0, 0.0, z0),
            Vector3::x(),
            Vector3::z(),
            width,
            height,
        )
        .unwrap()
    }

    #[test]
    fn wall_metrics() {
        let face = wall(0.0, 5.0, 3.0);
        assert_relative_eq!(face.area(), 15.0, epsilon = 1e-10);
        assert_relative_eq!(face.perimeter(), 16.0, epsilon = 1e-10);
        assert_relative_eq!(face.normal().y, -1.0, epsilon = 1e-10);
        assert_relative_eq!(face.center().x, 2.5, epsilon = 1e-10);
        assert_relative_eq!(face.tilt(), std::f64::consts::FRAC_PI_2, epsilon = 1e-10);
        assert!(face.is_planar(1e-9));
        assert!(!face.is_self_intersecting());
    }

    #[test]
    fn too_few_vertices() {
        let err = Face3D::new(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).unwrap_err();
        assert_eq!(err, Error::TooFewVertices(2));
    }

    #[test]
    fn non_planar_deviation() {
        let face = Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.2),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        assert!(!face.is_planar(0.01));
        assert!(face.planarity_deviation() > 0.01);
    }

    #[test]
    fn flipped_face_is_centered_adjacent() {
        let face = wall(0.0, 5.0, 3.0);
        let flipped = face.flip();
        assert_relative_eq!(flipped.normal().y, 1.0, epsilon = 1e-10);
        assert!(face.is_centered_adjacent(&flipped, 0.01));
        assert!(!face.is_centered_adjacent(&wall(1.0, 5.0, 3.0), 0.01));
    }

    #[test]
    fn ratio_sub_face_is_contained() {
        let face = wall(0.0, 5.0, 3.0);
        let subs = face.sub_faces_by_ratio(0.4).unwrap();
        assert_eq!(subs.len(), 1);
        assert_relative_eq!(subs[0].area(), 6.0, epsilon = 1e-9);
        assert!(face.is_sub_face(&subs[0], 0.01, 0.0175));
        assert!(face.sub_faces_by_ratio(1.0).is_err());
        assert!(face.sub_faces_by_ratio(0.0).unwrap().is_empty());
    }

    #[test]
    fn width_height_sub_face() {
        let face = wall(0.0, 5.0, 3.0);
        let sub = face.sub_face_by_width_height(2.0, 1.5, 0.8, 0.01).unwrap().unwrap();
        assert_relative_eq!(sub.area(), 3.0, epsilon = 1e-9);
        assert_relative_eq!(sub.min().z, 0.8, epsilon = 1e-9);
        assert!(face.sub_face_by_width_height(6.0, 1.0, 0.5, 0.01).unwrap().is_none());
    }

    #[test]
    fn punched_area_subtracts_holes() {
        let face = wall(0.0, 5.0, 3.0);
        let subs = face.sub_faces_by_ratio(0.4).unwrap();
        let punched = face.punched(&[&subs[0]]);
        assert_eq!(punched.len(), 1);
        assert_eq!(punched[0].holes().len(), 1);
        assert_relative_eq!(punched[0].area(), 9.0, epsilon = 1e-9);
        assert_relative_eq!(punched[0].normal().y, -1.0, epsilon = 1e-10);
        let mesh = punched[0].triangulated().unwrap();
        assert_relative_eq!(mesh.area(), 9.0, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_holes_are_cut_once() {
        let face = wall(0.0, 5.0, 3.0);
        let low = rect(1.0, 0.5, 1.0, 1.0);
        let high = rect(1.0, 1.4, 1.0, 1.0);
        let punched = face.punched(&[&low, &high]);
        assert_eq!(punched.len(), 1);
        assert_eq!(punched[0].holes().len(), 1);
        assert_relative_eq!(punched[0].area(), 15.0 - 1.9, epsilon = 1e-9);
        let mesh = punched[0].triangulated().unwrap();
        assert_relative_eq!(mesh.area(), 15.0 - 1.9, epsilon = 1e-9);
    }

    #[test]
    fn hole_on_the_boundary_becomes_a_notch() {
        let face = wall(0.0, 5.0, 3.0);
        let punched = face.punched(&[&wall(1.0, 1.0, 2.1)]);
        assert_eq!(punched.len(), 1);
        assert!(punched[0].holes().is_empty());
        assert_relative_eq!(punched[0].area(), 15.0 - 2.1, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_sub_faces() {
        let a = wall(0.0, 2.0, 2.0);
        let b = wall(1.0, 2.0, 2.0);
        let c = wall(2.0, 2.0, 2.0);
        assert!(a.overlaps(&b, 0.001));
        assert!(!a.overlaps(&c, 0.001));
    }

    #[test]
    fn stacked_sub_faces_overlapping_in_a_strip() {
        let low = rect(1.0, 0.5, 1.0, 1.0);
        let high = rect(1.0, 1.4, 1.0, 1.0);
        assert!(low.overlaps(&high, 0.01));
        assert!(!low.overlaps(&rect(1.0, 1.5, 1.0, 1.0), 0.01));
    }

    #[test]
    fn reflect_keeps_normal_consistent() {
        let mut face = wall(0.0, 5.0, 3.0);
        let t = Transform::reflect(Vector3::y(), Point3::new(0.0, 1.0, 0.0)).unwrap();
        face.transform(&t);
        assert_relative_eq!(face.normal().y, 1.0, epsilon = 1e-10);
        assert_relative_eq!(face.min().y, 2.0, epsilon = 1e-10);
    }

    #[test]
    fn record_round_trip() {
        let face = wall(0.0, 5.0, 3.0).punched(&[&rect(1.0, 1.0, 1.0, 1.0)]).remove(0);
        let json = serde_json::to_value(face.to_record()).unwrap();
        assert_eq!(json["type"], "Face3D");
        let record: Face3DRecord = serde_json::from_value(json).unwrap();
        let back = Face3D::from_record(&record).unwrap();
        assert_eq!(back.holes().len(), 1);
        assert_relative_eq!(back.area(), face.area(), epsilon = 1e-10);
    }
}
