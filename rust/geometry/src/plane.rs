// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Oriented planes with an in-plane coordinate system.

use nalgebra::{Point2, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::transform::Transform;

/// A plane with a unit normal, an origin and orthonormal in-plane axes.
///
/// For vertical planes the x axis is horizontal and the y axis points up,
/// which keeps window placement on walls intuitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vector3<f64>,
    origin: Point3<f64>,
    x_axis: Vector3<f64>,
    y_axis: Vector3<f64>,
}

impl Plane {
    /// Creates a plane from a (not necessarily unit) normal and origin.
    pub fn from_normal(normal: Vector3<f64>, origin: Point3<f64>) -> Result<Self> {
        let len = normal.norm();
        if len < 1e-12 {
            return Err(Error::Degenerate("plane normal has zero length".into()));
        }
        let normal = normal / len;
        let x_axis = {
            let x = Vector3::z().cross(&normal);
            if x.norm() < 1e-9 {
                Vector3::x()
            } else {
                x.normalize()
            }
        };
        let y_axis = normal.cross(&x_axis).normalize();
        Ok(Self {
            normal,
            origin,
            x_axis,
            y_axis,
        })
    }

    /// Creates a plane through three points, oriented counterclockwise.
    pub fn from_three_points(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Result<Self> {
        Self::from_normal((b - a).cross(&(c - a)), a)
    }

    /// The world XY plane at the given origin.
    pub fn world_xy(origin: Point3<f64>) -> Self {
        Self {
            normal: Vector3::z(),
            origin,
            x_axis: Vector3::x(),
            y_axis: Vector3::y(),
        }
    }

    pub fn normal(&self) -> &Vector3<f64> {
        &self.normal
    }

    pub fn origin(&self) -> &Point3<f64> {
        &self.origin
    }

    pub fn x_axis(&self) -> &Vector3<f64> {
        &self.x_axis
    }

    pub fn y_axis(&self) -> &Vector3<f64> {
        &self.y_axis
    }

    /// Signed distance from the plane (positive on the normal side).
    pub fn signed_distance_to_point(&self, p: &Point3<f64>) -> f64 {
        (p - self.origin).dot(&self.normal)
    }

    pub fn distance_to_point(&self, p: &Point3<f64>) -> f64 {
        self.signed_distance_to_point(p).abs()
    }

    /// Closest point on the plane.
    pub fn project_point(&self, p: &Point3<f64>) -> Point3<f64> {
        p - self.normal * self.signed_distance_to_point(p)
    }

    /// Converts a world point into plane coordinates.
    pub fn xyz_to_xy(&self, p: &Point3<f64>) -> Point2<f64> {
        let v = p - self.origin;
        Point2::new(v.dot(&self.x_axis), v.dot(&self.y_axis))
    }

    /// Converts plane coordinates back into a world point.
    pub fn xy_to_xyz(&self, p: &Point2<f64>) -> Point3<f64> {
        self.origin + self.x_axis * p.x + self.y_axis * p.y
    }

    /// True when both planes are the same within a distance and angle
    /// tolerance, regardless of which way they face.
    pub fn is_coplanar(&self, other: &Plane, tolerance: f64, angle_tolerance: f64) -> bool {
        let angle = self.normal.angle(&other.normal);
        let parallel = angle <= angle_tolerance || angle >= std::f64::consts::PI - angle_tolerance;
        parallel && self.distance_to_point(&other.origin) <= tolerance
    }

    /// The same plane facing the opposite way.
    pub fn flip(&self) -> Self {
        Self {
            normal: -self.normal,
            origin: self.origin,
            x_axis: -self.x_axis,
            y_axis: self.y_axis,
        }
    }

    /// Applies a transform, keeping the axes orthonormal.
    pub fn transform(&self, t: &Transform) -> Self {
        let origin = t.apply_point(&self.origin);
        let normal = t.apply_vector(&self.normal).normalize();
        let x_axis = t.apply_vector(&self.x_axis).normalize();
        let y_axis = normal.cross(&x_axis).normalize();
        Self {
            normal,
            origin,
            x_axis,
            y_axis,
        }
    }

    pub fn to_record(&self) -> PlaneRecord {
        PlaneRecord {
            kind: "Plane".to_string(),
            n: self.normal.into(),
            o: self.origin.coords.into(),
            x: Some(self.x_axis.into()),
        }
    }

    pub fn from_record(record: &PlaneRecord) -> Result<Self> {
        let mut plane = Self::from_normal(Vector3::from(record.n), Point3::from(record.o))?;
        if let Some(x) = record.x {
            let x = Vector3::from(x);
            if x.norm() > 1e-12 && x.dot(&plane.normal).abs() < 1e-6 {
                plane.x_axis = x.normalize();
                plane.y_axis = plane.normal.cross(&plane.x_axis).normalize();
            }
        }
        Ok(plane)
    }
}

/// Serialized form of a [`Plane`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub n: [f64; 3],
    pub o: [f64; 3],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<[f64; 3]>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn wall_plane_has_vertical_y_axis() {
        let plane = Plane::from_normal(Vector3::new(0.0, -2.0, 0.0), Point3::origin()).unwrap();
        assert_relative_eq!(plane.x_axis().x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.y_axis().z, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn xy_round_trip() {
        let plane =
            Plane::from_normal(Vector3::new(1.0, 1.0, 0.5), Point3::new(2.0, -1.0, 3.0)).unwrap();
        let p = Point3::new(2.5, -0.5, 2.0);
        let projected = plane.project_point(&p);
        let back = plane.xy_to_xyz(&plane.xyz_to_xy(&projected));
        assert_relative_eq!((back - projected).norm(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(plane.distance_to_point(&projected), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn coplanar_ignores_orientation() {
        let a = Plane::world_xy(Point3::origin());
        let b = a.flip();
        assert!(a.is_coplanar(&b, 0.01, 0.01));
        let c = Plane::world_xy(Point3::new(0.0, 0.0, 1.0));
        assert!(!a.is_coplanar(&c, 0.01, 0.01));
    }

    #[test]
    fn zero_normal_is_degenerate() {
        assert!(Plane::from_normal(Vector3::zeros(), Point3::origin()).is_err());
    }
}
