// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rigid and uniform-scale transforms.
//!
//! Every geometry type (and every entity built on top of them) applies a
//! [`Transform`] through a single `transform` method, so the five public
//! operations (move, rotate, rotate about Z, reflect, scale) all share one
//! code path per type.

use nalgebra::{Point3, Rotation3, Unit, Vector3};

use crate::error::{Error, Result};

/// An in-place transform applied to points, vectors and polygon loops.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    Translate(Vector3<f64>),
    Rotate {
        axis: Unit<Vector3<f64>>,
        /// Radians, counterclockwise about `axis`.
        angle: f64,
        origin: Point3<f64>,
    },
    Reflect {
        normal: Unit<Vector3<f64>>,
        origin: Point3<f64>,
    },
    Scale {
        factor: f64,
        origin: Point3<f64>,
    },
}

impl Transform {
    /// Translation by a vector.
    pub fn translate(vector: Vector3<f64>) -> Self {
        Transform::Translate(vector)
    }

    /// Rotation about an arbitrary axis through `origin`.
    pub fn rotate(axis: Vector3<f64>, angle: f64, origin: Point3<f64>) -> Result<Self> {
        let axis = Unit::try_new(axis, 1e-15)
            .ok_or_else(|| Error::InvalidArgument("rotation axis has zero length".into()))?;
        Ok(Transform::Rotate {
            axis,
            angle,
            origin,
        })
    }

    /// Rotation about the world Z axis through `origin`.
    pub fn rotate_xy(angle: f64, origin: Point3<f64>) -> Self {
        Transform::Rotate {
            axis: Vector3::z_axis(),
            angle,
            origin,
        }
    }

    /// Reflection across the plane through `origin` with the given normal.
    pub fn reflect(normal: Vector3<f64>, origin: Point3<f64>) -> Result<Self> {
        let normal = Unit::try_new(normal, 1e-15)
            .ok_or_else(|| Error::InvalidArgument("reflection normal has zero length".into()))?;
        Ok(Transform::Reflect { normal, origin })
    }

    /// Uniform scale about `origin` (the world origin when `None`).
    pub fn scale(factor: f64, origin: Option<Point3<f64>>) -> Self {
        Transform::Scale {
            factor,
            origin: origin.unwrap_or_else(Point3::origin),
        }
    }

    /// Applies the transform to a point.
    pub fn apply_point(&self, p: &Point3<f64>) -> Point3<f64> {
        match self {
            Transform::Translate(v) => p + v,
            Transform::Rotate {
                axis,
                angle,
                origin,
            } => {
                let rotation = Rotation3::from_axis_angle(axis, *angle);
                origin + rotation * (p - origin)
            }
            Transform::Reflect { normal, origin } => {
                let n = normal.into_inner();
                p - n * (2.0 * (p - origin).dot(&n))
            }
            Transform::Scale { factor, origin } => origin + (p - origin) * *factor,
        }
    }

    /// Applies the transform to a direction vector (translation has no effect).
    pub fn apply_vector(&self, v: &Vector3<f64>) -> Vector3<f64> {
        match self {
            Transform::Translate(_) => *v,
            Transform::Rotate { axis, angle, .. } => Rotation3::from_axis_angle(axis, *angle) * v,
            Transform::Reflect { normal, .. } => {
                let n = normal.into_inner();
                v - n * (2.0 * v.dot(&n))
            }
            Transform::Scale { factor, .. } => v * *factor,
        }
    }

    /// True when the transform mirrors handedness, so polygon loops must be
    /// reversed to keep their normals pointing the transformed way.
    pub fn reverses_orientation(&self) -> bool {
        match self {
            Transform::Reflect { .. } => true,
            Transform::Scale { factor, .. } => *factor < 0.0,
            _ => false,
        }
    }

    /// Applies the transform to a polygon loop, preserving its orientation.
    pub fn apply_loop(&self, points: &mut Vec<Point3<f64>>) {
        for p in points.iter_mut() {
            *p = self.apply_point(p);
        }
        if self.reverses_orientation() {
            points.reverse();
        }
    }
}

/// Types that can be moved, rotated, reflected and scaled in place.
///
/// Implementors only provide [`Transformable::transform`]; the named
/// operations all route through it. Angles here are in degrees.
pub trait Transformable {
    fn transform(&mut self, t: &Transform);

    /// Moves by a vector.
    fn translate(&mut self, vector: Vector3<f64>) {
        self.transform(&Transform::translate(vector));
    }

    /// Rotates counterclockwise about an axis through `origin`.
    fn rotate(&mut self, axis: Vector3<f64>, degrees: f64, origin: Point3<f64>) -> Result<()> {
        let t = Transform::rotate(axis, degrees.to_radians(), origin)?;
        self.transform(&t);
        Ok(())
    }

    /// Rotates counterclockwise about the world Z axis through `origin`.
    fn rotate_xy(&mut self, degrees: f64, origin: Point3<f64>) {
        self.transform(&Transform::rotate_xy(degrees.to_radians(), origin));
    }

    /// Mirrors across the plane through `origin` with the given normal.
    fn reflect(&mut self, normal: Vector3<f64>, origin: Point3<f64>) -> Result<()> {
        let t = Transform::reflect(normal, origin)?;
        self.transform(&t);
        Ok(())
    }

    /// Scales about `origin` (the world origin when `None`).
    fn scale(&mut self, factor: f64, origin: Option<Point3<f64>>) {
        self.transform(&Transform::scale(factor, origin));
    }
}
