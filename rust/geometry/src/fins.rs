// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Louvers, fins and borders extruded from a face.
//!
//! Contours are cut across the face in a frame whose first axis is
//! horizontal and whose second axis runs up the face. Seen from the side
//! the normal points to, positive first-axis values lie on the right.
//! Each contour segment is extruded along the face normal.

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{Error, Result};
use crate::face::Face3D;

/// Which way contour lines run across a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContourDirection {
    /// Lines of constant height: louvers and overhangs.
    #[default]
    Horizontal,
    /// Lines running up the face: vertical fins.
    Vertical,
}

/// How contour positions are spread over a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FinSpacing {
    /// This many contours, the first on the starting edge.
    Count(usize),
    /// Contours this far apart, starting on the starting edge.
    DistanceBetween(f64),
}

/// Shape of the fins cut from a face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinOptions {
    pub depth: f64,
    /// Distance the fins are moved off the face along its normal.
    pub offset: f64,
    /// Rotation of each fin about its contour line, in radians.
    pub angle: f64,
    pub direction: ContourDirection,
    /// Start from the bottom (or left) edge instead of the top (or right).
    pub flip_start_side: bool,
    /// Contour segments shorter than this are skipped.
    pub tolerance: f64,
}

impl FinOptions {
    pub fn new(depth: f64) -> Self {
        Self {
            depth,
            offset: 0.0,
            angle: 0.0,
            direction: ContourDirection::Horizontal,
            flip_start_side: false,
            tolerance: 0.0,
        }
    }
}

/// Horizontal and up-the-face axes of a face.
struct FinFrame {
    origin: Point3<f64>,
    across: Vector3<f64>,
    up: Vector3<f64>,
    normal: Vector3<f64>,
}

impl FinFrame {
    fn of(face: &Face3D) -> Result<Self> {
        if face.is_degenerate() {
            return Err(Error::Degenerate("cannot cut fins from a zero-area face".into()));
        }
        let normal = face.normal();
        let horizontal = Vector3::z().cross(&normal);
        // horizontal faces fall back to the plane axes
        let across = if horizontal.norm() < 1e-9 {
            *face.plane().x_axis()
        } else {
            horizontal.normalize()
        };
        Ok(Self {
            origin: *face.plane().origin(),
            across,
            up: normal.cross(&across),
            normal,
        })
    }

    /// Axis the contours are placed along, then the axis they run along.
    fn axes(&self, direction: ContourDirection) -> (Vector3<f64>, Vector3<f64>) {
        match direction {
            ContourDirection::Horizontal => (self.up, self.across),
            ContourDirection::Vertical => (self.across, self.up),
        }
    }

    /// (position along the contour, contour coordinate) of a point.
    fn project(&self, p: &Point3<f64>, direction: ContourDirection) -> Point2<f64> {
        let (cut, line) = self.axes(direction);
        let d = p - self.origin;
        Point2::new(d.dot(&line), d.dot(&cut))
    }

    fn point(&self, along: f64, level: f64, direction: ContourDirection) -> Point3<f64> {
        let (cut, line) = self.axes(direction);
        self.origin + line * along + cut * level
    }
}

/// Fins extruded from contour lines cut across `face`.
pub fn contour_fins(face: &Face3D, spacing: FinSpacing, options: &FinOptions) -> Result<Vec<Face3D>> {
    if options.depth <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "fin depth must be positive, got {}",
            options.depth
        )));
    }
    let frame = FinFrame::of(face)?;
    let direction = options.direction;
    let loops: Vec<Vec<Point2<f64>>> = std::iter::once(face.boundary())
        .chain(face.holes().iter().map(Vec::as_slice))
        .map(|pts| pts.iter().map(|p| frame.project(p, direction)).collect())
        .collect();
    let (lo, hi) = loops[0]
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.y), hi.max(p.y))
        });

    let (_, line_axis) = frame.axes(direction);
    let extrusion = (frame.normal * options.angle.cos()
        + line_axis.cross(&frame.normal) * options.angle.sin())
        * options.depth;
    let shift = frame.normal * options.offset;
    let min_length = options.tolerance.max(1e-9);
    // contours on an edge are measured just inside it
    let inset = ((hi - lo) * 1e-6).max(1e-12);

    let mut fins = Vec::new();
    for level in contour_levels(lo, hi, spacing, options.flip_start_side)? {
        let at = level.clamp(lo + inset, hi - inset);
        for (start, end) in contour_segments(&loops, at) {
            if end - start < min_length {
                continue;
            }
            let a = frame.point(start, level, direction) + shift;
            let b = frame.point(end, level, direction) + shift;
            fins.push(Face3D::new(vec![a, b, b + extrusion, a + extrusion])?);
        }
    }
    Ok(fins)
}

/// One face per boundary and hole edge, extruded `depth` along the normal.
pub fn extruded_border(face: &Face3D, depth: f64) -> Result<Vec<Face3D>> {
    if depth <= 0.0 {
        return Err(Error::InvalidArgument(format!(
            "border depth must be positive, got {}",
            depth
        )));
    }
    let extrusion = face.normal() * depth;
    let mut border = Vec::new();
    for pts in std::iter::once(face.boundary()).chain(face.holes().iter().map(Vec::as_slice)) {
        for (i, a) in pts.iter().enumerate() {
            let b = pts[(i + 1) % pts.len()];
            if (b - a).norm() < 1e-12 {
                continue;
            }
            border.push(Face3D::new(vec![*a, b, b + extrusion, a + extrusion])?);
        }
    }
    Ok(border)
}

fn contour_levels(lo: f64, hi: f64, spacing: FinSpacing, from_low: bool) -> Result<Vec<f64>> {
    let span = hi - lo;
    let steps: Vec<f64> = match spacing {
        FinSpacing::Count(0) => {
            return Err(Error::InvalidArgument("fin count must be at least 1".into()))
        }
        FinSpacing::Count(n) => (0..n).map(|i| i as f64 * span / n as f64).collect(),
        FinSpacing::DistanceBetween(d) if d <= 0.0 => {
            return Err(Error::InvalidArgument(format!(
                "distance between fins must be positive, got {}",
                d
            )))
        }
        FinSpacing::DistanceBetween(d) => (0..)
            .map(|i| i as f64 * d)
            .take_while(|step| *step < span - 1e-9)
            .collect(),
    };
    Ok(steps
        .into_iter()
        .map(|step| if from_low { lo + step } else { hi - step })
        .collect())
}

/// Spans where the line at `level` lies inside the loops (even-odd).
fn contour_segments(loops: &[Vec<Point2<f64>>], level: f64) -> Vec<(f64, f64)> {
    let mut hits = Vec::new();
    for pts in loops {
        for (i, a) in pts.iter().enumerate() {
            let b = &pts[(i + 1) % pts.len()];
            if (a.y > level) != (b.y > level) {
                hits.push(a.x + (level - a.y) / (b.y - a.y) * (b.x - a.x));
            }
        }
    }
    hits.sort_by(f64::total_cmp);
    hits.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    /// Window in a south-facing wall (normal -Y).
    fn south_window(width: f64, height: f64) -> Face3D {
        Face3D::rectangle(Point3::new(0.0, 0.0, 1.0), Vector3::x(), Vector3::z(), width, height)
            .unwrap()
    }

    fn max_z(face: &Face3D) -> f64 {
        face.boundary().iter().map(|p| p.z).fold(f64::NEG_INFINITY, f64::max)
    }

    fn min_z(face: &Face3D) -> f64 {
        face.boundary().iter().map(|p| p.z).fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn single_contour_sits_on_the_top_edge() {
        let fins = contour_fins(&south_window(2.0, 1.0), FinSpacing::Count(1), &FinOptions::new(0.5))
            .unwrap();
        assert_eq!(fins.len(), 1);
        assert_relative_eq!(fins[0].area(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(min_z(&fins[0]), 2.0, epsilon = 1e-9);
        assert_relative_eq!(max_z(&fins[0]), 2.0, epsilon = 1e-9);
        assert!(fins[0].center().y < 0.0);
    }

    #[test]
    fn count_spreads_down_from_the_top() {
        let fins = contour_fins(&south_window(2.0, 1.0), FinSpacing::Count(4), &FinOptions::new(0.2))
            .unwrap();
        let levels: Vec<f64> = fins.iter().map(max_z).collect();
        for (level, expected) in levels.iter().zip([2.0, 1.75, 1.5, 1.25]) {
            assert_relative_eq!(*level, expected, epsilon = 1e-9);
        }
        for fin in &fins {
            assert_relative_eq!(fin.area(), 0.4, epsilon = 1e-9);
        }
    }

    #[test]
    fn flipped_start_begins_at_the_bottom() {
        let options = FinOptions {
            flip_start_side: true,
            ..FinOptions::new(0.2)
        };
        let fins = contour_fins(&south_window(2.0, 1.0), FinSpacing::Count(2), &options).unwrap();
        assert_relative_eq!(max_z(&fins[0]), 1.0, epsilon = 1e-9);
        assert_relative_eq!(max_z(&fins[1]), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn distance_between_stops_before_the_far_edge() {
        let fins = contour_fins(
            &south_window(1.0, 1.0),
            FinSpacing::DistanceBetween(0.3),
            &FinOptions::new(0.1),
        )
        .unwrap();
        assert_eq!(fins.len(), 4);
        assert_relative_eq!(max_z(&fins[3]), 1.1, epsilon = 1e-9);
    }

    #[test]
    fn vertical_contours_start_on_the_right() {
        let options = FinOptions {
            direction: ContourDirection::Vertical,
            ..FinOptions::new(0.3)
        };
        let window = south_window(2.0, 1.0);
        let right = contour_fins(&window, FinSpacing::Count(1), &options).unwrap();
        assert_eq!(right.len(), 1);
        assert!(right[0].boundary().iter().all(|p| (p.x - 2.0).abs() < 1e-9));
        assert_relative_eq!(right[0].area(), 0.3, epsilon = 1e-9);

        let left_options = FinOptions {
            flip_start_side: true,
            ..options
        };
        let left = contour_fins(&window, FinSpacing::Count(1), &left_options).unwrap();
        assert!(left[0].boundary().iter().all(|p| p.x.abs() < 1e-9));
    }

    #[test]
    fn offset_and_angle_move_the_fin() {
        let options = FinOptions {
            offset: 0.1,
            angle: FRAC_PI_2,
            ..FinOptions::new(0.5)
        };
        let fins = contour_fins(&south_window(1.0, 1.0), FinSpacing::Count(1), &options).unwrap();
        // rotated a quarter turn the fin hangs down in a plane 0.1 off the wall
        assert!(fins[0].boundary().iter().all(|p| (p.y + 0.1).abs() < 1e-9));
        assert_relative_eq!(min_z(&fins[0]), 1.5, epsilon = 1e-9);
    }

    #[test]
    fn contour_at_an_apex_is_skipped() {
        let triangle = Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 2.0),
        ])
        .unwrap();
        let options = FinOptions {
            tolerance: 0.01,
            ..FinOptions::new(0.2)
        };
        let fins = contour_fins(&triangle, FinSpacing::Count(2), &options).unwrap();
        assert_eq!(fins.len(), 1);
        assert_relative_eq!(max_z(&fins[0]), 1.0, epsilon = 1e-9);
        assert_relative_eq!(fins[0].area(), 0.2, epsilon = 1e-9);
    }

    #[test]
    fn holes_split_a_contour() {
        let wall = Face3D::with_holes(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 0.0),
                Point3::new(3.0, 0.0, 3.0),
                Point3::new(0.0, 0.0, 3.0),
            ],
            vec![vec![
                Point3::new(1.0, 0.0, 1.0),
                Point3::new(1.0, 0.0, 2.0),
                Point3::new(2.0, 0.0, 2.0),
                Point3::new(2.0, 0.0, 1.0),
            ]],
        )
        .unwrap();
        let fins = contour_fins(&wall, FinSpacing::Count(2), &FinOptions::new(0.1)).unwrap();
        assert_eq!(fins.len(), 3);
        let total: f64 = fins.iter().map(Face3D::area).sum();
        assert_relative_eq!(total, 0.3 + 0.2, epsilon = 1e-9);
    }

    #[test]
    fn invalid_spacing_is_rejected() {
        let window = south_window(1.0, 1.0);
        let options = FinOptions::new(0.1);
        assert!(contour_fins(&window, FinSpacing::Count(0), &options).is_err());
        assert!(contour_fins(&window, FinSpacing::DistanceBetween(0.0), &options).is_err());
        assert!(contour_fins(&window, FinSpacing::Count(1), &FinOptions::new(0.0)).is_err());
    }

    #[test]
    fn border_wraps_every_edge() {
        let border = extruded_border(&south_window(2.0, 1.0), 0.25).unwrap();
        assert_eq!(border.len(), 4);
        let total: f64 = border.iter().map(Face3D::area).sum();
        assert_relative_eq!(total, 6.0 * 0.25, epsilon = 1e-9);
        assert!(border.iter().all(|f| f.center().y < 0.0));
    }
}
