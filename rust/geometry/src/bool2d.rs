// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! 2D polygon booleans backed by i_overlay.
//!
//! Used to cut sub-faces out of their parent face and to measure how much
//! two coplanar polygons share. Loops are projected into a common plane
//! before they reach this module.

use i_overlay::core::fill_rule::FillRule;
use i_overlay::core::overlay_rule::OverlayRule;
use i_overlay::float::single::SingleFloatOverlay;
use nalgebra::Point2;

use crate::polygon;

/// Regions smaller than this are dropped from boolean results.
const MIN_REGION_AREA: f64 = 1e-10;

/// One connected area: a counterclockwise outer loop and clockwise holes.
#[derive(Debug, Clone, PartialEq)]
pub struct Region2D {
    pub outer: Vec<Point2<f64>>,
    pub holes: Vec<Vec<Point2<f64>>>,
}

impl Region2D {
    pub fn area(&self) -> f64 {
        let holes: f64 = self
            .holes
            .iter()
            .map(|h| polygon::signed_area(h).abs())
            .sum();
        (polygon::signed_area(&self.outer).abs() - holes).max(0.0)
    }

    pub fn perimeter(&self) -> f64 {
        std::iter::once(&self.outer)
            .chain(self.holes.iter())
            .map(|pts| loop_length(pts))
            .sum()
    }
}

/// Area shared by two simple polygons.
pub fn intersection(a: &[Point2<f64>], b: &[Point2<f64>]) -> Vec<Region2D> {
    if a.len() < 3 || b.len() < 3 {
        return Vec::new();
    }
    let subject = vec![contour_to_path(&ensure_ccw(a))];
    let clip = vec![contour_to_path(&ensure_ccw(b))];
    let shapes = subject.overlay(&clip, OverlayRule::Intersect, FillRule::NonZero);
    shapes_to_regions(shapes)
}

/// A region (outer loop plus holes) minus a set of cutters.
///
/// Cutters may overlap each other or cross the outer loop. A cutter that
/// splits the region yields several regions.
pub fn difference(
    outer: &[Point2<f64>],
    holes: &[Vec<Point2<f64>>],
    cutters: &[Vec<Point2<f64>>],
) -> Vec<Region2D> {
    if outer.len() < 3 {
        return Vec::new();
    }
    // NonZero with consistent winding: holes cancel the outer loop and
    // overlapping cutters merge instead of cancelling.
    let subject: Vec<Vec<[f64; 2]>> = std::iter::once(contour_to_path(&ensure_ccw(outer)))
        .chain(
            holes
                .iter()
                .filter(|h| h.len() >= 3)
                .map(|h| contour_to_path(&ensure_cw(h))),
        )
        .collect();
    let clip: Vec<Vec<[f64; 2]>> = cutters
        .iter()
        .filter(|c| c.len() >= 3)
        .map(|c| contour_to_path(&ensure_ccw(c)))
        .collect();
    if clip.is_empty() {
        return shapes_to_regions(vec![subject]);
    }
    let shapes = subject.overlay(&clip, OverlayRule::Difference, FillRule::NonZero);
    shapes_to_regions(shapes)
}

/// True when two simple polygons share a region wider than `tolerance`.
///
/// Each shared region counts when its area exceeds `tolerance` times half
/// its perimeter, so edge contact and slivers thinner than the tolerance
/// are ignored.
pub fn polygons_overlap(a: &[Point2<f64>], b: &[Point2<f64>], tolerance: f64) -> bool {
    intersection(a, b)
        .iter()
        .any(|r| r.area() > (tolerance * r.perimeter() * 0.5).max(MIN_REGION_AREA))
}

fn ensure_ccw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if polygon::signed_area(contour) < 0.0 {
        contour.iter().rev().copied().collect()
    } else {
        contour.to_vec()
    }
}

fn ensure_cw(contour: &[Point2<f64>]) -> Vec<Point2<f64>> {
    if polygon::signed_area(contour) > 0.0 {
        contour.iter().rev().copied().collect()
    } else {
        contour.to_vec()
    }
}

fn contour_to_path(contour: &[Point2<f64>]) -> Vec<[f64; 2]> {
    contour.iter().map(|p| [p.x, p.y]).collect()
}

fn path_to_contour(path: &[[f64; 2]]) -> Vec<Point2<f64>> {
    path.iter().map(|p| Point2::new(p[0], p[1])).collect()
}

/// i_overlay shapes list the outer contour first, then the holes.
fn shapes_to_regions(shapes: Vec<Vec<Vec<[f64; 2]>>>) -> Vec<Region2D> {
    shapes
        .iter()
        .filter_map(|shape| {
            let (first, rest) = shape.split_first()?;
            let outer = path_to_contour(first);
            if outer.len() < 3 {
                return None;
            }
            let holes = rest
                .iter()
                .map(|h| path_to_contour(h))
                .filter(|h| h.len() >= 3 && polygon::signed_area(h).abs() > MIN_REGION_AREA)
                .map(|h| ensure_cw(&h))
                .collect();
            let region = Region2D {
                outer: ensure_ccw(&outer),
                holes,
            };
            (region.area() > MIN_REGION_AREA).then_some(region)
        })
        .collect()
}

fn loop_length(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n).map(|i| (points[(i + 1) % n] - points[i]).norm()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rect(x0: f64, y0: f64, w: f64, h: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(x0, y0),
            Point2::new(x0 + w, y0),
            Point2::new(x0 + w, y0 + h),
            Point2::new(x0, y0 + h),
        ]
    }

    fn total_area(regions: &[Region2D]) -> f64 {
        regions.iter().map(Region2D::area).sum()
    }

    #[test]
    fn overlap_detection() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        assert!(polygons_overlap(&a, &rect(0.5, 0.0, 1.0, 1.0), 0.001));
        assert!(!polygons_overlap(&a, &rect(1.0, 0.0, 1.0, 1.0), 0.001));
        assert!(polygons_overlap(&a, &a, 0.001));
        assert!(!polygons_overlap(&a, &rect(3.0, 3.0, 1.0, 1.0), 0.001));
    }

    #[test]
    fn strip_overlap_sharing_edge_endpoints() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(0.0, 0.9, 1.0, 1.0);
        assert_relative_eq!(total_area(&intersection(&a, &b)), 0.1, epsilon = 1e-9);
        assert!(polygons_overlap(&a, &b, 0.01));
    }

    #[test]
    fn sliver_within_tolerance_is_contact() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(0.995, 0.0, 1.0, 1.0);
        assert!(!polygons_overlap(&a, &b, 0.01));
        assert!(polygons_overlap(&a, &b, 0.001));
    }

    #[test]
    fn clockwise_input_is_accepted() {
        let mut a = rect(0.0, 0.0, 2.0, 2.0);
        a.reverse();
        assert_relative_eq!(
            total_area(&intersection(&a, &rect(1.0, 1.0, 2.0, 2.0))),
            1.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn overlapping_cutters_are_subtracted_once() {
        let regions = difference(
            &rect(0.0, 0.0, 5.0, 3.0),
            &[],
            &[rect(1.0, 0.5, 1.0, 1.0), rect(1.0, 1.4, 1.0, 1.0)],
        );
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].holes.len(), 1);
        assert_relative_eq!(total_area(&regions), 15.0 - 1.9, epsilon = 1e-9);
    }

    #[test]
    fn cutter_on_the_boundary_notches_the_outer_loop() {
        let regions = difference(&rect(0.0, 0.0, 5.0, 3.0), &[], &[rect(1.0, 0.0, 1.0, 1.0)]);
        assert_eq!(regions.len(), 1);
        assert!(regions[0].holes.is_empty());
        assert_relative_eq!(total_area(&regions), 14.0, epsilon = 1e-9);
    }

    #[test]
    fn full_height_cutter_splits_the_region() {
        let regions = difference(&rect(0.0, 0.0, 5.0, 3.0), &[], &[rect(2.0, -1.0, 1.0, 5.0)]);
        assert_eq!(regions.len(), 2);
        assert_relative_eq!(total_area(&regions), 12.0, epsilon = 1e-9);
    }

    #[test]
    fn existing_holes_are_kept() {
        let regions = difference(
            &rect(0.0, 0.0, 5.0, 3.0),
            &[rect(3.0, 1.0, 1.0, 1.0)],
            &[rect(0.5, 1.0, 1.0, 1.0)],
        );
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].holes.len(), 2);
        assert_relative_eq!(total_area(&regions), 13.0, epsilon = 1e-9);
    }
}
