// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use nalgebra::Point3;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl BoundingBox {
    /// Bounding box of a point set, `None` when empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3<f64>>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bb = Self {
            min: first,
            max: first,
        };
        for p in iter {
            bb.min = bb.min.inf(p);
            bb.max = bb.max.sup(p);
        }
        Some(bb)
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// True when the boxes touch or overlap once grown by `tolerance`.
    pub fn overlaps(&self, other: &BoundingBox, tolerance: f64) -> bool {
        (0..3).all(|i| {
            self.min[i] <= other.max[i] + tolerance && other.min[i] <= self.max[i] + tolerance
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_boxes_overlap() {
        let a = BoundingBox::from_points(&[Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 5.0, 3.0)]).unwrap();
        let b = BoundingBox::from_points(&[Point3::new(0.0, 5.0, 0.0), Point3::new(5.0, 10.0, 3.0)]).unwrap();
        let c = BoundingBox::from_points(&[Point3::new(0.0, 5.1, 0.0), Point3::new(5.0, 10.0, 3.0)]).unwrap();
        assert!(a.overlaps(&b, 0.01));
        assert!(!a.overlaps(&c, 0.01));
        assert_eq!(a.union(&c).max.y, 10.0);
    }

    #[test]
    fn empty_input_has_no_box() {
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }
}
