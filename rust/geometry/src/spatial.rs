// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Spatial hash for tolerance-based vertex welding.
//!
//! The grid divides space into cubic cells of side `cell_size`; lookups
//! scan the 3x3x3 neighborhood of the query cell.

use nalgebra::Point3;
use rustc_hash::FxHashMap;

/// Welds points within a tolerance into a shared, indexed vertex list.
#[derive(Debug)]
pub struct VertexWelder {
    tolerance: f64,
    cell_size: f64,
    grid: FxHashMap<(i64, i64, i64), Vec<usize>>,
    vertices: Vec<Point3<f64>>,
}

impl VertexWelder {
    pub fn new(tolerance: f64) -> Self {
        let tolerance = tolerance.max(0.0);
        Self {
            tolerance,
            cell_size: tolerance.max(1e-9),
            grid: FxHashMap::default(),
            vertices: Vec::new(),
        }
    }

    /// Index of an existing vertex within tolerance of `p`, or of a newly
    /// inserted one.
    pub fn find_or_insert(&mut self, p: &Point3<f64>) -> usize {
        if let Some(existing) = self.find_near(p) {
            return existing;
        }
        let index = self.vertices.len();
        self.vertices.push(*p);
        let cell = self.cell_coords(p);
        self.grid.entry(cell).or_default().push(index);
        index
    }

    /// First vertex within tolerance of `p`.
    pub fn find_near(&self, p: &Point3<f64>) -> Option<usize> {
        let (cx, cy, cz) = self.cell_coords(p);
        let tol_sq = self.tolerance * self.tolerance;

        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    if let Some(indices) = self.grid.get(&(cx + dx, cy + dy, cz + dz)) {
                        for &i in indices {
                            if (self.vertices[i] - p).norm_squared() <= tol_sq {
                                return Some(i);
                            }
                        }
                    }
                }
            }
        }

        None
    }

    pub fn into_vertices(self) -> Vec<Point3<f64>> {
        self.vertices
    }

    fn cell_coords(&self, p: &Point3<f64>) -> (i64, i64, i64) {
        (
            (p.x / self.cell_size).floor() as i64,
            (p.y / self.cell_size).floor() as i64,
            (p.z / self.cell_size).floor() as i64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welds_within_tolerance() {
        let mut welder = VertexWelder::new(0.01);
        let a = welder.find_or_insert(&Point3::new(1.0, 1.0, 1.0));
        let b = welder.find_or_insert(&Point3::new(1.004, 1.0, 0.996));
        let c = welder.find_or_insert(&Point3::new(1.1, 1.0, 1.0));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(welder.into_vertices().len(), 2);
    }

    #[test]
    fn welds_across_cell_boundaries() {
        let mut welder = VertexWelder::new(0.01);
        let a = welder.find_or_insert(&Point3::new(0.0099, 0.0, 0.0));
        let b = welder.find_or_insert(&Point3::new(0.0101, 0.0, 0.0));
        assert_eq!(a, b);
    }
}
