// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Louvers, fins, overhangs and borders generated as shades on a host.
//!
//! Outdoor shading is cut from the host geometry as it is. Indoor shading
//! is cut from the flipped geometry and attached as indoor shades, so
//! "right" and "left" are seen from the side the shades project into.

use honeybee_geometry::{ContourDirection, Face3D, FinOptions, FinSpacing};

use crate::error::Result;
use crate::shade::{Shade, ShadeHost};
use crate::typing::clean_string;

/// Layout of generated louvers. Lengths are in model units and the angle
/// is in degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct LouverSpec {
    pub depth: f64,
    /// Distance between the host and the louvers.
    pub offset: f64,
    /// Rotation of each louver about its contour line.
    pub angle: f64,
    pub direction: ContourDirection,
    /// Start from the bottom (or left) instead of the top (or right).
    pub flip_start_side: bool,
    pub indoor: bool,
    /// Louvers shorter than this are skipped.
    pub tolerance: f64,
    /// Text between the host identifier and the louver index. Defaults to
    /// `OutShd` or `InShd`.
    pub base_name: Option<String>,
}

impl LouverSpec {
    pub fn new(depth: f64) -> Self {
        Self {
            depth,
            offset: 0.0,
            angle: 0.0,
            direction: ContourDirection::Horizontal,
            flip_start_side: false,
            indoor: false,
            tolerance: 0.0,
            base_name: None,
        }
    }

    fn fin_options(&self) -> FinOptions {
        FinOptions {
            depth: self.depth,
            offset: self.offset,
            angle: self.angle.to_radians(),
            direction: self.direction,
            flip_start_side: self.flip_start_side,
            tolerance: self.tolerance,
        }
    }

    fn side_name(&self, outdoor: &str, indoor: &str) -> String {
        let side = if self.indoor { indoor } else { outdoor };
        side.to_string()
    }
}

/// Shade hosts with a single face to cut louvers from.
pub trait LouverHost: ShadeHost {
    fn louver_geometry(&self) -> &Face3D;

    /// Adds `count` louvers, the first on the starting edge. Returns the
    /// new shade identifiers.
    fn louvers_by_count(&mut self, count: usize, spec: &LouverSpec) -> Result<Vec<String>> {
        let base = spec
            .base_name
            .clone()
            .unwrap_or_else(|| spec.side_name("OutShd", "InShd"));
        let shapes = cut(self.louver_geometry(), FinSpacing::Count(count), spec)?;
        attach(self, shapes, spec.indoor, &base)
    }

    /// Adds louvers `distance` apart starting on the starting edge.
    fn louvers_by_distance_between(&mut self, distance: f64, spec: &LouverSpec) -> Result<Vec<String>> {
        let base = spec
            .base_name
            .clone()
            .unwrap_or_else(|| spec.side_name("OutShd", "InShd"));
        let shapes = cut(self.louver_geometry(), FinSpacing::DistanceBetween(distance), spec)?;
        attach(self, shapes, spec.indoor, &base)
    }

    /// One horizontal louver along the top edge. `None` when the top is a
    /// point or shorter than the tolerance.
    fn overhang(&mut self, spec: &LouverSpec) -> Result<Option<String>> {
        let spec = LouverSpec {
            direction: ContourDirection::Horizontal,
            flip_start_side: false,
            base_name: Some(spec.side_name("OutOverhang", "InOverhang")),
            ..spec.clone()
        };
        Ok(self.louvers_by_count(1, &spec)?.pop())
    }

    /// One vertical fin along the right edge.
    fn right_fin(&mut self, spec: &LouverSpec) -> Result<Option<String>> {
        let spec = LouverSpec {
            direction: ContourDirection::Vertical,
            flip_start_side: false,
            base_name: Some(spec.side_name("OutRightFin", "InRightFin")),
            ..spec.clone()
        };
        Ok(self.louvers_by_count(1, &spec)?.pop())
    }

    /// One vertical fin along the left edge.
    fn left_fin(&mut self, spec: &LouverSpec) -> Result<Option<String>> {
        let spec = LouverSpec {
            direction: ContourDirection::Vertical,
            flip_start_side: true,
            base_name: Some(spec.side_name("OutLeftFin", "InLeftFin")),
            ..spec.clone()
        };
        Ok(self.louvers_by_count(1, &spec)?.pop())
    }

    /// A shade per edge, extruded `depth` away from the host on the
    /// chosen side.
    fn extruded_border(&mut self, depth: f64, indoor: bool) -> Result<Vec<String>> {
        let geometry = self.louver_geometry();
        let source = if indoor { geometry.flip() } else { geometry.clone() };
        let shapes = source.extruded_border(depth)?;
        let base = if indoor { "InBorder" } else { "OutBorder" };
        attach(self, shapes, indoor, base)
    }
}

fn cut(geometry: &Face3D, spacing: FinSpacing, spec: &LouverSpec) -> Result<Vec<Face3D>> {
    let source = if spec.indoor { geometry.flip() } else { geometry.clone() };
    Ok(source.contour_fins(spacing, &spec.fin_options())?)
}

fn attach<H: LouverHost + ?Sized>(
    host: &mut H,
    shapes: Vec<Face3D>,
    indoor: bool,
    base: &str,
) -> Result<Vec<String>> {
    let mut created = Vec::with_capacity(shapes.len());
    for (i, geometry) in shapes.into_iter().enumerate() {
        let identifier = clean_string(&format!("{}_{}{}", host.identifier(), base, i));
        let shade = Shade::new(&identifier, geometry)?;
        if indoor {
            host.add_indoor_shade(shade)?;
        } else {
            host.add_outdoor_shade(shade)?;
        }
        created.push(identifier);
    }
    Ok(created)
}
