// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compass orientation of surface normals.

use honeybee_geometry::Vector3;

/// Clockwise angle in degrees from north to the horizontal projection of
/// `normal`, in `[0, 360)`. `north_angle` is the counterclockwise rotation
/// of north away from +Y, in degrees. Horizontal surfaces return 0.
pub fn horizontal_orientation(normal: &Vector3<f64>, north_angle: f64) -> f64 {
    if normal.x.hypot(normal.y) < 1e-9 {
        return 0.0;
    }
    let north = north_angle.to_radians();
    let (nx, ny) = (-north.sin(), north.cos());
    // atan2 of cross and dot gives the counterclockwise angle; negate it
    let ccw = (nx * normal.y - ny * normal.x).atan2(nx * normal.x + ny * normal.y);
    let orientation = (-ccw.to_degrees()).rem_euclid(360.0);
    if orientation > 360.0 - 1e-9 {
        0.0
    } else {
        orientation
    }
}

/// `North`, `East`, `South` or `West` for a horizontal orientation.
pub fn cardinal_direction(orientation: f64) -> &'static str {
    match orientation.rem_euclid(360.0) {
        o if !(45.0..315.0).contains(&o) => "North",
        o if o < 135.0 => "East",
        o if o < 225.0 => "South",
        _ => "West",
    }
}

/// Angle in degrees of `normal` above the horizon.
pub fn altitude(normal: &Vector3<f64>) -> f64 {
    let n = normal.normalize();
    n.z.clamp(-1.0, 1.0).asin().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn compass_points() {
        let east = Vector3::new(1.0, 0.0, 0.0);
        let south = Vector3::new(0.0, -1.0, 0.0);
        assert_relative_eq!(horizontal_orientation(&east, 0.0), 90.0, epsilon = 1e-9);
        assert_relative_eq!(horizontal_orientation(&south, 0.0), 180.0, epsilon = 1e-9);
        assert_eq!(cardinal_direction(horizontal_orientation(&east, 0.0)), "East");
        assert_eq!(cardinal_direction(350.0), "North");
        assert_eq!(cardinal_direction(270.0), "West");
    }

    #[test]
    fn rotated_north() {
        // north turned 90 degrees counterclockwise points at -X
        let west = Vector3::new(-1.0, 0.0, 0.0);
        assert_relative_eq!(horizontal_orientation(&west, 90.0), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn altitude_of_roofs_and_walls() {
        assert_relative_eq!(altitude(&Vector3::new(0.0, 0.0, 1.0)), 90.0);
        assert_relative_eq!(altitude(&Vector3::new(1.0, 0.0, 0.0)), 0.0);
        assert_eq!(horizontal_orientation(&Vector3::new(0.0, 0.0, 1.0), 0.0), 0.0);
    }
}
