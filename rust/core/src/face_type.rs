// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

use honeybee_geometry::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Normals within this many degrees of +Z are roofs.
pub const ROOF_ANGLE: f64 = 30.0;
/// Normals more than this many degrees from +Z are floors.
pub const FLOOR_ANGLE: f64 = 150.0;

/// Type of a face, used by simulation engines to pick defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaceType {
    Wall,
    Floor,
    RoofCeiling,
    AirBoundary,
}

impl FaceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaceType::Wall => "Wall",
            FaceType::Floor => "Floor",
            FaceType::RoofCeiling => "RoofCeiling",
            FaceType::AirBoundary => "AirBoundary",
        }
    }

    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "Wall" => Ok(FaceType::Wall),
            "Floor" => Ok(FaceType::Floor),
            "RoofCeiling" => Ok(FaceType::RoofCeiling),
            "AirBoundary" => Ok(FaceType::AirBoundary),
            other => Err(Error::InvalidValue(format!("unknown face type \"{}\"", other))),
        }
    }

    /// Wall, Floor or RoofCeiling from the angle between `normal` and +Z.
    pub fn from_normal(normal: &Vector3<f64>) -> Self {
        Self::from_normal_with_angles(normal, ROOF_ANGLE, FLOOR_ANGLE)
    }

    pub fn from_normal_with_angles(normal: &Vector3<f64>, roof_angle: f64, floor_angle: f64) -> Self {
        if normal.norm() < 1e-12 {
            return FaceType::Wall;
        }
        let angle = normal.angle(&Vector3::z()).to_degrees();
        if angle < roof_angle {
            FaceType::RoofCeiling
        } else if angle > floor_angle {
            FaceType::Floor
        } else {
            FaceType::Wall
        }
    }
}

impl fmt::Display for FaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_from_normal() {
        assert_eq!(FaceType::from_normal(&Vector3::new(0.0, 0.0, 1.0)), FaceType::RoofCeiling);
        assert_eq!(FaceType::from_normal(&Vector3::new(0.0, 0.0, -1.0)), FaceType::Floor);
        assert_eq!(FaceType::from_normal(&Vector3::new(1.0, 0.0, 0.0)), FaceType::Wall);
        // 45 degree pitched roof
        assert_eq!(FaceType::from_normal(&Vector3::new(1.0, 0.0, 1.0)), FaceType::Wall);
        assert_eq!(FaceType::from_normal(&Vector3::new(0.3, 0.0, 1.0)), FaceType::RoofCeiling);
    }

    #[test]
    fn names_round_trip() {
        for t in [FaceType::Wall, FaceType::Floor, FaceType::RoofCeiling, FaceType::AirBoundary] {
            assert_eq!(FaceType::by_name(t.as_str()).unwrap(), t);
        }
        assert!(FaceType::by_name("Window").is_err());
    }
}
