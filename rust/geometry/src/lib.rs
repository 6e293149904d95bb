// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Honeybee geometry
//!
//! Planar polygons, meshes and welded polyfaces used by the building
//! model, built on nalgebra with earcutr triangulation and i_overlay booleans.

pub mod bool2d;
pub mod bounds;
pub mod error;
pub mod face;
pub mod fins;
pub mod mesh;
pub mod plane;
pub mod polyface;
pub mod polygon;
pub mod spatial;
pub mod transform;

// Re-export nalgebra types for convenience
pub use nalgebra::{Point2, Point3, Vector2, Vector3};

pub use bool2d::Region2D;
pub use bounds::BoundingBox;
pub use error::{Error, Result};
pub use face::{Face3D, Face3DRecord};
pub use fins::{ContourDirection, FinOptions, FinSpacing};
pub use mesh::{Mesh3D, Mesh3DRecord};
pub use plane::{Plane, PlaneRecord};
pub use polyface::{LineSegment3D, Polyface3D, Polyface3DRecord};
pub use transform::{Transform, Transformable};
