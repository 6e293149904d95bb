// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # Honeybee Core
//!
//! Building geometry model for environmental simulation tooling.
//!
//! ## Overview
//!
//! The crate holds a tree of geometric entities and the rules downstream
//! engines rely on:
//!
//! - **Entities**: [`Model`] → [`Room`] → [`Face`] → [`Aperture`] / [`Door`],
//!   with [`Shade`]s on any host and free-standing [`ShadeMesh`]es
//! - **Boundary conditions**: Outdoors, Ground, Surface (adjacency) and
//!   registered extension conditions
//! - **Adjacency**: matching faces between rooms and linking them and their
//!   sub-faces with Surface conditions
//! - **Validation**: checks reporting through one raise / message /
//!   structured-record contract
//! - **Records**: JSON round trip of every entity
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use honeybee_core::{Model, Room};
//! use honeybee_geometry::Point3;
//!
//! let mut model = Model::new("Office_Block")?;
//! model.add_room(Room::from_box("West", 5.0, 5.0, 3.0, 0.0, Point3::origin())?);
//! model.add_room(Room::from_box("East", 5.0, 5.0, 3.0, 0.0, Point3::new(5.0, 0.0, 0.0))?);
//!
//! let info = model.solve_adjacency()?;
//! println!("{} adjacent faces", info.faces.len());
//!
//! let report = model.check_all(false, true)?;
//! for error in report.errors() {
//!     println!("{}: {}", error.code, error.message);
//! }
//! ```
//!
//! ## Transforms
//!
//! Every entity implements [`Transformable`](honeybee_geometry::Transformable),
//! cascading to its children, property extensions and cached geometry.
//! Angles are in degrees.

pub mod adjacency;
pub mod aperture;
pub mod boundary_condition;
pub mod door;
pub mod element;
pub mod error;
pub mod face;
pub mod face_type;
pub mod louvers;
pub mod model;
pub mod orientation;
pub mod properties;
mod record;
pub mod room;
pub mod shade;
pub mod shade_mesh;
pub mod triangulation;
pub mod typing;
pub mod units;
pub mod validation;

pub use adjacency::{find_adjacency, solve_adjacency, AdjacencyInfo, FacePair};
pub use aperture::Aperture;
pub use boundary_condition::{
    register_boundary_condition, BoundaryCondition, ExtensionCondition, Outdoors, Surface,
    SurfaceTarget, ViewFactor,
};
pub use door::Door;
pub use element::{ElementType, Entity, Identity};
pub use error::{Error, Result};
pub use face::{Face, SubFacePairs};
pub use face_type::FaceType;
pub use louvers::{LouverHost, LouverSpec};
pub use model::Model;
pub use properties::{
    register_property_extension, PassthroughExtension, Properties, PropertyExtension,
};
pub use room::Room;
pub use shade::{Shade, ShadeHost, ShadeSet};
pub use shade_mesh::ShadeMesh;
pub use triangulation::TriangulatedSubFace;
pub use units::{parse_distance_string, Units};
pub use validation::{
    codes, finish_check, CheckReport, GeometryChecks, ParentRef, ValidationError,
};
