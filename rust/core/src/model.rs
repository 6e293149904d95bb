// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The model: rooms plus everything not owned by a room
//!
//! A [`Model`] owns its rooms and four orphan collections (faces, shades,
//! apertures and doors without a parent) along with shade meshes. It
//! carries the units and tolerances that the adjacency solver and the
//! validation battery run with.
//!
//! Identifier uniqueness across the model is not enforced on insertion;
//! the duplicate checks report it.

use honeybee_geometry::{Transform, Transformable};
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::adjacency::{self, AdjacencyInfo};
use crate::aperture::Aperture;
use crate::boundary_condition::{BoundaryCondition, SurfaceTarget};
use crate::door::Door;
use crate::element::{ElementType, Entity, Identity, IdentityRecord};
use crate::error::{Error, Result};
use crate::face::Face;
use crate::face_type::FaceType;
use crate::properties::Properties;
use crate::record;
use crate::room::Room;
use crate::shade::{Shade, ShadeHost};
use crate::shade_mesh::ShadeMesh;
use crate::triangulation::{self, TriangulatedSubFace};
use crate::typing::float_in_range;
use crate::units::Units;
use crate::validation::{
    codes, duplicate_identifier_errors, finish_check, CheckReport, GeometryCheck, GeometryChecks,
    ValidationError,
};

/// Default angle tolerance in degrees.
pub const DEFAULT_ANGLE_TOLERANCE: f64 = 1.0;

#[derive(Debug, Clone)]
pub struct Model {
    identity: Identity,
    properties: Properties,
    rooms: Vec<Room>,
    orphaned_faces: Vec<Face>,
    orphaned_shades: Vec<Shade>,
    orphaned_apertures: Vec<Aperture>,
    orphaned_doors: Vec<Door>,
    shade_meshes: Vec<ShadeMesh>,
    units: Units,
    tolerance: f64,
    angle_tolerance: f64,
    north_angle: f64,
}

impl Model {
    /// An empty model in meters with the default tolerances.
    pub fn new(identifier: &str) -> Result<Self> {
        let units = Units::default();
        Ok(Self {
            identity: Identity::new(identifier)?,
            properties: Properties::new(),
            rooms: Vec::new(),
            orphaned_faces: Vec::new(),
            orphaned_shades: Vec::new(),
            orphaned_apertures: Vec::new(),
            orphaned_doors: Vec::new(),
            shade_meshes: Vec::new(),
            units,
            tolerance: units.default_tolerance(),
            angle_tolerance: DEFAULT_ANGLE_TOLERANCE,
            north_angle: 0.0,
        })
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Relabels the units without touching geometry. See
    /// [`Model::convert_to_units`] to rescale.
    pub fn set_units(&mut self, units: Units) {
        self.units = units;
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Distance tolerance; zero disables the tolerance-based checks.
    pub fn set_tolerance(&mut self, tolerance: f64) -> Result<()> {
        self.tolerance = float_in_range(tolerance, 0.0, f64::INFINITY, "model tolerance")?;
        Ok(())
    }

    pub fn angle_tolerance(&self) -> f64 {
        self.angle_tolerance
    }

    /// Angle tolerance in degrees.
    pub fn set_angle_tolerance(&mut self, angle_tolerance: f64) -> Result<()> {
        self.angle_tolerance =
            float_in_range(angle_tolerance, 0.0, 360.0, "model angle tolerance")?;
        Ok(())
    }

    /// Counterclockwise rotation of north from +Y, in degrees.
    pub fn north_angle(&self) -> f64 {
        self.north_angle
    }

    pub fn set_north_angle(&mut self, north_angle: f64) -> Result<()> {
        self.north_angle = float_in_range(north_angle, 0.0, 360.0, "model north angle")?;
        Ok(())
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn rooms_mut(&mut self) -> &mut [Room] {
        &mut self.rooms
    }

    pub fn orphaned_faces(&self) -> &[Face] {
        &self.orphaned_faces
    }

    pub fn orphaned_shades(&self) -> &[Shade] {
        &self.orphaned_shades
    }

    pub fn orphaned_apertures(&self) -> &[Aperture] {
        &self.orphaned_apertures
    }

    pub fn orphaned_doors(&self) -> &[Door] {
        &self.orphaned_doors
    }

    pub fn shade_meshes(&self) -> &[ShadeMesh] {
        &self.shade_meshes
    }

    pub fn add_room(&mut self, room: Room) {
        self.rooms.push(room);
    }

    pub fn add_rooms(&mut self, rooms: impl IntoIterator<Item = Room>) {
        self.rooms.extend(rooms);
    }

    /// Adds an orphaned face. Faces owned by a room are rejected.
    pub fn add_face(&mut self, face: Face) -> Result<()> {
        reject_parented(&face, face.has_parent())?;
        self.orphaned_faces.push(face);
        Ok(())
    }

    pub fn add_shade(&mut self, shade: Shade) -> Result<()> {
        reject_parented(&shade, shade.has_parent())?;
        self.orphaned_shades.push(shade);
        Ok(())
    }

    pub fn add_aperture(&mut self, aperture: Aperture) -> Result<()> {
        reject_parented(&aperture, aperture.has_parent())?;
        self.orphaned_apertures.push(aperture);
        Ok(())
    }

    pub fn add_door(&mut self, door: Door) -> Result<()> {
        reject_parented(&door, door.has_parent())?;
        self.orphaned_doors.push(door);
        Ok(())
    }

    pub fn add_shade_mesh(&mut self, shade_mesh: ShadeMesh) {
        self.shade_meshes.push(shade_mesh);
    }

    /// Moves every room and orphan of `other` into this model.
    pub fn add_model(&mut self, other: Model) {
        self.rooms.extend(other.rooms);
        self.orphaned_faces.extend(other.orphaned_faces);
        self.orphaned_shades.extend(other.orphaned_shades);
        self.orphaned_apertures.extend(other.orphaned_apertures);
        self.orphaned_doors.extend(other.orphaned_doors);
        self.shade_meshes.extend(other.shade_meshes);
    }

    pub fn remove_rooms(&mut self) -> Vec<Room> {
        std::mem::take(&mut self.rooms)
    }

    pub fn remove_room(&mut self, identifier: &str) -> Result<Room> {
        let index = self
            .rooms
            .iter()
            .position(|r| r.identifier() == identifier)
            .ok_or_else(|| Error::NotFound {
                element_type: ElementType::Room,
                identifiers: vec![identifier.to_string()],
            })?;
        Ok(self.rooms.remove(index))
    }

    pub fn remove_faces(&mut self) -> Vec<Face> {
        std::mem::take(&mut self.orphaned_faces)
    }

    pub fn remove_shades(&mut self) -> Vec<Shade> {
        std::mem::take(&mut self.orphaned_shades)
    }

    pub fn remove_apertures(&mut self) -> Vec<Aperture> {
        std::mem::take(&mut self.orphaned_apertures)
    }

    pub fn remove_doors(&mut self) -> Vec<Door> {
        std::mem::take(&mut self.orphaned_doors)
    }

    pub fn remove_shade_meshes(&mut self) -> Vec<ShadeMesh> {
        std::mem::take(&mut self.shade_meshes)
    }

    /// Every face: room faces in room order, then orphans.
    pub fn faces(&self) -> Vec<&Face> {
        self.rooms
            .iter()
            .flat_map(|r| r.faces())
            .chain(&self.orphaned_faces)
            .collect()
    }

    pub fn apertures(&self) -> Vec<&Aperture> {
        self.rooms
            .iter()
            .flat_map(|r| r.faces())
            .chain(&self.orphaned_faces)
            .flat_map(|f| f.apertures())
            .chain(&self.orphaned_apertures)
            .collect()
    }

    pub fn doors(&self) -> Vec<&Door> {
        self.rooms
            .iter()
            .flat_map(|r| r.faces())
            .chain(&self.orphaned_faces)
            .flat_map(|f| f.doors())
            .chain(&self.orphaned_doors)
            .collect()
    }

    /// Outdoor walls of every room, for edits that leave face geometry
    /// alone (sub-faces and shades).
    pub fn outdoor_walls_mut(&mut self) -> impl Iterator<Item = &mut Face> {
        self.rooms
            .iter_mut()
            .flat_map(|r| r.faces_for_conditions().iter_mut())
            .filter(|f| f.face_type() == FaceType::Wall && f.boundary_condition().is_outdoors())
    }

    /// Replaces the sub-faces of every outdoor wall with apertures covering
    /// `ratio` of the wall. Returns the number of walls edited.
    pub fn windows_by_ratio(&mut self, ratio: f64) -> Result<usize> {
        let mut walls = 0;
        for face in self.outdoor_walls_mut() {
            face.apertures_by_ratio(ratio)?;
            walls += 1;
        }
        debug!(model = %self.full_id(), walls, ratio, "Set windows by ratio");
        Ok(walls)
    }

    /// Triangle stand-ins for apertures with more than four sides, adjacent
    /// partners included. The model is not changed.
    pub fn triangulated_apertures(&self) -> Result<Vec<TriangulatedSubFace<Aperture>>> {
        triangulation::triangulate_sub_faces(&self.apertures())
    }

    pub fn triangulated_doors(&self) -> Result<Vec<TriangulatedSubFace<Door>>> {
        triangulation::triangulate_sub_faces(&self.doors())
    }

    /// Every shade at any depth, followed by the orphaned shades.
    pub fn shades(&self) -> Vec<&Shade> {
        let mut shades = Vec::new();
        for room in &self.rooms {
            shades.extend(room.shade_set().iter());
        }
        for face in self.faces() {
            shades.extend(face.shade_set().iter());
            for aperture in face.apertures() {
                shades.extend(aperture.shade_set().iter());
            }
            for door in face.doors() {
                shades.extend(door.shade_set().iter());
            }
        }
        for aperture in &self.orphaned_apertures {
            shades.extend(aperture.shade_set().iter());
        }
        for door in &self.orphaned_doors {
            shades.extend(door.shade_set().iter());
        }
        shades.extend(&self.orphaned_shades);
        shades
    }

    pub fn get_rooms_by_identifier(&self, identifiers: &[&str]) -> Result<Vec<&Room>> {
        find_by_identifier(self.rooms.iter().collect(), identifiers)
    }

    pub fn get_faces_by_identifier(&self, identifiers: &[&str]) -> Result<Vec<&Face>> {
        find_by_identifier(self.faces(), identifiers)
    }

    pub fn get_apertures_by_identifier(&self, identifiers: &[&str]) -> Result<Vec<&Aperture>> {
        find_by_identifier(self.apertures(), identifiers)
    }

    pub fn get_doors_by_identifier(&self, identifiers: &[&str]) -> Result<Vec<&Door>> {
        find_by_identifier(self.doors(), identifiers)
    }

    pub fn get_shades_by_identifier(&self, identifiers: &[&str]) -> Result<Vec<&Shade>> {
        find_by_identifier(self.shades(), identifiers)
    }

    pub fn get_shade_meshes_by_identifier(&self, identifiers: &[&str]) -> Result<Vec<&ShadeMesh>> {
        find_by_identifier(self.shade_meshes.iter().collect(), identifiers)
    }

    /// Rescales the geometry into `units` about the world origin and scales
    /// the tolerance with it.
    pub fn convert_to_units(&mut self, units: Units) {
        let factor = self.units.conversion_factor_to(units);
        if (factor - 1.0).abs() > f64::EPSILON {
            self.scale(factor, None);
            self.tolerance *= factor;
        }
        debug!(from = %self.units, to = %units, factor, "converted model units");
        self.units = units;
    }

    /// Solves adjacency between the rooms at the model tolerance.
    pub fn solve_adjacency(&mut self) -> Result<AdjacencyInfo> {
        adjacency::solve_adjacency(&mut self.rooms, self.tolerance)
    }

    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    fn duplicate_errors(&self) -> Vec<ValidationError> {
        let mut errors = duplicate_identifier_errors(self.rooms.iter(), codes::DUPLICATE_ROOM);
        errors.extend(duplicate_identifier_errors(self.faces(), codes::DUPLICATE_FACE));
        errors.extend(duplicate_identifier_errors(self.apertures(), codes::DUPLICATE_APERTURE));
        errors.extend(duplicate_identifier_errors(self.doors(), codes::DUPLICATE_DOOR));
        errors.extend(duplicate_identifier_errors(self.shades(), codes::DUPLICATE_SHADE));
        errors.extend(duplicate_identifier_errors(
            self.shade_meshes.iter(),
            codes::DUPLICATE_SHADE_MESH,
        ));
        errors
    }

    pub fn check_duplicate_room_identifiers(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = duplicate_identifier_errors(self.rooms.iter(), codes::DUPLICATE_ROOM);
        finish_check(errors, raise_exception, detailed)
    }

    pub fn check_duplicate_face_identifiers(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = duplicate_identifier_errors(self.faces(), codes::DUPLICATE_FACE);
        finish_check(errors, raise_exception, detailed)
    }

    /// Apertures and doors are checked separately.
    pub fn check_duplicate_sub_face_identifiers(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let mut errors = duplicate_identifier_errors(self.apertures(), codes::DUPLICATE_APERTURE);
        errors.extend(duplicate_identifier_errors(self.doors(), codes::DUPLICATE_DOOR));
        finish_check(errors, raise_exception, detailed)
    }

    pub fn check_duplicate_shade_identifiers(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = duplicate_identifier_errors(self.shades(), codes::DUPLICATE_SHADE);
        finish_check(errors, raise_exception, detailed)
    }

    pub fn check_duplicate_shade_mesh_identifiers(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors =
            duplicate_identifier_errors(self.shade_meshes.iter(), codes::DUPLICATE_SHADE_MESH);
        finish_check(errors, raise_exception, detailed)
    }

    fn geometry_errors(&self, check: GeometryCheck, tolerance: f64) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for room in &self.rooms {
            room.collect_geometry_errors(check, tolerance, &mut errors);
        }
        for face in &self.orphaned_faces {
            face.collect_geometry_errors(check, tolerance, &mut errors);
        }
        for aperture in &self.orphaned_apertures {
            aperture.collect_geometry_errors(check, tolerance, &mut errors);
        }
        for door in &self.orphaned_doors {
            door.collect_geometry_errors(check, tolerance, &mut errors);
        }
        errors.extend(
            self.orphaned_shades
                .iter()
                .filter_map(|s| s.geometry_error(check, tolerance)),
        );
        if check == GeometryCheck::NonZero {
            errors.extend(
                self.shade_meshes
                    .iter()
                    .filter_map(|m| m.non_zero_error(tolerance)),
            );
        }
        errors
    }

    /// Planarity of every planar object at the model tolerance.
    pub fn check_planar(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = self.geometry_errors(GeometryCheck::Planar, self.tolerance);
        finish_check(errors, raise_exception, detailed)
    }

    pub fn check_self_intersecting(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = self.geometry_errors(GeometryCheck::SelfIntersecting, 0.0);
        finish_check(errors, raise_exception, detailed)
    }

    /// Objects with an area below the model tolerance.
    pub fn check_non_zero(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = self.geometry_errors(GeometryCheck::NonZero, self.tolerance);
        finish_check(errors, raise_exception, detailed)
    }

    fn hosted_faces(&self) -> impl Iterator<Item = &Face> {
        self.rooms
            .iter()
            .flat_map(|r| r.faces())
            .chain(&self.orphaned_faces)
    }

    fn sub_faces_valid_errors(&self) -> Vec<ValidationError> {
        self.hosted_faces()
            .flat_map(|f| f.sub_faces_valid_errors(self.tolerance, self.angle_tolerance))
            .collect()
    }

    fn sub_faces_overlapping_errors(&self) -> Vec<ValidationError> {
        self.hosted_faces()
            .flat_map(|f| f.sub_faces_overlapping_errors(self.tolerance))
            .collect()
    }

    /// Apertures and doors that are not coplanar with, or not inside, their
    /// parent face.
    pub fn check_sub_faces_valid(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.sub_faces_valid_errors(), raise_exception, detailed)
    }

    pub fn check_sub_faces_overlapping(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.sub_faces_overlapping_errors(), raise_exception, detailed)
    }

    fn rooms_solid_errors(&self) -> Vec<ValidationError> {
        self.rooms
            .iter()
            .filter_map(|r| r.solid_error(self.tolerance))
            .collect()
    }

    /// Rooms whose faces do not close a volume at the model tolerance.
    pub fn check_rooms_solid(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.rooms_solid_errors(), raise_exception, detailed)
    }

    fn face_nodes(&self) -> Vec<SurfaceRef<'_, Face>> {
        self.faces()
            .into_iter()
            .map(|f| SurfaceRef {
                entity: f,
                condition: f.boundary_condition(),
                room: f.parent(),
            })
            .collect()
    }

    fn aperture_nodes(&self) -> Vec<SurfaceRef<'_, Aperture>> {
        self.apertures()
            .into_iter()
            .map(|a| SurfaceRef {
                entity: a,
                condition: a.boundary_condition(),
                room: a.room(),
            })
            .collect()
    }

    fn door_nodes(&self) -> Vec<SurfaceRef<'_, Door>> {
        self.doors()
            .into_iter()
            .map(|d| SurfaceRef {
                entity: d,
                condition: d.boundary_condition(),
                room: d.room(),
            })
            .collect()
    }

    fn missing_adjacency_errors(&self) -> Vec<ValidationError> {
        let mut errors = surface_reference_errors(&self.face_nodes());
        errors.extend(surface_reference_errors(&self.aperture_nodes()));
        errors.extend(surface_reference_errors(&self.door_nodes()));
        errors
    }

    /// Surface boundary conditions that point at a missing object, at the
    /// object itself, at an object of the same room, or at an object
    /// already referenced by another Surface condition.
    pub fn check_missing_adjacencies(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.missing_adjacency_errors(), raise_exception, detailed)
    }

    fn adjacent_area_errors(&self) -> Vec<ValidationError> {
        let mut errors = mismatched_area_errors(&self.face_nodes(), self.tolerance);
        errors.extend(mismatched_area_errors(&self.aperture_nodes(), self.tolerance));
        errors.extend(mismatched_area_errors(&self.door_nodes(), self.tolerance));
        errors
    }

    /// Adjacent pairs whose areas differ by more than `sqrt(area) * tolerance`.
    pub fn check_matching_adjacent_areas(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.adjacent_area_errors(), raise_exception, detailed)
    }

    fn air_boundary_adjacency_errors(&self) -> Vec<ValidationError> {
        self.faces()
            .into_iter()
            .filter(|f| f.face_type() == FaceType::AirBoundary && !f.boundary_condition().is_surface())
            .map(|f| {
                ValidationError::for_entity(
                    f,
                    codes::AIR_BOUNDARY_NOT_ADJACENT,
                    "Non-Adjacent AirBoundary",
                    format!(
                        "Face \"{}\" is an AirBoundary but is not adjacent to another Face.",
                        f.full_id()
                    ),
                )
                .with_parents(f.parent_refs())
            })
            .collect()
    }

    fn all_air_boundary_room_errors(&self) -> Vec<ValidationError> {
        self.rooms
            .iter()
            .filter(|r| {
                !r.faces().is_empty()
                    && r.faces().iter().all(|f| f.face_type() == FaceType::AirBoundary)
            })
            .map(|r| {
                ValidationError::for_entity(
                    r,
                    codes::ALL_AIR_BOUNDARY_ROOM,
                    "Room Composed Entirely of AirBoundaries",
                    format!("Room \"{}\" is composed entirely of AirBoundary Faces.", r.full_id()),
                )
            })
            .collect()
    }

    /// Every AirBoundary face must have a Surface boundary condition.
    pub fn check_all_air_boundaries_adjacent(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.air_boundary_adjacency_errors(), raise_exception, detailed)
    }

    pub fn check_rooms_not_all_air_boundary(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.all_air_boundary_room_errors(), raise_exception, detailed)
    }

    /// Runs every check in a fixed order and reports them together.
    ///
    /// The tolerance-based checks are skipped when the model tolerance is
    /// zero. With `raise_exception` the whole battery still runs first and a
    /// single [`Error::Validation`] is returned. Its errors keep the battery
    /// order, so `errors[0]` and the first line of the message are the
    /// first failure found.
    pub fn check_all(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let mut errors = self.duplicate_errors();
        if self.tolerance > 0.0 {
            errors.extend(self.geometry_errors(GeometryCheck::Planar, self.tolerance));
            errors.extend(self.geometry_errors(GeometryCheck::NonZero, self.tolerance));
        }
        errors.extend(self.geometry_errors(GeometryCheck::SelfIntersecting, 0.0));
        if self.tolerance > 0.0 {
            errors.extend(self.sub_faces_valid_errors());
            errors.extend(self.sub_faces_overlapping_errors());
            errors.extend(self.rooms_solid_errors());
        }
        errors.extend(self.missing_adjacency_errors());
        if self.tolerance > 0.0 {
            errors.extend(self.adjacent_area_errors());
        }
        errors.extend(self.air_boundary_adjacency_errors());
        errors.extend(self.all_air_boundary_room_errors());
        info!(model = %self.identifier(), errors = errors.len(), "model checks complete");
        finish_check(errors, raise_exception, detailed)
    }

    /// The model record. Children are written abridged.
    pub fn to_record(&self) -> Result<Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("Model".into()));
        record::write_identity(&mut map, &IdentityRecord::from_identity(&self.identity));
        map.insert(
            "properties".into(),
            self.properties.to_record(ElementType::Model, false),
        );
        map.insert("version".into(), Value::String(env!("CARGO_PKG_VERSION").into()));
        record::write_children(
            &mut map,
            "rooms",
            self.rooms
                .iter()
                .map(|r| r.to_record(true))
                .collect::<Result<_>>()?,
        );
        record::write_children(
            &mut map,
            "orphaned_faces",
            self.orphaned_faces
                .iter()
                .map(|f| f.to_record(true))
                .collect::<Result<_>>()?,
        );
        record::write_children(
            &mut map,
            "orphaned_shades",
            self.orphaned_shades
                .iter()
                .map(|s| s.to_record(true))
                .collect::<Result<_>>()?,
        );
        record::write_children(
            &mut map,
            "orphaned_apertures",
            self.orphaned_apertures
                .iter()
                .map(|a| a.to_record(true))
                .collect::<Result<_>>()?,
        );
        record::write_children(
            &mut map,
            "orphaned_doors",
            self.orphaned_doors
                .iter()
                .map(|d| d.to_record(true))
                .collect::<Result<_>>()?,
        );
        record::write_children(
            &mut map,
            "shade_meshes",
            self.shade_meshes
                .iter()
                .map(|m| m.to_record(true))
                .collect::<Result<_>>()?,
        );
        map.insert("units".into(), Value::String(self.units.as_str().into()));
        map.insert("tolerance".into(), Value::from(self.tolerance));
        map.insert("angle_tolerance".into(), Value::from(self.angle_tolerance));
        if self.north_angle != 0.0 {
            map.insert("north_angle".into(), Value::from(self.north_angle));
        }
        Ok(Value::Object(map))
    }

    pub fn from_record(value: &Value) -> Result<Self> {
        let map = record::typed_object(value, "Model")?;
        let mut model = Model::new(&record::identity(map)?.identifier)?;
        model.identity = record::identity(map)?.to_identity()?;
        model.properties = record::properties(map, ElementType::Model, false)?;

        if let Some(units) = map.get("units").and_then(Value::as_str) {
            model.units = Units::by_name(units)?;
        }
        let tolerance = map
            .get("tolerance")
            .and_then(Value::as_f64)
            .unwrap_or_else(|| model.units.default_tolerance());
        model.set_tolerance(tolerance)?;
        if let Some(angle) = map.get("angle_tolerance").and_then(Value::as_f64) {
            model.set_angle_tolerance(angle)?;
        }
        if let Some(north) = map.get("north_angle").and_then(Value::as_f64) {
            model.set_north_angle(north)?;
        }

        model.rooms = record::children(map, "rooms", ElementType::Room, |v| {
            Room::from_record(v, true)
        })?;
        for face in record::children(map, "orphaned_faces", ElementType::Face, |v| {
            Face::from_record(v, true)
        })? {
            model.add_face(face)?;
        }
        for shade in record::children(map, "orphaned_shades", ElementType::Shade, |v| {
            Shade::from_record(v, true)
        })? {
            model.add_shade(shade)?;
        }
        for aperture in record::children(map, "orphaned_apertures", ElementType::Aperture, |v| {
            Aperture::from_record(v, true)
        })? {
            model.add_aperture(aperture)?;
        }
        for door in record::children(map, "orphaned_doors", ElementType::Door, |v| {
            Door::from_record(v, true)
        })? {
            model.add_door(door)?;
        }
        model.shade_meshes = record::children(map, "shade_meshes", ElementType::ShadeMesh, |v| {
            ShadeMesh::from_record(v, true)
        })?;

        debug!(
            model = %model.identifier(),
            rooms = model.rooms.len(),
            orphaned_faces = model.orphaned_faces.len(),
            "loaded model record"
        );
        Ok(model)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_record()?)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_record()?)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_record(&value)
    }
}

impl Entity for Model {
    const ELEMENT_TYPE: ElementType = ElementType::Model;

    fn identity(&self) -> &Identity {
        &self.identity
    }
    fn identity_mut(&mut self) -> &mut Identity {
        &mut self.identity
    }
    fn properties(&self) -> &Properties {
        &self.properties
    }
    fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }
}

impl Transformable for Model {
    fn transform(&mut self, t: &Transform) {
        for room in self.rooms.iter_mut() {
            room.transform(t);
        }
        for face in self.orphaned_faces.iter_mut() {
            face.transform(t);
        }
        for shade in self.orphaned_shades.iter_mut() {
            shade.transform(t);
        }
        for aperture in self.orphaned_apertures.iter_mut() {
            aperture.transform(t);
        }
        for door in self.orphaned_doors.iter_mut() {
            door.transform(t);
        }
        for mesh in self.shade_meshes.iter_mut() {
            mesh.transform(t);
        }
        self.properties.transform(t);
    }
}

fn reject_parented<E: Entity>(entity: &E, has_parent: bool) -> Result<()> {
    if has_parent {
        return Err(Error::AlreadyParented {
            element_type: E::ELEMENT_TYPE,
            identifier: entity.identifier().to_string(),
        });
    }
    Ok(())
}

/// Entities in `items` with the given identifiers, in the order asked for.
fn find_by_identifier<'a, E: Entity>(items: Vec<&'a E>, identifiers: &[&str]) -> Result<Vec<&'a E>> {
    let index: FxHashMap<&str, &E> = items.into_iter().map(|e| (e.identifier(), e)).collect();
    let mut found = Vec::with_capacity(identifiers.len());
    let mut missing = Vec::new();
    for id in identifiers {
        match index.get(id) {
            Some(entity) => found.push(*entity),
            None => missing.push(id.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(Error::NotFound {
            element_type: E::ELEMENT_TYPE,
            identifiers: missing,
        });
    }
    Ok(found)
}

/// An object that may carry a Surface boundary condition.
struct SurfaceRef<'a, E> {
    entity: &'a E,
    condition: &'a BoundaryCondition,
    room: Option<&'a str>,
}

fn surface_reference_errors<'a, E: GeometryChecks + SurfaceTarget>(
    nodes: &[SurfaceRef<'a, E>],
) -> Vec<ValidationError> {
    let kind = E::ELEMENT_TYPE;
    let targets: FxHashMap<&'a str, &SurfaceRef<'a, E>> = nodes
        .iter()
        .map(|n| (n.entity.identifier(), n))
        .collect();
    let mut referrers: FxHashMap<&'a str, Vec<String>> = FxHashMap::default();
    let mut errors = Vec::new();

    for node in nodes {
        let Some(surface) = node.condition.surface() else {
            continue;
        };
        let id = node.entity.identifier();
        let target = surface.boundary_condition_object();
        referrers.entry(target).or_default().push(node.entity.full_id());

        let error = if target == id {
            Some((
                codes::SELF_ADJACENCY,
                "Self-Adjacent Object",
                format!("{} \"{}\" is adjacent to itself.", kind, node.entity.full_id()),
            ))
        } else {
            match targets.get(target) {
                None => Some((
                    codes::MISSING_ADJACENCY,
                    "Missing Adjacency",
                    format!(
                        "{} \"{}\" has an adjacent object \"{}\" that is missing from the model.",
                        kind,
                        node.entity.full_id(),
                        target
                    ),
                )),
                Some(other) => {
                    let recorded = surface.boundary_condition_objects();
                    let actual = other.entity.surface_chain();
                    // a bare identifier names no parents to compare
                    if recorded.len() > 1 && recorded[1..] != actual[1..] {
                        Some((
                            codes::MISSING_ADJACENCY,
                            "Missing Adjacency",
                            format!(
                                "{} \"{}\" has an adjacent object \"{}\" recorded under \"{}\" \
                                 but the model holds it under \"{}\".",
                                kind,
                                node.entity.full_id(),
                                target,
                                recorded[1..].join("/"),
                                actual[1..].join("/")
                            ),
                        ))
                    } else {
                        match (other.room, node.room) {
                            (Some(room), Some(own)) if room == own => Some((
                                codes::INTRA_ROOM_ADJACENCY,
                                "Intra-Room Adjacency",
                                format!(
                                    "{} \"{}\" is adjacent to \"{}\" in the same Room \"{}\".",
                                    kind,
                                    node.entity.full_id(),
                                    target,
                                    room
                                ),
                            )),
                            _ => None,
                        }
                    }
                }
            }
        };
        if let Some((code, error_type, message)) = error {
            errors.push(
                ValidationError::for_entity(node.entity, code, error_type, message)
                    .with_parents(node.entity.parent_refs()),
            );
        }
    }

    for node in nodes {
        let Some(sources) = referrers.get(node.entity.identifier()) else {
            continue;
        };
        if sources.len() > 1 {
            errors.push(
                ValidationError::for_entity(
                    node.entity,
                    codes::REPEATED_ADJACENCY,
                    "Repeated Adjacency",
                    format!(
                        "{} \"{}\" is referenced as adjacent by more than one object: {}",
                        kind,
                        node.entity.full_id(),
                        sources.join(", ")
                    ),
                )
                .with_parents(node.entity.parent_refs()),
            );
        }
    }
    errors
}

fn mismatched_area_errors<'a, E: GeometryChecks>(
    nodes: &[SurfaceRef<'a, E>],
    tolerance: f64,
) -> Vec<ValidationError> {
    let kind = E::ELEMENT_TYPE;
    let index: FxHashMap<&'a str, &'a E> = nodes
        .iter()
        .map(|n| (n.entity.identifier(), n.entity))
        .collect();
    let mut compared: FxHashSet<&'a str> = FxHashSet::default();
    let mut errors = Vec::new();

    for node in nodes {
        let Some(surface) = node.condition.surface() else {
            continue;
        };
        let id = node.entity.identifier();
        let target = surface.boundary_condition_object();
        let Some(other) = index.get(target) else {
            continue;
        };
        if target == id || compared.contains(id) || compared.contains(target) {
            continue;
        }
        compared.insert(id);
        compared.insert(target);

        let area = node.entity.check_geometry().area();
        let other_area = other.check_geometry().area();
        let band = area.sqrt() * tolerance;
        let difference = (area - other_area).abs();
        if difference > band {
            errors.push(ValidationError::new(
                codes::MISMATCHED_ADJACENT_AREA,
                "Mismatched Area Adjacency",
                kind,
                vec![id.to_string(), target.to_string()],
                vec![
                    node.entity.display_name().to_string(),
                    other.display_name().to_string(),
                ],
                format!(
                    "{} \"{}\" with an area of {:.4} is adjacent to {} \"{}\" with an area of \
                     {:.4}. The difference of {:.4} is outside the tolerance of {:.4}.",
                    kind,
                    node.entity.full_id(),
                    area,
                    kind,
                    other.full_id(),
                    other_area,
                    difference,
                    band
                ),
            ));
        }
    }
    errors
}
