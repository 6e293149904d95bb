// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Faces: the walls, floors and roofs that bound a room.
//!
//! A face owns its apertures, doors and shades. Its punched geometry (the
//! face polygon with every sub-face cut out) is computed lazily and cached;
//! every mutation that can move a sub-face or the face itself drops the
//! cache.

use std::sync::OnceLock;

use honeybee_geometry::{Face3D, Point3, Transform, Transformable, Vector3};
use serde_json::{Map, Value};

use crate::aperture::Aperture;
use crate::boundary_condition::{BoundaryCondition, Surface, SurfaceTarget};
use crate::door::Door;
use crate::element::{ElementType, Entity, Identity, IdentityRecord};
use crate::error::{Error, Result};
use crate::face_type::FaceType;
use crate::louvers::LouverHost;
use crate::orientation;
use crate::properties::Properties;
use crate::record;
use crate::shade::{ShadeHost, ShadeSet};
use crate::validation::{
    codes, finish_check, CheckReport, GeometryCheck, GeometryChecks, ParentRef, ValidationError,
};

/// Identifier pairs of the sub-faces matched by [`Face::set_adjacency`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubFacePairs {
    pub apertures: Vec<(String, String)>,
    pub doors: Vec<(String, String)>,
}

/// A planar surface of a room.
#[derive(Debug, Clone)]
pub struct Face {
    identity: Identity,
    properties: Properties,
    geometry: Face3D,
    punched: OnceLock<Vec<Face3D>>,
    face_type: FaceType,
    boundary_condition: BoundaryCondition,
    apertures: Vec<Aperture>,
    doors: Vec<Door>,
    shades: ShadeSet,
    parent: Option<String>,
}

impl Face {
    /// Creates a face. Without an explicit type, the type follows the normal
    /// direction; without a boundary condition, faces entirely at or below
    /// the ground plane (z = 0) are Ground and all others Outdoors.
    pub fn new(
        identifier: &str,
        geometry: Face3D,
        face_type: Option<FaceType>,
        boundary_condition: Option<BoundaryCondition>,
    ) -> Result<Self> {
        let face_type = face_type.unwrap_or_else(|| FaceType::from_normal(&geometry.normal()));
        let boundary_condition = boundary_condition
            .unwrap_or_else(|| BoundaryCondition::from_position(geometry.boundary(), 0.0));
        Ok(Self {
            identity: Identity::new(identifier)?,
            properties: Properties::new(),
            geometry,
            punched: OnceLock::new(),
            face_type,
            boundary_condition,
            apertures: Vec::new(),
            doors: Vec::new(),
            shades: ShadeSet::default(),
            parent: None,
        })
    }

    pub fn geometry(&self) -> &Face3D {
        &self.geometry
    }

    /// The face polygon with the sub-faces cut out.
    ///
    /// Usually a single face; a sub-face spanning the whole face splits it.
    pub fn punched_geometry(&self) -> &[Face3D] {
        self.punched.get_or_init(|| {
            let holes: Vec<&Face3D> = self
                .apertures
                .iter()
                .map(Aperture::geometry)
                .chain(self.doors.iter().map(Door::geometry))
                .collect();
            if holes.is_empty() {
                vec![self.geometry.clone()]
            } else {
                self.geometry.punched(&holes)
            }
        })
    }

    fn invalidate(&mut self) {
        self.punched.take();
    }

    pub fn face_type(&self) -> FaceType {
        self.face_type
    }

    /// Changes the type. AirBoundary faces cannot hold sub-faces.
    pub fn set_type(&mut self, face_type: FaceType) -> Result<()> {
        if face_type == FaceType::AirBoundary && self.has_sub_faces() {
            return Err(Error::UnacceptableSubFace(format!(
                "Face \"{}\" has apertures or doors and cannot be an AirBoundary",
                self.full_id()
            )));
        }
        self.face_type = face_type;
        Ok(())
    }

    pub fn boundary_condition(&self) -> &BoundaryCondition {
        &self.boundary_condition
    }

    /// Changes the boundary condition. Faces with sub-faces only accept
    /// Outdoors or Surface.
    pub fn set_boundary_condition(&mut self, boundary_condition: BoundaryCondition) -> Result<()> {
        if self.has_sub_faces() && !boundary_condition.allows_sub_faces() {
            return Err(Error::UnacceptableSubFace(format!(
                "Face \"{}\" has apertures or doors and cannot take a {} boundary condition",
                self.full_id(),
                boundary_condition.name()
            )));
        }
        self.boundary_condition = boundary_condition;
        Ok(())
    }

    pub fn apertures(&self) -> &[Aperture] {
        &self.apertures
    }

    /// Mutable access to the apertures. Drops the punched geometry cache.
    pub fn apertures_mut(&mut self) -> &mut [Aperture] {
        self.invalidate();
        &mut self.apertures
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    /// Mutable access to the doors. Drops the punched geometry cache.
    pub fn doors_mut(&mut self) -> &mut [Door] {
        self.invalidate();
        &mut self.doors
    }

    pub fn has_sub_faces(&self) -> bool {
        !self.apertures.is_empty() || !self.doors.is_empty()
    }

    /// Identifier of the owning room.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn assign_parent(&mut self, room: &str) -> Result<()> {
        if self.parent.is_some() {
            return Err(Error::AlreadyParented {
                element_type: ElementType::Face,
                identifier: self.identifier().to_string(),
            });
        }
        self.set_room(Some(room));
        Ok(())
    }

    pub(crate) fn clear_parent(&mut self) {
        self.set_room(None);
    }

    fn set_room(&mut self, room: Option<&str>) {
        self.parent = room.map(str::to_string);
        for aperture in self.apertures.iter_mut() {
            aperture.set_room(room);
        }
        for door in self.doors.iter_mut() {
            door.set_room(room);
        }
    }

    fn acceptable_sub_face_check(&self, kind: ElementType) -> Result<()> {
        if !self.boundary_condition.is_outdoors() {
            return Err(Error::UnacceptableSubFace(format!(
                "{} can only be added to Faces with an Outdoors boundary condition; \
                 Face \"{}\" is {}",
                kind,
                self.full_id(),
                self.boundary_condition
            )));
        }
        if self.face_type == FaceType::AirBoundary {
            return Err(Error::UnacceptableSubFace(format!(
                "{} cannot be added to AirBoundary Face \"{}\"",
                kind,
                self.full_id()
            )));
        }
        Ok(())
    }

    /// True when `sub` points away from this face's normal.
    fn is_reversed(&self, sub: &Face3D) -> bool {
        self.geometry.normal().angle(&sub.normal()) > std::f64::consts::FRAC_PI_2
    }

    fn attach_aperture(&mut self, mut aperture: Aperture) -> Result<()> {
        aperture.assign_parent(self.identity.identifier(), self.parent.as_deref())?;
        if self.is_reversed(aperture.geometry()) {
            aperture.flip();
        }
        self.apertures.push(aperture);
        self.invalidate();
        Ok(())
    }

    fn attach_door(&mut self, mut door: Door) -> Result<()> {
        door.assign_parent(self.identity.identifier(), self.parent.as_deref())?;
        if self.is_reversed(door.geometry()) {
            door.flip();
        }
        self.doors.push(door);
        self.invalidate();
        Ok(())
    }

    /// Adds an aperture. The face must be Outdoors and not an AirBoundary;
    /// an aperture pointing the other way is flipped to match the face.
    pub fn add_aperture(&mut self, aperture: Aperture) -> Result<()> {
        self.acceptable_sub_face_check(ElementType::Aperture)?;
        self.attach_aperture(aperture)
    }

    pub fn add_apertures(&mut self, apertures: Vec<Aperture>) -> Result<()> {
        self.acceptable_sub_face_check(ElementType::Aperture)?;
        apertures.into_iter().try_for_each(|ap| self.attach_aperture(ap))
    }

    pub fn add_door(&mut self, door: Door) -> Result<()> {
        self.acceptable_sub_face_check(ElementType::Door)?;
        self.attach_door(door)
    }

    pub fn add_doors(&mut self, doors: Vec<Door>) -> Result<()> {
        self.acceptable_sub_face_check(ElementType::Door)?;
        doors.into_iter().try_for_each(|dr| self.attach_door(dr))
    }

    /// Detaches and returns every aperture.
    pub fn remove_apertures(&mut self) -> Vec<Aperture> {
        self.invalidate();
        let mut removed = std::mem::take(&mut self.apertures);
        removed.iter_mut().for_each(Aperture::clear_parent);
        removed
    }

    pub fn remove_doors(&mut self) -> Vec<Door> {
        self.invalidate();
        let mut removed = std::mem::take(&mut self.doors);
        removed.iter_mut().for_each(Door::clear_parent);
        removed
    }

    pub fn remove_sub_faces(&mut self) {
        self.remove_apertures();
        self.remove_doors();
    }

    /// Replaces all sub-faces with apertures covering `ratio` of the face
    /// area, named `{face}_Glz{i}`. A ratio of 0 only removes sub-faces.
    pub fn apertures_by_ratio(&mut self, ratio: f64) -> Result<()> {
        if !(0.0..1.0).contains(&ratio) {
            return Err(Error::InvalidValue(format!(
                "aperture ratio must be between 0 and 1, got {}",
                ratio
            )));
        }
        self.acceptable_sub_face_check(ElementType::Aperture)?;
        self.remove_sub_faces();
        for (i, geometry) in self.geometry.sub_faces_by_ratio(ratio)?.into_iter().enumerate() {
            let identifier = format!("{}_Glz{}", self.identifier(), i);
            self.attach_aperture(Aperture::new(&identifier, geometry, None, false)?)?;
        }
        Ok(())
    }

    /// Adds a single rectangular aperture centered in the face with its
    /// bottom `sill_height` above the face's lowest point. Returns false
    /// when the rectangle does not fit inside the face.
    pub fn aperture_by_width_height(
        &mut self,
        width: f64,
        height: f64,
        sill_height: f64,
        tolerance: f64,
    ) -> Result<bool> {
        self.acceptable_sub_face_check(ElementType::Aperture)?;
        let Some(geometry) =
            self.geometry
                .sub_face_by_width_height(width, height, sill_height, tolerance)?
        else {
            return Ok(false);
        };
        let identifier = format!("{}_Glz{}", self.identifier(), self.apertures.len());
        self.attach_aperture(Aperture::new(&identifier, geometry, None, false)?)?;
        Ok(true)
    }

    /// Sets this face and `other` adjacent, pairing their sub-faces.
    ///
    /// Sub-face counts must match. Each aperture (then door) of this face is
    /// paired with the first unclaimed one of `other` whose center lies
    /// within `tolerance`. Nothing is modified unless every sub-face finds a
    /// compatible partner.
    pub fn set_adjacency(&mut self, other: &mut Face, tolerance: f64) -> Result<SubFacePairs> {
        if self.apertures.len() != other.apertures.len() {
            return Err(Error::Adjacency(format!(
                "Number of apertures does not match between \"{}\" and \"{}\"",
                self.full_id(),
                other.full_id()
            )));
        }
        if self.doors.len() != other.doors.len() {
            return Err(Error::Adjacency(format!(
                "Number of doors does not match between \"{}\" and \"{}\"",
                self.full_id(),
                other.full_id()
            )));
        }

        let aperture_matches = match_by_center(
            self.apertures.iter().map(Aperture::center),
            other.apertures.iter().map(Aperture::center).collect(),
            tolerance,
        )
        .ok_or_else(|| self.unmatched_error("apertures", other))?;
        let door_matches = match_by_center(
            self.doors.iter().map(Door::center),
            other.doors.iter().map(Door::center).collect(),
            tolerance,
        )
        .ok_or_else(|| self.unmatched_error("doors", other))?;

        for (i, &j) in aperture_matches.iter().enumerate() {
            if self.apertures[i].is_operable() != other.apertures[j].is_operable() {
                return Err(Error::Adjacency(format!(
                    "Aperture \"{}\" and \"{}\" differ in operability",
                    self.apertures[i].full_id(),
                    other.apertures[j].full_id()
                )));
            }
        }
        for (i, &j) in door_matches.iter().enumerate() {
            if self.doors[i].is_glass() != other.doors[j].is_glass() {
                return Err(Error::Adjacency(format!(
                    "Door \"{}\" and \"{}\" differ in glazing",
                    self.doors[i].full_id(),
                    other.doors[j].full_id()
                )));
            }
        }

        let to_other = Surface::from_target(&*other);
        let to_self = Surface::from_target(&*self);
        self.boundary_condition = BoundaryCondition::Surface(to_other);
        other.boundary_condition = BoundaryCondition::Surface(to_self);

        let mut pairs = SubFacePairs::default();
        for (i, j) in aperture_matches.into_iter().enumerate() {
            self.apertures[i].set_adjacency(&mut other.apertures[j])?;
            pairs.apertures.push((
                self.apertures[i].identifier().to_string(),
                other.apertures[j].identifier().to_string(),
            ));
        }
        for (i, j) in door_matches.into_iter().enumerate() {
            self.doors[i].set_adjacency(&mut other.doors[j])?;
            pairs.doors.push((
                self.doors[i].identifier().to_string(),
                other.doors[j].identifier().to_string(),
            ));
        }
        Ok(pairs)
    }

    fn unmatched_error(&self, kind: &str, other: &Face) -> Error {
        Error::Adjacency(format!(
            "Not all {} of \"{}\" were found to be adjacent to {} in \"{}\"; \
             try increasing the tolerance",
            kind,
            self.full_id(),
            kind,
            other.full_id()
        ))
    }

    pub(crate) fn flip(&mut self) {
        self.geometry = self.geometry.flip();
        for aperture in self.apertures.iter_mut() {
            aperture.flip();
        }
        for door in self.doors.iter_mut() {
            door.flip();
        }
        self.invalidate();
    }

    pub fn area(&self) -> f64 {
        self.geometry.area()
    }

    /// Opaque area, excluding apertures and doors.
    pub fn punched_area(&self) -> f64 {
        self.punched_geometry().iter().map(Face3D::area).sum()
    }

    pub fn perimeter(&self) -> f64 {
        self.geometry.perimeter()
    }

    pub fn aperture_area(&self) -> f64 {
        self.apertures.iter().map(Aperture::area).sum()
    }

    /// Aperture area divided by face area.
    pub fn aperture_ratio(&self) -> f64 {
        let area = self.area();
        if area > 0.0 {
            self.aperture_area() / area
        } else {
            0.0
        }
    }

    pub fn center(&self) -> Point3<f64> {
        self.geometry.center()
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.geometry.normal()
    }

    pub fn min(&self) -> Point3<f64> {
        self.geometry.min()
    }

    pub fn max(&self) -> Point3<f64> {
        self.geometry.max()
    }

    /// Degrees between the normal and +Z.
    pub fn tilt(&self) -> f64 {
        self.geometry.tilt().to_degrees()
    }

    pub fn altitude(&self) -> f64 {
        orientation::altitude(&self.normal())
    }

    /// Clockwise degrees from north, 0 for horizontal faces.
    pub fn azimuth(&self) -> f64 {
        self.horizontal_orientation(0.0)
    }

    pub fn horizontal_orientation(&self, north_angle: f64) -> f64 {
        orientation::horizontal_orientation(&self.normal(), north_angle)
    }

    pub fn cardinal_direction(&self, north_angle: f64) -> &'static str {
        orientation::cardinal_direction(self.horizontal_orientation(north_angle))
    }

    /// Deep copy with no parent; sub-faces and shades stay attached to the
    /// copy.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.clear_parent();
        copy
    }

    pub(crate) fn sub_faces_valid_errors(&self, tolerance: f64, angle_tolerance: f64) -> Vec<ValidationError> {
        let angle = angle_tolerance.to_radians();
        let mut errors = Vec::new();
        for ap in &self.apertures {
            if !self.geometry.is_sub_face(ap.geometry(), tolerance, angle) {
                errors.push(self.invalid_sub_face_error(ap, ap.parent_refs()));
            }
        }
        for dr in &self.doors {
            if !self.geometry.is_sub_face(dr.geometry(), tolerance, angle) {
                errors.push(self.invalid_sub_face_error(dr, dr.parent_refs()));
            }
        }
        errors
    }

    fn invalid_sub_face_error<E: Entity>(&self, sub: &E, parents: Vec<ParentRef>) -> ValidationError {
        ValidationError::for_entity(
            sub,
            codes::INVALID_SUB_FACE,
            "Invalid Sub-Face Geometry",
            format!(
                "{} \"{}\" is not coplanar or fully bounded by its parent Face \"{}\"",
                sub.element_type(),
                sub.full_id(),
                self.full_id()
            ),
        )
        .with_parents(parents)
    }

    /// Checks that every sub-face is coplanar with and inside this face.
    pub fn check_sub_faces_valid(
        &self,
        tolerance: f64,
        angle_tolerance: f64,
        raise_exception: bool,
        detailed: bool,
    ) -> Result<CheckReport> {
        finish_check(
            self.sub_faces_valid_errors(tolerance, angle_tolerance),
            raise_exception,
            detailed,
        )
    }

    pub(crate) fn sub_faces_overlapping_errors(&self, tolerance: f64) -> Vec<ValidationError> {
        let subs: Vec<(&str, &Face3D)> = self
            .apertures
            .iter()
            .map(|a| (a.identifier(), a.geometry()))
            .chain(self.doors.iter().map(|d| (d.identifier(), d.geometry())))
            .collect();
        let mut overlapping: Vec<String> = Vec::new();
        for (i, (id_a, a)) in subs.iter().enumerate() {
            for (id_b, b) in subs.iter().skip(i + 1) {
                if a.overlaps(b, tolerance) {
                    for id in [id_a, id_b] {
                        if !overlapping.iter().any(|o| o.as_str() == *id) {
                            overlapping.push(id.to_string());
                        }
                    }
                }
            }
        }
        if overlapping.is_empty() {
            return Vec::new();
        }
        vec![ValidationError::for_entity(
            self,
            codes::OVERLAPPING_SUB_FACES,
            "Overlapping Sub-Face Geometry",
            format!(
                "Face \"{}\" contains sub-faces that overlap with one another: {}",
                self.full_id(),
                overlapping.join(", ")
            ),
        )
        .with_parents(self.parent_refs())]
    }

    pub fn check_sub_faces_overlapping(
        &self,
        tolerance: f64,
        raise_exception: bool,
        detailed: bool,
    ) -> Result<CheckReport> {
        finish_check(self.sub_faces_overlapping_errors(tolerance), raise_exception, detailed)
    }

    pub(crate) fn collect_geometry_errors(
        &self,
        check: GeometryCheck,
        tolerance: f64,
        out: &mut Vec<ValidationError>,
    ) {
        out.extend(self.geometry_error(check, tolerance));
        for aperture in &self.apertures {
            aperture.collect_geometry_errors(check, tolerance, out);
        }
        for door in &self.doors {
            door.collect_geometry_errors(check, tolerance, out);
        }
        self.shades.collect_geometry_errors(check, tolerance, out);
    }

    pub fn to_record(&self, abridged: bool) -> Result<Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("Face".into()));
        record::write_identity(&mut map, &IdentityRecord::from_identity(&self.identity));
        map.insert(
            "properties".into(),
            self.properties.to_record(ElementType::Face, abridged),
        );
        map.insert("geometry".into(), record::to_value(&self.geometry.to_record())?);
        map.insert("face_type".into(), Value::String(self.face_type.as_str().into()));
        map.insert("boundary_condition".into(), self.boundary_condition.to_record());
        record::write_children(
            &mut map,
            "apertures",
            self.apertures.iter().map(|a| a.to_record(abridged)).collect::<Result<_>>()?,
        );
        record::write_children(
            &mut map,
            "doors",
            self.doors.iter().map(|d| d.to_record(abridged)).collect::<Result<_>>()?,
        );
        self.shades.write_records(&mut map, abridged)?;
        Ok(Value::Object(map))
    }

    /// Rebuilds a face. Missing type and boundary condition fall back to the
    /// same defaults as [`Face::new`].
    pub fn from_record(value: &Value, abridged: bool) -> Result<Self> {
        let map = record::typed_object(value, "Face")?;
        let identity = record::identity(map)?;
        let face_type = match map.get("face_type").and_then(Value::as_str) {
            Some(name) => Some(FaceType::by_name(name)?),
            None => None,
        };
        let boundary_condition = match map.get("boundary_condition") {
            Some(bc) => Some(BoundaryCondition::from_record(bc)?),
            None => None,
        };
        let mut face = Face::new(
            &identity.identifier,
            record::face3d(map)?,
            face_type,
            boundary_condition,
        )?;
        face.identity = identity.to_identity()?;
        face.properties = record::properties(map, ElementType::Face, abridged)?;

        let apertures = record::children(map, "apertures", ElementType::Aperture, |v| {
            Aperture::from_record(v, abridged)
        })?;
        let doors = record::children(map, "doors", ElementType::Door, |v| {
            Door::from_record(v, abridged)
        })?;
        if (!apertures.is_empty() || !doors.is_empty())
            && (!face.boundary_condition.allows_sub_faces()
                || face.face_type == FaceType::AirBoundary)
        {
            return Err(Error::UnacceptableSubFace(format!(
                "Face \"{}\" cannot hold sub-faces with a {} boundary condition and {} type",
                face.full_id(),
                face.boundary_condition.name(),
                face.face_type
            )));
        }
        for aperture in apertures {
            face.attach_aperture(aperture)?;
        }
        for door in doors {
            face.attach_door(door)?;
        }
        face.shades = ShadeSet::from_records(map, (ElementType::Face, &identity.identifier), abridged)?;
        Ok(face)
    }
}

/// For each center in `first`, the index of the first unclaimed center in
/// `second` within `tolerance`. `None` when any center goes unmatched.
fn match_by_center(
    first: impl Iterator<Item = Point3<f64>>,
    second: Vec<Point3<f64>>,
    tolerance: f64,
) -> Option<Vec<usize>> {
    let mut claimed = vec![false; second.len()];
    first
        .map(|c| {
            let j = second
                .iter()
                .enumerate()
                .position(|(j, other)| !claimed[j] && (c - other).norm() <= tolerance)?;
            claimed[j] = true;
            Some(j)
        })
        .collect()
}

impl Entity for Face {
    const ELEMENT_TYPE: ElementType = ElementType::Face;

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

impl LouverHost for Face {
    fn louver_geometry(&self) -> &Face3D {
        &self.geometry
    }
}

impl ShadeHost for Face {
    fn shade_set(&self) -> &ShadeSet {
        &self.shades
    }
    fn shade_set_mut(&mut self) -> &mut ShadeSet {
        &mut self.shades
    }
}

impl SurfaceTarget for Face {
    fn surface_chain(&self) -> Vec<String> {
        std::iter::once(self.identifier().to_string())
            .chain(self.parent.clone())
            .collect()
    }
}

impl Transformable for Face {
    fn transform(&mut self, t: &Transform) {
        self.geometry.transform(t);
        for aperture in self.apertures.iter_mut() {
            aperture.transform(t);
        }
        for door in self.doors.iter_mut() {
            door.transform(t);
        }
        self.shades.transform(t);
        self.properties.transform(t);
        self.invalidate();
    }
}

impl GeometryChecks for Face {
    fn check_geometry(&self) -> &Face3D {
        &self.geometry
    }

    fn parent_refs(&self) -> Vec<ParentRef> {
        self.parent
            .iter()
            .map(|room| ParentRef::new(ElementType::Room, room))
            .collect()
    }
}
