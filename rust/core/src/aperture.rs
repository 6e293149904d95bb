// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Windows, skylights and other glazed openings in a face.

use honeybee_geometry::{Face3D, Point3, Transform, Transformable, Vector3};
use serde_json::{Map, Value};

use crate::boundary_condition::{BoundaryCondition, Surface, SurfaceTarget};
use crate::element::{ElementType, Entity, Identity, IdentityRecord};
use crate::error::{Error, Result};
use crate::louvers::LouverHost;
use crate::orientation;
use crate::properties::Properties;
use crate::record;
use crate::shade::{ShadeHost, ShadeSet};
use crate::validation::{GeometryCheck, GeometryChecks, ParentRef, ValidationError};

/// A glazed opening owned by a face.
#[derive(Debug, Clone)]
pub struct Aperture {
    identity: Identity,
    properties: Properties,
    geometry: Face3D,
    boundary_condition: BoundaryCondition,
    is_operable: bool,
    shades: ShadeSet,
    parent: Option<String>,
    room: Option<String>,
}

impl Aperture {
    /// Creates an aperture. The boundary condition defaults to Outdoors and
    /// must otherwise be Outdoors or Surface.
    pub fn new(
        identifier: &str,
        geometry: Face3D,
        boundary_condition: Option<BoundaryCondition>,
        is_operable: bool,
    ) -> Result<Self> {
        let boundary_condition = boundary_condition.unwrap_or_default();
        check_sub_face_condition(&boundary_condition)?;
        Ok(Self {
            identity: Identity::new(identifier)?,
            properties: Properties::new(),
            geometry,
            boundary_condition,
            is_operable,
            shades: ShadeSet::default(),
            parent: None,
            room: None,
        })
    }

    pub fn geometry(&self) -> &Face3D {
        &self.geometry
    }

    pub fn boundary_condition(&self) -> &BoundaryCondition {
        &self.boundary_condition
    }

    pub fn set_boundary_condition(&mut self, boundary_condition: BoundaryCondition) -> Result<()> {
        check_sub_face_condition(&boundary_condition)?;
        self.boundary_condition = boundary_condition;
        Ok(())
    }

    pub fn is_operable(&self) -> bool {
        self.is_operable
    }

    pub fn set_operable(&mut self, operable: bool) {
        self.is_operable = operable;
    }

    /// Identifier of the owning face.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    /// Identifier of the room owning the parent face.
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub(crate) fn assign_parent(&mut self, face: &str, room: Option<&str>) -> Result<()> {
        if self.parent.is_some() {
            return Err(Error::AlreadyParented {
                element_type: ElementType::Aperture,
                identifier: self.identifier().to_string(),
            });
        }
        self.parent = Some(face.to_string());
        self.room = room.map(str::to_string);
        Ok(())
    }

    pub(crate) fn set_room(&mut self, room: Option<&str>) {
        self.room = room.map(str::to_string);
    }

    pub(crate) fn clear_parent(&mut self) {
        self.parent = None;
        self.room = None;
    }

    pub(crate) fn flip(&mut self) {
        self.geometry = self.geometry.flip();
    }

    pub fn area(&self) -> f64 {
        self.geometry.area()
    }

    pub fn perimeter(&self) -> f64 {
        self.geometry.perimeter()
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

    /// Degrees above the horizon of the normal.
    pub fn altitude(&self) -> f64 {
        orientation::altitude(&self.normal())
    }

    /// Clockwise degrees from north of the normal.
    pub fn horizontal_orientation(&self, north_angle: f64) -> f64 {
        orientation::horizontal_orientation(&self.normal(), north_angle)
    }

    pub fn cardinal_direction(&self, north_angle: f64) -> &'static str {
        orientation::cardinal_direction(self.horizontal_orientation(north_angle))
    }

    /// Sets this aperture and `other` adjacent to one another. Both must
    /// share the same operability.
    pub fn set_adjacency(&mut self, other: &mut Aperture) -> Result<()> {
        if self.is_operable != other.is_operable {
            return Err(Error::Adjacency(format!(
                "Aperture \"{}\" and \"{}\" cannot be adjacent: only one of them is operable",
                self.full_id(),
                other.full_id()
            )));
        }
        let to_other = Surface::from_target(&*other);
        let to_self = Surface::from_target(&*self);
        self.boundary_condition = BoundaryCondition::Surface(to_other);
        other.boundary_condition = BoundaryCondition::Surface(to_self);
        Ok(())
    }

    /// Deep copy with no parent.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.clear_parent();
        copy
    }

    pub(crate) fn collect_geometry_errors(
        &self,
        check: GeometryCheck,
        tolerance: f64,
        out: &mut Vec<ValidationError>,
    ) {
        out.extend(self.geometry_error(check, tolerance));
        self.shades.collect_geometry_errors(check, tolerance, out);
    }

    pub fn to_record(&self, abridged: bool) -> Result<Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("Aperture".into()));
        record::write_identity(&mut map, &IdentityRecord::from_identity(&self.identity));
        map.insert(
            "properties".into(),
            self.properties.to_record(ElementType::Aperture, abridged),
        );
        map.insert("geometry".into(), record::to_value(&self.geometry.to_record())?);
        map.insert("boundary_condition".into(), self.boundary_condition.to_record());
        map.insert("is_operable".into(), Value::Bool(self.is_operable));
        self.shades.write_records(&mut map, abridged)?;
        Ok(Value::Object(map))
    }

    pub fn from_record(value: &Value, abridged: bool) -> Result<Self> {
        let map = record::typed_object(value, "Aperture")?;
        let identity = record::identity(map)?.to_identity()?;
        let boundary_condition = match map.get("boundary_condition") {
            Some(bc) => BoundaryCondition::from_record(bc)?,
            None => BoundaryCondition::default(),
        };
        check_sub_face_condition(&boundary_condition)?;
        let shades = ShadeSet::from_records(map, (ElementType::Aperture, identity.identifier()), abridged)?;
        Ok(Self {
            identity,
            properties: record::properties(map, ElementType::Aperture, abridged)?,
            geometry: record::face3d(map)?,
            boundary_condition,
            is_operable: record::bool_or(map, "is_operable", false),
            shades,
            parent: None,
            room: None,
        })
    }
}

/// Apertures and doors only take Outdoors or Surface conditions.
pub(crate) fn check_sub_face_condition(bc: &BoundaryCondition) -> Result<()> {
    if bc.allows_sub_faces() {
        Ok(())
    } else {
        Err(Error::InvalidBoundaryCondition(format!(
            "{} is not valid for apertures and doors; use Outdoors or Surface",
            bc.name()
        )))
    }
}

impl Entity for Aperture {
    const ELEMENT_TYPE: ElementType = ElementType::Aperture;

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

impl LouverHost for Aperture {
    fn louver_geometry(&self) -> &Face3D {
        &self.geometry
    }
}

impl ShadeHost for Aperture {
    fn shade_set(&self) -> &ShadeSet {
        &self.shades
    }
    fn shade_set_mut(&mut self) -> &mut ShadeSet {
        &mut self.shades
    }
}

impl SurfaceTarget for Aperture {
    fn surface_chain(&self) -> Vec<String> {
        std::iter::once(self.identifier().to_string())
            .chain(self.parent.clone())
            .chain(self.room.clone())
            .collect()
    }
}

impl Transformable for Aperture {
    fn transform(&mut self, t: &Transform) {
        self.geometry.transform(t);
        self.shades.transform(t);
        self.properties.transform(t);
    }
}

impl GeometryChecks for Aperture {
    fn check_geometry(&self) -> &Face3D {
        &self.geometry
    }

    fn parent_refs(&self) -> Vec<ParentRef> {
        let mut parents = Vec::new();
        if let Some(room) = &self.room {
            parents.push(ParentRef::new(ElementType::Room, room));
        }
        if let Some(face) = &self.parent {
            parents.push(ParentRef::new(ElementType::Face, face));
        }
        parents
    }
}
