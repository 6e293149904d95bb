// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use honeybee_geometry::{Face3D, Point3, Transform, Transformable, Vector3};
use serde_json::{Map, Value};

use crate::aperture::check_sub_face_condition;
use crate::boundary_condition::{BoundaryCondition, Surface, SurfaceTarget};
use crate::element::{ElementType, Entity, Identity, IdentityRecord};
use crate::error::{Error, Result};
use crate::orientation;
use crate::properties::Properties;
use crate::record;
use crate::shade::{ShadeHost, ShadeSet};
use crate::validation::{GeometryCheck, GeometryChecks, ParentRef, ValidationError};

/// An opaque or glass door owned by a face.
#[derive(Debug, Clone)]
pub struct Door {
    identity: Identity,
    properties: Properties,
    geometry: Face3D,
    boundary_condition: BoundaryCondition,
    is_glass: bool,
    shades: ShadeSet,
    parent: Option<String>,
    room: Option<String>,
}

impl Door {
    pub fn new(
        identifier: &str,
        geometry: Face3D,
        boundary_condition: Option<BoundaryCondition>,
        is_glass: bool,
    ) -> Result<Self> {
        let boundary_condition = boundary_condition.unwrap_or_default();
        check_sub_face_condition(&boundary_condition)?;
        Ok(Self {
            identity: Identity::new(identifier)?,
            properties: Properties::new(),
            geometry,
            boundary_condition,
            is_glass,
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

    pub fn is_glass(&self) -> bool {
        self.is_glass
    }

    pub fn set_glass(&mut self, glass: bool) {
        self.is_glass = glass;
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub(crate) fn assign_parent(&mut self, face: &str, room: Option<&str>) -> Result<()> {
        if self.parent.is_some() {
            return Err(Error::AlreadyParented {
                element_type: ElementType::Door,
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

    pub fn center(&self) -> Point3<f64> {
        self.geometry.center()
    }

    pub fn normal(&self) -> Vector3<f64> {
        self.geometry.normal()
    }

    pub fn horizontal_orientation(&self, north_angle: f64) -> f64 {
        orientation::horizontal_orientation(&self.normal(), north_angle)
    }

    pub fn cardinal_direction(&self, north_angle: f64) -> &'static str {
        orientation::cardinal_direction(self.horizontal_orientation(north_angle))
    }

    /// Sets this door and `other` adjacent to one another. A glass door
    /// can only be adjacent to another glass door.
    pub fn set_adjacency(&mut self, other: &mut Door) -> Result<()> {
        if self.is_glass != other.is_glass {
            return Err(Error::Adjacency(format!(
                "Door \"{}\" and \"{}\" cannot be adjacent: only one of them is glass",
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
        map.insert("type".into(), Value::String("Door".into()));
        record::write_identity(&mut map, &IdentityRecord::from_identity(&self.identity));
        map.insert(
            "properties".into(),
            self.properties.to_record(ElementType::Door, abridged),
        );
        map.insert("geometry".into(), record::to_value(&self.geometry.to_record())?);
        map.insert("boundary_condition".into(), self.boundary_condition.to_record());
        map.insert("is_glass".into(), Value::Bool(self.is_glass));
        self.shades.write_records(&mut map, abridged)?;
        Ok(Value::Object(map))
    }

    pub fn from_record(value: &Value, abridged: bool) -> Result<Self> {
        let map = record::typed_object(value, "Door")?;
        let identity = record::identity(map)?.to_identity()?;
        let boundary_condition = match map.get("boundary_condition") {
            Some(bc) => BoundaryCondition::from_record(bc)?,
            None => BoundaryCondition::default(),
        };
        check_sub_face_condition(&boundary_condition)?;
        let shades = ShadeSet::from_records(map, (ElementType::Door, identity.identifier()), abridged)?;
        Ok(Self {
            identity,
            properties: record::properties(map, ElementType::Door, abridged)?,
            geometry: record::face3d(map)?,
            boundary_condition,
            is_glass: record::bool_or(map, "is_glass", false),
            shades,
            parent: None,
            room: None,
        })
    }
}

impl Entity for Door {
    const ELEMENT_TYPE: ElementType = ElementType::Door;

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

impl ShadeHost for Door {
    fn shade_set(&self) -> &ShadeSet {
        &self.shades
    }
    fn shade_set_mut(&mut self) -> &mut ShadeSet {
        &mut self.shades
    }
}

impl SurfaceTarget for Door {
    fn surface_chain(&self) -> Vec<String> {
        std::iter::once(self.identifier().to_string())
            .chain(self.parent.clone())
            .chain(self.room.clone())
            .collect()
    }
}

impl Transformable for Door {
    fn transform(&mut self, t: &Transform) {
        self.geometry.transform(t);
        self.shades.transform(t);
        self.properties.transform(t);
    }
}

impl GeometryChecks for Door {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shade::Shade;

    fn door(id: &str, glass: bool) -> Door {
        let geometry = Face3D::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 2.1),
            Point3::new(0.0, 0.0, 2.1),
        ])
        .unwrap();
        Door::new(id, geometry, None, glass).unwrap()
    }

    #[test]
    fn glass_must_match() {
        let mut a = door("D1", true);
        let mut b = door("D2", false);
        assert!(a.set_adjacency(&mut b).is_err());
        b.set_glass(true);
        a.set_adjacency(&mut b).unwrap();
        assert_eq!(a.boundary_condition().to_string(), "Surface(D2)");
    }

    #[test]
    fn record_keeps_glass_flag_and_shades() {
        let mut d = door("Entry", true);
        let canopy = Shade::from_vertices(
            "Entry_Canopy",
            vec![
                Point3::new(0.0, 0.0, 2.2),
                Point3::new(1.0, 0.0, 2.2),
                Point3::new(1.0, -1.0, 2.2),
                Point3::new(0.0, -1.0, 2.2),
            ],
        )
        .unwrap();
        d.add_outdoor_shade(canopy).unwrap();
        let record = d.to_record(false).unwrap();
        assert_eq!(record["is_glass"], true);
        let back = Door::from_record(&record, false).unwrap();
        assert!(back.is_glass());
        assert_eq!(back.to_record(false).unwrap(), record);
    }

    #[test]
    fn adiabatic_like_conditions_rejected() {
        let record = serde_json::json!({
            "type": "Door",
            "identifier": "D9",
            "geometry": {"type": "Face3D", "boundary": [[0, 0, 0], [1, 0, 0], [1, 0, 2]]},
            "boundary_condition": {"type": "Ground"}
        });
        assert!(matches!(
            Door::from_record(&record, false),
            Err(Error::InvalidBoundaryCondition(_))
        ));
    }
}
