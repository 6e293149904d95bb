// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Planar shades and the shade collections of their hosts.

use honeybee_geometry::{Face3D, Point3, Transform, Transformable, Vector3};
use serde_json::{Map, Value};

use crate::element::{ElementType, Entity, Identity, IdentityRecord};
use crate::error::{Error, Result};
use crate::properties::Properties;
use crate::record;
use crate::validation::{GeometryCheck, GeometryChecks, ParentRef, ValidationError};

/// A planar shading surface.
///
/// A shade starts detached. Adding it to a Face, Aperture, Door or Room
/// assigns its parent once; re-parenting is rejected until the host
/// removes it again.
#[derive(Debug, Clone)]
pub struct Shade {
    identity: Identity,
    properties: Properties,
    geometry: Face3D,
    is_detached: bool,
    is_indoor: bool,
    parent: Option<(ElementType, String)>,
}

impl Shade {
    pub fn new(identifier: &str, geometry: Face3D) -> Result<Self> {
        Ok(Self {
            identity: Identity::new(identifier)?,
            properties: Properties::new(),
            geometry,
            is_detached: true,
            is_indoor: false,
            parent: None,
        })
    }

    pub fn from_vertices(identifier: &str, vertices: Vec<Point3<f64>>) -> Result<Self> {
        Self::new(identifier, Face3D::new(vertices)?)
    }

    pub fn geometry(&self) -> &Face3D {
        &self.geometry
    }

    /// True when the shade is not attached to a building surface.
    pub fn is_detached(&self) -> bool {
        self.is_detached
    }

    pub fn set_detached(&mut self, detached: bool) {
        self.is_detached = detached;
    }

    pub fn is_indoor(&self) -> bool {
        self.is_indoor
    }

    /// Identifier of the owning host.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_ref().map(|(_, id)| id.as_str())
    }

    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn assign_parent(&mut self, parent_type: ElementType, parent: &str, indoor: bool) -> Result<()> {
        if self.parent.is_some() {
            return Err(Error::AlreadyParented {
                element_type: ElementType::Shade,
                identifier: self.identifier().to_string(),
            });
        }
        self.parent = Some((parent_type, parent.to_string()));
        self.is_detached = false;
        self.is_indoor = indoor;
        Ok(())
    }

    pub(crate) fn clear_parent(&mut self) {
        self.parent = None;
        self.is_indoor = false;
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

    /// Deep copy with no parent.
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.parent = None;
        copy
    }

    pub fn to_record(&self, abridged: bool) -> Result<Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("Shade".into()));
        record::write_identity(&mut map, &IdentityRecord::from_identity(&self.identity));
        map.insert(
            "properties".into(),
            self.properties.to_record(ElementType::Shade, abridged),
        );
        map.insert("geometry".into(), record::to_value(&self.geometry.to_record())?);
        if !self.is_detached {
            map.insert("is_detached".into(), Value::Bool(false));
        }
        Ok(Value::Object(map))
    }

    pub fn from_record(value: &Value, abridged: bool) -> Result<Self> {
        let map = record::typed_object(value, "Shade")?;
        let identity = record::identity(map)?.to_identity()?;
        Ok(Self {
            identity,
            properties: record::properties(map, ElementType::Shade, abridged)?,
            geometry: record::face3d(map)?,
            is_detached: record::bool_or(map, "is_detached", true),
            is_indoor: false,
            parent: None,
        })
    }
}

impl Entity for Shade {
    const ELEMENT_TYPE: ElementType = ElementType::Shade;

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

impl Transformable for Shade {
    fn transform(&mut self, t: &Transform) {
        self.geometry.transform(t);
        self.properties.transform(t);
    }
}

impl GeometryChecks for Shade {
    fn check_geometry(&self) -> &Face3D {
        &self.geometry
    }

    fn parent_refs(&self) -> Vec<ParentRef> {
        self.parent
            .iter()
            .map(|(kind, id)| ParentRef::new(*kind, id))
            .collect()
    }
}

/// Indoor and outdoor shades owned by one host.
#[derive(Debug, Clone, Default)]
pub struct ShadeSet {
    outdoor: Vec<Shade>,
    indoor: Vec<Shade>,
}

impl ShadeSet {
    pub fn outdoor(&self) -> &[Shade] {
        &self.outdoor
    }

    pub fn indoor(&self) -> &[Shade] {
        &self.indoor
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shade> {
        self.outdoor.iter().chain(self.indoor.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.outdoor.is_empty() && self.indoor.is_empty()
    }

    pub(crate) fn push(&mut self, mut shade: Shade, host: (ElementType, &str), indoor: bool) -> Result<()> {
        shade.assign_parent(host.0, host.1, indoor)?;
        if indoor {
            self.indoor.push(shade);
        } else {
            self.outdoor.push(shade);
        }
        Ok(())
    }

    pub(crate) fn take_outdoor(&mut self) -> Vec<Shade> {
        let mut shades = std::mem::take(&mut self.outdoor);
        shades.iter_mut().for_each(Shade::clear_parent);
        shades
    }

    pub(crate) fn take_indoor(&mut self) -> Vec<Shade> {
        let mut shades = std::mem::take(&mut self.indoor);
        shades.iter_mut().for_each(Shade::clear_parent);
        shades
    }

    pub(crate) fn transform(&mut self, t: &Transform) {
        for shade in self.outdoor.iter_mut().chain(self.indoor.iter_mut()) {
            shade.transform(t);
        }
    }

    pub(crate) fn collect_geometry_errors(
        &self,
        check: GeometryCheck,
        tolerance: f64,
        out: &mut Vec<ValidationError>,
    ) {
        out.extend(self.iter().filter_map(|s| s.geometry_error(check, tolerance)));
    }

    pub(crate) fn write_records(&self, map: &mut Map<String, Value>, abridged: bool) -> Result<()> {
        record::write_children(
            map,
            "outdoor_shades",
            self.outdoor
                .iter()
                .map(|s| s.to_record(abridged))
                .collect::<Result<_>>()?,
        );
        record::write_children(
            map,
            "indoor_shades",
            self.indoor
                .iter()
                .map(|s| s.to_record(abridged))
                .collect::<Result<_>>()?,
        );
        Ok(())
    }

    pub(crate) fn from_records(
        map: &Map<String, Value>,
        host: (ElementType, &str),
        abridged: bool,
    ) -> Result<Self> {
        let mut set = ShadeSet::default();
        let parse = |v: &Value| Shade::from_record(v, abridged);
        for shade in record::children(map, "outdoor_shades", ElementType::Shade, parse)? {
            set.push(shade, host, false)?;
        }
        for shade in record::children(map, "indoor_shades", ElementType::Shade, parse)? {
            set.push(shade, host, true)?;
        }
        Ok(set)
    }
}

/// Entities that own indoor and outdoor shades.
pub trait ShadeHost: Entity {
    fn shade_set(&self) -> &ShadeSet;
    fn shade_set_mut(&mut self) -> &mut ShadeSet;

    fn outdoor_shades(&self) -> &[Shade] {
        self.shade_set().outdoor()
    }

    fn indoor_shades(&self) -> &[Shade] {
        self.shade_set().indoor()
    }

    /// Attaches an outdoor shade. Fails when the shade already has a parent.
    fn add_outdoor_shade(&mut self, shade: Shade) -> Result<()> {
        let host = (Self::ELEMENT_TYPE, self.identifier().to_string());
        self.shade_set_mut().push(shade, (host.0, &host.1), false)
    }

    /// Attaches an indoor shade. Fails when the shade already has a parent.
    fn add_indoor_shade(&mut self, shade: Shade) -> Result<()> {
        let host = (Self::ELEMENT_TYPE, self.identifier().to_string());
        self.shade_set_mut().push(shade, (host.0, &host.1), true)
    }

    fn add_outdoor_shades(&mut self, shades: Vec<Shade>) -> Result<()> {
        shades.into_iter().try_for_each(|s| self.add_outdoor_shade(s))
    }

    fn add_indoor_shades(&mut self, shades: Vec<Shade>) -> Result<()> {
        shades.into_iter().try_for_each(|s| self.add_indoor_shade(s))
    }

    /// Detaches and returns the outdoor shades.
    fn remove_outdoor_shades(&mut self) -> Vec<Shade> {
        self.shade_set_mut().take_outdoor()
    }

    fn remove_indoor_shades(&mut self) -> Vec<Shade> {
        self.shade_set_mut().take_indoor()
    }

    fn remove_shades(&mut self) -> Vec<Shade> {
        let mut shades = self.remove_outdoor_shades();
        shades.extend(self.remove_indoor_shades());
        shades
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn canopy(id: &str) -> Shade {
        Shade::from_vertices(
            id,
            vec![
                Point3::new(0.0, 0.0, 3.0),
                Point3::new(2.0, 0.0, 3.0),
                Point3::new(2.0, 1.0, 3.0),
                Point3::new(0.0, 1.0, 3.0),
            ],
        )
        .unwrap()
    }

    #[test]
    fn parenting_is_exclusive() {
        let mut set = ShadeSet::default();
        set.push(canopy("S1"), (ElementType::Face, "F1"), false).unwrap();
        let mut stolen = set.outdoor()[0].clone();
        assert!(stolen.has_parent());
        assert!(!stolen.is_detached());
        assert!(matches!(
            stolen.assign_parent(ElementType::Face, "F2", false),
            Err(Error::AlreadyParented { .. })
        ));

        let removed = set.take_outdoor();
        assert!(!removed[0].has_parent());
        // detachment is not restored on removal
        assert!(!removed[0].is_detached());
    }

    #[test]
    fn indoor_flag_follows_collection() {
        let mut set = ShadeSet::default();
        set.push(canopy("Desk"), (ElementType::Room, "R1"), true).unwrap();
        assert!(set.indoor()[0].is_indoor());
        let removed = set.take_indoor();
        assert!(!removed[0].is_indoor());
    }

    #[test]
    fn duplicate_then_move_back() {
        let original = canopy("S1");
        let mut copy = original.duplicate();
        copy.translate(Vector3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(original.center(), Point3::new(1.0, 0.5, 3.0));
        copy.translate(Vector3::new(-1.0, -2.0, -3.0));
        assert_relative_eq!(copy.center(), original.center(), epsilon = 1e-12);
    }

    #[test]
    fn record_round_trip() {
        let mut shade = canopy("Overhang");
        shade.set_display_name("South Overhang");
        let record = shade.to_record(false).unwrap();
        assert_eq!(record["type"], "Shade");
        let back = Shade::from_record(&record, false).unwrap();
        assert_eq!(back.display_name(), "South Overhang");
        assert_eq!(back.to_record(false).unwrap(), record);
    }

    #[test]
    fn bad_record_type() {
        let record = serde_json::json!({"type": "Face", "identifier": "x"});
        assert!(Shade::from_record(&record, false).is_err());
    }
}
