// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Boundary conditions: what lies on the other side of a surface.
//!
//! The core variants are a closed enum. Extension variants (Adiabatic,
//! Othersideboundary, ...) are registered by name with
//! [`register_boundary_condition`]; unregistered names found in records are
//! kept as opaque [`ExtensionCondition`]s.

use std::fmt;

use honeybee_geometry::Point3;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};

use crate::error::{Error, Result};
use crate::typing::{float_in_range, valid_identifier};

/// View factor to the ground of an outdoor surface.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ViewFactor {
    #[default]
    Autocalculate,
    Value(f64),
}

/// Exposed to the outdoor environment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Outdoors {
    pub sun_exposure: bool,
    pub wind_exposure: bool,
    view_factor: ViewFactor,
}

impl Default for Outdoors {
    fn default() -> Self {
        Self {
            sun_exposure: true,
            wind_exposure: true,
            view_factor: ViewFactor::Autocalculate,
        }
    }
}

impl Outdoors {
    pub fn new(sun_exposure: bool, wind_exposure: bool, view_factor: ViewFactor) -> Result<Self> {
        if let ViewFactor::Value(v) = view_factor {
            float_in_range(v, 0.0, 1.0, "view factor to ground")?;
        }
        Ok(Self {
            sun_exposure,
            wind_exposure,
            view_factor,
        })
    }

    pub fn view_factor(&self) -> ViewFactor {
        self.view_factor
    }
}

/// Adjacent to another surface of the model, referenced by identifier.
///
/// The first identifier is the adjacent object itself. For faces the second
/// one is the adjacent face's room; for apertures and doors the second is
/// the adjacent sub-face's face and the third its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    boundary_condition_objects: Vec<String>,
}

impl Surface {
    /// A surface condition from raw identifiers (as read from a record).
    pub fn new(boundary_condition_objects: Vec<String>) -> Result<Self> {
        if boundary_condition_objects.is_empty() || boundary_condition_objects.len() > 3 {
            return Err(Error::InvalidBoundaryCondition(format!(
                "Surface needs 1 to 3 boundary condition objects, got {}",
                boundary_condition_objects.len()
            )));
        }
        for id in &boundary_condition_objects {
            valid_identifier(id)?;
        }
        Ok(Self {
            boundary_condition_objects,
        })
    }

    /// A surface condition pointing at `target`, recording its identifier
    /// and those of its parents without resolving anything.
    pub fn from_target<T: SurfaceTarget + ?Sized>(target: &T) -> Self {
        Self {
            boundary_condition_objects: target.surface_chain(),
        }
    }

    pub fn boundary_condition_objects(&self) -> &[String] {
        &self.boundary_condition_objects
    }

    /// Identifier of the adjacent object.
    pub fn boundary_condition_object(&self) -> &str {
        &self.boundary_condition_objects[0]
    }

    /// Identifier of the adjacent object's room, when recorded.
    pub fn room(&self) -> Option<&str> {
        if self.boundary_condition_objects.len() > 1 {
            self.boundary_condition_objects.last().map(String::as_str)
        } else {
            None
        }
    }
}

/// Entities that can be the other side of a [`Surface`] condition.
pub trait SurfaceTarget {
    /// The entity identifier followed by its parents' identifiers.
    fn surface_chain(&self) -> Vec<String>;
}

/// A boundary condition contributed outside the core set.
#[derive(Debug, Clone)]
pub struct ExtensionCondition {
    name: String,
    fields: Map<String, Value>,
}

impl ExtensionCondition {
    pub fn new(name: &str, fields: Map<String, Value>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Builds an extension condition from the fields of its record (without
/// the `type` key). Called with an empty map to get the default instance.
pub type ConditionConstructor = fn(&Map<String, Value>) -> Result<ExtensionCondition>;

static BOUNDARY_CONDITIONS: RwLock<Vec<(String, ConditionConstructor)>> =
    parking_lot::const_rwlock(Vec::new());

/// Registers an extension boundary condition by name.
pub fn register_boundary_condition(name: &str, constructor: ConditionConstructor) {
    let mut registry = BOUNDARY_CONDITIONS.write();
    if let Some(entry) = registry.iter_mut().find(|(n, _)| n == name) {
        entry.1 = constructor;
    } else {
        registry.push((name.to_string(), constructor));
    }
}

fn condition_constructor(name: &str) -> Option<ConditionConstructor> {
    BOUNDARY_CONDITIONS
        .read()
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, c)| *c)
}

/// What lies on the other side of a face, aperture or door.
#[derive(Debug, Clone)]
pub enum BoundaryCondition {
    Outdoors(Outdoors),
    Ground,
    Surface(Surface),
    Extension(ExtensionCondition),
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        BoundaryCondition::Outdoors(Outdoors::default())
    }
}

impl BoundaryCondition {
    pub fn outdoors() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        match self {
            BoundaryCondition::Outdoors(_) => "Outdoors",
            BoundaryCondition::Ground => "Ground",
            BoundaryCondition::Surface(_) => "Surface",
            BoundaryCondition::Extension(e) => e.name(),
        }
    }

    /// Default instance of a core or registered condition by name.
    /// `Surface` needs identifiers and cannot be built this way.
    pub fn by_name(name: &str) -> Result<Self> {
        match name {
            "Outdoors" => Ok(Self::outdoors()),
            "Ground" => Ok(BoundaryCondition::Ground),
            "Surface" => Err(Error::InvalidBoundaryCondition(
                "Surface boundary conditions need adjacent objects".into(),
            )),
            other => match condition_constructor(other) {
                Some(constructor) => Ok(BoundaryCondition::Extension(constructor(&Map::new())?)),
                None => Err(Error::InvalidBoundaryCondition(format!(
                    "\"{}\" is not a registered boundary condition",
                    other
                ))),
            },
        }
    }

    /// Ground when every point is at or below `ground_depth`, else Outdoors.
    pub fn from_position(points: &[Point3<f64>], ground_depth: f64) -> Self {
        if points.iter().any(|p| p.z > ground_depth) {
            Self::outdoors()
        } else {
            BoundaryCondition::Ground
        }
    }

    pub fn is_outdoors(&self) -> bool {
        matches!(self, BoundaryCondition::Outdoors(_))
    }

    pub fn is_ground(&self) -> bool {
        matches!(self, BoundaryCondition::Ground)
    }

    pub fn surface(&self) -> Option<&Surface> {
        match self {
            BoundaryCondition::Surface(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_surface(&self) -> bool {
        self.surface().is_some()
    }

    /// Outdoors and Surface are the only conditions that can host
    /// apertures and doors.
    pub fn allows_sub_faces(&self) -> bool {
        matches!(
            self,
            BoundaryCondition::Outdoors(_) | BoundaryCondition::Surface(_)
        )
    }

    pub fn to_record(&self) -> Value {
        match self {
            BoundaryCondition::Outdoors(o) => {
                let view_factor = match o.view_factor {
                    ViewFactor::Autocalculate => json!({"type": "Autocalculate"}),
                    ViewFactor::Value(v) => json!(v),
                };
                json!({
                    "type": "Outdoors",
                    "sun_exposure": o.sun_exposure,
                    "wind_exposure": o.wind_exposure,
                    "view_factor": view_factor,
                })
            }
            BoundaryCondition::Ground => json!({"type": "Ground"}),
            BoundaryCondition::Surface(s) => json!({
                "type": "Surface",
                "boundary_condition_objects": s.boundary_condition_objects,
            }),
            BoundaryCondition::Extension(e) => {
                let mut map = e.fields.clone();
                map.insert("type".into(), Value::String(e.name.clone()));
                Value::Object(map)
            }
        }
    }

    pub fn from_record(record: &Value) -> Result<Self> {
        let map = record.as_object().ok_or_else(|| {
            Error::InvalidBoundaryCondition("boundary condition must be an object".into())
        })?;
        let kind = map.get("type").and_then(Value::as_str).ok_or_else(|| {
            Error::InvalidBoundaryCondition("boundary condition has no type".into())
        })?;
        match kind {
            "Outdoors" => {
                let flag = |key: &str| map.get(key).and_then(Value::as_bool).unwrap_or(true);
                let view_factor = match map.get("view_factor") {
                    None => ViewFactor::Autocalculate,
                    Some(Value::Number(n)) => ViewFactor::Value(n.as_f64().unwrap_or(0.0)),
                    Some(v) if v.get("type").and_then(Value::as_str) == Some("Autocalculate") => {
                        ViewFactor::Autocalculate
                    }
                    Some(Value::String(s)) if s.eq_ignore_ascii_case("autocalculate") => {
                        ViewFactor::Autocalculate
                    }
                    Some(other) => {
                        return Err(Error::InvalidBoundaryCondition(format!(
                            "invalid view_factor {}",
                            other
                        )))
                    }
                };
                Ok(BoundaryCondition::Outdoors(Outdoors::new(
                    flag("sun_exposure"),
                    flag("wind_exposure"),
                    view_factor,
                )?))
            }
            "Ground" => Ok(BoundaryCondition::Ground),
            "Surface" => {
                let objects = map
                    .get("boundary_condition_objects")
                    .and_then(Value::as_array)
                    .ok_or_else(|| {
                        Error::InvalidBoundaryCondition(
                            "Surface needs boundary_condition_objects".into(),
                        )
                    })?
                    .iter()
                    .map(|v| {
                        v.as_str().map(str::to_string).ok_or_else(|| {
                            Error::InvalidBoundaryCondition(
                                "boundary_condition_objects must be strings".into(),
                            )
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(BoundaryCondition::Surface(Surface::new(objects)?))
            }
            other => {
                let mut fields = map.clone();
                fields.remove("type");
                match condition_constructor(other) {
                    Some(constructor) => Ok(BoundaryCondition::Extension(constructor(&fields)?)),
                    None => Ok(BoundaryCondition::Extension(ExtensionCondition::new(
                        other, fields,
                    ))),
                }
            }
        }
    }
}

/// Only the variant and the referenced identifiers take part in equality.
impl PartialEq for BoundaryCondition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (BoundaryCondition::Surface(a), BoundaryCondition::Surface(b)) => a == b,
            (BoundaryCondition::Extension(a), BoundaryCondition::Extension(b)) => a.name == b.name,
            (BoundaryCondition::Outdoors(_), BoundaryCondition::Outdoors(_)) => true,
            (BoundaryCondition::Ground, BoundaryCondition::Ground) => true,
            _ => false,
        }
    }
}

impl fmt::Display for BoundaryCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryCondition::Surface(s) => {
                write!(f, "Surface({})", s.boundary_condition_objects.join(", "))
            }
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adiabatic(fields: &Map<String, Value>) -> Result<ExtensionCondition> {
        Ok(ExtensionCondition::new("Adiabatic", fields.clone()))
    }

    #[test]
    fn position_defaults() {
        let below = [Point3::new(0.0, 0.0, -1.0), Point3::new(1.0, 0.0, 0.0)];
        let above = [Point3::new(0.0, 0.0, -1.0), Point3::new(1.0, 0.0, 0.5)];
        assert!(BoundaryCondition::from_position(&below, 0.0).is_ground());
        assert!(BoundaryCondition::from_position(&above, 0.0).is_outdoors());
    }

    #[test]
    fn equality_ignores_exposure_flags() {
        let a = BoundaryCondition::outdoors();
        let b = BoundaryCondition::Outdoors(Outdoors::new(false, false, ViewFactor::Value(0.5)).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, BoundaryCondition::Ground);
        let s1 = BoundaryCondition::Surface(Surface::new(vec!["F1".into(), "R1".into()]).unwrap());
        let s2 = BoundaryCondition::Surface(Surface::new(vec!["F1".into(), "R2".into()]).unwrap());
        assert_ne!(s1, s2);
        assert_eq!(s1.to_string(), "Surface(F1, R1)");
    }

    #[test]
    fn view_factor_is_range_checked() {
        assert!(Outdoors::new(true, true, ViewFactor::Value(1.2)).is_err());
    }

    #[test]
    fn surface_needs_identifiers() {
        assert!(Surface::new(vec![]).is_err());
        assert!(Surface::new(vec!["bad id".into()]).is_err());
        let s = Surface::new(vec!["A1".into(), "F1".into(), "R1".into()]).unwrap();
        assert_eq!(s.boundary_condition_object(), "A1");
        assert_eq!(s.room(), Some("R1"));
        assert!(BoundaryCondition::by_name("Surface").is_err());
    }

    #[test]
    fn record_round_trip() {
        for bc in [
            BoundaryCondition::outdoors(),
            BoundaryCondition::Ground,
            BoundaryCondition::Surface(Surface::new(vec!["F2".into(), "R2".into()]).unwrap()),
        ] {
            let record = bc.to_record();
            let back = BoundaryCondition::from_record(&record).unwrap();
            assert_eq!(back.to_record(), record);
        }
    }

    #[test]
    fn unknown_conditions_pass_through() {
        let record = json!({"type": "OtherSideTemperature", "temperature": 21.0});
        let bc = BoundaryCondition::from_record(&record).unwrap();
        assert_eq!(bc.name(), "OtherSideTemperature");
        assert_eq!(bc.to_record(), record);
        assert!(!bc.allows_sub_faces());
    }

    #[test]
    fn registered_conditions_by_name() {
        assert!(BoundaryCondition::by_name("NotRegistered").is_err());
        register_boundary_condition("Adiabatic", adiabatic);
        let bc = BoundaryCondition::by_name("Adiabatic").unwrap();
        assert_eq!(bc.to_record(), json!({"type": "Adiabatic"}));
    }
}
