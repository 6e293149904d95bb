// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Validation records and the shared check contract.
//!
//! Every check collects [`ValidationError`]s and hands them to
//! [`finish_check`], which honors the `raise_exception` / `detailed` pair
//! the same way for all of them:
//!
//! | raise | detailed | outcome on failure |
//! |-------|----------|--------------------|
//! | true  | any      | `Err(Error::Validation { .. })` |
//! | false | false    | `Ok(CheckReport::Message(joined))` |
//! | false | true     | `Ok(CheckReport::Detailed(records))` |

use honeybee_geometry::{Face3D, LineSegment3D};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::element::{ElementType, Entity};
use crate::error::{Error, Result};

/// Stable codes of every core check.
pub mod codes {
    pub const DUPLICATE_ROOM: &str = "000001";
    pub const DUPLICATE_FACE: &str = "000002";
    pub const DUPLICATE_APERTURE: &str = "000003";
    pub const DUPLICATE_DOOR: &str = "000004";
    pub const DUPLICATE_SHADE: &str = "000005";
    pub const DUPLICATE_SHADE_MESH: &str = "000006";

    pub const NON_PLANAR: &str = "000101";
    pub const SELF_INTERSECTING: &str = "000102";
    pub const ZERO_AREA: &str = "000103";
    pub const INVALID_SUB_FACE: &str = "000104";
    pub const OVERLAPPING_SUB_FACES: &str = "000105";
    pub const NON_SOLID_ROOM: &str = "000106";

    pub const MISSING_ADJACENCY: &str = "000201";
    pub const SELF_ADJACENCY: &str = "000202";
    pub const INTRA_ROOM_ADJACENCY: &str = "000203";
    pub const REPEATED_ADJACENCY: &str = "000204";
    pub const MISMATCHED_ADJACENT_AREA: &str = "000205";
    pub const AIR_BOUNDARY_NOT_ADJACENT: &str = "000206";
    pub const ALL_AIR_BOUNDARY_ROOM: &str = "000207";
}

/// An entity above the one that failed a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentRef {
    pub parent_type: ElementType,
    pub id: String,
    pub name: String,
}

impl ParentRef {
    pub fn new(parent_type: ElementType, id: &str) -> Self {
        Self {
            parent_type,
            id: id.to_string(),
            name: id.to_string(),
        }
    }
}

/// Structured description of one failed check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    #[serde(rename = "type")]
    pub kind: String,
    pub code: String,
    pub error_type: String,
    pub extension_type: String,
    pub element_type: ElementType,
    pub element_id: Vec<String>,
    pub element_name: Vec<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parents: Option<Vec<Vec<ParentRef>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helper_geometry: Option<Vec<Value>>,
}

impl ValidationError {
    pub fn new(
        code: &str,
        error_type: &str,
        element_type: ElementType,
        element_id: Vec<String>,
        element_name: Vec<String>,
        message: String,
    ) -> Self {
        Self {
            kind: "ValidationError".to_string(),
            code: code.to_string(),
            error_type: error_type.to_string(),
            extension_type: "Core".to_string(),
            element_type,
            element_id,
            element_name,
            message,
            parents: None,
            helper_geometry: None,
        }
    }

    /// Error about a single entity.
    pub fn for_entity<E: Entity + ?Sized>(
        entity: &E,
        code: &str,
        error_type: &str,
        message: String,
    ) -> Self {
        Self::new(
            code,
            error_type,
            entity.element_type(),
            vec![entity.identifier().to_string()],
            vec![entity.display_name().to_string()],
            message,
        )
    }

    pub fn with_parents(mut self, parents: Vec<ParentRef>) -> Self {
        if !parents.is_empty() {
            self.parents = Some(vec![parents]);
        }
        self
    }

    pub fn with_helper_geometry(mut self, geometry: Vec<Value>) -> Self {
        if !geometry.is_empty() {
            self.helper_geometry = Some(geometry);
        }
        self
    }

    pub fn to_record(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Result of a check that did not raise.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckReport {
    /// Failure messages joined by newlines; empty when the check passed.
    Message(String),
    Detailed(Vec<ValidationError>),
}

impl CheckReport {
    pub fn is_valid(&self) -> bool {
        match self {
            CheckReport::Message(m) => m.is_empty(),
            CheckReport::Detailed(errors) => errors.is_empty(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            CheckReport::Message(m) => m.clone(),
            CheckReport::Detailed(errors) => join_messages(errors),
        }
    }

    pub fn errors(&self) -> &[ValidationError] {
        match self {
            CheckReport::Message(_) => &[],
            CheckReport::Detailed(errors) => errors,
        }
    }
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Turns collected errors into the outcome selected by the two flags.
pub fn finish_check(
    errors: Vec<ValidationError>,
    raise_exception: bool,
    detailed: bool,
) -> Result<CheckReport> {
    if raise_exception && !errors.is_empty() {
        return Err(Error::Validation {
            message: join_messages(&errors),
            errors,
        });
    }
    if detailed {
        Ok(CheckReport::Detailed(errors))
    } else {
        Ok(CheckReport::Message(join_messages(&errors)))
    }
}

/// One error per identifier used by more than one entity, in order of
/// first appearance.
pub fn duplicate_identifier_errors<'a, E, I>(entities: I, code: &str) -> Vec<ValidationError>
where
    E: Entity + 'a,
    I: IntoIterator<Item = &'a E>,
{
    let mut order: Vec<&str> = Vec::new();
    let mut groups: FxHashMap<&str, Vec<&E>> = FxHashMap::default();
    for entity in entities {
        let id = entity.identifier();
        groups
            .entry(id)
            .or_insert_with(|| {
                order.push(id);
                Vec::new()
            })
            .push(entity);
    }

    let element_type = E::ELEMENT_TYPE;
    order
        .into_iter()
        .filter_map(|id| {
            let group = groups.get(id).filter(|g| g.len() > 1)?;
            let names: Vec<String> = group.iter().map(|e| e.display_name().to_string()).collect();
            Some(ValidationError::new(
                code,
                &format!("Duplicate {} Identifier", element_type),
                element_type,
                vec![id.to_string()],
                names.clone(),
                format!(
                    "There is a duplicated {} identifier: {}\n  Display Names: {}",
                    element_type,
                    id,
                    names.join(" | ")
                ),
            ))
        })
        .collect()
}

/// The three geometry checks shared by every planar entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryCheck {
    Planar,
    SelfIntersecting,
    NonZero,
}

/// Planar entities: Shade, Aperture, Door and Face.
pub trait GeometryChecks: Entity {
    fn check_geometry(&self) -> &Face3D;

    /// Chain of owners used to locate a failure in the model.
    fn parent_refs(&self) -> Vec<ParentRef> {
        Vec::new()
    }

    /// The failure of one geometry check on this entity alone.
    fn geometry_error(&self, check: GeometryCheck, tolerance: f64) -> Option<ValidationError> {
        let geometry = self.check_geometry();
        let error = match check {
            GeometryCheck::Planar => {
                if geometry.is_planar(tolerance) {
                    return None;
                }
                ValidationError::for_entity(
                    self,
                    codes::NON_PLANAR,
                    "Non-Planar Geometry",
                    format!(
                        "{} \"{}\" is not planar. Vertices deviate {:.6} from the plane \
                         (tolerance {}).",
                        self.element_type(),
                        self.full_id(),
                        geometry.planarity_deviation(),
                        tolerance
                    ),
                )
            }
            GeometryCheck::SelfIntersecting => {
                if !geometry.is_self_intersecting() {
                    return None;
                }
                ValidationError::for_entity(
                    self,
                    codes::SELF_INTERSECTING,
                    "Self-Intersecting Geometry",
                    format!(
                        "{} \"{}\" has self-intersecting edges.",
                        self.element_type(),
                        self.full_id()
                    ),
                )
            }
            GeometryCheck::NonZero => {
                if geometry.area() >= tolerance {
                    return None;
                }
                ValidationError::for_entity(
                    self,
                    codes::ZERO_AREA,
                    "Zero-Area Geometry",
                    format!(
                        "{} \"{}\" geometry is too small. Area {} is below the tolerance {}.",
                        self.element_type(),
                        self.full_id(),
                        geometry.area(),
                        tolerance
                    ),
                )
            }
        };
        Some(error.with_parents(self.parent_refs()))
    }

    fn check_planar(&self, tolerance: f64, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = self.geometry_error(GeometryCheck::Planar, tolerance);
        finish_check(errors.into_iter().collect(), raise_exception, detailed)
    }

    fn check_self_intersecting(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = self.geometry_error(GeometryCheck::SelfIntersecting, 0.0);
        finish_check(errors.into_iter().collect(), raise_exception, detailed)
    }

    fn check_non_zero(&self, tolerance: f64, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        let errors = self.geometry_error(GeometryCheck::NonZero, tolerance);
        finish_check(errors.into_iter().collect(), raise_exception, detailed)
    }
}

/// `{"type": "LineSegment3D", "p": start, "v": direction}` for helper geometry.
pub fn segment_record(segment: &LineSegment3D) -> Value {
    let v = segment.end - segment.start;
    json!({
        "type": "LineSegment3D",
        "p": [segment.start.x, segment.start.y, segment.start.z],
        "v": [v.x, v.y, v.z],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shade::Shade;
    use honeybee_geometry::Point3;

    fn shade(id: &str) -> Shade {
        let geometry = Face3D::new(vec![
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(1.0, 0.0, 3.0),
            Point3::new(1.0, 1.0, 3.0),
            Point3::new(0.0, 1.0, 3.0),
        ])
        .unwrap();
        Shade::new(id, geometry).unwrap()
    }

    #[test]
    fn duplicates_are_grouped() {
        let shades = vec![shade("A"), shade("B"), shade("A"), shade("A")];
        let errors = duplicate_identifier_errors(&shades, codes::DUPLICATE_SHADE);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].element_id, vec!["A".to_string()]);
        assert_eq!(errors[0].element_name.len(), 3);
        assert_eq!(errors[0].error_type, "Duplicate Shade Identifier");
    }

    #[test]
    fn flags_select_outcome() {
        let shades = vec![shade("A"), shade("A")];
        let errors = duplicate_identifier_errors(&shades, codes::DUPLICATE_SHADE);

        let report = finish_check(errors.clone(), false, false).unwrap();
        assert!(!report.is_valid());
        assert!(report.message().contains("duplicated Shade identifier: A"));

        let report = finish_check(errors.clone(), false, true).unwrap();
        assert_eq!(report.errors().len(), 1);

        match finish_check(errors, true, true) {
            Err(Error::Validation { errors, .. }) => assert_eq!(errors.len(), 1),
            other => panic!("expected a validation error, got {:?}", other),
        }

        assert!(finish_check(Vec::new(), true, false).unwrap().is_valid());
    }

    #[test]
    fn record_shape() {
        let s = shade("Tiny");
        let error = ValidationError::for_entity(&s, codes::ZERO_AREA, "Zero-Area Geometry", "x".into())
            .with_parents(vec![ParentRef::new(ElementType::Face, "F1")]);
        let record = error.to_record().unwrap();
        assert_eq!(record["type"], "ValidationError");
        assert_eq!(record["extension_type"], "Core");
        assert_eq!(record["element_type"], "Shade");
        assert_eq!(record["parents"][0][0]["parent_type"], "Face");
        assert!(record.get("helper_geometry").is_none());
    }

    #[test]
    fn geometry_checks_on_a_shade() {
        let s = shade("Canopy");
        assert!(s.check_planar(0.01, true, false).unwrap().is_valid());
        assert!(s.check_self_intersecting(true, false).unwrap().is_valid());
        let report = s.check_non_zero(2.0, false, true).unwrap();
        assert_eq!(report.errors()[0].code, codes::ZERO_AREA);
    }
}
