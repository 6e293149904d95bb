// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use honeybee_geometry::{Mesh3D, Point3, Transform, Transformable};
use serde_json::{Map, Value};

use crate::element::{ElementType, Entity, Identity, IdentityRecord};
use crate::error::Result;
use crate::properties::Properties;
use crate::record;
use crate::typing::clean_string;
use crate::validation::{codes, finish_check, CheckReport, ValidationError};

/// A shading surface described by a triangle/quad mesh. Shade meshes are
/// never parented; they live directly on the model.
#[derive(Debug, Clone)]
pub struct ShadeMesh {
    identity: Identity,
    properties: Properties,
    geometry: Mesh3D,
    is_detached: bool,
}

impl ShadeMesh {
    pub fn new(identifier: &str, geometry: Mesh3D, is_detached: bool) -> Result<Self> {
        Ok(Self {
            identity: Identity::new(identifier)?,
            properties: Properties::new(),
            geometry,
            is_detached,
        })
    }

    pub fn geometry(&self) -> &Mesh3D {
        &self.geometry
    }

    pub fn is_detached(&self) -> bool {
        self.is_detached
    }

    pub fn set_detached(&mut self, detached: bool) {
        self.is_detached = detached;
    }

    pub fn area(&self) -> f64 {
        self.geometry.area()
    }

    pub fn center(&self) -> Point3<f64> {
        self.geometry.center()
    }

    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Inserts `prefix` at the start of the identifier and display name,
    /// so copies of a mesh can share a model with the original.
    pub fn add_prefix(&mut self, prefix: &str) -> Result<()> {
        let display_name = format!("{}_{}", prefix, self.display_name());
        let identifier = clean_string(&format!("{}_{}", prefix, self.identifier()));
        self.identity.set_identifier(&identifier)?;
        self.set_display_name(&display_name);
        Ok(())
    }

    /// Splits non-planar quads and removes faces that collapse within
    /// `tolerance`. Fails when no face survives.
    pub fn triangulate_and_remove_degenerate_faces(&mut self, tolerance: f64) -> Result<()> {
        self.geometry = self.geometry.without_degenerate_faces(tolerance)?;
        Ok(())
    }

    /// Fails when every mesh face is degenerate.
    pub fn check_non_zero(&self, tolerance: f64, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.non_zero_error(tolerance).into_iter().collect(), raise_exception, detailed)
    }

    pub(crate) fn non_zero_error(&self, tolerance: f64) -> Option<ValidationError> {
        if self.area() >= tolerance {
            return None;
        }
        Some(ValidationError::for_entity(
            self,
            codes::ZERO_AREA,
            "Zero-Area Geometry",
            format!(
                "ShadeMesh \"{}\" geometry is too small. Area {} is below the tolerance {}.",
                self.full_id(),
                self.area(),
                tolerance
            ),
        ))
    }

    pub fn to_record(&self, abridged: bool) -> Result<Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("ShadeMesh".into()));
        record::write_identity(&mut map, &IdentityRecord::from_identity(&self.identity));
        map.insert(
            "properties".into(),
            self.properties.to_record(ElementType::ShadeMesh, abridged),
        );
        map.insert("geometry".into(), record::to_value(&self.geometry.to_record())?);
        map.insert("is_detached".into(), Value::Bool(self.is_detached));
        Ok(Value::Object(map))
    }

    pub fn from_record(value: &Value, abridged: bool) -> Result<Self> {
        let map = record::typed_object(value, "ShadeMesh")?;
        Ok(Self {
            identity: record::identity(map)?.to_identity()?,
            properties: record::properties(map, ElementType::ShadeMesh, abridged)?,
            geometry: record::mesh3d(map)?,
            is_detached: record::bool_or(map, "is_detached", true),
        })
    }
}

impl Entity for ShadeMesh {
    const ELEMENT_TYPE: ElementType = ElementType::ShadeMesh;

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

impl Transformable for ShadeMesh {
    fn transform(&mut self, t: &Transform) {
        self.geometry.transform(t);
        self.properties.transform(t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use honeybee_geometry::Vector3;

    fn terrain() -> ShadeMesh {
        let mesh = Mesh3D::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(4.0, 4.0, 1.0),
                Point3::new(0.0, 4.0, 1.0),
                Point3::new(2.0, 6.0, 2.0),
            ],
            vec![vec![0, 1, 2, 3], vec![3, 2, 4]],
        )
        .unwrap();
        ShadeMesh::new("Terrain", mesh, true).unwrap()
    }

    #[test]
    fn mesh_moves_with_transform() {
        let mut mesh = terrain();
        let before = mesh.center();
        mesh.translate(Vector3::new(0.0, 0.0, 10.0));
        assert_relative_eq!(mesh.center().z, before.z + 10.0, epsilon = 1e-12);
    }

    #[test]
    fn record_round_trip() {
        let mesh = terrain();
        let record = mesh.to_record(true).unwrap();
        let back = ShadeMesh::from_record(&record, true).unwrap();
        assert_eq!(back.to_record(true).unwrap(), record);
        assert_relative_eq!(back.area(), mesh.area(), epsilon = 1e-12);
    }

    #[test]
    fn prefix_is_cleaned_into_the_identifier() {
        let mut mesh = terrain();
        mesh.add_prefix("Site 2").unwrap();
        assert_eq!(mesh.identifier(), "Site_2_Terrain");
        assert_eq!(mesh.display_name(), "Site 2_Terrain");
    }

    #[test]
    fn twisted_quads_are_split() {
        let twisted = Mesh3D::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(4.0, 4.0, 0.0),
                Point3::new(0.0, 4.0, 2.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
            vec![vec![0, 1, 2, 3], vec![0, 4, 1]],
        )
        .unwrap();
        let mut mesh = ShadeMesh::new("Canopy", twisted, true).unwrap();
        mesh.triangulate_and_remove_degenerate_faces(0.01).unwrap();
        assert_eq!(mesh.geometry().faces(), [vec![0, 1, 2], vec![2, 3, 0]]);
        assert_relative_eq!(mesh.area(), 8.0 + 96f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn zero_area_reported() {
        let mesh = terrain();
        assert!(mesh.check_non_zero(0.01, true, false).is_ok());
        let report = mesh.check_non_zero(1e6, false, true).unwrap();
        assert_eq!(report.errors()[0].element_type, ElementType::ShadeMesh);
    }
}
