// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rooms: sets of faces enclosing a volume.

use std::sync::OnceLock;

use honeybee_geometry::{
    BoundingBox, Face3D, Plane, Point3, Polyface3D, Transform, Transformable,
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::adjacency::{self, AdjacencyInfo, FacePair};
use crate::boundary_condition::BoundaryCondition;
use crate::element::{ElementType, Entity, Identity, IdentityRecord};
use crate::error::{Error, Result};
use crate::face::Face;
use crate::face_type::FaceType;
use crate::properties::Properties;
use crate::record;
use crate::shade::{Shade, ShadeHost, ShadeSet};
use crate::validation::{
    codes, finish_check, segment_record, CheckReport, GeometryCheck, ValidationError,
};

/// Names of the [`Room::from_box`] faces, in face order.
pub const BOX_FACE_NAMES: [&str; 6] = ["Bottom", "Front", "Right", "Back", "Left", "Top"];

/// A volume bounded by faces.
#[derive(Debug, Clone)]
pub struct Room {
    identity: Identity,
    properties: Properties,
    faces: Vec<Face>,
    multiplier: u32,
    story: Option<String>,
    exclude_floor_area: bool,
    shades: ShadeSet,
    geometry: OnceLock<Polyface3D>,
}

impl Room {
    /// Creates a room from faces, taking ownership of them.
    ///
    /// With a positive `tolerance` the faces are welded into a polyface; if
    /// that is not closed, overlapping edges are merged and, once closed,
    /// every face (with its sub-faces) is turned to point outward. A zero
    /// tolerance takes the faces as they are.
    pub fn new(identifier: &str, faces: Vec<Face>, tolerance: f64) -> Result<Self> {
        let identity = Identity::new(identifier)?;
        let mut faces = faces;
        for face in faces.iter_mut() {
            face.assign_parent(identifier)?;
        }

        let geometries: Vec<Face3D> = faces.iter().map(|f| f.geometry().clone()).collect();
        let mut geometry = Polyface3D::from_faces(&geometries, tolerance);
        if tolerance > 0.0 {
            if !geometry.is_solid() {
                geometry = geometry.merge_overlapping_edges(tolerance);
            }
            if geometry.is_solid() && geometry.face_count() == faces.len() {
                let (oriented, flips) = geometry.with_outward_normals();
                let flipped = flips.iter().filter(|&&f| f).count();
                for (face, flip) in faces.iter_mut().zip(flips) {
                    if flip {
                        face.flip();
                    }
                }
                if flipped > 0 {
                    debug!(room = identifier, flipped, "reoriented faces outward");
                }
                geometry = oriented;
            } else {
                warn!(
                    room = identifier,
                    naked_edges = geometry.naked_edges().len(),
                    "room faces do not form a closed volume"
                );
            }
        }

        Ok(Self {
            identity,
            properties: Properties::new(),
            faces,
            multiplier: 1,
            story: None,
            exclude_floor_area: false,
            shades: ShadeSet::default(),
            geometry: OnceLock::from(geometry),
        })
    }

    /// A rectangular box room. `orientation_angle` turns the box
    /// counterclockwise about Z in degrees. Faces are named
    /// `{identifier}_{Bottom|Front|Right|Back|Left|Top}`.
    pub fn from_box(
        identifier: &str,
        width: f64,
        depth: f64,
        height: f64,
        orientation_angle: f64,
        origin: Point3<f64>,
    ) -> Result<Self> {
        let base = Plane::world_xy(origin)
            .transform(&Transform::rotate_xy(orientation_angle.to_radians(), origin));
        let polyface = Polyface3D::from_box(width, depth, height, &base)?;
        let faces = polyface
            .faces()?
            .into_iter()
            .zip(BOX_FACE_NAMES)
            .map(|(geometry, name)| {
                Face::new(&format!("{}_{}", identifier, name), geometry, None, None)
            })
            .collect::<Result<Vec<_>>>()?;
        let mut room = Self::new(identifier, faces, 0.0)?;
        room.geometry = OnceLock::from(polyface);
        Ok(room)
    }

    /// A room with one face per polyface face, named `{identifier}_Face{i}`.
    pub fn from_polyface(identifier: &str, polyface: Polyface3D) -> Result<Self> {
        let faces = polyface
            .faces()?
            .into_iter()
            .enumerate()
            .map(|(i, geometry)| Face::new(&format!("{}_Face{}", identifier, i), geometry, None, None))
            .collect::<Result<Vec<_>>>()?;
        let mut room = Self::new(identifier, faces, 0.0)?;
        room.geometry = OnceLock::from(polyface);
        Ok(room)
    }

    /// The closed (or not) polyface of the room faces.
    pub fn geometry(&self) -> &Polyface3D {
        self.geometry.get_or_init(|| {
            let geometries: Vec<Face3D> = self.faces.iter().map(|f| f.geometry().clone()).collect();
            Polyface3D::from_faces(&geometries, 0.0)
        })
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Mutable access to the faces. Drops the cached polyface.
    pub fn faces_mut(&mut self) -> &mut [Face] {
        self.geometry.take();
        &mut self.faces
    }

    /// Faces for edits that leave their geometry alone (boundary
    /// conditions and sub-faces).
    pub(crate) fn faces_for_conditions(&mut self) -> &mut [Face] {
        &mut self.faces
    }

    /// Adds a face. The room is not re-closed.
    pub fn add_face(&mut self, mut face: Face) -> Result<()> {
        face.assign_parent(self.identity.identifier())?;
        self.faces.push(face);
        self.geometry.take();
        Ok(())
    }

    /// Removes and returns a face by identifier.
    pub fn remove_face(&mut self, identifier: &str) -> Result<Face> {
        let index = self
            .faces
            .iter()
            .position(|f| f.identifier() == identifier)
            .ok_or_else(|| Error::NotFound {
                element_type: ElementType::Face,
                identifiers: vec![identifier.to_string()],
            })?;
        let mut face = self.faces.remove(index);
        face.clear_parent();
        self.geometry.take();
        Ok(face)
    }

    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn set_multiplier(&mut self, multiplier: u32) -> Result<()> {
        if multiplier < 1 {
            return Err(Error::InvalidValue(format!(
                "room multiplier must be at least 1, got {}",
                multiplier
            )));
        }
        self.multiplier = multiplier;
        Ok(())
    }

    pub fn story(&self) -> Option<&str> {
        self.story.as_deref()
    }

    pub fn set_story(&mut self, story: Option<&str>) -> Result<()> {
        if let Some(story) = story {
            crate::typing::valid_identifier(story)?;
        }
        self.story = story.map(str::to_string);
        Ok(())
    }

    pub fn exclude_floor_area(&self) -> bool {
        self.exclude_floor_area
    }

    pub fn set_exclude_floor_area(&mut self, exclude: bool) {
        self.exclude_floor_area = exclude;
    }

    /// Adds furniture or other interior mass as an indoor shade.
    pub fn add_indoor_furniture(&mut self, shade: Shade) -> Result<()> {
        self.add_indoor_shade(shade)
    }

    pub fn volume(&self) -> f64 {
        self.geometry().volume()
    }

    fn face_area_where(&self, keep: impl Fn(&Face) -> bool) -> f64 {
        self.faces.iter().filter(|f| keep(f)).map(Face::area).sum()
    }

    pub fn floor_area(&self) -> f64 {
        self.face_area_where(|f| f.face_type() == FaceType::Floor)
    }

    /// Area of every face with an Outdoors boundary condition.
    pub fn exposed_area(&self) -> f64 {
        self.face_area_where(|f| f.boundary_condition().is_outdoors())
    }

    pub fn exterior_wall_area(&self) -> f64 {
        self.face_area_where(|f| {
            f.face_type() == FaceType::Wall && f.boundary_condition().is_outdoors()
        })
    }

    pub fn exterior_roof_area(&self) -> f64 {
        self.face_area_where(|f| {
            f.face_type() == FaceType::RoofCeiling && f.boundary_condition().is_outdoors()
        })
    }

    pub fn exterior_aperture_area(&self) -> f64 {
        self.faces
            .iter()
            .filter(|f| f.boundary_condition().is_outdoors())
            .map(Face::aperture_area)
            .sum()
    }

    pub fn exterior_wall_aperture_area(&self) -> f64 {
        self.faces
            .iter()
            .filter(|f| f.face_type() == FaceType::Wall && f.boundary_condition().is_outdoors())
            .map(Face::aperture_area)
            .sum()
    }

    /// Area-weighted height of the floor faces, or the lowest point of the
    /// room when it has no floors.
    pub fn average_floor_height(&self) -> f64 {
        let floors: Vec<&Face> = self
            .faces
            .iter()
            .filter(|f| f.face_type() == FaceType::Floor)
            .collect();
        let total: f64 = floors.iter().map(|f| f.area()).sum();
        if total <= 0.0 {
            return self.min().z;
        }
        floors
            .iter()
            .map(|f| f.geometry().centroid().z * f.area())
            .sum::<f64>()
            / total
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.faces
            .iter()
            .map(|f| f.geometry().bounding_box())
            .reduce(|a, b| a.union(&b))
    }

    pub fn center(&self) -> Point3<f64> {
        self.bounding_box()
            .map(|bb| bb.center())
            .unwrap_or_else(Point3::origin)
    }

    pub fn min(&self) -> Point3<f64> {
        self.bounding_box()
            .map(|bb| bb.min)
            .unwrap_or_else(Point3::origin)
    }

    pub fn max(&self) -> Point3<f64> {
        self.bounding_box()
            .map(|bb| bb.max)
            .unwrap_or_else(Point3::origin)
    }

    /// Glazes every outdoor wall to `ratio`, replacing existing sub-faces.
    pub fn wall_apertures_by_ratio(&mut self, ratio: f64) -> Result<()> {
        for face in self.faces.iter_mut() {
            if face.face_type() == FaceType::Wall && face.boundary_condition().is_outdoors() {
                face.apertures_by_ratio(ratio)?;
            }
        }
        Ok(())
    }

    /// Sets Ground on every face without sub-faces that lies inside one of
    /// the `ground` polygons. Returns the number of faces changed.
    pub fn ground_by_custom_surface(
        &mut self,
        ground: &[Face3D],
        tolerance: f64,
        angle_tolerance: f64,
    ) -> Result<usize> {
        let angle = angle_tolerance.to_radians();
        let mut changed = 0;
        for face in self.faces.iter_mut() {
            if face.has_sub_faces() || face.boundary_condition().is_ground() {
                continue;
            }
            let on_ground = ground
                .iter()
                .any(|g| g.is_sub_face(face.geometry(), tolerance, angle));
            if on_ground {
                face.set_boundary_condition(BoundaryCondition::Ground)?;
                changed += 1;
            }
        }
        Ok(changed)
    }

    /// Solves adjacency between rooms. See [`adjacency::solve_adjacency`].
    pub fn solve_adjacency(rooms: &mut [Room], tolerance: f64) -> Result<AdjacencyInfo> {
        adjacency::solve_adjacency(rooms, tolerance)
    }

    /// Adjacent face pairs without changing anything. See
    /// [`adjacency::find_adjacency`].
    pub fn find_adjacency(rooms: &[Room], tolerance: f64) -> Vec<FacePair> {
        adjacency::find_adjacency(rooms, tolerance)
    }

    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// Non-solid error: the cached polyface is trusted when closed, then the
    /// faces are re-welded at `tolerance`, then overlapping edges merged.
    pub(crate) fn solid_error(&self, tolerance: f64) -> Option<ValidationError> {
        if self.geometry().is_solid() {
            return None;
        }
        let geometries: Vec<Face3D> = self.faces.iter().map(|f| f.geometry().clone()).collect();
        let rebuilt = Polyface3D::from_faces(&geometries, tolerance);
        if rebuilt.is_solid() {
            return None;
        }
        let merged = rebuilt.merge_overlapping_edges(tolerance);
        if merged.is_solid() {
            return None;
        }
        let naked = merged.naked_edges();
        let non_manifold = merged.non_manifold_edges();
        let helpers = naked
            .iter()
            .chain(non_manifold.iter())
            .map(segment_record)
            .collect();
        Some(
            ValidationError::for_entity(
                self,
                codes::NON_SOLID_ROOM,
                "Non-Solid Room Geometry",
                format!(
                    "Room \"{}\" is not closed to within {} tolerance.\n  {} naked edges found\n  \
                     {} non-manifold edges found",
                    self.full_id(),
                    tolerance,
                    naked.len(),
                    non_manifold.len()
                ),
            )
            .with_helper_geometry(helpers),
        )
    }

    /// Checks that the faces form a closed volume.
    pub fn check_solid(&self, tolerance: f64, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        finish_check(self.solid_error(tolerance).into_iter().collect(), raise_exception, detailed)
    }

    pub fn check_sub_faces_valid(
        &self,
        tolerance: f64,
        angle_tolerance: f64,
        raise_exception: bool,
        detailed: bool,
    ) -> Result<CheckReport> {
        let errors = self
            .faces
            .iter()
            .flat_map(|f| f.sub_faces_valid_errors(tolerance, angle_tolerance))
            .collect();
        finish_check(errors, raise_exception, detailed)
    }

    pub fn check_sub_faces_overlapping(
        &self,
        tolerance: f64,
        raise_exception: bool,
        detailed: bool,
    ) -> Result<CheckReport> {
        let errors = self
            .faces
            .iter()
            .flat_map(|f| f.sub_faces_overlapping_errors(tolerance))
            .collect();
        finish_check(errors, raise_exception, detailed)
    }

    pub(crate) fn collect_geometry_errors(
        &self,
        check: GeometryCheck,
        tolerance: f64,
        out: &mut Vec<ValidationError>,
    ) {
        for face in &self.faces {
            face.collect_geometry_errors(check, tolerance, out);
        }
        self.shades.collect_geometry_errors(check, tolerance, out);
    }

    fn geometry_report(
        &self,
        check: GeometryCheck,
        tolerance: f64,
        raise_exception: bool,
        detailed: bool,
    ) -> Result<CheckReport> {
        let mut errors = Vec::new();
        self.collect_geometry_errors(check, tolerance, &mut errors);
        finish_check(errors, raise_exception, detailed)
    }

    /// Planarity of every face, sub-face and shade of the room.
    pub fn check_planar(&self, tolerance: f64, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        self.geometry_report(GeometryCheck::Planar, tolerance, raise_exception, detailed)
    }

    pub fn check_self_intersecting(&self, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        self.geometry_report(GeometryCheck::SelfIntersecting, 0.0, raise_exception, detailed)
    }

    pub fn check_non_zero(&self, tolerance: f64, raise_exception: bool, detailed: bool) -> Result<CheckReport> {
        self.geometry_report(GeometryCheck::NonZero, tolerance, raise_exception, detailed)
    }

    pub fn to_record(&self, abridged: bool) -> Result<Value> {
        let mut map = Map::new();
        map.insert("type".into(), Value::String("Room".into()));
        record::write_identity(&mut map, &IdentityRecord::from_identity(&self.identity));
        map.insert(
            "properties".into(),
            self.properties.to_record(ElementType::Room, abridged),
        );
        map.insert(
            "faces".into(),
            Value::Array(
                self.faces
                    .iter()
                    .map(|f| f.to_record(abridged))
                    .collect::<Result<_>>()?,
            ),
        );
        self.shades.write_records(&mut map, abridged)?;
        map.insert("multiplier".into(), Value::from(self.multiplier));
        if let Some(story) = &self.story {
            map.insert("story".into(), Value::String(story.clone()));
        }
        if self.exclude_floor_area {
            map.insert("exclude_floor_area".into(), Value::Bool(true));
        }
        Ok(Value::Object(map))
    }

    /// Rebuilds a room. The faces are taken as recorded, without closure.
    pub fn from_record(value: &Value, abridged: bool) -> Result<Self> {
        let map = record::typed_object(value, "Room")?;
        let identity = record::identity(map)?;
        let faces = record::children(map, "faces", ElementType::Face, |v| {
            Face::from_record(v, abridged)
        })?;
        let mut room = Room::new(&identity.identifier, faces, 0.0)?;
        room.identity = identity.to_identity()?;
        room.properties = record::properties(map, ElementType::Room, abridged)?;
        room.shades = ShadeSet::from_records(map, (ElementType::Room, &identity.identifier), abridged)?;
        if let Some(multiplier) = map.get("multiplier") {
            let multiplier = multiplier
                .as_u64()
                .and_then(|m| u32::try_from(m).ok())
                .ok_or_else(|| Error::InvalidValue(format!("invalid multiplier {}", multiplier)))?;
            room.set_multiplier(multiplier)?;
        }
        room.set_story(map.get("story").and_then(Value::as_str))?;
        room.exclude_floor_area = record::bool_or(map, "exclude_floor_area", false);
        Ok(room)
    }
}

impl Entity for Room {
    const ELEMENT_TYPE: ElementType = ElementType::Room;

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

impl ShadeHost for Room {
    fn shade_set(&self) -> &ShadeSet {
        &self.shades
    }
    fn shade_set_mut(&mut self) -> &mut ShadeSet {
        &mut self.shades
    }
}

impl Transformable for Room {
    fn transform(&mut self, t: &Transform) {
        for face in self.faces.iter_mut() {
            face.transform(t);
        }
        self.shades.transform(t);
        self.properties.transform(t);
        if let Some(geometry) = self.geometry.get_mut() {
            geometry.transform(t);
        }
    }
}
