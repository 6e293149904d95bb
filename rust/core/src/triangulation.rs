// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle stand-ins for apertures and doors with more than four sides.
//!
//! Energy engines accept sub-faces with three or four vertices only. The
//! model is left untouched; callers swap the returned triangles in.

use honeybee_geometry::Face3D;
use rustc_hash::FxHashSet;

use crate::aperture::Aperture;
use crate::boundary_condition::BoundaryCondition;
use crate::door::Door;
use crate::element::Entity;
use crate::error::Result;
use crate::typing::clean_string;

/// Triangles replacing one sub-face, with the parents to edit.
#[derive(Debug, Clone)]
pub struct TriangulatedSubFace<T> {
    /// Identifier of the replaced sub-face.
    pub original: String,
    pub parent_face: Option<String>,
    pub parent_room: Option<String>,
    pub triangles: Vec<T>,
}

pub(crate) trait SubFace: Entity + Sized {
    fn sub_face_geometry(&self) -> &Face3D;
    fn sub_face_condition(&self) -> &BoundaryCondition;
    fn parent_face(&self) -> Option<&str>;
    fn parent_room(&self) -> Option<&str>;
    /// Same kind, properties and parent with new geometry and an outdoor
    /// condition.
    fn with_geometry(&self, identifier: &str, geometry: Face3D) -> Result<Self>;
    fn link(&mut self, other: &mut Self) -> Result<()>;
}

impl SubFace for Aperture {
    fn sub_face_geometry(&self) -> &Face3D {
        self.geometry()
    }
    fn sub_face_condition(&self) -> &BoundaryCondition {
        self.boundary_condition()
    }
    fn parent_face(&self) -> Option<&str> {
        self.parent()
    }
    fn parent_room(&self) -> Option<&str> {
        self.room()
    }
    fn with_geometry(&self, identifier: &str, geometry: Face3D) -> Result<Self> {
        let mut sub = Aperture::new(identifier, geometry, None, self.is_operable())?;
        *sub.properties_mut() = self.properties().clone();
        if let Some(face) = self.parent() {
            sub.assign_parent(face, self.room())?;
        }
        Ok(sub)
    }
    fn link(&mut self, other: &mut Self) -> Result<()> {
        self.set_adjacency(other)
    }
}

impl SubFace for Door {
    fn sub_face_geometry(&self) -> &Face3D {
        self.geometry()
    }
    fn sub_face_condition(&self) -> &BoundaryCondition {
        self.boundary_condition()
    }
    fn parent_face(&self) -> Option<&str> {
        self.parent()
    }
    fn parent_room(&self) -> Option<&str> {
        self.room()
    }
    fn with_geometry(&self, identifier: &str, geometry: Face3D) -> Result<Self> {
        let mut sub = Door::new(identifier, geometry, None, self.is_glass())?;
        *sub.properties_mut() = self.properties().clone();
        if let Some(face) = self.parent() {
            sub.assign_parent(face, self.room())?;
        }
        Ok(sub)
    }
    fn link(&mut self, other: &mut Self) -> Result<()> {
        self.set_adjacency(other)
    }
}

/// Triangulates every sub-face with more than four vertices or with holes.
///
/// A sub-face with a Surface condition is replaced together with its
/// partner: the partner gets the flipped triangles and each pair is
/// linked again.
pub(crate) fn triangulate_sub_faces<T: SubFace>(all: &[&T]) -> Result<Vec<TriangulatedSubFace<T>>> {
    let mut handled: FxHashSet<String> = FxHashSet::default();
    let mut replaced = Vec::new();
    for &sub in all {
        if !needs_triangles(sub.sub_face_geometry()) || handled.contains(sub.identifier()) {
            continue;
        }
        let shapes = triangles(sub.sub_face_geometry())?;
        let mut own = replacement(sub, &shapes)?;
        let partner = sub
            .sub_face_condition()
            .surface()
            .and_then(|s| s.boundary_condition_objects().first())
            .and_then(|target| all.iter().find(|o| o.identifier() == target.as_str()));
        if let Some(&partner) = partner {
            let flipped: Vec<Face3D> = shapes.iter().map(Face3D::flip).collect();
            let mut theirs = replacement(partner, &flipped)?;
            for (a, b) in own.triangles.iter_mut().zip(theirs.triangles.iter_mut()) {
                a.link(b)?;
            }
            handled.insert(partner.identifier().to_string());
            replaced.push(own);
            replaced.push(theirs);
        } else {
            replaced.push(own);
        }
    }
    Ok(replaced)
}

fn needs_triangles(geometry: &Face3D) -> bool {
    geometry.vertices().len() > 4 || geometry.has_holes()
}

/// Triangles wound like `geometry`.
fn triangles(geometry: &Face3D) -> Result<Vec<Face3D>> {
    let mesh = geometry.triangulated()?;
    let normal = geometry.normal();
    mesh.faces()
        .iter()
        .map(|indices| {
            let tri = Face3D::new(indices.iter().map(|&i| mesh.vertices()[i]).collect())?;
            Ok(if tri.normal().dot(&normal) < 0.0 {
                tri.flip()
            } else {
                tri
            })
        })
        .collect()
}

fn replacement<T: SubFace>(original: &T, shapes: &[Face3D]) -> Result<TriangulatedSubFace<T>> {
    let triangles = shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            let identifier = clean_string(&format!("{}..{}", original.identifier(), i));
            original.with_geometry(&identifier, shape.clone())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TriangulatedSubFace {
        original: original.identifier().to_string(),
        parent_face: original.parent_face().map(str::to_string),
        parent_room: original.parent_room().map(str::to_string),
        triangles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::face::Face;
    use crate::model::Model;
    use approx::assert_relative_eq;
    use honeybee_geometry::{Point3, Vector3};

    /// House-shaped outline in a south-facing wall (normal -Y).
    fn gable(x0: f64) -> Face3D {
        Face3D::new(vec![
            Point3::new(x0, 0.0, 1.0),
            Point3::new(x0 + 1.0, 0.0, 1.0),
            Point3::new(x0 + 1.0, 0.0, 2.0),
            Point3::new(x0 + 0.5, 0.0, 2.5),
            Point3::new(x0, 0.0, 2.0),
        ])
        .unwrap()
    }

    fn quad(x0: f64) -> Face3D {
        Face3D::rectangle(Point3::new(x0, 0.0, 1.0), Vector3::x(), Vector3::z(), 1.0, 1.0).unwrap()
    }

    #[test]
    fn only_sub_faces_past_four_sides_are_split() {
        let mut model = Model::new("Tri").unwrap();
        model
            .add_aperture(Aperture::new("Gable", gable(0.0), None, true).unwrap())
            .unwrap();
        model
            .add_aperture(Aperture::new("Square", quad(3.0), None, false).unwrap())
            .unwrap();
        let replaced = model.triangulated_apertures().unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].original, "Gable");
        assert_eq!(replaced[0].parent_face, None);
        let ids: Vec<&str> = replaced[0].triangles.iter().map(|a| a.identifier()).collect();
        assert_eq!(ids, ["Gable..0", "Gable..1", "Gable..2"]);
        let area: f64 = replaced[0].triangles.iter().map(|a| a.area()).sum();
        assert_relative_eq!(area, 1.25, epsilon = 1e-9);
        for tri in &replaced[0].triangles {
            assert!(tri.is_operable());
            assert_relative_eq!(tri.normal().y, -1.0, epsilon = 1e-9);
        }
        // the model itself is unchanged
        assert_eq!(model.apertures().len(), 2);
    }

    #[test]
    fn adjacent_partners_are_split_together() {
        let mut a = Aperture::new("A", gable(0.0), None, false).unwrap();
        let mut b = Aperture::new("B", gable(0.0).flip(), None, false).unwrap();
        a.set_adjacency(&mut b).unwrap();
        let mut model = Model::new("Pair").unwrap();
        model.add_aperture(a).unwrap();
        model.add_aperture(b).unwrap();

        let replaced = model.triangulated_apertures().unwrap();
        assert_eq!(replaced.len(), 2);
        assert_eq!(replaced[0].original, "A");
        assert_eq!(replaced[1].original, "B");
        let first = &replaced[0].triangles[0];
        let surface = first.boundary_condition().surface().unwrap();
        assert_eq!(surface.boundary_condition_objects(), ["B..0"]);
        assert!(replaced[1].triangles[0].normal().y > 0.0);
    }

    #[test]
    fn door_triangles_keep_their_parent() {
        let wall = Face3D::rectangle(Point3::origin(), Vector3::x(), Vector3::z(), 5.0, 3.0).unwrap();
        let mut face = Face::new("F1", wall, None, Some(BoundaryCondition::outdoors())).unwrap();
        face.add_door(Door::new("D1", gable(1.0), None, false).unwrap())
            .unwrap();
        let mut model = Model::new("Doors").unwrap();
        model.add_face(face).unwrap();

        let replaced = model.triangulated_doors().unwrap();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].parent_face.as_deref(), Some("F1"));
        assert_eq!(replaced[0].parent_room, None);
        assert!(replaced[0]
            .triangles
            .iter()
            .all(|d| d.parent() == Some("F1")));
    }
}
