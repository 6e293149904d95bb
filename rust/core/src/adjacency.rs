// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adjacency between rooms
//!
//! Two faces of different rooms are adjacent when they share a center,
//! plane and area within the tolerance. Solving turns each such pair into
//! a pair of Surface boundary conditions that point at each other, along
//! with their apertures and doors.

use rustc_hash::FxHashSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::element::Entity;
use crate::error::Result;
use crate::room::Room;

/// Two adjacent faces, by room index and face index within the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacePair {
    pub rooms: (usize, usize),
    pub faces: (usize, usize),
    pub identifiers: (String, String),
}

/// Identifier pairs set adjacent by [`solve_adjacency`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdjacencyInfo {
    pub faces: Vec<(String, String)>,
    pub apertures: Vec<(String, String)>,
    pub doors: Vec<(String, String)>,
}

impl AdjacencyInfo {
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

/// Finds adjacent faces without modifying the rooms.
///
/// Faces that already have a Surface boundary condition are skipped and
/// each face takes the first unclaimed match in room order.
pub fn find_adjacency(rooms: &[Room], tolerance: f64) -> Vec<FacePair> {
    let bounds: Vec<_> = rooms.iter().map(Room::bounding_box).collect();
    let mut claimed: FxHashSet<(usize, usize)> = FxHashSet::default();
    let mut pairs = Vec::new();

    for i in 0..rooms.len() {
        for j in (i + 1)..rooms.len() {
            let touching = match (&bounds[i], &bounds[j]) {
                (Some(a), Some(b)) => a.overlaps(b, tolerance),
                _ => false,
            };
            if !touching {
                continue;
            }
            for (fi, face) in rooms[i].faces().iter().enumerate() {
                if face.boundary_condition().is_surface() || claimed.contains(&(i, fi)) {
                    continue;
                }
                let found = rooms[j].faces().iter().enumerate().find(|(fj, other)| {
                    !other.boundary_condition().is_surface()
                        && !claimed.contains(&(j, *fj))
                        && face.geometry().is_centered_adjacent(other.geometry(), tolerance)
                });
                if let Some((fj, other)) = found {
                    claimed.insert((i, fi));
                    claimed.insert((j, fj));
                    pairs.push(FacePair {
                        rooms: (i, j),
                        faces: (fi, fj),
                        identifiers: (face.identifier().to_string(), other.identifier().to_string()),
                    });
                }
            }
        }
    }
    pairs
}

/// Sets Surface boundary conditions on every adjacent face pair.
///
/// Running it again on solved rooms finds nothing new. A pair whose
/// sub-faces cannot be matched stops the solve with an error; pairs solved
/// before it keep their new boundary conditions.
pub fn solve_adjacency(rooms: &mut [Room], tolerance: f64) -> Result<AdjacencyInfo> {
    let mut info = AdjacencyInfo::default();
    for pair in find_adjacency(rooms, tolerance) {
        let (i, j) = pair.rooms;
        let (left, right) = rooms.split_at_mut(j);
        let face = &mut left[i].faces_for_conditions()[pair.faces.0];
        let other = &mut right[0].faces_for_conditions()[pair.faces.1];
        let sub_faces = face.set_adjacency(other, tolerance)?;
        debug!(
            face = %pair.identifiers.0,
            other = %pair.identifiers.1,
            apertures = sub_faces.apertures.len(),
            doors = sub_faces.doors.len(),
            "set adjacency"
        );
        info.faces.push(pair.identifiers);
        info.apertures.extend(sub_faces.apertures);
        info.doors.extend(sub_faces.doors);
    }
    info!(
        rooms = rooms.len(),
        faces = info.faces.len(),
        apertures = info.apertures.len(),
        doors = info.doors.len(),
        "solved adjacency"
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary_condition::BoundaryCondition;
    use honeybee_geometry::Point3;

    fn row(count: usize) -> Vec<Room> {
        (0..count)
            .map(|i| {
                Room::from_box(
                    &format!("R{}", i),
                    4.0,
                    4.0,
                    3.0,
                    0.0,
                    Point3::new(4.0 * i as f64, 0.0, 0.0),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn neighbours_share_one_wall() {
        let rooms = row(3);
        let pairs = find_adjacency(&rooms, 0.01);
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].identifiers, ("R0_Right".to_string(), "R1_Left".to_string()));
        assert_eq!(pairs[1].rooms, (1, 2));
    }

    #[test]
    fn solve_points_both_faces_at_each_other() {
        let mut rooms = row(2);
        let info = solve_adjacency(&mut rooms, 0.01).unwrap();
        assert_eq!(info.faces.len(), 1);
        let right = &rooms[0].faces()[2];
        let left = &rooms[1].faces()[4];
        match right.boundary_condition() {
            BoundaryCondition::Surface(s) => {
                assert_eq!(s.boundary_condition_objects(), ["R1_Left", "R1"]);
            }
            other => panic!("expected Surface, got {}", other),
        }
        assert_eq!(
            left.boundary_condition().surface().map(|s| s.boundary_condition_object()),
            Some("R0_Right")
        );
    }

    #[test]
    fn solving_twice_changes_nothing() {
        let mut rooms = row(2);
        solve_adjacency(&mut rooms, 0.01).unwrap();
        let before: Vec<_> = rooms.iter().map(|r| r.to_record(true).unwrap()).collect();
        let again = solve_adjacency(&mut rooms, 0.01).unwrap();
        assert!(again.is_empty());
        let after: Vec<_> = rooms.iter().map(|r| r.to_record(true).unwrap()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn distant_rooms_are_not_adjacent() {
        let mut rooms = row(2);
        let far = Room::from_box("Far", 4.0, 4.0, 3.0, 0.0, Point3::new(50.0, 0.0, 0.0)).unwrap();
        rooms[1] = far;
        assert!(find_adjacency(&rooms, 0.01).is_empty());
    }
}
