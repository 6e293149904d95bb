// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use honeybee_core::{
    codes, Aperture, BoundaryCondition, Door, Entity, Face, FaceType, Model, Room, Shade,
    ShadeHost, ShadeMesh, Units,
};
use honeybee_geometry::{Face3D, Mesh3D, Point3, Transformable, Vector3};

fn stacked_pair() -> (Room, Room) {
    let mut a = Room::from_box("R1", 5.0, 5.0, 3.0, 0.0, Point3::origin()).unwrap();
    let mut b = Room::from_box("R2", 5.0, 5.0, 3.0, 0.0, Point3::new(0.0, 5.0, 0.0)).unwrap();
    a.wall_apertures_by_ratio(0.4).unwrap();
    b.wall_apertures_by_ratio(0.4).unwrap();
    (a, b)
}

fn wall(x0: f64, x1: f64, y: f64, height: f64) -> Face3D {
    Face3D::new(vec![
        Point3::new(x0, y, 0.0),
        Point3::new(x1, y, 0.0),
        Point3::new(x1, y, height),
        Point3::new(x0, y, height),
    ])
    .unwrap()
}

#[test]
fn duplicate_then_move_leaves_the_original() {
    let (room, _) = stacked_pair();
    let before = room.to_record(false).unwrap();
    let mut copy = room.duplicate();
    copy.translate(Vector3::new(10.0, 0.0, 0.0));
    assert_eq!(room.to_record(false).unwrap(), before);
    assert_relative_eq!(copy.min().x, 10.0, epsilon = 1e-12);
    assert_relative_eq!(copy.volume(), room.volume(), epsilon = 1e-9);
}

#[test]
fn adjacency_is_symmetric_and_reaches_sub_faces() {
    let (a, b) = stacked_pair();
    let mut rooms = vec![a, b];
    let info = Room::solve_adjacency(&mut rooms, 0.01).unwrap();
    assert_eq!(info.faces, [("R1_Back".to_string(), "R2_Front".to_string())]);
    assert_eq!(
        info.apertures,
        [("R1_Back_Glz0".to_string(), "R2_Front_Glz0".to_string())]
    );

    let back = &rooms[0].faces()[3];
    let front = &rooms[1].faces()[1];
    let to_front = back.boundary_condition().surface().unwrap();
    let to_back = front.boundary_condition().surface().unwrap();
    assert_eq!(to_front.boundary_condition_objects(), ["R2_Front", "R2"]);
    assert_eq!(to_back.boundary_condition_objects(), ["R1_Back", "R1"]);

    let window = back.apertures()[0].boundary_condition().surface().unwrap();
    assert_eq!(
        window.boundary_condition_objects(),
        ["R2_Front_Glz0", "R2_Front", "R2"]
    );
}

#[test]
fn solving_again_disturbs_nothing() {
    let (a, b) = stacked_pair();
    let mut rooms = vec![a, b];
    Room::solve_adjacency(&mut rooms, 0.01).unwrap();
    let solved: Vec<_> = rooms.iter().map(|r| r.to_record(true).unwrap()).collect();
    let again = Room::solve_adjacency(&mut rooms, 0.01).unwrap();
    assert!(again.is_empty());
    assert_eq!(rooms.iter().map(|r| r.to_record(true).unwrap()).collect::<Vec<_>>(), solved);
    assert!(Room::find_adjacency(&rooms, 0.01).is_empty());
}

#[test]
fn mismatched_sub_faces_leave_the_pair_untouched() {
    let (a, mut b) = stacked_pair();
    b.faces_mut()[1].remove_apertures();
    let mut rooms = vec![a, b];
    assert!(Room::solve_adjacency(&mut rooms, 0.01).is_err());
    assert!(rooms[0].faces()[3].boundary_condition().is_outdoors());
    assert!(rooms[1].faces()[1].boundary_condition().is_outdoors());
}

#[test]
fn unit_boxes_share_exactly_one_pair() {
    let mut model = Model::new("Unit_Boxes").unwrap();
    model.add_room(Room::from_box("A", 1.0, 1.0, 1.0, 0.0, Point3::origin()).unwrap());
    model.add_room(Room::from_box("B", 1.0, 1.0, 1.0, 0.0, Point3::new(1.0, 0.0, 0.0)).unwrap());
    let info = model.solve_adjacency().unwrap();
    assert_eq!(info.faces.len(), 1);
    assert!(model
        .check_matching_adjacent_areas(false, false)
        .unwrap()
        .is_valid());
}

#[test]
fn outdoor_only_model_has_no_missing_adjacency() {
    let mut model = Model::new("Detached").unwrap();
    model.add_room(Room::from_box("A", 3.0, 3.0, 3.0, 0.0, Point3::origin()).unwrap());
    model.add_room(Room::from_box("B", 3.0, 3.0, 3.0, 45.0, Point3::new(20.0, 0.0, 0.0)).unwrap());
    assert!(model.check_missing_adjacencies(true, false).is_ok());
    assert!(model.check_all(true, false).is_ok());
}

#[test]
fn open_room_fails_the_solid_check() {
    let (mut room, _) = stacked_pair();
    assert!(room.check_solid(0.01, true, false).is_ok());
    room.remove_face("R1_Top").unwrap();
    let report = room.check_solid(0.01, false, true).unwrap();
    assert_eq!(report.errors().len(), 1);
    let error = &report.errors()[0];
    assert_eq!(error.code, codes::NON_SOLID_ROOM);
    assert!(error.message.contains("R1[R1]"));
    assert!(error.helper_geometry.as_ref().is_some_and(|g| !g.is_empty()));
    assert!(matches!(
        room.check_solid(0.01, true, false),
        Err(honeybee_core::Error::Validation { .. })
    ));
}

#[test]
fn closure_flips_sub_faces_with_their_face() {
    let template = Room::from_box("T", 4.0, 4.0, 3.0, 0.0, Point3::origin()).unwrap();
    let mut faces = Vec::new();
    for (i, f) in template.faces().iter().enumerate() {
        // front wall drawn pointing into the room
        let geometry = if i == 1 { f.geometry().flip() } else { f.geometry().clone() };
        let mut face = Face::new(&format!("Room_Face{}", i), geometry, None, None).unwrap();
        if face.face_type() == FaceType::Wall {
            face.apertures_by_ratio(0.3).unwrap();
        }
        faces.push(face);
    }
    let room = Room::new("Room", faces, 0.01).unwrap();
    let front = &room.faces()[1];
    assert_relative_eq!(front.normal(), Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-9);
    assert_relative_eq!(
        front.apertures()[0].normal(),
        Vector3::new(0.0, -1.0, 0.0),
        epsilon = 1e-9
    );
    assert_eq!(front.apertures()[0].room(), Some("Room"));
}

#[test]
fn rotation_keeps_the_room_closed() {
    let (mut room, _) = stacked_pair();
    room.rotate(Vector3::new(1.0, 0.0, 1.0), 37.0, Point3::new(1.0, 2.0, 0.0))
        .unwrap();
    assert_relative_eq!(room.volume(), 75.0, epsilon = 1e-9);
    assert!(room.check_solid(0.01, true, false).is_ok());
    assert!(room.check_sub_faces_valid(0.01, 1.0, true, false).is_ok());
}

#[test]
fn every_entity_round_trips_through_its_record() {
    let shade = Shade::from_vertices(
        "Fin",
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, -0.5, 0.0),
            Point3::new(0.0, -0.5, 3.0),
            Point3::new(0.0, 0.0, 3.0),
        ],
    )
    .unwrap();
    let shade_record = shade.to_record(false).unwrap();
    assert_eq!(Shade::from_record(&shade_record, false).unwrap().to_record(false).unwrap(), shade_record);

    let mut aperture = Aperture::new("Window", wall(1.0, 2.0, 0.0, 2.0), None, true).unwrap();
    aperture.add_outdoor_shade(shade.duplicate()).unwrap();
    let aperture_record = aperture.to_record(false).unwrap();
    let back = Aperture::from_record(&aperture_record, false).unwrap();
    assert!(back.is_operable());
    assert_eq!(back.to_record(false).unwrap(), aperture_record);

    let door = Door::new("Entry", wall(3.0, 4.0, 0.0, 2.1), None, false).unwrap();
    let door_record = door.to_record(false).unwrap();
    assert_eq!(Door::from_record(&door_record, false).unwrap().to_record(false).unwrap(), door_record);

    let mut face = Face::new("South", wall(0.0, 5.0, 0.0, 3.0), None, None).unwrap();
    face.add_aperture(aperture).unwrap();
    face.add_door(door).unwrap();
    let face_record = face.to_record(false).unwrap();
    let back = Face::from_record(&face_record, false).unwrap();
    assert_eq!(back.apertures()[0].parent(), Some("South"));
    assert_eq!(back.to_record(false).unwrap(), face_record);

    let (room, _) = stacked_pair();
    let room_record = room.to_record(true).unwrap();
    assert_eq!(Room::from_record(&room_record, true).unwrap().to_record(true).unwrap(), room_record);

    let mut model = Model::new("Everything").unwrap();
    model.add_room(room);
    model.add_face(face).unwrap();
    model
        .add_shade_mesh(
            ShadeMesh::new(
                "Terrain",
                Mesh3D::new(
                    vec![
                        Point3::new(-10.0, -10.0, 0.0),
                        Point3::new(10.0, -10.0, 0.0),
                        Point3::new(10.0, 10.0, 0.0),
                        Point3::new(-10.0, 10.0, 0.0),
                    ],
                    vec![vec![0, 1, 2, 3]],
                )
                .unwrap(),
                false,
            )
            .unwrap(),
        );
    model.set_units(Units::Feet);
    let model_record = model.to_record().unwrap();
    assert_eq!(model_record["units"], "Feet");
    let back = Model::from_record(&model_record).unwrap();
    assert_eq!(back.to_record().unwrap(), model_record);
    assert_eq!(back.units(), Units::Feet);
}

#[test]
fn orphans_are_checked_with_the_rooms() {
    let mut model = Model::new("Orphans").unwrap();
    model.add_room(Room::from_box("Hall", 3.0, 3.0, 3.0, 0.0, Point3::origin()).unwrap());
    let bowtie = Face3D::new(vec![
        Point3::new(0.0, 0.0, 5.0),
        Point3::new(2.0, 2.0, 5.0),
        Point3::new(3.0, 0.0, 5.0),
        Point3::new(0.0, 1.0, 5.0),
    ])
    .unwrap();
    model.add_shade(Shade::new("Bowtie", bowtie).unwrap()).unwrap();
    let report = model.check_self_intersecting(false, true).unwrap();
    assert_eq!(report.errors().len(), 1);
    assert_eq!(report.errors()[0].element_id, ["Bowtie"]);
}

#[test]
fn rooms_convert_between_units() {
    let mut model = Model::new("Feet_Model").unwrap();
    model.set_units(Units::Feet);
    model.set_tolerance(Units::Feet.default_tolerance()).unwrap();
    model.add_room(Room::from_box("Den", 10.0, 10.0, 10.0, 0.0, Point3::origin()).unwrap());
    model.convert_to_units(Units::Meters);
    assert_relative_eq!(model.rooms()[0].max().x, 3.048, epsilon = 1e-9);
    assert_relative_eq!(model.tolerance(), 0.003048, epsilon = 1e-12);
}

#[test]
fn boundary_condition_display() {
    let (room, _) = stacked_pair();
    assert_eq!(room.faces()[0].boundary_condition(), &BoundaryCondition::Ground);
    assert_eq!(room.faces()[1].boundary_condition().to_string(), "Outdoors");
    assert_eq!(room.identifier(), "R1");
}

#[test]
fn models_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Model>();
    assert_send_sync::<Room>();
    assert_send_sync::<Face>();
}
