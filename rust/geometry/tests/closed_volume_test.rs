// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use approx::assert_relative_eq;
use honeybee_geometry::{Face3D, Plane, Point3, Polyface3D, Transformable, Vector3};

fn shoebox(width: f64, depth: f64, height: f64) -> Vec<Face3D> {
    Polyface3D::from_box(width, depth, height, &Plane::world_xy(Point3::origin()))
        .unwrap()
        .faces()
        .unwrap()
}

#[test]
fn rotated_box_keeps_volume() {
    let mut pf = Polyface3D::from_faces(&shoebox(5.0, 4.0, 3.0), 0.01);
    pf.rotate(Vector3::new(1.0, 1.0, 0.0), 33.0, Point3::new(2.0, 2.0, 0.0))
        .unwrap();
    assert!(pf.is_solid());
    assert_relative_eq!(pf.volume(), 60.0, epsilon = 1e-9);
}

#[test]
fn reflected_box_stays_outward() {
    let mut pf = Polyface3D::from_faces(&shoebox(2.0, 2.0, 2.0), 0.01);
    pf.reflect(Vector3::x(), Point3::origin()).unwrap();
    assert_relative_eq!(pf.signed_volume(), 8.0, epsilon = 1e-9);
    assert!(pf.outward_flips().iter().all(|f| !f));
}

#[test]
fn adjacent_boxes_share_a_centered_wall() {
    let a = shoebox(5.0, 5.0, 3.0);
    let mut b = shoebox(5.0, 5.0, 3.0);
    for f in b.iter_mut() {
        f.translate(Vector3::new(0.0, 5.0, 0.0));
    }
    // back wall of the first box against the front wall of the second
    assert!(a[3].is_centered_adjacent(&b[1], 0.01));
    assert!(!a[2].is_centered_adjacent(&b[1], 0.01));
    assert_relative_eq!(a[3].normal().dot(&b[1].normal()), -1.0, epsilon = 1e-10);
}

#[test]
fn scaled_faces_weld_at_matching_tolerance() {
    let mut faces = shoebox(1.0, 1.0, 1.0);
    for f in faces.iter_mut() {
        f.scale(1000.0, None);
    }
    let pf = Polyface3D::from_faces(&faces, 1.0);
    assert!(pf.is_solid());
    assert_relative_eq!(pf.volume(), 1.0e9, epsilon = 1e-3);
}
