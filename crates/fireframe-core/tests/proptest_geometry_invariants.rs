//! Property tests for quaternions, mesh normalization and projection.

use std::f64::consts::{FRAC_PI_2, PI};

use fireframe_core::geometry::{Quaternion, Transform, Vec3};
use fireframe_core::mesh::{Mesh, normalize};
use fireframe_core::projector::{NEAR_PLANE, Projector, clip_segment};
use proptest::prelude::*;

const EPS: f64 = 1e-9;

// ── Helpers ─────────────────────────────────────────────────────────────

fn vec3() -> impl Strategy<Value = Vec3> {
    (-100.0f64..100.0, -100.0f64..100.0, -100.0f64..100.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn unit_axis() -> impl Strategy<Value = Vec3> {
    vec3()
        .prop_filter("non-zero", |v| v.length() > 1e-3)
        .prop_map(Vec3::normalized)
}

fn close(a: Vec3, b: Vec3, eps: f64) -> bool {
    (a - b).length() <= eps * (1.0 + a.length().max(b.length()))
}

fn mesh() -> impl Strategy<Value = Mesh> {
    prop::collection::vec(vec3(), 2..40).prop_map(|vertices| {
        let lines = (1..vertices.len()).map(|i| [i - 1, i]).collect();
        Mesh::new(vertices, lines)
    })
}

fn bounds(m: &Mesh) -> (Vec3, Vec3) {
    let first = m.vertices[0];
    m.vertices.iter().fold((first, first), |(lo, hi), v| {
        (
            Vec3::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
            Vec3::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
        )
    })
}

// ── Quaternion ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn identity_leaves_vectors_alone(v in vec3()) {
        prop_assert_eq!(Quaternion::IDENTITY.rotate(v), v);
    }

    #[test]
    fn two_quarter_turns_make_a_half_turn(axis in unit_axis(), v in vec3()) {
        let quarter = Quaternion::from_axis_angle(axis, FRAC_PI_2);
        let half = Quaternion::from_axis_angle(axis, PI);
        let twice = quarter.rotate(quarter.rotate(v));
        prop_assert!(close(twice, half.rotate(v), EPS));
        prop_assert!(close((quarter * quarter).rotate(v), half.rotate(v), EPS));
    }

    #[test]
    fn rotation_preserves_length(axis in unit_axis(), angle in -10.0f64..10.0, v in vec3()) {
        let q = Quaternion::from_axis_angle(axis, angle);
        prop_assert!((q.rotate(v).length() - v.length()).abs() <= EPS * (1.0 + v.length()));
    }

    #[test]
    fn normalizing_a_unit_quaternion_is_a_noop(axis in unit_axis(), angle in -10.0f64..10.0) {
        let q = Quaternion::from_axis_angle(axis, angle);
        let n = q.normalized();
        prop_assert!((q.w - n.w).abs() < EPS && (q.x - n.x).abs() < EPS);
        prop_assert!((q.y - n.y).abs() < EPS && (q.z - n.z).abs() < EPS);
    }

    #[test]
    fn many_small_rotations_stay_unit(steps in prop::collection::vec((-0.1f64..0.1, -0.1f64..0.1), 1..500)) {
        let mut t = Transform::default();
        for (dx, dy) in steps {
            t.rotate(dx, dy);
        }
        prop_assert!((t.orientation.magnitude() - 1.0).abs() < 1e-12);
    }
}

// ── Normalization ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn normalized_mesh_is_centered_and_bounded(m in mesh()) {
        let (lo, hi) = bounds(&m);
        prop_assume!((hi - lo).length() > 1e-3);
        let n = normalize(m);
        let (lo, hi) = bounds(&n);
        prop_assert!(((lo + hi) * 0.5).length() < 1e-9);
        for v in &n.vertices {
            prop_assert!(v.length() <= 1.0 + 1e-9);
        }
    }

    #[test]
    fn normalization_is_idempotent(m in mesh()) {
        let once = normalize(m);
        let twice = normalize(once.clone());
        prop_assert_eq!(once.lines.clone(), twice.lines.clone());
        for (a, b) in once.vertices.iter().zip(&twice.vertices) {
            prop_assert!(close(*a, *b, 1e-9));
        }
    }

    #[test]
    fn degenerate_mesh_is_unchanged(p in vec3(), n in 1usize..10) {
        let m = Mesh::new(vec![p; n], vec![]);
        prop_assert_eq!(normalize(m.clone()), m);
    }
}

// ── Projection ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn clipped_endpoint_lands_on_near_plane(
        x0 in -5.0f64..5.0, y0 in -5.0f64..5.0, z0 in -5.0f64..NEAR_PLANE,
        x1 in -5.0f64..5.0, y1 in -5.0f64..5.0, z1 in (NEAR_PLANE + 0.01)..5.0,
    ) {
        let behind = Vec3::new(x0, y0, z0);
        let front = Vec3::new(x1, y1, z1);
        let (a, b) = clip_segment(behind, front).expect("one end is in front");
        prop_assert!((a.z - NEAR_PLANE).abs() < 1e-12);
        prop_assert_eq!(b, front);
    }

    #[test]
    fn both_behind_is_rejected(
        z0 in -5.0f64..=NEAR_PLANE, z1 in -5.0f64..=NEAR_PLANE,
    ) {
        prop_assert!(clip_segment(Vec3::new(0.0, 0.0, z0), Vec3::new(1.0, 1.0, z1)).is_none());
    }
}

#[test]
fn known_projection() {
    let p = Projector::new(200, 100);
    assert_eq!(p.project_point(Vec3::new(1.0, 0.0, 10.0), 100.0), (110, 50));
    assert_eq!(p.project_point(Vec3::new(0.0, -2.0, 10.0), 100.0), (100, 30));
}
