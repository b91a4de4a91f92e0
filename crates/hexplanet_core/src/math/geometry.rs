//! Ray and circle intersection tests for picking and player collision.

use glam::{Vec2, Vec3};

/// Ray/triangle intersection (Möller–Trumbore, both-sided).
///
/// Returns the hit point for `t > 1e-5`, or `None`.
#[must_use]
pub fn ray_triangle_intersection(
    origin: Vec3,
    dir: Vec3,
    triangle: &[Vec3; 3],
) -> Option<Vec3> {
    const EPS: f32 = 1e-6;

    let e1 = triangle[1] - triangle[0];
    let e2 = triangle[2] - triangle[0];
    let p = dir.cross(e2);
    let det = e1.dot(p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;
    let t_vec = origin - triangle[0];
    let u = t_vec.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = t_vec.cross(e1);
    let v = dir.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = e2.dot(q) * inv_det;
    if t <= 1e-5 {
        return None;
    }
    Some(origin + dir * t)
}

/// Circle-vs-face overlap in the xy plane, by circumcircle.
#[inline]
#[must_use]
pub fn circle_hits_face(pos: Vec2, face_center: Vec2, face_radius: f32, r: f32) -> bool {
    pos.distance_squared(face_center) < (face_radius + r) * (face_radius + r)
}

/// Pushes a circle of radius `r` at `pos` out of the half-plane behind a
/// face edge.
///
/// `edge` is the face's horizontal edge segment and `normal` its outward
/// direction. Returns the corrected position (unchanged when there is no
/// penetration or the circle is beside the segment).
#[must_use]
pub fn push_circle_from_edge(pos: Vec2, edge: [Vec2; 2], normal: Vec2, r: f32) -> Vec2 {
    let e = edge[1] - edge[0];
    let len_sq = e.length_squared();
    if len_sq < 1e-8 {
        return pos;
    }
    let t = (pos - edge[0]).dot(e) / len_sq;
    if !(0.0..=1.0).contains(&t) {
        return pos;
    }
    let d = (pos - edge[0]).dot(normal);
    if d < r {
        pos + normal * (r - d)
    } else {
        pos
    }
}
