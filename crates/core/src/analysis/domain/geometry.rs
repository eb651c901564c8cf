//! Angle and distance helpers over landmark positions.
//!
//! Every function returns `None` instead of a non-finite number, so a
//! zero-length vector or NaN input never leaks out as NaN.

use crate::pose::domain::landmark::Landmark;

/// A point or direction in landmark space.
pub type Vec3 = [f64; 3];

/// Image "up": y grows downward in normalized image coordinates.
pub const UP: Vec3 = [0.0, -1.0, 0.0];

pub fn position(lm: &Landmark) -> Vec3 {
    [lm.x, lm.y, lm.z]
}

pub fn midpoint(a: &Landmark, b: &Landmark) -> Vec3 {
    [(a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}

/// Orientation of the 2D segment `p1 -> p2` against the horizontal axis,
/// `atan2(dy, dx)` in degrees, in (-180, 180].
pub fn slope_angle(p1: &Landmark, p2: &Landmark) -> Option<f64> {
    finite((p2.y - p1.y).atan2(p2.x - p1.x).to_degrees())
}

/// Absolute difference `|a - b|` between two slope angles, in [0, 360).
///
/// Not folded: a front-facing torso has both slopes near +-180, so opposite
/// tilts of one degree each read as 358.
pub fn slope_difference(a: f64, b: f64) -> Option<f64> {
    finite((a - b).abs())
}

/// Angle between two vectors in degrees, in [0, 180].
///
/// The cosine is clipped to [-1, 1] before `acos`. Returns `None` when
/// either vector has zero length.
pub fn angle_between(u: Vec3, v: Vec3) -> Option<f64> {
    let denom = norm(u) * norm(v);
    if !denom.is_finite() || denom == 0.0 {
        return None;
    }
    let cos = (dot(u, v) / denom).clamp(-1.0, 1.0);
    finite(cos.acos().to_degrees())
}

/// Angle at `vertex` formed by `a` and `c`, in degrees.
pub fn angle_at(a: &Landmark, vertex: &Landmark, c: &Landmark) -> Option<f64> {
    let b = position(vertex);
    angle_between(sub(position(a), b), sub(position(c), b))
}

/// Euclidean length of the `a -> b` segment in the image plane (x, y only).
pub fn planar_distance(a: &Landmark, b: &Landmark) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}
