/*
 * Math Helpers
 *
 * Small scalar and vector helpers shared by the integrators and the controller.
 */

use nannou::prelude::*;

/// Lengths and distances below this are treated as zero.
pub const EPSILON: f32 = 1.0e-4;

/// Cubic Hermite ease between two edges, clamped to [0, 1].
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Unit vector along `v`, or `None` when `v` is too short to have a direction.
#[inline]
pub fn safe_normalize(v: Vec3) -> Option<Vec3> {
    let length = v.length();
    if length > EPSILON && length.is_finite() {
        Some(v / length)
    } else {
        None
    }
}
