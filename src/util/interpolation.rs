//! Interpolation helpers for camera tweening.
//!
//! Scalar cosine easing and spherical linear interpolation of 3D vectors.
//! Everything here is pure and allocation-free; the restore-view animator
//! calls these once per frame per pose component.

use std::f64::consts::PI;

use glam::DVec3;

/// Below this angle (radians) two directions are treated as identical and
/// slerp falls back to a normalized lerp.
const SLERP_PARALLEL_EPSILON: f64 = 1.0e-9;

/// Cosine-shaped ease-in/ease-out weight for `t` in `[0, 1]`.
///
/// Input is clamped. Returns 0 at `t = 0`, 0.5 at `t = 0.5`, 1 at `t = 1`,
/// with zero slope at both ends.
#[inline]
#[must_use]
pub fn cos_ease(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    0.5 * (1.0 - (t * PI).cos())
}

/// Interpolate between `a` and `b` using a cosine ease.
#[inline]
#[must_use]
pub fn cos_interp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * cos_ease(t)
}

/// Component-wise cosine interpolation of two points.
#[inline]
#[must_use]
pub fn cos_interp_point(a: DVec3, b: DVec3, t: f64) -> DVec3 {
    DVec3::new(
        cos_interp(a.x, b.x, t),
        cos_interp(a.y, b.y, t),
        cos_interp(a.z, b.z, t),
    )
}

/// Spherical linear interpolation between two vectors.
///
/// The direction sweeps the great arc between `a` and `b` at constant
/// angular velocity while the length is interpolated linearly, so for
/// equal-length inputs the result stays on the sphere. `t` is clamped to
/// `[0, 1]`; `t = 0` returns `a` and `t = 1` returns `b` exactly.
///
/// Zero-length inputs degrade to a linear blend. Antiparallel inputs rotate
/// about an arbitrary axis perpendicular to `a`.
#[must_use]
pub fn slerp(a: DVec3, b: DVec3, t: f64) -> DVec3 {
    let t = t.clamp(0.0, 1.0);
    if t <= 0.0 {
        return a;
    }
    if t >= 1.0 {
        return b;
    }

    let len_a = a.length();
    let len_b = b.length();
    if len_a <= f64::EPSILON || len_b <= f64::EPSILON {
        return a.lerp(b, t);
    }

    let ua = a / len_a;
    let ub = b / len_b;
    let length = len_a + (len_b - len_a) * t;

    let cos_theta = ua.dot(ub).clamp(-1.0, 1.0);
    let theta = cos_theta.acos();

    let dir = if theta < SLERP_PARALLEL_EPSILON {
        ua.lerp(ub, t).normalize_or(ua)
    } else if PI - theta < SLERP_PARALLEL_EPSILON {
        // Antiparallel: any perpendicular axis is a valid great circle.
        let axis = ua.any_orthonormal_vector();
        let angle = theta * t;
        ua * angle.cos() + axis * angle.sin()
    } else {
        let sin_theta = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin_theta;
        let wb = (t * theta).sin() / sin_theta;
        (ua * wa + ub * wb).normalize_or(ua)
    };

    dir * length
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn cos_ease_endpoints_and_midpoint() {
        assert_eq!(cos_ease(0.0), 0.0);
        assert!((cos_ease(0.5) - 0.5).abs() < EPS);
        assert!((cos_ease(1.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn cos_ease_clamps_input() {
        assert_eq!(cos_ease(-2.0), 0.0);
        assert!((cos_ease(3.0) - 1.0).abs() < EPS);
    }

    #[test]
    fn cos_ease_is_slow_at_the_ends() {
        // Ease-in: early progress lags behind linear.
        assert!(cos_ease(0.1) < 0.1);
        // Ease-out: late progress is ahead of linear.
        assert!(cos_ease(0.9) > 0.9);
    }

    #[test]
    fn cos_interp_scalar() {
        assert_eq!(cos_interp(2.0, 10.0, 0.0), 2.0);
        assert!((cos_interp(2.0, 10.0, 0.5) - 6.0).abs() < EPS);
        assert!((cos_interp(2.0, 10.0, 1.0) - 10.0).abs() < EPS);
    }

    #[test]
    fn cos_interp_point_is_component_wise() {
        let p = cos_interp_point(DVec3::ZERO, DVec3::new(2.0, 4.0, -6.0), 0.5);
        assert!((p - DVec3::new(1.0, 2.0, -3.0)).length() < EPS);
    }

    #[test]
    fn slerp_endpoints_are_exact() {
        let a = DVec3::new(1.0, 2.0, 3.0);
        let b = DVec3::new(-3.0, 0.5, 2.0);
        assert_eq!(slerp(a, b, 0.0), a);
        assert_eq!(slerp(a, b, 1.0), b);
    }

    #[test]
    fn slerp_has_constant_angular_velocity() {
        let a = DVec3::X * 5.0;
        let b = DVec3::Y * 5.0;
        let quarter = slerp(a, b, 0.25);
        let half = slerp(a, b, 0.5);

        assert!((quarter.length() - 5.0).abs() < 1e-9);
        assert!((half.length() - 5.0).abs() < 1e-9);
        assert!((a.angle_between(quarter) - PI / 8.0).abs() < 1e-9);
        assert!((a.angle_between(half) - PI / 4.0).abs() < 1e-9);
    }

    #[test]
    fn slerp_interpolates_length_linearly() {
        let mid = slerp(DVec3::X * 2.0, DVec3::Y * 4.0, 0.5);
        assert!((mid.length() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn slerp_parallel_inputs() {
        let mid = slerp(DVec3::Z, DVec3::Z * 3.0, 0.5);
        assert!((mid - DVec3::Z * 2.0).length() < 1e-9);
    }

    #[test]
    fn slerp_antiparallel_stays_on_sphere() {
        let mid = slerp(DVec3::X, -DVec3::X, 0.5);
        assert!((mid.length() - 1.0).abs() < 1e-9);
        assert!(mid.dot(DVec3::X).abs() < 1e-9);
    }
}
