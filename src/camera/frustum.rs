//! View frustum window and clipping-plane fitting.
//!
//! The frustum is stored the way a camera describes it: a window
//! (left/right/bottom/top) on the near plane plus near/far distances. For
//! perspective projections the window scales with `near`, so changing the
//! clipping range never changes the field of view.

use glam::DVec3;

use super::bounds::BoundingBox;

/// Frustum window and clipping distances in camera space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left edge of the window on the near plane.
    pub left: f64,
    /// Right edge of the window on the near plane.
    pub right: f64,
    /// Bottom edge of the window on the near plane.
    pub bottom: f64,
    /// Top edge of the window on the near plane.
    pub top: f64,
    /// Near clipping distance (> 0).
    pub near: f64,
    /// Far clipping distance (> near).
    pub far: f64,
}

impl Frustum {
    /// Frustum from explicit window and clipping distances.
    #[must_use]
    pub fn new(
        left: f64,
        right: f64,
        bottom: f64,
        top: f64,
        near: f64,
        far: f64,
    ) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
            near,
            far,
        }
    }

    /// Window width on the near plane.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Window height on the near plane.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Width / height, `None` for a collapsed window.
    #[must_use]
    pub fn aspect(&self) -> Option<f64> {
        let h = self.height();
        (h.abs() > f64::EPSILON).then(|| self.width() / h)
    }

    /// Window center on the near plane (non-zero for off-axis frusta).
    #[must_use]
    pub fn window_center(&self) -> (f64, f64) {
        (
            0.5 * (self.left + self.right),
            0.5 * (self.bottom + self.top),
        )
    }

    /// Reshape the window to `aspect` about its center.
    ///
    /// The window is first squared to its smaller extent, then the width
    /// (aspect > 1) or the height (aspect < 1) is grown. Re-applying the
    /// same aspect leaves the window unchanged.
    pub fn set_aspect(&mut self, aspect: f64) {
        if !aspect.is_finite() || aspect <= 0.0 {
            return;
        }
        let (cx, cy) = self.window_center();
        let side = self.width().abs().min(self.height().abs());
        if side <= 0.0 {
            return;
        }
        let (half_w, half_h) = if aspect >= 1.0 {
            (0.5 * side * aspect, 0.5 * side)
        } else {
            (0.5 * side, 0.5 * side / aspect)
        };
        self.left = cx - half_w;
        self.right = cx + half_w;
        self.bottom = cy - half_h;
        self.top = cy + half_h;
    }

    /// Shift the window by `(dx, dy)` near-plane units.
    pub fn shift_window(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.right += dx;
        self.bottom += dy;
        self.top += dy;
    }

    /// Scale the window about the near-plane point `(px, py)`.
    pub fn scale_window_about(&mut self, px: f64, py: f64, factor: f64) {
        self.left = px + (self.left - px) * factor;
        self.right = px + (self.right - px) * factor;
        self.bottom = py + (self.bottom - py) * factor;
        self.top = py + (self.top - py) * factor;
    }

    /// Center the window on the view axis, keeping its size.
    pub fn recenter(&mut self) {
        let (cx, cy) = self.window_center();
        self.shift_window(-cx, -cy);
    }

    /// Replace near/far. With `perspective`, the window is rescaled by
    /// `near / old_near` to keep the viewing angles.
    pub fn set_near_far(&mut self, near: f64, far: f64, perspective: bool) {
        if near.is_nan() || near <= 0.0 || far <= near || !far.is_finite() {
            return;
        }
        if perspective && self.near > 0.0 {
            let s = near / self.near;
            self.left *= s;
            self.right *= s;
            self.bottom *= s;
            self.top *= s;
        }
        self.near = near;
        self.far = far;
    }
}

impl Default for Frustum {
    fn default() -> Self {
        Self::new(-1.0, 1.0, -1.0, 1.0, 0.1, 1000.0)
    }
}

/// Tuning for [`clipping_range`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipParams {
    /// Extra room on either side of the box depth range, as a fraction of
    /// that range.
    pub margin_ratio: f64,
    /// Lower bound for `near / far`; keeps depth precision usable when the
    /// camera sits inside the box.
    pub min_near_ratio: f64,
}

impl Default for ClipParams {
    fn default() -> Self {
        Self {
            margin_ratio: 0.005,
            min_near_ratio: 1.0e-4,
        }
    }
}

/// Near/far distances bracketing `bbox` as seen from `location` looking
/// along `direction` (unit).
///
/// Returns `None` for an invalid box or one entirely behind the camera.
#[must_use]
pub fn clipping_range(
    location: DVec3,
    direction: DVec3,
    bbox: &BoundingBox,
    params: ClipParams,
) -> Option<(f64, f64)> {
    if !bbox.is_valid() {
        return None;
    }

    let (min_z, max_z) = bbox.corners().iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), &corner| {
            let z = (corner - location).dot(direction);
            (lo.min(z), hi.max(z))
        },
    );
    if max_z.is_nan() || max_z <= 0.0 {
        return None;
    }

    let margin = ((max_z - min_z) * params.margin_ratio)
        .max(bbox.diagonal() * 1.0e-6)
        .max(1.0e-9);
    let far = max_z + margin;
    let near = (min_z - margin).max(far * params.min_near_ratio);
    Some((near, far))
}
