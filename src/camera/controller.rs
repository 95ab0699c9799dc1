//! Gesture-level navigation on a [`ViewportPose`].
//!
//! Every operation is a no-op when its inputs are degenerate; a rejected
//! operation never leaves the pose half-updated.

use glam::{DQuat, DVec2, DVec3};

use super::bounds::BoundingBox;
use super::core::{Projection, ViewportPose};
use super::frustum::ClipParams;

/// Fixed point of a [`ViewportPose::magnify`] step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MagnifyPivot {
    /// Zoom toward the look-at point.
    Target,
    /// Keep the world point under this screen position (pixels, origin
    /// top-left) fixed on screen.
    ScreenPoint(DVec2),
}

/// Map a screen position onto the unit virtual trackball. Points outside
/// the ball land on its rim.
fn screen_to_arcball(screen_size: DVec2, pos: DVec2) -> DVec3 {
    let min_dim = screen_size.x.min(screen_size.y).max(1.0);
    let nx = (2.0 * pos.x - screen_size.x) / min_dim;
    let ny = (screen_size.y - 2.0 * pos.y) / min_dim;

    let r2 = nx * nx + ny * ny;
    if r2 <= 1.0 {
        DVec3::new(nx, ny, (1.0 - r2).sqrt())
    } else {
        DVec3::new(nx, ny, 0.0) / r2.sqrt()
    }
}

impl ViewportPose {
    /// Rotate the camera about the target by the trackball drag from
    /// `anchor` to `current`. Distance is preserved; up rotates along.
    pub fn orbit(
        &mut self,
        screen_size: DVec2,
        anchor: DVec2,
        current: DVec2,
    ) {
        if !(anchor.is_finite() && current.is_finite()) || anchor == current {
            return;
        }
        let a = screen_to_arcball(screen_size, anchor);
        let b = screen_to_arcball(screen_size, current);
        if a.abs_diff_eq(b, 1.0e-12) {
            return;
        }

        let (right, up, back) = self.camera_frame();
        let to_world = |v: DVec3| right * v.x + up * v.y + back * v.z;
        // The scene turns a -> b, so the camera turns the other way.
        let rotation =
            DQuat::from_rotation_arc(to_world(a), to_world(b)).inverse();

        let target = self.target();
        let offset = rotation * (self.camera_location() - target);
        let new_up = (rotation * self.up()).normalize();
        if let Err(e) = self.set_target(target, target + offset, new_up) {
            log::warn!("orbit rejected: {e}");
        }
    }

    /// World units covered by one screen pixel at the target depth.
    #[must_use]
    pub fn world_per_pixel(&self) -> f64 {
        let port = self.screen_port();
        let width = self.frustum.width();
        match self.projection {
            Projection::Perspective => {
                width * self.distance()
                    / self.frustum.near
                    / f64::from(port.width.max(1))
            }
            Projection::Parallel => width / f64::from(port.width.max(1)),
        }
    }

    /// Slide camera and target along the view plane so the scene follows
    /// the drag from `start` to `midpoint`.
    pub fn lateral_pan(&mut self, start: DVec2, midpoint: DVec2) {
        let delta = midpoint - start;
        if !delta.is_finite() || delta == DVec2::ZERO {
            return;
        }
        let (right, up, _) = self.camera_frame();
        let scale = self.world_per_pixel();
        // Screen y grows downward.
        self.translate((-right * delta.x + up * delta.y) * scale);
    }

    /// Zoom by `scale` (> 1 moves closer): the camera-to-target distance
    /// becomes `distance / scale` with the target held fixed.
    pub fn magnify(
        &mut self,
        screen_size: DVec2,
        scale: f64,
        pivot: MagnifyPivot,
    ) {
        if !scale.is_finite() || scale <= 0.0 || scale == 1.0 {
            return;
        }

        let anchor = match pivot {
            MagnifyPivot::Target => None,
            MagnifyPivot::ScreenPoint(p) => {
                self.near_plane_point(screen_size, p)
            }
        };

        self.set_distance(self.distance() / scale);
        match (self.projection, anchor) {
            (Projection::Perspective, Some((x, y))) => {
                self.frustum
                    .shift_window((scale - 1.0) * x, (scale - 1.0) * y);
            }
            (Projection::Perspective, None) => {}
            (Projection::Parallel, Some((x, y))) => {
                self.frustum.scale_window_about(x, y, 1.0 / scale);
            }
            (Projection::Parallel, None) => {
                let (cx, cy) = self.frustum.window_center();
                self.frustum.scale_window_about(cx, cy, 1.0 / scale);
            }
        }
    }

    /// Near-plane window coordinates under a screen position.
    fn near_plane_point(
        &self,
        screen_size: DVec2,
        p: DVec2,
    ) -> Option<(f64, f64)> {
        if !p.is_finite() || screen_size.x <= 0.0 || screen_size.y <= 0.0 {
            return None;
        }
        let f = &self.frustum;
        Some((
            f.left + p.x / screen_size.x * f.width(),
            f.top - p.y / screen_size.y * f.height(),
        ))
    }

    /// Move the camera along its current direction so `bounds`, scaled by
    /// `padding` about its center, fills the view. The target becomes the
    /// box center and any off-axis window shift is removed.
    ///
    /// Returns `false` (pose untouched) for degenerate boxes or a fit the
    /// pose rejects.
    pub fn dolly_extents(
        &mut self,
        bounds: &BoundingBox,
        padding: f64,
    ) -> bool {
        if bounds.is_degenerate() || !padding.is_finite() || padding <= 0.0 {
            return false;
        }
        let padded = bounds.scaled(padding);
        let center = padded.center();
        let direction = self.direction();
        let (right, up, _) = self.camera_frame();

        let mut frustum = self.frustum;
        let half_w = 0.5 * frustum.width().abs();
        let half_h = 0.5 * frustum.height().abs();
        if half_w <= 0.0 || half_h <= 0.0 {
            return false;
        }
        frustum.recenter();

        let corners = padded.corners().map(|c| {
            let v = c - center;
            (v.dot(right), v.dot(up), v.dot(direction))
        });

        let distance = match self.projection {
            Projection::Perspective => {
                let tan_w = half_w / frustum.near;
                let tan_h = half_h / frustum.near;
                let fit = corners.iter().fold(0.0_f64, |d, &(x, y, z)| {
                    d.max(x.abs() / tan_w - z).max(y.abs() / tan_h - z)
                });
                let in_front = corners
                    .iter()
                    .fold(f64::NEG_INFINITY, |d, &(_, _, z)| d.max(-z));
                fit.max(in_front + padded.diagonal() * 1.0e-6)
            }
            Projection::Parallel => {
                let (ex, ey) = corners.iter().fold(
                    (0.0_f64, 0.0_f64),
                    |(ex, ey), &(x, y, _)| (ex.max(x.abs()), ey.max(y.abs())),
                );
                let factor = (ex / half_w).max(ey / half_h);
                if factor > 0.0 {
                    frustum.scale_window_about(0.0, 0.0, factor);
                }
                padded.diagonal()
            }
        };

        if let Err(e) =
            self.set_target(center, center - direction * distance, self.up())
        {
            log::warn!("dolly extents rejected: {e}");
            return false;
        }
        self.frustum = frustum;
        self.fit_frustum(&padded, ClipParams::default());
        true
    }
}
