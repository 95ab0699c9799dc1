//! Mutable viewport context shared by the mapper, animator and render loop.

use glam::DVec2;

use crate::camera::bounds::BoundingBox;
use crate::camera::core::ViewportPose;
use crate::camera::frustum::ClipParams;

/// All per-view state that gestures, animation and rendering read or
/// write. Passed by `&mut` to each component; never shared across threads.
#[derive(Debug, Clone)]
pub struct ViewportController {
    /// Current pose, `None` until set up from a scene.
    pub viewport: Option<ViewportPose>,
    /// Pose captured at setup.
    pub home_pose: Option<ViewportPose>,
    /// Pose saved before the last animation back to home.
    pub last_interactive_pose: Option<ViewportPose>,
    /// Degraded rendering while interaction or animation is in progress.
    pub fast_drawing: bool,
    /// Pose equals the home pose (set at setup and after a restore).
    pub at_initial_position: bool,
    /// Gestures are accepted (false while a restore animation runs).
    pub interaction_enabled: bool,
    /// Mesh preparation finished successfully.
    pub gestures_ready: bool,
    /// Scene extents used for frustum fitting and dolly extents.
    pub scene_bounds: Option<BoundingBox>,
    /// View size in points.
    pub view_size: DVec2,
    /// Pixels per point.
    pub content_scale: f64,
    /// Near/far fitting parameters.
    pub clip_params: ClipParams,
    redraw_requested: bool,
}

impl Default for ViewportController {
    fn default() -> Self {
        Self {
            viewport: None,
            home_pose: None,
            last_interactive_pose: None,
            fast_drawing: false,
            at_initial_position: false,
            interaction_enabled: true,
            gestures_ready: false,
            scene_bounds: None,
            view_size: DVec2::ONE,
            content_scale: 1.0,
            clip_params: ClipParams::default(),
            redraw_requested: false,
        }
    }
}

impl ViewportController {
    /// Empty context for a view of `view_size` points.
    #[must_use]
    pub fn new(view_size: DVec2, content_scale: f64) -> Self {
        Self {
            view_size,
            content_scale: if content_scale > 0.0 {
                content_scale
            } else {
                1.0
            },
            ..Self::default()
        }
    }

    /// Ask the host for another frame.
    pub fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    /// Pending redraw flag, cleared on read.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Whether a redraw is pending.
    #[must_use]
    pub fn redraw_requested(&self) -> bool {
        self.redraw_requested
    }

    /// Gesture input may move the camera.
    #[must_use]
    pub fn accepts_gestures(&self) -> bool {
        self.viewport.is_some()
            && self.interaction_enabled
            && self.gestures_ready
    }

    /// Drawable size in pixels (points × content scale), at least 1×1.
    #[must_use]
    pub fn drawable_size(&self) -> (u32, u32) {
        let px = (self.view_size * self.content_scale).round();
        (px.x.max(1.0) as u32, px.y.max(1.0) as u32)
    }

    /// View size rounded to whole points, at least 1×1.
    #[must_use]
    pub fn view_size_points(&self) -> (u32, u32) {
        let pt = self.view_size.round();
        (pt.x.max(1.0) as u32, pt.y.max(1.0) as u32)
    }

    /// Refit near/far of the current viewport to the scene bounds.
    pub fn fit_frustum(&mut self) {
        if let (Some(pose), Some(bounds)) =
            (self.viewport.as_mut(), self.scene_bounds.as_ref())
        {
            pose.fit_frustum(bounds, self.clip_params);
        }
    }

    /// Push the view size into the viewport's screen port and refit.
    pub fn apply_view_size(&mut self) {
        let (w, h) = self.view_size_points();
        if let Some(pose) = self.viewport.as_mut() {
            pose.set_screen_port(w, h);
        }
        self.fit_frustum();
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;

    #[test]
    fn redraw_request_is_taken_once() {
        let mut ctx = ViewportController::default();
        ctx.request_redraw();
        assert!(ctx.take_redraw_request());
        assert!(!ctx.take_redraw_request());
    }

    #[test]
    fn drawable_size_applies_content_scale() {
        let ctx = ViewportController::new(DVec2::new(400.0, 300.0), 2.0);
        assert_eq!(ctx.drawable_size(), (800, 600));
    }

    #[test]
    fn gestures_need_viewport_and_readiness() {
        let mut ctx = ViewportController::default();
        ctx.gestures_ready = true;
        assert!(!ctx.accepts_gestures());
        ctx.viewport = Some(
            ViewportPose::new(DVec3::Z, DVec3::ZERO, DVec3::Y).unwrap(),
        );
        assert!(ctx.accepts_gestures());
        ctx.interaction_enabled = false;
        assert!(!ctx.accepts_gestures());
    }

    #[test]
    fn apply_view_size_sets_aspect() {
        let mut ctx = ViewportController::new(DVec2::new(300.0, 100.0), 1.0);
        ctx.viewport = Some(
            ViewportPose::new(DVec3::Z, DVec3::ZERO, DVec3::Y).unwrap(),
        );
        ctx.apply_view_size();
        let aspect = ctx.viewport.unwrap().frustum_aspect().unwrap();
        assert!((aspect - 3.0).abs() < 1e-12);
    }
}
