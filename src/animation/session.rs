//! One restore-view tween between two captured poses.

use glam::DVec3;
use web_time::{Duration, Instant};

use crate::camera::core::{Projection, ViewportPose};
use crate::camera::frustum::Frustum;
use crate::util::interpolation::{cos_interp, cos_interp_point, slerp};

/// Pose vectors for one animation frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameVectors {
    /// Look-at point.
    pub target: DVec3,
    /// Camera position.
    pub camera_location: DVec3,
    /// Unit up vector.
    pub up: DVec3,
}

/// Start and finish poses plus timing for a single tween.
#[derive(Debug, Clone)]
pub struct AnimationSession {
    start: ViewportPose,
    finish: ViewportPose,
    start_time: Instant,
    duration: Duration,
    /// `finish.camera` moved along its line of sight to the start distance.
    equalized_finish_camera: DVec3,
    start_distance: f64,
    finish_distance: f64,
}

impl AnimationSession {
    /// Session starting at `now`.
    #[must_use]
    pub fn new(
        start: ViewportPose,
        finish: ViewportPose,
        now: Instant,
        duration: Duration,
    ) -> Self {
        let start_distance = start.distance();
        let finish_distance = finish.distance();
        let equalized_finish_camera = finish.target()
            + (finish.camera_location() - finish.target()).normalize()
                * start_distance;
        Self {
            start,
            finish,
            start_time: now,
            duration,
            equalized_finish_camera,
            start_distance,
            finish_distance,
        }
    }

    /// Pose the tween starts from.
    #[must_use]
    pub fn start(&self) -> &ViewportPose {
        &self.start
    }

    /// Pose the tween ends at.
    #[must_use]
    pub fn finish(&self) -> &ViewportPose {
        &self.finish
    }

    /// Total duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Elapsed fraction in `[0, 1]`, non-decreasing in `now`.
    #[must_use]
    pub fn fraction(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(self.start_time);
        (elapsed.as_secs_f64() / self.duration.as_secs_f64()).min(1.0)
    }

    /// Whether the session reached its end.
    #[must_use]
    pub fn is_complete(&self, now: Instant) -> bool {
        self.fraction(now) >= 1.0
    }

    /// Tweened pose vectors at `fraction`.
    ///
    /// The look-at point is cosine-eased per component; the camera
    /// direction sweeps at constant angular velocity while its distance is
    /// cosine-eased between the two original distances. `fraction >= 1`
    /// returns the finish vectors exactly.
    #[must_use]
    pub fn frame_vectors(&self, fraction: f64) -> FrameVectors {
        if fraction >= 1.0 {
            return FrameVectors {
                target: self.finish.target(),
                camera_location: self.finish.camera_location(),
                up: self.finish.up(),
            };
        }

        let (start, finish) = (&self.start, &self.finish);
        let target =
            cos_interp_point(start.target(), finish.target(), fraction);
        let swept = slerp(
            self.start.camera_location(),
            self.equalized_finish_camera,
            fraction,
        );
        let distance =
            cos_interp(self.start_distance, self.finish_distance, fraction);
        let direction = (swept - target)
            .try_normalize()
            .unwrap_or_else(|| -self.start.direction());
        let up = slerp(self.start.up(), self.finish.up(), fraction)
            .try_normalize()
            .unwrap_or_else(|| self.start.up());

        FrameVectors {
            target,
            camera_location: target + direction * distance,
            up,
        }
    }

    /// Tweened frustum window at `fraction`, with near/far taken from
    /// `current`. Perspective windows are blended as slopes so the blend
    /// is independent of the clipping range.
    #[must_use]
    pub fn frame_window(&self, fraction: f64, current: &Frustum) -> Frustum {
        let perspective = self.finish.projection == Projection::Perspective;
        let edges = |f: &Frustum| {
            let s = if perspective { 1.0 / f.near } else { 1.0 };
            [f.left * s, f.right * s, f.bottom * s, f.top * s]
        };
        let a = edges(&self.start.frustum);
        let b = edges(&self.finish.frustum);
        let t = fraction.clamp(0.0, 1.0);
        let blend: [f64; 4] = std::array::from_fn(|i| {
            if t >= 1.0 {
                b[i]
            } else {
                cos_interp(a[i], b[i], t)
            }
        });
        let s = if perspective { current.near } else { 1.0 };
        Frustum::new(
            blend[0] * s,
            blend[1] * s,
            blend[2] * s,
            blend[3] * s,
            current.near,
            current.far,
        )
    }
}
