use std::fmt;

use glam::{DMat4, DVec3, DVec4, Mat4};

use super::bounds::BoundingBox;
use super::frustum::{clipping_range, ClipParams, Frustum};

/// Half of the short side of a 35 mm film frame (24 mm), in millimeters.
const FILM_HALF_SHORT_SIDE_MM: f64 = 12.0;

/// Projection kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Perspective projection (window scales with depth).
    #[default]
    Perspective,
    /// Parallel (orthographic) projection.
    Parallel,
}

/// Pixel rectangle the viewport maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenPort {
    /// Width in pixels (or points).
    pub width: u32,
    /// Height in pixels (or points).
    pub height: u32,
}

impl ScreenPort {
    /// Port of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width / height, `None` when either side is zero.
    #[must_use]
    pub fn aspect(&self) -> Option<f64> {
        (self.width > 0 && self.height > 0)
            .then(|| f64::from(self.width) / f64::from(self.height))
    }
}

impl Default for ScreenPort {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Why a pose update was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoseError {
    /// Camera location coincides with the target.
    CameraAtTarget,
    /// Up vector is zero or parallel to the view direction.
    DegenerateUp,
    /// A coordinate is NaN or infinite.
    NonFinite,
}

impl fmt::Display for PoseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CameraAtTarget => {
                write!(f, "camera location coincides with target")
            }
            Self::DegenerateUp => {
                write!(f, "up vector is zero or parallel to view direction")
            }
            Self::NonFinite => write!(f, "non-finite pose coordinate"),
        }
    }
}

impl std::error::Error for PoseError {}

/// Camera pose and projection for one view.
///
/// Invariants upheld by every mutator: `up` is unit length and not
/// parallel to the view direction, and `camera_location != target`.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportPose {
    camera_location: DVec3,
    target: DVec3,
    up: DVec3,
    /// Frustum window and clipping range.
    pub frustum: Frustum,
    screen_port: ScreenPort,
    /// Projection kind.
    pub projection: Projection,
    lens_length: f64,
}

impl ViewportPose {
    /// Pose looking from `camera_location` at `target`.
    ///
    /// # Errors
    ///
    /// [`PoseError`] if the vectors violate the pose invariants.
    pub fn new(
        camera_location: DVec3,
        target: DVec3,
        up: DVec3,
    ) -> Result<Self, PoseError> {
        let mut pose = Self {
            camera_location: DVec3::Z,
            target: DVec3::ZERO,
            up: DVec3::Y,
            frustum: Frustum::default(),
            screen_port: ScreenPort::default(),
            projection: Projection::Perspective,
            lens_length: 50.0,
        };
        pose.set_target(target, camera_location, up)?;
        pose.set_lens_length(50.0);
        Ok(pose)
    }

    /// Camera position.
    #[must_use]
    pub fn camera_location(&self) -> DVec3 {
        self.camera_location
    }

    /// Look-at point.
    #[must_use]
    pub fn target(&self) -> DVec3 {
        self.target
    }

    /// Unit up vector.
    #[must_use]
    pub fn up(&self) -> DVec3 {
        self.up
    }

    /// Unit vector from camera toward target.
    #[must_use]
    pub fn direction(&self) -> DVec3 {
        (self.target - self.camera_location).normalize()
    }

    /// Camera-to-target distance.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.camera_location.distance(self.target)
    }

    /// Camera frame: unit (right, up, back) with back = -direction.
    #[must_use]
    pub fn camera_frame(&self) -> (DVec3, DVec3, DVec3) {
        let back = -self.direction();
        let right = self.up.cross(back).normalize();
        let up = back.cross(right);
        (right, up, back)
    }

    /// Current screen port.
    #[must_use]
    pub fn screen_port(&self) -> ScreenPort {
        self.screen_port
    }

    /// 35 mm equivalent lens length.
    #[must_use]
    pub fn lens_length(&self) -> f64 {
        self.lens_length
    }

    /// Frustum width / height.
    #[must_use]
    pub fn frustum_aspect(&self) -> Option<f64> {
        self.frustum.aspect()
    }

    /// Force the frustum window to `aspect`.
    pub fn set_frustum_aspect(&mut self, aspect: f64) {
        self.frustum.set_aspect(aspect);
    }

    /// Atomically replace target, camera location and up.
    ///
    /// `up` is unitized unless it already is (so unit inputs are stored
    /// bit-for-bit). On error the pose is left untouched.
    ///
    /// # Errors
    ///
    /// [`PoseError`] if the new vectors violate the pose invariants.
    pub fn set_target(
        &mut self,
        target: DVec3,
        camera_location: DVec3,
        up: DVec3,
    ) -> Result<(), PoseError> {
        let finite =
            target.is_finite() && camera_location.is_finite() && up.is_finite();
        if !finite {
            return Err(PoseError::NonFinite);
        }
        let view = target - camera_location;
        let view_len = view.length();
        if view_len <= f64::EPSILON * target.length().max(1.0) {
            return Err(PoseError::CameraAtTarget);
        }
        let up_len = up.length();
        if up_len <= f64::EPSILON {
            return Err(PoseError::DegenerateUp);
        }
        let up = if (up_len - 1.0).abs() <= 1.0e-12 {
            up
        } else {
            up / up_len
        };
        if up.cross(view / view_len).length() <= 1.0e-9 {
            return Err(PoseError::DegenerateUp);
        }

        self.target = target;
        self.camera_location = camera_location;
        self.up = up;
        Ok(())
    }

    /// Move the camera along its current line of sight so it sits
    /// `distance` from the target.
    pub fn set_distance(&mut self, distance: f64) {
        if distance.is_finite() && distance > 0.0 {
            self.camera_location = self.target - self.direction() * distance;
        }
    }

    /// Translate camera and target together.
    pub fn translate(&mut self, delta: DVec3) {
        if delta.is_finite() {
            self.camera_location += delta;
            self.target += delta;
        }
    }

    /// Re-derive the perspective window from a 35 mm lens length, keeping
    /// the current aspect and near distance.
    pub fn set_lens_length(&mut self, lens_length: f64) {
        if !lens_length.is_finite() || lens_length <= 0.0 {
            return;
        }
        self.lens_length = lens_length;
        if self.projection != Projection::Perspective {
            return;
        }
        let aspect = self.frustum.aspect().unwrap_or(1.0);
        let half = self.frustum.near * FILM_HALF_SHORT_SIDE_MM / lens_length;
        self.frustum.left = -half;
        self.frustum.right = half;
        self.frustum.bottom = -half;
        self.frustum.top = half;
        self.frustum.set_aspect(aspect);
    }

    /// Set the screen port and match the frustum aspect to it.
    ///
    /// Zero-sized ports are ignored. Applying the same size twice is a
    /// no-op the second time.
    pub fn set_screen_port(&mut self, width: u32, height: u32) {
        let port = ScreenPort::new(width, height);
        let Some(aspect) = port.aspect() else {
            return;
        };
        self.screen_port = port;
        self.frustum.set_aspect(aspect);
    }

    /// Fit near/far around `bbox` from the current pose. Invalid boxes and
    /// boxes behind the camera leave the frustum unchanged.
    pub fn fit_frustum(&mut self, bbox: &BoundingBox, params: ClipParams) {
        if let Some((near, far)) = clipping_range(
            self.camera_location,
            self.direction(),
            bbox,
            params,
        ) {
            self.frustum.set_near_far(
                near,
                far,
                self.projection == Projection::Perspective,
            );
        }
    }

    /// World → camera matrix.
    #[must_use]
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.camera_location, self.target, self.up)
    }

    /// Camera → clip matrix with a `[0, 1]` depth range (wgpu convention).
    #[must_use]
    pub fn projection_matrix(&self) -> DMat4 {
        let f = &self.frustum;
        match self.projection {
            Projection::Parallel => DMat4::orthographic_rh(
                f.left, f.right, f.bottom, f.top, f.near, f.far,
            ),
            Projection::Perspective => {
                let w = f.right - f.left;
                let h = f.top - f.bottom;
                let depth = f.near - f.far;
                DMat4::from_cols(
                    DVec4::new(2.0 * f.near / w, 0.0, 0.0, 0.0),
                    DVec4::new(0.0, 2.0 * f.near / h, 0.0, 0.0),
                    DVec4::new(
                        (f.right + f.left) / w,
                        (f.top + f.bottom) / h,
                        f.far / depth,
                        -1.0,
                    ),
                    DVec4::new(0.0, 0.0, f.near * f.far / depth, 0.0),
                )
            }
        }
    }

    /// Combined view-projection matrix.
    #[must_use]
    pub fn view_projection(&self) -> DMat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
/// GPU uniform buffer holding the view-projection matrix and camera metadata.
pub struct CameraUniform {
    /// Combined view-projection matrix.
    pub view_proj: [[f32; 4]; 4],
    /// Camera world-space position.
    pub position: [f32; 3],
    /// Frustum aspect ratio.
    pub aspect: f32,
    /// Camera forward direction.
    pub forward: [f32; 3],
    /// Padding for GPU alignment.
    pub(crate) _pad: f32,
}

impl Default for CameraUniform {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraUniform {
    /// Create a new camera uniform with identity view-projection.
    pub fn new() -> Self {
        Self {
            view_proj: Mat4::IDENTITY.to_cols_array_2d(),
            position: [0.0; 3],
            aspect: 1.0,
            forward: [0.0, 0.0, -1.0],
            _pad: 0.0,
        }
    }

    /// Update uniform fields from the given pose.
    pub fn update_view_proj(&mut self, pose: &ViewportPose) {
        self.view_proj = pose.view_projection().as_mat4().to_cols_array_2d();
        self.position = pose.camera_location().as_vec3().to_array();
        self.aspect = pose.frustum_aspect().unwrap_or(1.0) as f32;
        self.forward = pose.direction().as_vec3().to_array();
    }
}
