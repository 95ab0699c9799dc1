//! Building the viewport from a loaded scene.

use glam::DVec3;

use super::Engine;
use crate::camera::bounds::BoundingBox;
use crate::camera::core::{Projection, ViewportPose};
use crate::scene::SceneModel;

/// Camera position of the synthesized default view.
const DEFAULT_CAMERA: DVec3 = DVec3::new(10.0, 10.0, 10.0);

/// World Z projected perpendicular to `direction`, unitized.
fn up_perpendicular_to(direction: DVec3) -> DVec3 {
    let up = DVec3::Z - direction * DVec3::Z.dot(direction);
    up.try_normalize().unwrap_or(DVec3::Y)
}

impl<T> Engine<T> {
    /// Install the scene's first stored perspective view, or a default view
    /// looking at the origin from (10, 10, 10) dollied to the scene
    /// extents. Captures the home and last interactive poses. Returns
    /// whether a viewport was installed.
    pub fn setup_viewport<S>(&mut self, scene: &S) -> bool
    where
        S: SceneModel + ?Sized,
    {
        self.ctx.scene_bounds = scene.bounding_box();
        let stored = scene
            .stored_views()
            .iter()
            .filter(|view| view.projection == Projection::Perspective)
            .find_map(|view| match view.to_pose() {
                Ok(pose) => Some(pose),
                Err(e) => {
                    log::warn!("stored view skipped: {e}");
                    None
                }
            });
        let pose = match stored {
            Some(pose) => {
                log::info!("viewport from stored view");
                Some(pose)
            }
            None => self.default_pose(self.ctx.scene_bounds.as_ref()),
        };
        let Some(pose) = pose else {
            return false;
        };

        self.ctx.viewport = Some(pose);
        self.ctx.apply_view_size();
        self.ctx.home_pose = self.ctx.viewport.clone();
        self.ctx.last_interactive_pose = self.ctx.viewport.clone();
        self.ctx.at_initial_position = true;
        self.ctx.request_redraw();
        true
    }

    fn default_pose(
        &self,
        bounds: Option<&BoundingBox>,
    ) -> Option<ViewportPose> {
        let direction = (-DEFAULT_CAMERA).normalize();
        let mut pose = match ViewportPose::new(
            DEFAULT_CAMERA,
            DVec3::ZERO,
            up_perpendicular_to(direction),
        ) {
            Ok(pose) => pose,
            Err(e) => {
                log::error!("default view rejected: {e}");
                return None;
            }
        };
        pose.set_lens_length(self.options.camera.lens_length);
        let (w, h) = self.ctx.view_size_points();
        pose.set_screen_port(w, h);
        if let Some(bounds) = bounds {
            if !pose.dolly_extents(bounds, self.options.camera.extents_padding)
            {
                log::debug!("scene bounds degenerate, default view kept");
            }
        }
        log::info!(
            "default viewport: camera {:?} target {:?}",
            pose.camera_location(),
            pose.target()
        );
        Some(pose)
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;

    use super::super::testing::FakeScene;
    use super::*;
    use crate::gpu::framebuffer::testing::FakeTarget;
    use crate::options::Options;
    use crate::scene::StoredView;

    fn engine() -> Engine<FakeTarget> {
        Engine::new(Options::default(), DVec2::new(200.0, 100.0), 1.0)
            .unwrap()
    }

    #[test]
    fn default_up_is_z_perpendicular_to_view() {
        let dir = DVec3::splat(-1.0).normalize();
        let up = up_perpendicular_to(dir);
        assert!(up.dot(dir).abs() < 1e-12);
        assert!((up.length() - 1.0).abs() < 1e-12);
        assert!(up.z > 0.0);
    }

    #[test]
    fn default_view_looks_at_scene_center() {
        let mut e = engine();
        let scene = FakeScene {
            bounds: Some(BoundingBox::new(
                DVec3::new(1.0, 1.0, 1.0),
                DVec3::new(3.0, 3.0, 3.0),
            )),
            ..FakeScene::default()
        };
        assert!(e.setup_viewport(&scene));
        let pose = e.viewport().unwrap();
        assert!(pose.target().abs_diff_eq(DVec3::splat(2.0), 1e-9));
        let dir = pose.direction();
        assert!(dir.abs_diff_eq(DVec3::splat(-1.0).normalize(), 1e-9));
        let aspect = pose.frustum_aspect().unwrap();
        assert!((aspect - 2.0).abs() < 1e-9);

        let ctx = e.context();
        assert!(ctx.at_initial_position);
        assert!(ctx.home_pose.is_some());
        assert!(ctx.last_interactive_pose.is_some());
    }

    #[test]
    fn first_perspective_stored_view_wins() {
        let mut e = engine();
        let parallel = StoredView {
            camera_location: DVec3::new(0.0, -20.0, 0.0),
            target: DVec3::ZERO,
            up: DVec3::Z,
            projection: Projection::Parallel,
            lens_length: 50.0,
        };
        let perspective = StoredView {
            camera_location: DVec3::new(0.0, 0.0, 12.0),
            projection: Projection::Perspective,
            up: DVec3::Y,
            lens_length: 35.0,
            ..parallel
        };
        let scene = FakeScene {
            views: vec![parallel, perspective],
            ..FakeScene::default()
        };
        assert!(e.setup_viewport(&scene));
        let pose = e.viewport().unwrap();
        assert_eq!(pose.camera_location(), DVec3::new(0.0, 0.0, 12.0));
        assert_eq!(pose.lens_length(), 35.0);
    }

    #[test]
    fn no_bounds_keeps_default_camera() {
        let mut e = engine();
        let scene = FakeScene {
            bounds: None,
            ..FakeScene::default()
        };
        assert!(e.setup_viewport(&scene));
        let pose = e.viewport().unwrap();
        assert_eq!(pose.camera_location(), DEFAULT_CAMERA);
    }
}
