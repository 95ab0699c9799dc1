//! Display-link and view lifecycle.

use glam::DVec2;
use web_time::Instant;

use super::{Engine, InitializationState};
use crate::error::TouchviewError;
use crate::gpu::framebuffer::RenderTarget;
use crate::options::Options;
use crate::scene::SceneModel;

impl<T: RenderTarget> Engine<T> {
    /// Start the display link.
    pub fn start_animating(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        if self.init_state == InitializationState::Failed {
            self.init_state = InitializationState::Uninitialized;
        }
        log::info!(
            "display link started (every {} vsync)",
            self.frame_timing.frame_interval()
        );
        self.frame_timing.end_frame(now);
        self.ctx.request_redraw();
    }

    /// Stop the display link: drop both framebuffers, release the scene's
    /// GPU buffers and abandon any restore animation.
    pub fn stop_animating<S: SceneModel + ?Sized>(&mut self, scene: &mut S) {
        let was_running = std::mem::replace(&mut self.running, false);
        self.framebuffers.teardown();
        self.msaa_samples = None;
        self.init_state = InitializationState::Uninitialized;
        let released = scene.release_gpu_buffers();
        self.animator.abandon(&mut self.ctx, &mut self.scheduler);
        if was_running {
            log::info!("display link stopped, {released} buffers released");
        }
    }

    /// Draw every `frame_interval`-th display refresh.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::InvalidArgument`] if `frame_interval` is zero; the
    /// current interval is kept.
    pub fn set_frame_interval(
        &mut self,
        frame_interval: u32,
    ) -> Result<(), TouchviewError> {
        self.frame_timing.set_frame_interval(frame_interval)?;
        self.options.render.frame_interval = frame_interval;
        if self.running {
            log::debug!("display link restarted at interval {frame_interval}");
            self.ctx.request_redraw();
        }
        Ok(())
    }

    /// Layout change: new view size in points.
    ///
    /// Updates the screen port and frustum, and drops the framebuffers when
    /// the drawable size changed; they are recreated on the next frame.
    pub fn resize(&mut self, view_size: DVec2) {
        if !(view_size.x > 0.0 && view_size.y > 0.0) {
            log::warn!("ignoring resize to {view_size}");
            return;
        }
        self.ctx.view_size = view_size;
        self.apply_drawable_size();
    }

    /// Pixels per point changed (window moved to another display).
    pub fn set_content_scale(&mut self, content_scale: f64) {
        if !(content_scale.is_finite() && content_scale > 0.0) {
            return;
        }
        self.ctx.content_scale = content_scale;
        self.apply_drawable_size();
    }

    fn apply_drawable_size(&mut self) {
        self.ctx.apply_view_size();
        let (width, height) = self.ctx.drawable_size();
        if self.framebuffers.invalidate_if_resized(width, height) {
            self.msaa_samples = None;
            self.init_state = InitializationState::Uninitialized;
        } else if self.init_state == InitializationState::Failed {
            self.init_state = InitializationState::Uninitialized;
        }
        self.ctx.request_redraw();
    }

    /// Mesh preparation finished; gestures are accepted only after success.
    pub fn on_scene_prepared(&mut self, success: bool) {
        self.ctx.gestures_ready = success;
        if success {
            log::info!("scene prepared, gestures enabled");
            self.ctx.request_redraw();
        } else {
            log::warn!("scene preparation failed, gestures stay disabled");
        }
    }

    /// The view became visible: arm the idle redraw timer.
    pub fn view_did_appear(&mut self, now: Instant) {
        self.mapper.restart_inactivity_timer(&mut self.scheduler, now);
        self.ctx.request_redraw();
    }

    /// Replace the options. Framebuffers are recreated when the sample
    /// ceiling changes.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::InvalidArgument`] if `options` fail validation;
    /// nothing is changed then.
    pub fn set_options(
        &mut self,
        options: Options,
    ) -> Result<(), TouchviewError> {
        options.validate()?;
        self.frame_timing
            .set_frame_interval(options.render.frame_interval)?;
        self.ctx.clip_params = options.camera.clip_params();
        self.animator.set_timing(
            options.animation.restore_duration(),
            options.animation.settle_delay(),
        );
        self.animator.set_preemption(options.animation.preemption);
        self.mapper
            .set_inactivity_interval(options.animation.inactivity_interval());
        if options.render.msaa_samples != self.options.render.msaa_samples {
            self.framebuffers.teardown();
            self.msaa_samples = None;
            self.init_state = InitializationState::Uninitialized;
        }
        self.options = options;
        self.ctx.fit_frustum();
        self.ctx.request_redraw();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{FakeScene, RecordingRenderer};
    use super::*;
    use crate::animation::RestoreState;
    use crate::gpu::framebuffer::testing::{FakeBackend, FakeTarget};

    fn ready_engine(
        backend: &mut FakeBackend,
        scene: &mut FakeScene,
    ) -> Engine<FakeTarget> {
        let mut e =
            Engine::new(Options::default(), DVec2::new(400.0, 200.0), 1.0)
                .unwrap();
        e.start_animating(Instant::now());
        let mut renderer = RecordingRenderer::default();
        assert!(e.draw_frame(backend, scene, &mut renderer, Instant::now()));
        e.on_scene_prepared(true);
        e
    }

    #[test]
    fn zero_frame_interval_is_rejected() {
        let mut e: Engine<FakeTarget> =
            Engine::new(Options::default(), DVec2::ONE, 1.0).unwrap();
        assert!(matches!(
            e.set_frame_interval(0),
            Err(TouchviewError::InvalidArgument {
                name: "frame_interval",
                ..
            })
        ));
        assert_eq!(e.frame_timing().frame_interval(), 1);
        e.set_frame_interval(2).unwrap();
        assert_eq!(e.frame_timing().frame_interval(), 2);
        assert_eq!(e.options().render.frame_interval, 2);
    }

    #[test]
    fn stop_tears_down_targets_and_scene_buffers() {
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut e = ready_engine(&mut backend, &mut scene);
        assert!(e.framebuffers().is_initialized());

        e.stop_animating(&mut scene);
        assert!(!e.is_running());
        assert!(!e.framebuffers().is_initialized());
        assert!(e.framebuffers().multisample().is_none());
        assert_eq!(scene.buffers, 0);
        assert_eq!(
            e.initialization_state(),
            InitializationState::Uninitialized
        );
    }

    #[test]
    fn stop_abandons_restore_animation() {
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut e = ready_engine(&mut backend, &mut scene);
        e.context_mut().at_initial_position = false;
        assert!(e.restore_view(Instant::now()));
        assert_eq!(e.animator().state(), RestoreState::Animating);

        e.stop_animating(&mut scene);
        assert_eq!(e.animator().state(), RestoreState::Idle);
        assert!(e.context().interaction_enabled);
    }

    #[test]
    fn resize_updates_aspect_and_invalidates_targets() {
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut e = ready_engine(&mut backend, &mut scene);
        let _ = e.take_redraw_request();

        e.resize(DVec2::new(300.0, 300.0));
        assert!(!e.framebuffers().is_initialized());
        assert!(e.take_redraw_request());
        let aspect = e.viewport().unwrap().frustum_aspect().unwrap();
        assert!((aspect - 1.0).abs() < 1e-12);

        let before = e.viewport().unwrap().frustum;
        e.resize(DVec2::new(300.0, 300.0));
        let after = e.viewport().unwrap().frustum;
        assert!((after.near - before.near).abs() < 1e-12);
        assert!((after.right - before.right).abs() < 1e-12);
        assert!((after.top - before.top).abs() < 1e-12);
    }

    #[test]
    fn same_size_keeps_targets() {
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut e = ready_engine(&mut backend, &mut scene);
        e.resize(DVec2::new(400.0, 200.0));
        assert!(e.framebuffers().is_initialized());
    }

    #[test]
    fn failed_preparation_keeps_gestures_off() {
        let mut e: Engine<FakeTarget> =
            Engine::new(Options::default(), DVec2::ONE, 1.0).unwrap();
        e.on_scene_prepared(false);
        assert!(!e.context().gestures_ready);
    }

    #[test]
    fn changing_msaa_ceiling_recreates_targets() {
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut e = ready_engine(&mut backend, &mut scene);
        assert_eq!(e.msaa_samples(), Some(8));

        let mut options = e.options().clone();
        options.render.msaa_samples = 2;
        e.set_options(options).unwrap();
        assert!(!e.framebuffers().is_initialized());

        let mut renderer = RecordingRenderer::default();
        let drawn = e.draw_frame(
            &mut backend,
            &mut scene,
            &mut renderer,
            Instant::now(),
        );
        assert!(drawn);
        assert_eq!(e.msaa_samples(), Some(2));
    }

    #[test]
    fn invalid_options_change_nothing() {
        let mut e: Engine<FakeTarget> =
            Engine::new(Options::default(), DVec2::ONE, 1.0).unwrap();
        let mut options = Options::default();
        options.render.frame_interval = 0;
        options.render.msaa_samples = 2;
        assert!(e.set_options(options).is_err());
        assert_eq!(e.options().render.msaa_samples, 8);
    }
}
