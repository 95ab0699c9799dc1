//! Per-frame driving: deferred tasks and the draw sequence.

use web_time::Instant;

use super::{Engine, InitializationState};
use crate::gpu::framebuffer::{RenderTarget, RenderTargetBackend};
use crate::renderer::SceneRenderer;
use crate::scene::SceneModel;
use crate::util::schedule::DeferredTask;

impl<T: RenderTarget> Engine<T> {
    /// Run deferred tasks that are due: the settle redraw after a restore
    /// animation and the idle redraw timer.
    pub fn tick(&mut self, now: Instant) {
        for task in self.scheduler.drain_due(now) {
            match task {
                DeferredTask::SettleRedraw => {
                    let active = self.mapper.is_interacting();
                    self.animator.on_settle(&mut self.ctx, active);
                }
                DeferredTask::InactivityRedraw => {
                    log::debug!("inactivity redraw");
                    self.ctx.request_redraw();
                }
            }
        }
        if self.animator.is_animating() {
            self.ctx.request_redraw();
        }
    }

    /// Whether the display link should draw at `now`.
    #[must_use]
    pub fn should_draw(&self, now: Instant) -> bool {
        self.running && self.frame_timing.should_render(now)
    }

    /// Draw one frame. Returns whether anything was presented.
    ///
    /// Creates framebuffers on first use, sets the viewport up from the
    /// scene once it is ready, advances the restore animation, draws into
    /// the target selected by the fast-drawing flag and resolves it into
    /// the visible target.
    pub fn draw_frame<B, S, R>(
        &mut self,
        backend: &mut B,
        scene: &mut S,
        renderer: &mut R,
        now: Instant,
    ) -> bool
    where
        B: RenderTargetBackend<Target = T> + ?Sized,
        S: SceneModel + ?Sized,
        R: SceneRenderer<S, B> + ?Sized,
    {
        if !self.ensure_framebuffers(backend) {
            return false;
        }
        if self.ctx.viewport.is_none() && scene.is_ready_for_rendering() {
            let _ = self.setup_viewport(scene);
        }
        if self.ctx.viewport.is_none() {
            return false;
        }

        let _ = self.framebuffers.select_active(self.ctx.fast_drawing);
        if let Err(e) = backend.begin_frame() {
            log::error!("frame skipped: {e}");
            return false;
        }
        let Some(target) = self.framebuffers.active_target() else {
            return false;
        };
        backend.enable(target);

        if self.animator.is_animating() {
            self.animator.update(&mut self.ctx, now, &mut self.scheduler);
        }
        if let Some(viewport) = self.ctx.viewport.as_ref() {
            renderer.render_model(scene, viewport, backend, target);
        }

        self.framebuffers.resolve(backend);
        backend.present();
        self.frame_timing.end_frame(now);
        true
    }

    /// Create the multisampled and visible targets if missing. Returns
    /// whether a visible target is available.
    fn ensure_framebuffers<B>(&mut self, backend: &mut B) -> bool
    where
        B: RenderTargetBackend<Target = T> + ?Sized,
    {
        match self.init_state {
            InitializationState::Failed => return false,
            InitializationState::Ready
                if self.framebuffers.is_initialized() =>
            {
                return true;
            }
            _ => {}
        }

        let (width, height) = self.ctx.drawable_size();
        self.msaa_samples = self.framebuffers.create_multisample_target(
            backend,
            width,
            height,
            self.options.render.msaa_samples,
            true,
            true,
        );
        match self.framebuffers.create_visible_target(backend, width, height)
        {
            Ok(()) => {
                self.init_state = InitializationState::Ready;
                true
            }
            Err(e) => {
                log::error!("visible target creation failed: {e}");
                self.framebuffers.teardown();
                self.msaa_samples = None;
                self.init_state = InitializationState::Failed;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec2;
    use web_time::Duration;

    use super::super::testing::{FakeScene, RecordingRenderer};
    use super::*;
    use crate::gpu::framebuffer::testing::{Call, FakeBackend, FakeTarget};
    use crate::gpu::framebuffer::TargetKind;
    use crate::input::{GestureEvent, GesturePhase};
    use crate::options::Options;

    fn engine() -> Engine<FakeTarget> {
        Engine::new(Options::default(), DVec2::new(400.0, 300.0), 2.0)
            .unwrap()
    }

    #[test]
    fn first_frame_creates_targets_and_viewport() {
        let mut e = engine();
        let mut backend = FakeBackend::with_max_samples(4);
        let mut scene = FakeScene::default();
        let mut renderer = RecordingRenderer::default();

        assert!(e.draw_frame(&mut backend, &mut scene, &mut renderer, now()));
        assert_eq!(e.initialization_state(), InitializationState::Ready);
        assert_eq!(e.msaa_samples(), Some(4));
        assert_eq!(e.framebuffers().size(), (800, 600));
        assert!(e.viewport().is_some());
        assert!(e.context().at_initial_position);

        let ms = e.framebuffers().multisample().unwrap().id;
        let vis = e.framebuffers().visible().unwrap().id;
        let tail: Vec<_> = backend.calls.iter().rev().take(4).collect();
        assert_eq!(
            tail,
            vec![
                &Call::Present,
                &Call::Resolve(ms, vis),
                &Call::Enable(ms),
                &Call::BeginFrame,
            ]
        );
        assert_eq!(renderer.draws.len(), 1);
        assert_eq!(renderer.draws[0].0, ms);
    }

    #[test]
    fn fast_drawing_renders_straight_to_visible() {
        let mut e = engine();
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut renderer = RecordingRenderer::default();
        let _ = e.draw_frame(&mut backend, &mut scene, &mut renderer, now());

        e.context_mut().fast_drawing = true;
        backend.calls.clear();
        assert!(e.draw_frame(&mut backend, &mut scene, &mut renderer, now()));
        let vis = e.framebuffers().visible().unwrap().id;
        assert_eq!(
            backend.calls,
            vec![Call::BeginFrame, Call::Enable(vis), Call::Present]
        );
    }

    #[test]
    fn no_viewport_until_scene_is_ready() {
        let mut e = engine();
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene {
            ready: false,
            ..FakeScene::default()
        };
        let mut renderer = RecordingRenderer::default();
        assert!(!e.draw_frame(&mut backend, &mut scene, &mut renderer, now()));
        assert!(e.viewport().is_none());
        assert!(renderer.draws.is_empty());
        assert!(!backend.calls.contains(&Call::BeginFrame));
    }

    #[test]
    fn visible_target_failure_marks_failed() {
        let mut e = engine();
        let mut backend = FakeBackend::with_max_samples(8);
        backend.fail_visible = true;
        let mut scene = FakeScene::default();
        let mut renderer = RecordingRenderer::default();
        assert!(!e.draw_frame(&mut backend, &mut scene, &mut renderer, now()));
        assert_eq!(e.initialization_state(), InitializationState::Failed);
        assert!(e.framebuffers().multisample().is_none());

        backend.calls.clear();
        assert!(!e.draw_frame(&mut backend, &mut scene, &mut renderer, now()));
        assert!(backend.calls.is_empty());
    }

    #[test]
    fn begin_frame_failure_skips_frame() {
        let mut e = engine();
        let mut backend = FakeBackend::with_max_samples(8);
        backend.fail_begin = true;
        let mut scene = FakeScene::default();
        let mut renderer = RecordingRenderer::default();
        assert!(!e.draw_frame(&mut backend, &mut scene, &mut renderer, now()));
        assert!(renderer.draws.is_empty());
        assert!(!backend.calls.contains(&Call::Present));
        assert_eq!(e.initialization_state(), InitializationState::Ready);
    }

    #[test]
    fn msaa_disabled_creates_only_visible() {
        let mut options = Options::default();
        options.render.msaa_samples = 1;
        let mut e: Engine<FakeTarget> =
            Engine::new(options, DVec2::new(100.0, 100.0), 1.0).unwrap();
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut renderer = RecordingRenderer::default();
        assert!(e.draw_frame(&mut backend, &mut scene, &mut renderer, now()));
        assert_eq!(e.msaa_samples(), None);
        assert_eq!(
            backend.calls[0],
            Call::Create(1, TargetKind::Visible)
        );
    }

    #[test]
    fn restore_animation_runs_through_frames_and_settles() {
        let mut e = engine();
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut renderer = RecordingRenderer::default();
        let t0 = now();
        let _ = e.draw_frame(&mut backend, &mut scene, &mut renderer, t0);
        e.on_scene_prepared(true);
        let home = e.viewport().unwrap().camera_location();

        // Orbit away so there is something to restore.
        for (phase, x) in [
            (GesturePhase::Began, 200.0),
            (GesturePhase::Changed, 260.0),
            (GesturePhase::Ended, 260.0),
        ] {
            let _ = e.handle_gesture(
                GestureEvent::OrbitDolly {
                    phase,
                    touches: usize::from(phase != GesturePhase::Ended),
                    location: DVec2::new(x, 150.0),
                    midpoint: DVec2::new(x, 150.0),
                },
                t0,
            );
        }
        let moved = e.viewport().unwrap().camera_location();
        assert!(moved.distance(home) > 1e-6);

        let _ = e.handle_gesture(
            GestureEvent::DoubleTap {
                phase: GesturePhase::Ended,
            },
            t0,
        );
        assert!(e.animator().is_animating());
        assert!(e.context().fast_drawing);

        let mid = t0 + Duration::from_millis(250);
        let _ = e.draw_frame(&mut backend, &mut scene, &mut renderer, mid);
        let end = t0 + Duration::from_millis(500);
        let _ = e.draw_frame(&mut backend, &mut scene, &mut renderer, end);
        let last = renderer.draws.last().unwrap().1;
        assert!(last.abs_diff_eq(home, 1e-9));
        assert!(e.context().interaction_enabled);
        assert!(e.context().fast_drawing);

        e.tick(end + Duration::from_millis(50));
        assert!(!e.context().fast_drawing);
        assert!(e.context().at_initial_position);
    }

    #[test]
    fn drag_started_while_settling_keeps_fast_drawing() {
        let mut e = engine();
        let mut backend = FakeBackend::with_max_samples(8);
        let mut scene = FakeScene::default();
        let mut renderer = RecordingRenderer::default();
        let t0 = now();
        let _ = e.draw_frame(&mut backend, &mut scene, &mut renderer, t0);
        e.on_scene_prepared(true);
        e.context_mut().at_initial_position = false;
        let _ = e.restore_view(t0);
        let end = t0 + Duration::from_millis(500);
        let _ = e.draw_frame(&mut backend, &mut scene, &mut renderer, end);
        assert!(e.context().interaction_enabled);

        for (phase, x) in [
            (GesturePhase::Began, 200.0),
            (GesturePhase::Changed, 240.0),
        ] {
            let _ = e.handle_gesture(
                GestureEvent::OrbitDolly {
                    phase,
                    touches: 1,
                    location: DVec2::new(x, 150.0),
                    midpoint: DVec2::new(x, 150.0),
                },
                end,
            );
        }
        e.tick(end + Duration::from_millis(50));
        assert!(!e.animator().is_animating());
        assert!(e.context().fast_drawing);

        let _ = e.draw_frame(&mut backend, &mut scene, &mut renderer, end);
        let vis = e.framebuffers().visible().unwrap().id;
        assert_eq!(renderer.draws.last().unwrap().0, vis);
    }

    #[test]
    fn tick_fires_inactivity_redraw() {
        let mut e = engine();
        let t0 = now();
        e.view_did_appear(t0);
        let _ = e.take_redraw_request();
        e.tick(t0 + Duration::from_secs(5));
        assert!(!e.take_redraw_request());
        e.tick(t0 + Duration::from_secs(9));
        assert!(e.take_redraw_request());
        e.tick(t0 + Duration::from_secs(18));
        assert!(e.take_redraw_request());
    }

    #[test]
    fn frame_timing_paces_draws() {
        let mut e = engine();
        let t0 = now();
        assert!(!e.should_draw(t0));
        e.start_animating(t0);
        assert!(e.should_draw(t0 + Duration::from_millis(17)));
    }

    fn now() -> Instant {
        Instant::now()
    }
}
