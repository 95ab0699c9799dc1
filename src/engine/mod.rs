//! Render-loop coordinator.
//!
//! [`Engine`] owns the viewport context, the framebuffer manager, the
//! gesture mapper, the restore-view animator and the deferred task queue,
//! and drives one frame at a time through a [`RenderTargetBackend`] and a
//! [`SceneRenderer`](crate::renderer::SceneRenderer).
//!
//! # Frame loop
//!
//! While the display link runs, call [`tick`](Engine::tick) and then
//! [`draw_frame`](Engine::draw_frame) once per vsync that
//! [`should_draw`](Engine::should_draw) accepts. Input goes through
//! [`handle_touch`](Engine::handle_touch) or
//! [`handle_gesture`](Engine::handle_gesture); layout changes through
//! [`resize`](Engine::resize).

/// Mutable viewport context shared by the engine's components.
pub mod context;
mod frame;
mod input;
mod lifecycle;
mod setup;

use glam::DVec2;

use self::context::ViewportController;
use crate::animation::RestoreViewAnimator;
use crate::camera::core::ViewportPose;
use crate::error::TouchviewError;
use crate::gpu::framebuffer::FramebufferManager;
use crate::gpu::target::WgpuTarget;
use crate::input::{GestureMapper, GestureRecognizer};
use crate::options::Options;
use crate::util::frame_timing::FrameTiming;
use crate::util::schedule::DeferredQueue;

/// Framebuffer setup progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitializationState {
    /// Targets not created yet (or torn down).
    #[default]
    Uninitialized,
    /// Visible target exists.
    Ready,
    /// The visible target could not be created; frames are skipped until
    /// the next resize or restart.
    Failed,
}

/// Coordinates viewport, input, animation and framebuffers for one view.
///
/// `T` is the render-target type of the backend the engine draws with.
#[derive(Debug)]
pub struct Engine<T = WgpuTarget> {
    ctx: ViewportController,
    framebuffers: FramebufferManager<T>,
    scheduler: DeferredQueue,
    mapper: GestureMapper,
    recognizer: GestureRecognizer,
    animator: RestoreViewAnimator,
    frame_timing: FrameTiming,
    options: Options,
    init_state: InitializationState,
    running: bool,
    msaa_samples: Option<u32>,
}

impl<T> Engine<T> {
    /// Engine for a view of `view_size` points at `content_scale` pixels
    /// per point.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::InvalidArgument`] if `options` fail validation.
    pub fn new(
        options: Options,
        view_size: DVec2,
        content_scale: f64,
    ) -> Result<Self, TouchviewError> {
        options.validate()?;
        let frame_timing = FrameTiming::new(
            options.render.frame_interval,
            options.render.refresh_hz,
        )?;
        let mut ctx = ViewportController::new(view_size, content_scale);
        ctx.clip_params = options.camera.clip_params();
        let mut animator = RestoreViewAnimator::new(
            options.animation.restore_duration(),
            options.animation.settle_delay(),
        );
        animator.set_preemption(options.animation.preemption);

        Ok(Self {
            ctx,
            framebuffers: FramebufferManager::default(),
            scheduler: DeferredQueue::new(),
            mapper: GestureMapper::new(
                options.animation.inactivity_interval(),
            ),
            recognizer: GestureRecognizer::new(),
            animator,
            frame_timing,
            options,
            init_state: InitializationState::Uninitialized,
            running: false,
            msaa_samples: None,
        })
    }

    /// Viewport context (flags, poses, view size).
    #[must_use]
    pub fn context(&self) -> &ViewportController {
        &self.ctx
    }

    /// Mutable viewport context.
    pub fn context_mut(&mut self) -> &mut ViewportController {
        &mut self.ctx
    }

    /// Current viewport pose, `None` until set up from a scene.
    #[must_use]
    pub fn viewport(&self) -> Option<&ViewportPose> {
        self.ctx.viewport.as_ref()
    }

    /// Restore-view animator.
    #[must_use]
    pub fn animator(&self) -> &RestoreViewAnimator {
        &self.animator
    }

    /// Owned render targets.
    #[must_use]
    pub fn framebuffers(&self) -> &FramebufferManager<T> {
        &self.framebuffers
    }

    /// Pending deferred tasks.
    #[must_use]
    pub fn scheduler(&self) -> &DeferredQueue {
        &self.scheduler
    }

    /// Display-link pacing.
    #[must_use]
    pub fn frame_timing(&self) -> &FrameTiming {
        &self.frame_timing
    }

    /// Active options.
    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Framebuffer setup progress.
    #[must_use]
    pub fn initialization_state(&self) -> InitializationState {
        self.init_state
    }

    /// Samples per pixel of the multisampled target, `None` without MSAA.
    #[must_use]
    pub fn msaa_samples(&self) -> Option<u32> {
        self.msaa_samples
    }

    /// Whether the display link is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pending redraw flag, cleared on read.
    pub fn take_redraw_request(&mut self) -> bool {
        self.ctx.take_redraw_request()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scene and renderer fakes for engine tests.

    use glam::DVec3;

    use crate::camera::bounds::BoundingBox;
    use crate::camera::core::ViewportPose;
    use crate::gpu::framebuffer::testing::{FakeBackend, FakeTarget};
    use crate::renderer::SceneRenderer;
    use crate::scene::{SceneModel, StoredView};

    #[derive(Debug)]
    pub(crate) struct FakeScene {
        pub(crate) bounds: Option<BoundingBox>,
        pub(crate) views: Vec<StoredView>,
        pub(crate) ready: bool,
        pub(crate) buffers: usize,
    }

    impl Default for FakeScene {
        fn default() -> Self {
            Self {
                bounds: Some(BoundingBox::new(
                    DVec3::splat(-1.0),
                    DVec3::splat(1.0),
                )),
                views: Vec::new(),
                ready: true,
                buffers: 4,
            }
        }
    }

    impl SceneModel for FakeScene {
        fn bounding_box(&self) -> Option<BoundingBox> {
            self.bounds
        }

        fn stored_views(&self) -> &[StoredView] {
            &self.views
        }

        fn is_ready_for_rendering(&self) -> bool {
            self.ready
        }

        fn release_gpu_buffers(&mut self) -> usize {
            std::mem::take(&mut self.buffers)
        }
    }

    /// Records the target id and camera location of every draw.
    #[derive(Debug, Default)]
    pub(crate) struct RecordingRenderer {
        pub(crate) draws: Vec<(usize, DVec3)>,
    }

    impl SceneRenderer<FakeScene, FakeBackend> for RecordingRenderer {
        fn render_model(
            &mut self,
            _scene: &mut FakeScene,
            viewport: &ViewportPose,
            _backend: &mut FakeBackend,
            target: &FakeTarget,
        ) {
            self.draws.push((target.id, viewport.camera_location()));
        }
    }
}
