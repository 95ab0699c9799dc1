//! Standalone window backed by winit.
//!
//! Mouse input is translated into the same gestures touches produce: left
//! drag orbits (a quick double click restores the view), right drag pans
//! and the wheel pinches.
//!
//! ```no_run
//! # use touchview::Viewer;
//! Viewer::builder()
//!     .with_title("Blocks")
//!     .build()
//!     .run()
//!     .unwrap();
//! ```

use std::sync::Arc;

use glam::{DVec2, DVec3};
use web_time::Instant;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::camera::bounds::BoundingBox;
use crate::engine::Engine;
use crate::error::TouchviewError;
use crate::gpu::{RenderContext, WgpuBackend};
use crate::input::{GestureEvent, GesturePhase, TouchEvent, TouchPhase};
use crate::options::Options;
use crate::renderer::flat::FlatRenderer;
use crate::scene::mesh::MeshData;
use crate::scene::Scene;

/// Touch id used for the left mouse button.
const MOUSE_TOUCH_ID: u64 = u64::MAX;
/// Pinch scale per wheel line.
const WHEEL_STEP: f64 = 1.1;

// ── Builder ──────────────────────────────────────────────────────────────

/// Fluent builder for [`Viewer`].
pub struct ViewerBuilder {
    scene: Option<Scene>,
    options: Option<Options>,
    title: String,
}

impl ViewerBuilder {
    fn new() -> Self {
        Self {
            scene: None,
            options: None,
            title: "Touchview".into(),
        }
    }

    /// Display `scene` instead of the built-in demo blocks.
    #[must_use]
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.scene = Some(scene);
        self
    }

    /// Override the default options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the window title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Consume the builder and produce a [`Viewer`].
    #[must_use]
    pub fn build(self) -> Viewer {
        Viewer {
            scene: self.scene.unwrap_or_else(demo_scene),
            options: self.options.unwrap_or_default(),
            title: self.title,
        }
    }
}

// ── Viewer ───────────────────────────────────────────────────────────────

/// A window that displays one scene.
pub struct Viewer {
    scene: Scene,
    options: Options,
    title: String,
}

impl Viewer {
    /// Start a new builder.
    #[must_use]
    pub fn builder() -> ViewerBuilder {
        ViewerBuilder::new()
    }

    /// Open the window and run the event loop until it is closed.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::Viewer`] if the event loop cannot be created or
    /// fails.
    pub fn run(self) -> Result<(), TouchviewError> {
        let event_loop = EventLoop::new()
            .map_err(|e| TouchviewError::Viewer(e.to_string()))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = ViewerApp {
            window: None,
            view: None,
            scene: self.scene,
            options: self.options,
            title: self.title,
            cursor: DVec2::ZERO,
            left_down: false,
            right_down: false,
        };
        event_loop
            .run_app(&mut app)
            .map_err(|e| TouchviewError::Viewer(e.to_string()))
    }
}

/// Colored blocks on a slab, with one translucent box.
fn demo_scene() -> Scene {
    let mut scene = Scene::new();
    let slab = BoundingBox::new(
        DVec3::new(-4.0, -4.0, -0.5),
        DVec3::new(4.0, 4.0, 0.0),
    );
    scene.add_mesh(MeshData::cuboid(&slab, [0.35, 0.37, 0.4, 1.0]));
    let blocks = [
        (DVec3::new(-3.0, -3.0, 0.0), 2.0, [0.85, 0.33, 0.25, 1.0]),
        (DVec3::new(0.5, -2.5, 0.0), 3.0, [0.25, 0.6, 0.85, 1.0]),
        (DVec3::new(-2.0, 1.0, 0.0), 1.0, [0.95, 0.75, 0.2, 1.0]),
    ];
    for (min, height, color) in blocks {
        let max = min + DVec3::new(1.5, 1.5, height);
        scene.add_mesh(MeshData::cuboid(&BoundingBox::new(min, max), color));
    }
    let glass = BoundingBox::new(
        DVec3::new(1.0, 1.0, 0.0),
        DVec3::new(3.5, 3.5, 2.5),
    );
    scene.add_mesh(MeshData::cuboid(&glass, [0.4, 0.9, 0.5, 0.35]));
    scene
}

// ── Winit app ────────────────────────────────────────────────────────────

/// GPU side of the window, created on resume.
struct ViewState {
    engine: Engine,
    backend: WgpuBackend,
    renderer: FlatRenderer,
}

struct ViewerApp {
    window: Option<Arc<Window>>,
    view: Option<ViewState>,
    scene: Scene,
    options: Options,
    title: String,
    /// Cursor position in points.
    cursor: DVec2,
    left_down: bool,
    right_down: bool,
}

impl ViewerApp {
    fn create_view(
        &mut self,
        window: &Arc<Window>,
    ) -> Result<ViewState, TouchviewError> {
        let inner = window.inner_size();
        let scale = window.scale_factor();
        let mut context = pollster::block_on(RenderContext::new(
            Arc::clone(window),
            (inner.width, inner.height),
        ))?;
        context.set_content_scale(scale);

        let points =
            DVec2::new(f64::from(inner.width), f64::from(inner.height)) / scale;
        let mut engine = Engine::new(self.options.clone(), points, scale)?;
        let renderer = FlatRenderer::new(&context);
        let backend =
            WgpuBackend::new(context, self.options.render.clear_color);

        engine.on_scene_prepared(self.scene.prepare());
        let now = Instant::now();
        engine.start_animating(now);
        engine.view_did_appear(now);
        Ok(ViewState {
            engine,
            backend,
            renderer,
        })
    }

    fn redraw(&mut self) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let now = Instant::now();
        view.engine.tick(now);
        let requested = view.engine.take_redraw_request();
        if requested || view.engine.should_draw(now) {
            let _ = view.engine.draw_frame(
                &mut view.backend,
                &mut self.scene,
                &mut view.renderer,
                now,
            );
        }
    }

    fn resize(&mut self) {
        let (Some(window), Some(view)) = (&self.window, self.view.as_mut())
        else {
            return;
        };
        let inner = window.inner_size();
        let scale = window.scale_factor();
        view.backend.context_mut().resize(inner.width, inner.height);
        view.backend.context_mut().set_content_scale(scale);
        view.engine.set_content_scale(scale);
        view.engine.resize(
            DVec2::new(f64::from(inner.width), f64::from(inner.height))
                / scale,
        );
    }

    fn mouse_touch(&mut self, phase: TouchPhase) {
        let touch = TouchEvent {
            id: MOUSE_TOUCH_ID,
            phase,
            position: self.cursor,
            time: Instant::now(),
        };
        if let Some(view) = self.view.as_mut() {
            let _ = view.engine.handle_touch(touch);
        }
    }

    /// Right drag is a two-finger pan.
    fn pan(&mut self, phase: GesturePhase) {
        let touches = if phase.is_terminal() { 0 } else { 2 };
        let event = GestureEvent::OrbitDolly {
            phase,
            touches,
            location: self.cursor,
            midpoint: self.cursor,
        };
        self.gesture(event);
    }

    fn wheel(&mut self, lines: f64) {
        let midpoint = self.cursor;
        let scale = WHEEL_STEP.powf(lines);
        for (phase, scale) in [
            (GesturePhase::Began, 1.0),
            (GesturePhase::Changed, scale),
            (GesturePhase::Ended, 1.0),
        ] {
            let touches = if phase == GesturePhase::Ended { 0 } else { 2 };
            self.gesture(GestureEvent::Pinch {
                phase,
                touches,
                scale,
                midpoint,
            });
        }
    }

    fn gesture(&mut self, event: GestureEvent) {
        if let Some(view) = self.view.as_mut() {
            let _ = view.engine.handle_gesture(event, Instant::now());
        }
    }

    fn scale_factor(&self) -> f64 {
        self.window.as_ref().map_or(1.0, |w| w.scale_factor())
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(&self.title)
            .with_inner_size(winit::dpi::LogicalSize::new(1024, 768));
        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        match self.create_view(&window) {
            Ok(view) => self.view = Some(view),
            Err(e) => {
                log::error!("Failed to initialize view: {e}");
                event_loop.exit();
                return;
            }
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: WindowId,
        event: WindowEvent,
    ) {
        if matches!(event, WindowEvent::CloseRequested) {
            event_loop.exit();
            return;
        }
        if self.window.is_none() || self.view.is_none() {
            return;
        }

        match event {
            WindowEvent::Resized(_)
            | WindowEvent::ScaleFactorChanged { .. } => self.resize(),

            WindowEvent::RedrawRequested => {
                self.redraw();
                if let Some(w) = &self.window {
                    w.request_redraw();
                }
            }

            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = state == ElementState::Pressed;
                match button {
                    MouseButton::Left if pressed != self.left_down => {
                        self.left_down = pressed;
                        self.mouse_touch(if pressed {
                            TouchPhase::Started
                        } else {
                            TouchPhase::Ended
                        });
                    }
                    MouseButton::Right if pressed != self.right_down => {
                        self.right_down = pressed;
                        self.pan(if pressed {
                            GesturePhase::Began
                        } else {
                            GesturePhase::Ended
                        });
                    }
                    _ => {}
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor =
                    DVec2::new(position.x, position.y) / self.scale_factor();
                if self.left_down {
                    self.mouse_touch(TouchPhase::Moved);
                }
                if self.right_down {
                    self.pan(GesturePhase::Changed);
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                let lines = match delta {
                    MouseScrollDelta::LineDelta(_, y) => f64::from(y),
                    MouseScrollDelta::PixelDelta(pos) => pos.y * 0.01,
                };
                self.wheel(lines);
            }

            WindowEvent::Touch(touch) => {
                let event = TouchEvent {
                    id: touch.id,
                    phase: touch.phase.into(),
                    position: DVec2::new(touch.location.x, touch.location.y)
                        / self.scale_factor(),
                    time: Instant::now(),
                };
                if let Some(view) = self.view.as_mut() {
                    let _ = view.engine.handle_touch(event);
                }
            }

            WindowEvent::Focused(false) => {
                if std::mem::take(&mut self.left_down) {
                    self.mouse_touch(TouchPhase::Cancelled);
                }
                if std::mem::take(&mut self.right_down) {
                    self.pan(GesturePhase::Cancelled);
                }
            }

            _ => (),
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(view) = self.view.as_mut() {
            view.engine.stop_animating(&mut self.scene);
        }
    }
}
