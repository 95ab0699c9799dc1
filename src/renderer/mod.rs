//! Drawing the scene into the active render target.
//!
//! The engine only calls [`SceneRenderer::render_model`] once per frame;
//! how a scene turns into draw calls is up to the implementation.

use crate::camera::core::ViewportPose;
use crate::gpu::framebuffer::RenderTargetBackend;

/// Flat-shaded mesh and bounds renderer.
pub mod flat;
pub(crate) mod pipeline_util;

/// Issues the draw calls for one frame.
pub trait SceneRenderer<S: ?Sized, B: RenderTargetBackend + ?Sized> {
    /// Draw `scene` seen through `viewport` into `target`, which the
    /// backend has already enabled and cleared for this frame.
    fn render_model(
        &mut self,
        scene: &mut S,
        viewport: &ViewportPose,
        backend: &mut B,
        target: &B::Target,
    );
}
