//! GPU resource management.
//!
//! The framebuffer manager and its backend traits are GPU-agnostic; the
//! wgpu context and backend implement them.

/// Adaptive multisample framebuffer management.
pub mod framebuffer;
/// wgpu device, surface, and queue initialization.
pub mod render_context;
/// wgpu render targets and frame submission.
pub mod target;

pub use framebuffer::{
    ActiveTarget, FramebufferManager, RenderTarget, RenderTargetBackend,
    TargetDescriptor, TargetError, TargetKind,
};
pub use render_context::{RenderContext, RenderContextError};
pub use target::{WgpuBackend, WgpuTarget};
