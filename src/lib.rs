// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Complexity limits (thresholds in clippy.toml)
#![deny(clippy::cognitive_complexity)]
#![deny(clippy::too_many_lines)]
#![deny(clippy::excessive_nesting)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Touch-driven 3D viewport engine built on wgpu.
//!
//! Touchview owns the interactive camera of a single 3D view: touch
//! gestures orbit, pan and zoom it, a double-tap animates back and forth
//! between the home view and the last place the user navigated to, and the
//! frame is rendered into an adaptively multisampled framebuffer that is
//! bypassed while the camera moves.
//!
//! # Key entry points
//!
//! - [`engine::Engine`] - render-loop coordinator (gestures, animation,
//!   framebuffers, display-link pacing)
//! - [`camera::core::ViewportPose`] - double-precision camera with an
//!   off-center frustum
//! - [`scene::SceneModel`] - what the engine needs from scene content
//! - [`options::Options`] - TOML-backed runtime configuration
//!
//! # Architecture
//!
//! The engine is generic over a
//! [`RenderTargetBackend`](gpu::RenderTargetBackend), so the frame sequence
//! (target creation, sample-count fallback, resolve, present) is driven
//! the same way against wgpu and against test fakes. Deferred work such as
//! the post-animation settle redraw and the idle redraw timer is queued on
//! the engine and drained from [`engine::Engine::tick`] on the render
//! thread.

pub mod animation;
pub mod camera;
pub mod engine;
pub mod error;
pub mod gpu;
pub mod input;
pub mod options;
pub mod renderer;
pub mod scene;
pub mod util;
#[cfg(feature = "viewer")]
mod viewer;

pub use engine::Engine;
pub use error::TouchviewError;
#[cfg(feature = "viewer")]
pub use viewer::{Viewer, ViewerBuilder};
