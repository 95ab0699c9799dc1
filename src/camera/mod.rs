//! Camera model for the interactive viewport.
//!
//! A [`core::ViewportPose`] holds camera location, target, up vector,
//! frustum and screen port in double precision. Navigation operations
//! (orbit, pan, magnify, dolly-to-extents) live in [`controller`];
//! clipping-plane fitting in [`frustum`].

/// Axis-aligned scene bounds.
pub mod bounds;
/// Gesture-level navigation: orbit, lateral pan, magnify, dolly extents.
pub mod controller;
/// Viewport pose and GPU uniform types.
pub mod core;
/// Frustum window and near/far fitting.
pub mod frustum;
