//! Shared utilities for the render loop.
//!
//! Display-link pacing, deferred task scheduling and the interpolation
//! primitives used by camera animation.

/// Display-link pacing.
pub mod frame_timing;
pub mod interpolation;
pub mod schedule;
