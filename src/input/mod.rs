//! Touch input: raw touches are grouped into gestures by the
//! [`GestureRecognizer`], and the [`GestureMapper`] turns gestures into
//! camera operations on the viewport context.

/// Gesture and touch event types.
pub mod event;
/// Gesture-to-camera dispatch.
pub mod mapper;
/// Touch-to-gesture recognition.
pub mod recognizer;

pub use event::{GestureEvent, GesturePhase, TouchEvent, TouchPhase};
pub use mapper::{GestureMapper, GestureResponse};
pub use recognizer::GestureRecognizer;
