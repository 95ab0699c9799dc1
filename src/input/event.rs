use glam::DVec2;
use web_time::Instant;

/// Lifecycle phase shared by every gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GesturePhase {
    /// The gesture was recognized.
    Began,
    /// Touch positions or count changed.
    Changed,
    /// All participating touches lifted.
    Ended,
    /// The platform aborted the gesture.
    Cancelled,
}

impl GesturePhase {
    /// `Ended` or `Cancelled`.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }
}

/// Normalized gesture fed to the
/// [`GestureMapper`](super::mapper::GestureMapper).
///
/// Positions are in view points with the origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    /// Two-finger pinch.
    Pinch {
        /// Gesture phase.
        phase: GesturePhase,
        /// Touches currently down.
        touches: usize,
        /// Spread ratio since the previous pinch event (> 1 spreads apart).
        scale: f64,
        /// Centroid of the touches.
        midpoint: DVec2,
    },
    /// One-finger orbit or two-finger dolly.
    OrbitDolly {
        /// Gesture phase.
        phase: GesturePhase,
        /// Touches currently down.
        touches: usize,
        /// Position of the primary touch.
        location: DVec2,
        /// Centroid of the touches.
        midpoint: DVec2,
    },
    /// Two quick taps.
    DoubleTap {
        /// Gesture phase (recognized taps arrive as `Ended`).
        phase: GesturePhase,
    },
}

impl GestureEvent {
    /// Phase of the wrapped gesture.
    #[must_use]
    pub fn phase(&self) -> GesturePhase {
        match *self {
            Self::Pinch { phase, .. }
            | Self::OrbitDolly { phase, .. }
            | Self::DoubleTap { phase } => phase,
        }
    }
}

/// Phase of a single finger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TouchPhase {
    /// Finger went down.
    Started,
    /// Finger moved.
    Moved,
    /// Finger lifted.
    Ended,
    /// Touch was cancelled by the platform.
    Cancelled,
}

#[cfg(feature = "viewer")]
impl From<winit::event::TouchPhase> for TouchPhase {
    fn from(phase: winit::event::TouchPhase) -> Self {
        match phase {
            winit::event::TouchPhase::Started => Self::Started,
            winit::event::TouchPhase::Moved => Self::Moved,
            winit::event::TouchPhase::Ended => Self::Ended,
            winit::event::TouchPhase::Cancelled => Self::Cancelled,
        }
    }
}

/// Raw per-finger touch sample fed to the
/// [`GestureRecognizer`](super::recognizer::GestureRecognizer).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchEvent {
    /// Platform finger identifier, stable while the finger is down.
    pub id: u64,
    /// Finger phase.
    pub phase: TouchPhase,
    /// Position in view points.
    pub position: DVec2,
    /// Sample timestamp.
    pub time: Instant,
}
