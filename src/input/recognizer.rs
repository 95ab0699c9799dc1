//! Raw touches → gesture events.
//!
//! Runs three recognizers over one touch stream, the way a platform
//! gesture system does: orbit/dolly (any touch count), pinch (two or more
//! touches) and double-tap. Pinch and orbit/dolly fire simultaneously.

use glam::DVec2;
use rustc_hash::FxHashMap;
use web_time::{Duration, Instant};

use super::event::{GestureEvent, GesturePhase, TouchEvent, TouchPhase};

const DOUBLE_TAP_THRESHOLD: Duration = Duration::from_millis(400);
const TAP_MAX_DURATION: Duration = Duration::from_millis(300);
/// Movement (points) after which a touch is no longer a tap.
const TAP_SLOP: f64 = 10.0;
/// Max distance (points) between the two taps of a double-tap.
const DOUBLE_TAP_SLOP: f64 = 40.0;

#[derive(Debug, Clone, Copy)]
struct TapCandidate {
    position: DVec2,
    time: Instant,
}

/// Stateful touch-to-gesture recognizer.
#[derive(Debug, Default)]
pub struct GestureRecognizer {
    touches: FxHashMap<u64, DVec2>,
    /// Finger reported as the orbit location.
    primary: Option<u64>,
    /// Spread at the previous pinch event, `Some` while pinching.
    pinch_spread: Option<f64>,
    tap: Option<TapCandidate>,
    last_tap: Option<TapCandidate>,
}

impl GestureRecognizer {
    /// Recognizer with no touches down.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Touches currently down.
    #[must_use]
    pub fn touch_count(&self) -> usize {
        self.touches.len()
    }

    /// Feed one touch sample; returns the gestures it produced, in order.
    pub fn handle(&mut self, touch: TouchEvent) -> Vec<GestureEvent> {
        match touch.phase {
            TouchPhase::Started => self.touch_started(touch),
            TouchPhase::Moved => self.touch_moved(touch),
            TouchPhase::Ended => self.touch_lifted(touch, GesturePhase::Ended),
            TouchPhase::Cancelled => {
                self.touch_lifted(touch, GesturePhase::Cancelled)
            }
        }
    }

    /// Drop every touch without emitting gestures (e.g. focus loss).
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn touch_started(&mut self, touch: TouchEvent) -> Vec<GestureEvent> {
        let was_empty = self.touches.is_empty();
        let _ = self.touches.insert(touch.id, touch.position);
        let mut events = Vec::with_capacity(2);

        if was_empty {
            self.primary = Some(touch.id);
            self.tap = Some(TapCandidate {
                position: touch.position,
                time: touch.time,
            });
            events.push(self.orbit_dolly(GesturePhase::Began));
            return events;
        }

        self.tap = None;
        events.push(self.orbit_dolly(GesturePhase::Changed));
        let spread = self.spread();
        if self.pinch_spread.is_some() {
            events.push(self.pinch(GesturePhase::Changed, 1.0));
        } else {
            events.push(self.pinch(GesturePhase::Began, 1.0));
        }
        self.pinch_spread = Some(spread);
        events
    }

    fn touch_moved(&mut self, touch: TouchEvent) -> Vec<GestureEvent> {
        let Some(slot) = self.touches.get_mut(&touch.id) else {
            return Vec::new();
        };
        *slot = touch.position;

        if self.tap.is_some_and(|tap| {
            tap.position.distance(touch.position) > TAP_SLOP
        }) {
            self.tap = None;
        }

        let mut events = vec![self.orbit_dolly(GesturePhase::Changed)];
        if let Some(previous) = self.pinch_spread {
            let spread = self.spread();
            let scale = if previous > f64::EPSILON {
                spread / previous
            } else {
                1.0
            };
            self.pinch_spread = Some(spread);
            events.push(self.pinch(GesturePhase::Changed, scale));
        }
        events
    }

    fn touch_lifted(
        &mut self,
        touch: TouchEvent,
        phase: GesturePhase,
    ) -> Vec<GestureEvent> {
        let Some(position) = self.touches.remove(&touch.id) else {
            return Vec::new();
        };
        if self.primary == Some(touch.id) {
            self.primary = self.touches.keys().min().copied();
        }
        let mut events = Vec::with_capacity(3);

        if self.pinch_spread.is_some() {
            if self.touches.len() >= 2 {
                self.pinch_spread = Some(self.spread());
                events.push(self.pinch(GesturePhase::Changed, 1.0));
            } else {
                self.pinch_spread = None;
                events.push(self.pinch(phase, 1.0));
            }
        }

        if self.touches.is_empty() {
            events.push(GestureEvent::OrbitDolly {
                phase,
                touches: 0,
                location: position,
                midpoint: position,
            });
            if phase == GesturePhase::Ended {
                events.extend(self.finish_tap(touch.time));
            } else {
                self.tap = None;
            }
        } else {
            events.push(self.orbit_dolly(GesturePhase::Changed));
        }
        events
    }

    /// Second completed tap inside the window and radius is a double-tap.
    fn finish_tap(&mut self, now: Instant) -> Option<GestureEvent> {
        let tap = self.tap.take()?;
        if now.saturating_duration_since(tap.time) > TAP_MAX_DURATION {
            self.last_tap = None;
            return None;
        }
        match self.last_tap.take() {
            Some(last)
                if tap.time.saturating_duration_since(last.time)
                    <= DOUBLE_TAP_THRESHOLD
                    && last.position.distance(tap.position)
                        <= DOUBLE_TAP_SLOP =>
            {
                Some(GestureEvent::DoubleTap {
                    phase: GesturePhase::Ended,
                })
            }
            _ => {
                self.last_tap = Some(tap);
                None
            }
        }
    }

    fn centroid(&self) -> DVec2 {
        if self.touches.is_empty() {
            return DVec2::ZERO;
        }
        self.touches.values().copied().sum::<DVec2>()
            / self.touches.len() as f64
    }

    /// Mean distance of the touches from their centroid.
    fn spread(&self) -> f64 {
        if self.touches.is_empty() {
            return 0.0;
        }
        let c = self.centroid();
        self.touches.values().map(|p| p.distance(c)).sum::<f64>()
            / self.touches.len() as f64
    }

    fn orbit_dolly(&self, phase: GesturePhase) -> GestureEvent {
        let midpoint = self.centroid();
        let location = self
            .primary
            .and_then(|id| self.touches.get(&id).copied())
            .unwrap_or(midpoint);
        GestureEvent::OrbitDolly {
            phase,
            touches: self.touches.len(),
            location,
            midpoint,
        }
    }

    fn pinch(&self, phase: GesturePhase, scale: f64) -> GestureEvent {
        GestureEvent::Pinch {
            phase,
            touches: self.touches.len(),
            scale,
            midpoint: self.centroid(),
        }
    }
}
