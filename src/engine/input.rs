//! Gesture and touch entry points.

use web_time::Instant;

use super::Engine;
use crate::input::{GestureEvent, GesturePhase, GestureResponse, TouchEvent};

impl<T> Engine<T> {
    /// Apply one gesture. A recognized double-tap starts the restore-view
    /// animation; while one runs, the tap goes to the animator's
    /// preemption rule instead of the (disabled) gesture mapper.
    pub fn handle_gesture(
        &mut self,
        event: GestureEvent,
        now: Instant,
    ) -> GestureResponse {
        let double_tap = event
            == GestureEvent::DoubleTap {
                phase: GesturePhase::Ended,
            };
        if double_tap && self.animator.is_animating() {
            return if self.restore_view(now) {
                GestureResponse::RestoreView
            } else {
                GestureResponse::Ignored
            };
        }

        let response =
            self.mapper
                .handle(&mut self.ctx, event, now, &mut self.scheduler);
        if response == GestureResponse::RestoreView {
            let _ = self.restore_view(now);
        }
        response
    }

    /// Feed one raw touch through the recognizer and apply the gestures it
    /// produces.
    pub fn handle_touch(&mut self, touch: TouchEvent) -> Vec<GestureResponse> {
        let now = touch.time;
        self.recognizer
            .handle(touch)
            .into_iter()
            .map(|event| self.handle_gesture(event, now))
            .collect()
    }

    /// Trigger the restore-view toggle directly. Returns whether an
    /// animation was started or redirected.
    pub fn restore_view(&mut self, now: Instant) -> bool {
        self.animator.trigger(&mut self.ctx, now, &mut self.scheduler)
    }
}
