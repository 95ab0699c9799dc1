//! Gesture events → camera operations.
//!
//! The [`GestureMapper`] owns only the anchors the gestures advance (last
//! orbit point, pan start); everything else lives on the
//! [`ViewportController`] it is handed.

use glam::DVec2;
use web_time::{Duration, Instant};

use super::event::{GestureEvent, GesturePhase};
use crate::camera::controller::MagnifyPivot;
use crate::engine::context::ViewportController;
use crate::util::schedule::{DeferredTask, Scheduler};

/// What the caller should do after a gesture was mapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureResponse {
    /// Guarded out (no viewport, animating, or not ready).
    Ignored,
    /// Applied to the viewport context.
    Handled,
    /// Double-tap: start the restore-view animation.
    RestoreView,
}

/// Effect of a gesture on the idle redraw timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerAction {
    Keep,
    Cancel,
    Restart,
}

/// Dispatcher from gesture kind and phase to viewport mutation.
#[derive(Debug, Clone)]
pub struct GestureMapper {
    /// Last single-finger orbit position.
    anchor: DVec2,
    /// Last two-finger pan midpoint.
    pan_start: DVec2,
    /// Touch count seen on the previous orbit/dolly event.
    touches: usize,
    /// A gesture began and not every finger has lifted yet.
    interacting: bool,
    inactivity_interval: Duration,
}

impl Default for GestureMapper {
    fn default() -> Self {
        Self::new(Duration::from_secs(9))
    }
}

impl GestureMapper {
    /// Mapper restarting the idle redraw timer with `inactivity_interval`.
    #[must_use]
    pub fn new(inactivity_interval: Duration) -> Self {
        Self {
            anchor: DVec2::ZERO,
            pan_start: DVec2::ZERO,
            touches: 0,
            interacting: false,
            inactivity_interval,
        }
    }

    /// Change the idle redraw period used on the next restart.
    pub fn set_inactivity_interval(&mut self, interval: Duration) {
        self.inactivity_interval = interval;
    }

    /// Whether fingers are still down from a pinch or orbit/dolly.
    #[must_use]
    pub fn is_interacting(&self) -> bool {
        self.interacting
    }

    /// (Re)arm the repeating idle redraw.
    pub fn restart_inactivity_timer<S: Scheduler + ?Sized>(
        &self,
        scheduler: &mut S,
        now: Instant,
    ) {
        scheduler.schedule_repeating(
            DeferredTask::InactivityRedraw,
            now,
            self.inactivity_interval,
        );
    }

    /// Apply one gesture event.
    pub fn handle<S: Scheduler + ?Sized>(
        &mut self,
        ctx: &mut ViewportController,
        event: GestureEvent,
        now: Instant,
        scheduler: &mut S,
    ) -> GestureResponse {
        if ctx.viewport.is_none() {
            return GestureResponse::Ignored;
        }
        if !ctx.interaction_enabled || !ctx.gestures_ready {
            log::debug!("gesture ignored: {:?}", event.phase());
            return GestureResponse::Ignored;
        }

        let timer = match event {
            GestureEvent::Pinch {
                phase,
                touches,
                scale,
                midpoint,
            } => self.pinch(ctx, phase, touches, scale, midpoint),
            GestureEvent::OrbitDolly {
                phase,
                touches,
                location,
                midpoint,
            } => self.orbit_dolly(ctx, phase, touches, location, midpoint),
            GestureEvent::DoubleTap { phase } => {
                if phase != GesturePhase::Ended {
                    return GestureResponse::Handled;
                }
                self.restart_inactivity_timer(scheduler, now);
                return GestureResponse::RestoreView;
            }
        };

        match timer {
            TimerAction::Keep => {}
            TimerAction::Cancel => {
                let _ = scheduler.cancel(DeferredTask::InactivityRedraw);
            }
            TimerAction::Restart => {
                self.restart_inactivity_timer(scheduler, now);
            }
        }
        GestureResponse::Handled
    }

    fn pinch(
        &mut self,
        ctx: &mut ViewportController,
        phase: GesturePhase,
        touches: usize,
        scale: f64,
        midpoint: DVec2,
    ) -> TimerAction {
        match phase {
            GesturePhase::Began => {
                self.interacting = true;
                TimerAction::Cancel
            }
            GesturePhase::Changed if touches > 1 => {
                ctx.fast_drawing = true;
                let screen_size = ctx.view_size;
                if let Some(pose) = ctx.viewport.as_mut() {
                    pose.magnify(
                        screen_size,
                        scale,
                        MagnifyPivot::ScreenPoint(midpoint),
                    );
                }
                ctx.at_initial_position = false;
                ctx.fit_frustum();
                ctx.request_redraw();
                TimerAction::Keep
            }
            GesturePhase::Changed => {
                ctx.request_redraw();
                TimerAction::Keep
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                ctx.request_redraw();
                self.end_interaction(ctx, touches)
            }
        }
    }

    fn orbit_dolly(
        &mut self,
        ctx: &mut ViewportController,
        phase: GesturePhase,
        touches: usize,
        location: DVec2,
        midpoint: DVec2,
    ) -> TimerAction {
        match phase {
            GesturePhase::Began => {
                self.interacting = true;
                self.seed(touches, location, midpoint);
                ctx.request_redraw();
                TimerAction::Cancel
            }
            GesturePhase::Changed if touches != self.touches => {
                self.seed(touches, location, midpoint);
                TimerAction::Keep
            }
            GesturePhase::Changed => {
                let screen_size = ctx.view_size;
                let Some(pose) = ctx.viewport.as_mut() else {
                    return TimerAction::Keep;
                };
                match touches {
                    0 => return TimerAction::Keep,
                    1 => {
                        pose.orbit(screen_size, self.anchor, location);
                        self.anchor = location;
                    }
                    _ => {
                        pose.lateral_pan(self.pan_start, midpoint);
                        self.pan_start = midpoint;
                    }
                }
                ctx.fast_drawing = true;
                ctx.at_initial_position = false;
                ctx.fit_frustum();
                ctx.request_redraw();
                TimerAction::Keep
            }
            GesturePhase::Ended | GesturePhase::Cancelled => {
                self.touches = touches;
                ctx.request_redraw();
                self.end_interaction(ctx, touches)
            }
        }
    }

    fn seed(&mut self, touches: usize, location: DVec2, midpoint: DVec2) {
        self.touches = touches;
        self.anchor = location;
        self.pan_start = midpoint;
    }

    /// Interaction ends once the last finger lifts.
    fn end_interaction(
        &mut self,
        ctx: &mut ViewportController,
        remaining_touches: usize,
    ) -> TimerAction {
        if remaining_touches == 0 {
            self.interacting = false;
            ctx.fast_drawing = false;
            TimerAction::Restart
        } else {
            TimerAction::Keep
        }
    }
}
