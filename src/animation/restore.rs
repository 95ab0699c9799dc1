//! Double-tap "restore view" state machine.
//!
//! Idle → Animating → Settling → Idle. While animating, gestures are
//! disabled and the viewport is tweened every frame; when the tween ends a
//! single deferred settle redraw switches rendering back to full quality.

use serde::{Deserialize, Serialize};
use web_time::{Duration, Instant};

use super::session::AnimationSession;
use crate::engine::context::ViewportController;
use crate::util::schedule::{DeferredTask, Scheduler};

/// Animator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreState {
    /// No animation.
    #[default]
    Idle,
    /// Tweening toward the target pose.
    Animating,
    /// Tween finished; waiting for the settle redraw.
    Settling,
}

/// What a double-tap does while a tween is already running.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    schemars::JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PreemptionStrategy {
    /// Keep running; the tap is dropped.
    #[default]
    Ignore,
    /// Turn around and tween back to the pose the animation started from.
    Reverse,
}

/// Animates the viewport between the home pose and the last interactive
/// pose.
#[derive(Debug, Clone)]
pub struct RestoreViewAnimator {
    state: RestoreState,
    session: Option<AnimationSession>,
    duration: Duration,
    settle_delay: Duration,
    /// "At initial position" when the current animation was triggered.
    started_at_initial: bool,
    preemption: PreemptionStrategy,
}

impl Default for RestoreViewAnimator {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_millis(50))
    }
}

impl RestoreViewAnimator {
    /// Animator with the given tween duration and settle delay.
    #[must_use]
    pub fn new(duration: Duration, settle_delay: Duration) -> Self {
        Self {
            state: RestoreState::Idle,
            session: None,
            duration,
            settle_delay,
            started_at_initial: false,
            preemption: PreemptionStrategy::Ignore,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> RestoreState {
        self.state
    }

    /// Whether a tween is in flight.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.state == RestoreState::Animating
    }

    /// In-flight session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&AnimationSession> {
        self.session.as_ref()
    }

    /// Change how mid-flight triggers are handled.
    pub fn set_preemption(&mut self, preemption: PreemptionStrategy) {
        self.preemption = preemption;
    }

    /// Update tween duration and settle delay for later triggers.
    pub fn set_timing(&mut self, duration: Duration, settle_delay: Duration) {
        self.duration = duration;
        self.settle_delay = settle_delay;
    }

    /// Start animating toward home, or back to the last interactive pose
    /// when already at home.
    ///
    /// Returns `false` when nothing was started: no viewport, no pose to
    /// go to, or a tween is already running.
    pub fn trigger<S: Scheduler + ?Sized>(
        &mut self,
        ctx: &mut ViewportController,
        now: Instant,
        scheduler: &mut S,
    ) -> bool {
        match (self.state, self.preemption) {
            (RestoreState::Animating, PreemptionStrategy::Ignore) => {
                log::debug!("restore view ignored: animation in progress");
                return false;
            }
            (RestoreState::Animating, PreemptionStrategy::Reverse) => {
                return self.reverse(ctx, now);
            }
            (RestoreState::Settling, _) => {
                let _ = scheduler.cancel(DeferredTask::SettleRedraw);
            }
            (RestoreState::Idle, _) => {}
        }

        let Some(current) = ctx.viewport.clone() else {
            return false;
        };
        let target = if ctx.at_initial_position {
            ctx.last_interactive_pose.clone()
        } else {
            let home = ctx.home_pose.clone();
            if home.is_some() {
                ctx.last_interactive_pose = Some(current.clone());
            }
            home
        };
        let Some(mut finish) = target else {
            log::warn!("restore view has no pose to animate to");
            self.state = RestoreState::Idle;
            return false;
        };
        if let Some(aspect) = current.frustum_aspect() {
            finish.set_frustum_aspect(aspect);
        }

        self.session =
            Some(AnimationSession::new(current, finish, now, self.duration));
        self.started_at_initial = ctx.at_initial_position;
        self.state = RestoreState::Animating;
        ctx.fast_drawing = true;
        ctx.interaction_enabled = false;
        ctx.request_redraw();
        log::debug!(
            "restore view: animating {} home",
            if self.started_at_initial { "away from" } else { "to" }
        );
        true
    }

    /// Tween from the current frame back to where the running one began.
    fn reverse(&mut self, ctx: &mut ViewportController, now: Instant) -> bool {
        let (Some(current), Some(session)) =
            (ctx.viewport.clone(), self.session.take())
        else {
            return false;
        };
        let finish = session.start().clone();
        self.session =
            Some(AnimationSession::new(current, finish, now, self.duration));
        self.started_at_initial = !self.started_at_initial;
        ctx.request_redraw();
        log::debug!("restore view reversed");
        true
    }

    /// Advance the tween to `now` and commit the frame pose.
    pub fn update<S: Scheduler + ?Sized>(
        &mut self,
        ctx: &mut ViewportController,
        now: Instant,
        scheduler: &mut S,
    ) {
        if self.state != RestoreState::Animating {
            return;
        }
        let Some(session) = self.session.as_ref() else {
            self.state = RestoreState::Idle;
            return;
        };

        let fraction = session.fraction(now);
        let frame = session.frame_vectors(fraction);
        if let Some(pose) = ctx.viewport.as_mut() {
            if let Err(e) =
                pose.set_target(frame.target, frame.camera_location, frame.up)
            {
                log::warn!("restore view frame rejected: {e}");
            }
            pose.frustum = session.frame_window(fraction, &pose.frustum);
        }
        ctx.fit_frustum();
        ctx.request_redraw();

        if fraction >= 1.0 {
            self.session = None;
            self.state = RestoreState::Settling;
            ctx.interaction_enabled = true;
            ctx.at_initial_position = !self.started_at_initial;
            scheduler.schedule(
                DeferredTask::SettleRedraw,
                now,
                self.settle_delay,
            );
        }
    }

    /// Deferred settle redraw fired: back to full-quality rendering,
    /// unless a gesture that started while settling is still in progress.
    pub fn on_settle(
        &mut self,
        ctx: &mut ViewportController,
        gesture_active: bool,
    ) {
        if self.state != RestoreState::Settling {
            return;
        }
        self.state = RestoreState::Idle;
        if !gesture_active {
            ctx.fast_drawing = false;
        }
        ctx.request_redraw();
    }

    /// Drop any in-flight animation (render loop stopped).
    pub fn abandon<S: Scheduler + ?Sized>(
        &mut self,
        ctx: &mut ViewportController,
        scheduler: &mut S,
    ) {
        if self.state == RestoreState::Idle {
            return;
        }
        let _ = scheduler.cancel(DeferredTask::SettleRedraw);
        self.session = None;
        self.state = RestoreState::Idle;
        ctx.interaction_enabled = true;
        ctx.fast_drawing = false;
    }
}

#[cfg(test)]
mod tests {
    use glam::{DVec2, DVec3};

    use super::*;
    use crate::camera::core::ViewportPose;
    use crate::util::schedule::DeferredQueue;

    fn pose(camera: DVec3) -> ViewportPose {
        let mut p = ViewportPose::new(camera, DVec3::ZERO, DVec3::Y).unwrap();
        p.set_screen_port(800, 600);
        p
    }

    /// Context sitting at a moved pose with home at (0, 0, 5).
    fn moved_ctx() -> ViewportController {
        let mut ctx = ViewportController::new(DVec2::new(800.0, 600.0), 1.0);
        ctx.home_pose = Some(pose(DVec3::new(0.0, 0.0, 5.0)));
        ctx.last_interactive_pose = ctx.home_pose.clone();
        ctx.viewport = Some(pose(DVec3::splat(10.0)));
        ctx.gestures_ready = true;
        ctx
    }

    fn run_to_end(
        a: &mut RestoreViewAnimator,
        ctx: &mut ViewportController,
        q: &mut DeferredQueue,
        t0: Instant,
    ) -> Instant {
        let end = t0 + Duration::from_millis(500);
        a.update(ctx, end, q);
        let settle = end + Duration::from_millis(50);
        for task in q.drain_due(settle) {
            if task == DeferredTask::SettleRedraw {
                a.on_settle(ctx, false);
            }
        }
        settle
    }

    #[test]
    fn trigger_disables_interaction() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        assert!(a.trigger(&mut ctx, Instant::now(), &mut q));
        assert!(a.is_animating());
        assert!(ctx.fast_drawing);
        assert!(!ctx.interaction_enabled);
    }

    #[test]
    fn trigger_while_animating_is_ignored() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        let t0 = Instant::now();
        assert!(a.trigger(&mut ctx, t0, &mut q));
        let finish = a.session().unwrap().finish().camera_location();
        assert!(!a.trigger(&mut ctx, t0, &mut q));
        assert_eq!(a.session().unwrap().finish().camera_location(), finish);
    }

    #[test]
    fn midpoint_frame_matches_eased_distance() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        let t0 = Instant::now();
        let _ = a.trigger(&mut ctx, t0, &mut q);
        a.update(&mut ctx, t0 + Duration::from_millis(250), &mut q);

        let pose = ctx.viewport.as_ref().unwrap();
        assert!(pose.target().abs_diff_eq(DVec3::ZERO, 1e-9));
        let expected = 0.5 * (300.0_f64.sqrt() + 5.0);
        assert!((pose.distance() - expected).abs() < 1e-6);
        assert!(a.is_animating());
    }

    #[test]
    fn completion_commits_finish_and_settles() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        let t0 = Instant::now();
        let _ = a.trigger(&mut ctx, t0, &mut q);

        a.update(&mut ctx, t0 + Duration::from_millis(600), &mut q);
        assert_eq!(a.state(), RestoreState::Settling);
        assert!(ctx.interaction_enabled);
        assert!(ctx.fast_drawing);
        assert!(q.is_pending(DeferredTask::SettleRedraw));
        let pose = ctx.viewport.as_ref().unwrap();
        assert_eq!(pose.camera_location(), DVec3::new(0.0, 0.0, 5.0));
        assert_eq!(pose.up(), DVec3::Y);

        a.on_settle(&mut ctx, false);
        assert_eq!(a.state(), RestoreState::Idle);
        assert!(!ctx.fast_drawing);
    }

    #[test]
    fn settle_keeps_fast_drawing_during_gesture() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        let t0 = Instant::now();
        let _ = a.trigger(&mut ctx, t0, &mut q);
        a.update(&mut ctx, t0 + Duration::from_millis(600), &mut q);

        let _ = ctx.take_redraw_request();
        a.on_settle(&mut ctx, true);
        assert_eq!(a.state(), RestoreState::Idle);
        assert!(ctx.fast_drawing);
        assert!(ctx.take_redraw_request());
    }

    #[test]
    fn double_tap_toggles_between_home_and_last_pose() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        let moved = DVec3::splat(10.0);

        let t0 = Instant::now();
        let _ = a.trigger(&mut ctx, t0, &mut q);
        let t1 = run_to_end(&mut a, &mut ctx, &mut q, t0);
        assert!(ctx.at_initial_position);
        assert_eq!(
            ctx.viewport.as_ref().unwrap().camera_location(),
            DVec3::new(0.0, 0.0, 5.0)
        );

        let _ = a.trigger(&mut ctx, t1, &mut q);
        let t2 = run_to_end(&mut a, &mut ctx, &mut q, t1);
        assert!(!ctx.at_initial_position);
        assert_eq!(ctx.viewport.as_ref().unwrap().camera_location(), moved);

        let _ = a.trigger(&mut ctx, t2, &mut q);
        let _ = run_to_end(&mut a, &mut ctx, &mut q, t2);
        assert!(ctx.at_initial_position);
        assert_eq!(
            ctx.viewport.as_ref().unwrap().camera_location(),
            DVec3::new(0.0, 0.0, 5.0)
        );
    }

    #[test]
    fn trigger_while_settling_restarts() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        let t0 = Instant::now();
        let _ = a.trigger(&mut ctx, t0, &mut q);
        let t1 = t0 + Duration::from_millis(500);
        a.update(&mut ctx, t1, &mut q);
        assert_eq!(a.state(), RestoreState::Settling);

        assert!(a.trigger(&mut ctx, t1, &mut q));
        assert!(a.is_animating());
        assert!(!q.is_pending(DeferredTask::SettleRedraw));
    }

    #[test]
    fn reverse_preemption_returns_to_start() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        a.set_preemption(PreemptionStrategy::Reverse);
        let t0 = Instant::now();
        let _ = a.trigger(&mut ctx, t0, &mut q);
        let t1 = t0 + Duration::from_millis(200);
        a.update(&mut ctx, t1, &mut q);
        assert!(a.trigger(&mut ctx, t1, &mut q));

        let _ = run_to_end(&mut a, &mut ctx, &mut q, t1);
        assert_eq!(
            ctx.viewport.as_ref().unwrap().camera_location(),
            DVec3::splat(10.0)
        );
        assert!(!ctx.at_initial_position);
    }

    #[test]
    fn abandon_reenables_interaction() {
        let mut ctx = moved_ctx();
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        let _ = a.trigger(&mut ctx, Instant::now(), &mut q);
        a.abandon(&mut ctx, &mut q);
        assert_eq!(a.state(), RestoreState::Idle);
        assert!(ctx.interaction_enabled);
    }

    #[test]
    fn no_home_pose_does_nothing() {
        let mut ctx = moved_ctx();
        ctx.home_pose = None;
        let mut q = DeferredQueue::new();
        let mut a = RestoreViewAnimator::default();
        assert!(!a.trigger(&mut ctx, Instant::now(), &mut q));
        assert!(ctx.interaction_enabled);
    }
}
