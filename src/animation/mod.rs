//! Restore-view camera animation.
//!
//! A double-tap tweens the viewport between its home pose and the last
//! pose the user navigated to. [`session::AnimationSession`] holds the
//! tween math; [`restore::RestoreViewAnimator`] is the state machine that
//! drives it from the render loop.

pub mod restore;
pub mod session;

pub use restore::{PreemptionStrategy, RestoreState, RestoreViewAnimator};
pub use session::{AnimationSession, FrameVectors};
