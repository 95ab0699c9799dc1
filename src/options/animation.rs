use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::animation::PreemptionStrategy;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[schemars(title = "Animation", inline)]
#[serde(default)]
/// Restore-view tween and idle timer settings.
pub struct AnimationOptions {
    /// Length of the restore-view tween in milliseconds.
    #[schemars(
        title = "Restore Duration (ms)",
        range(min = 0, max = 5000),
        extend("step" = 50)
    )]
    pub restore_duration_ms: u64,
    /// Delay of the full-quality redraw after a tween, in milliseconds.
    #[schemars(skip)]
    pub settle_delay_ms: u64,
    /// Period of the idle redraw timer in milliseconds.
    #[schemars(skip)]
    pub inactivity_interval_ms: u64,
    /// What a double-tap does while a tween is running.
    #[schemars(title = "Double-Tap During Animation")]
    pub preemption: PreemptionStrategy,
}

impl Default for AnimationOptions {
    fn default() -> Self {
        Self {
            restore_duration_ms: 500,
            settle_delay_ms: 50,
            inactivity_interval_ms: 9000,
            preemption: PreemptionStrategy::Ignore,
        }
    }
}

impl AnimationOptions {
    /// Tween length.
    #[must_use]
    pub fn restore_duration(&self) -> Duration {
        Duration::from_millis(self.restore_duration_ms)
    }

    /// Settle redraw delay.
    #[must_use]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Idle redraw period.
    #[must_use]
    pub fn inactivity_interval(&self) -> Duration {
        Duration::from_millis(self.inactivity_interval_ms)
    }
}
