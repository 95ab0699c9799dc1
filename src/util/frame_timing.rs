use web_time::{Duration, Instant};

use crate::error::TouchviewError;

/// Display-link pacing: draw every `frame_interval`-th vsync of a display
/// refreshing at `refresh_hz`.
#[derive(Debug, Clone)]
pub struct FrameTiming {
    /// Vsyncs per drawn frame (1 = every refresh).
    frame_interval: u32,
    /// Display refresh rate in Hz.
    refresh_hz: u32,
    /// Minimum frame duration derived from the two above.
    min_frame_duration: Duration,
    /// Last frame timestamp
    last_frame: Instant,
}

impl FrameTiming {
    /// Create a frame timer.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::InvalidArgument`] if `frame_interval` or
    /// `refresh_hz` is zero.
    pub fn new(
        frame_interval: u32,
        refresh_hz: u32,
    ) -> Result<Self, TouchviewError> {
        validate_frame_interval(frame_interval)?;
        if refresh_hz == 0 {
            return Err(TouchviewError::invalid_argument(
                "refresh_hz",
                "display refresh rate must be positive",
            ));
        }

        Ok(Self {
            frame_interval,
            refresh_hz,
            min_frame_duration: frame_duration(frame_interval, refresh_hz),
            last_frame: Instant::now(),
        })
    }

    /// Current frame interval.
    pub fn frame_interval(&self) -> u32 {
        self.frame_interval
    }

    /// Change the frame interval.
    ///
    /// # Errors
    ///
    /// [`TouchviewError::InvalidArgument`] if `frame_interval` is zero; the
    /// previous interval is kept.
    pub fn set_frame_interval(
        &mut self,
        frame_interval: u32,
    ) -> Result<(), TouchviewError> {
        validate_frame_interval(frame_interval)?;
        self.frame_interval = frame_interval;
        self.min_frame_duration =
            frame_duration(frame_interval, self.refresh_hz);
        Ok(())
    }

    /// Shortest time between two drawn frames.
    pub fn min_frame_duration(&self) -> Duration {
        self.min_frame_duration
    }

    /// Returns true if enough time has passed since the last frame.
    pub fn should_render(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_frame)
            >= self.min_frame_duration
    }

    /// Call after rendering to update timing.
    pub fn end_frame(&mut self, now: Instant) {
        self.last_frame = now;
    }
}

/// Reject non-positive frame intervals.
pub(crate) fn validate_frame_interval(
    frame_interval: u32,
) -> Result<(), TouchviewError> {
    if frame_interval == 0 {
        return Err(TouchviewError::invalid_argument(
            "frame_interval",
            "frame interval must be positive",
        ));
    }
    Ok(())
}

fn frame_duration(frame_interval: u32, refresh_hz: u32) -> Duration {
    Duration::from_secs_f64(f64::from(frame_interval) / f64::from(refresh_hz))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        assert!(matches!(
            FrameTiming::new(0, 60),
            Err(TouchviewError::InvalidArgument {
                name: "frame_interval",
                ..
            })
        ));
    }

    #[test]
    fn interval_scales_frame_duration() {
        let mut timing = FrameTiming::new(1, 60).unwrap();
        let one = timing.min_frame_duration();
        timing.set_frame_interval(2).unwrap();
        assert_eq!(timing.frame_interval(), 2);
        assert!((timing.min_frame_duration().as_secs_f64()
            - 2.0 * one.as_secs_f64())
        .abs()
            < 1e-9);
    }

    #[test]
    fn rejected_interval_keeps_previous() {
        let mut timing = FrameTiming::new(3, 60).unwrap();
        assert!(timing.set_frame_interval(0).is_err());
        assert_eq!(timing.frame_interval(), 3);
    }

    #[test]
    fn should_render_after_min_duration() {
        let mut timing = FrameTiming::new(1, 60).unwrap();
        let t0 = Instant::now();
        timing.end_frame(t0);
        assert!(!timing.should_render(t0));
        assert!(timing.should_render(t0 + Duration::from_millis(17)));
    }
}
