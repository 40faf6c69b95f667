use std::time::{Duration, Instant};

/// Nanoseconds per frame at sixty frames per second.
pub const SIXTY_FPS: u64 = 16_666_666;

/// Timing information for a single simulation frame, handed to every system during dispatch.
///
/// Frames are produced from the previous frame with [`Time::next`] (wall clock) or
/// [`Time::advance`] (explicit delta, for deterministic stepping and tests).
#[derive(Debug, Copy, Clone)]
pub struct Time {
    // The instant this frame was captured.
    instant: Instant,
    /// Monotonic frame counter, starting at `0`.
    pub frame: u64,
    /// The time delta since the last frame.
    pub delta: Duration,
    /// The total elapsed time since the first frame.
    pub elapsed: Duration,
}

impl Time {
    /// Construct the first frame with zero delta and elapsed time.
    pub fn new() -> Self {
        Self {
            instant: Instant::now(),
            frame: 0,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// Create the next frame, measuring the delta against the wall clock.
    pub fn next(self) -> Self {
        let delta = self.instant.elapsed();
        Self {
            instant: Instant::now(),
            ..self.advance(delta)
        }
    }

    /// Create the next frame with an explicit delta.
    pub fn advance(self, delta: Duration) -> Self {
        Self {
            instant: self.instant,
            frame: self.frame + 1,
            delta,
            elapsed: self.elapsed + delta,
        }
    }

    /// The frame delta in seconds.
    #[inline]
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}
