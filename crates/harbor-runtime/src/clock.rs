//! Frame clock

use std::time::Instant;

/// Longest frame the clock will report, in seconds
const MAX_DELTA: f32 = 0.25;

/// Tracks wall-clock time between rendered frames
pub struct FrameClock {
    /// Total elapsed time in seconds
    pub total_time: f32,
    /// Time since last frame in seconds
    pub delta_time: f32,
    /// Frames ticked so far
    pub frame_count: u64,
    last_instant: Instant,
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            frame_count: 0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock. Call once per frame.
    pub fn tick(&mut self) {
        let now = Instant::now();

        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            self.frame_count += 1;
            return;
        }

        let elapsed = now.duration_since(self.last_instant).as_secs_f32();
        self.last_instant = now;
        self.advance(elapsed);
    }

    /// Advance by an explicit amount of time (clamped like a real frame)
    pub fn advance(&mut self, seconds: f32) {
        self.delta_time = seconds.clamp(0.0, MAX_DELTA);
        self.total_time += self.delta_time;
        self.frame_count += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_defaults() {
        let clock = FrameClock::new();
        assert_eq!(clock.total_time, 0.0);
        assert_eq!(clock.delta_time, 0.0);
        assert_eq!(clock.frame_count, 0);
    }

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new();
        clock.tick();
        assert_eq!(clock.delta_time, 0.0);
        assert_eq!(clock.frame_count, 1);
    }

    #[test]
    fn test_advance_accumulates() {
        let mut clock = FrameClock::new();
        clock.advance(0.1);
        clock.advance(0.2);
        assert!((clock.total_time - 0.3).abs() < 1e-6);
        assert!((clock.delta_time - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FrameClock::new();
        clock.advance(3.0);
        assert_eq!(clock.delta_time, MAX_DELTA);
        clock.advance(-1.0);
        assert_eq!(clock.delta_time, 0.0);
    }
}
