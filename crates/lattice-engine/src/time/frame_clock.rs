use std::time::{Duration, Instant};

/// Timing of one frame.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Seconds since the clock started. Drives the cube animation.
    pub elapsed: f64,

    pub now: Instant,

    /// Starts at 0.
    pub frame_index: u64,
}

/// Produces a [`FrameTime`] per frame.
///
/// `dt` is clamped so a debugger pause or a minimized window does not show up
/// as one huge step. `elapsed` is not clamped: rotation angles are a function
/// of wall time, not of accumulated steps.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self::starting_at(Instant::now(), dt_min, dt_max)
    }

    fn starting_at(start: Instant, dt_min: Duration, dt_max: Duration) -> Self {
        Self {
            start,
            last: start,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the delta baseline (e.g. after resuming). `elapsed` keeps counting.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start).as_secs_f64(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock(start: Instant) -> FrameClock {
        FrameClock::starting_at(start, Duration::from_millis(1), Duration::from_millis(250))
    }

    #[test]
    fn frame_index_counts_from_zero() {
        let start = Instant::now();
        let mut c = clock(start);
        assert_eq!(c.tick_at(start + Duration::from_millis(16)).frame_index, 0);
        assert_eq!(c.tick_at(start + Duration::from_millis(32)).frame_index, 1);
    }

    #[test]
    fn dt_is_clamped_but_elapsed_is_not() {
        let start = Instant::now();
        let mut c = clock(start);

        let ft = c.tick_at(start + Duration::from_secs(5));
        assert_eq!(ft.dt, 0.25);
        assert!((ft.elapsed - 5.0).abs() < 1e-9);

        let ft = c.tick_at(start + Duration::from_secs(5));
        assert_eq!(ft.dt, 0.001);
    }

    #[test]
    fn elapsed_is_monotonic() {
        let start = Instant::now();
        let mut c = clock(start);
        let mut prev = 0.0;
        for ms in [10, 20, 20, 35, 1000] {
            let ft = c.tick_at(start + Duration::from_millis(ms));
            assert!(ft.elapsed >= prev);
            prev = ft.elapsed;
        }
    }

    #[test]
    fn reset_keeps_elapsed() {
        let start = Instant::now();
        let mut c = clock(start);
        c.tick_at(start + Duration::from_secs(2));
        c.reset();
        let ft = c.tick_at(start + Duration::from_secs(3));
        assert!((ft.elapsed - 3.0).abs() < 1e-9);
    }
}
