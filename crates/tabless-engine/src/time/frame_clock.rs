use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f32,

    /// Milliseconds since the clock was created (`DOMHighResTimeStamp`).
    pub timestamp_ms: f64,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped to avoid pathological values when the process is
/// paused by the debugger, minimized, or stalls. Timestamps are not clamped:
/// they track wall time like `performance.now()` does.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps.
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            origin: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Milliseconds since the clock was created.
    pub fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            timestamp_ms: now.saturating_duration_since(self.origin).as_secs_f64() * 1000.0,
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

    #[test]
    fn frame_index_counts_ticks() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
    }

    #[test]
    fn dt_is_clamped_to_minimum() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(5), Duration::from_millis(10));
        let ft = clock.tick();
        assert!(ft.dt >= 0.005);
        assert!(ft.dt <= 0.010);
    }

    #[test]
    fn timestamps_are_monotonic() {
        let mut clock = FrameClock::new();
        let a = clock.tick().timestamp_ms;
        let b = clock.tick().timestamp_ms;
        assert!(b >= a);
        assert!(clock.now_ms() >= b);
    }
}
