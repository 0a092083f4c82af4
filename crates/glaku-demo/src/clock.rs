use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick, clamped.
    pub dt: f32,

    /// Seconds since the clock was created or reset, accumulated from `dt`.
    pub elapsed: f32,

    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots for the render loop.
///
/// Delta time is clamped so that a stalled or minimized window does not make
/// the animation jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f32,
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
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Restarts the delta baseline, e.g. after the surface was recreated.
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max)
            .as_secs_f32();
        self.last = now;
        self.elapsed += dt;

        let ft = FrameTime {
            dt,
            elapsed: self.elapsed,
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
    fn dt_is_clamped_from_below() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(10), Duration::from_millis(20));
        let ft = clock.tick();
        assert!(ft.dt >= 0.010 - f32::EPSILON);
        assert!(ft.dt <= 0.020 + f32::EPSILON);
    }

    #[test]
    fn elapsed_accumulates_dt() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(5), Duration::from_millis(5));
        clock.tick();
        clock.tick();
        let ft = clock.tick();
        assert!((ft.elapsed - 0.015).abs() < 1e-6);
    }
}
