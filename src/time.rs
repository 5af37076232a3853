//! Frame pacing for [`Renderer::run`](crate::renderer::Renderer::run).

#[cfg(not(target_arch = "wasm32"))]
use instant::Instant;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;

/// Source of frame timestamps. Each call waits until the next frame is due
/// and returns its time in seconds since the clock started, or `None` once
/// the clock has no more frames to give.
pub trait FrameClock {
    fn next_frame(&mut self) -> Option<f64>;
}

/// Deterministic clock: frames are `interval` apart and never wait.
#[derive(Debug, Clone)]
pub struct FixedClock {
    interval: f64,
    frame: u64,
    limit: Option<u64>,
}

impl FixedClock {
    pub fn new(interval: f64) -> Self {
        Self {
            interval,
            frame: 0,
            limit: None,
        }
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn frames_delivered(&self) -> u64 {
        self.frame
    }
}

impl FrameClock for FixedClock {
    fn next_frame(&mut self) -> Option<f64> {
        if self.limit.is_some_and(|limit| self.frame >= limit) {
            return None;
        }
        let timestamp = self.frame as f64 * self.interval;
        self.frame += 1;
        Some(timestamp)
    }
}

/// Wall-clock pacing at a target refresh rate. Sleeps the calling thread,
/// so it is only available natively; the browser uses
/// `requestAnimationFrame` instead.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug)]
pub struct SystemClock {
    start: Instant,
    interval: Duration,
    next_due: Option<Instant>,
    limit: Option<u64>,
    frame: u64,
}

#[cfg(not(target_arch = "wasm32"))]
impl SystemClock {
    pub fn new(refresh_rate_hz: f64) -> Self {
        let hz = if refresh_rate_hz > 0.0 { refresh_rate_hz } else { 60.0 };
        Self {
            start: Instant::now(),
            interval: Duration::from_secs_f64(1.0 / hz),
            next_due: None,
            limit: None,
            frame: 0,
        }
    }

    pub fn with_frame_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl FrameClock for SystemClock {
    fn next_frame(&mut self) -> Option<f64> {
        if self.limit.is_some_and(|limit| self.frame >= limit) {
            return None;
        }

        let now = Instant::now();
        if let Some(due) = self.next_due {
            if due > now {
                std::thread::sleep(due - now);
            }
        }
        let frame_start = Instant::now();
        // Late frames do not try to catch up
        self.next_due = Some(frame_start + self.interval);
        self.frame += 1;
        Some(frame_start.duration_since(self.start).as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_steps_and_stops() {
        let mut clock = FixedClock::new(0.5).with_frame_limit(3);
        assert_eq!(clock.next_frame(), Some(0.0));
        assert_eq!(clock.next_frame(), Some(0.5));
        assert_eq!(clock.next_frame(), Some(1.0));
        assert_eq!(clock.next_frame(), None);
        assert_eq!(clock.frames_delivered(), 3);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn system_clock_paces_frames() {
        let mut clock = SystemClock::new(200.0).with_frame_limit(3);
        let first = clock.next_frame().unwrap();
        clock.next_frame().unwrap();
        let third = clock.next_frame().unwrap();
        assert!(clock.next_frame().is_none());
        // Two intervals of 5ms at least
        assert!(third - first >= 0.009, "{}", third - first);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn non_positive_rate_falls_back_to_sixty() {
        let clock = SystemClock::new(0.0);
        assert!((clock.interval().as_secs_f64() - 1.0 / 60.0).abs() < 1e-9);
    }
}
