use std::time::{Duration, Instant};

use crate::pipeline::frame_scheduler::FrameScheduler;

/// Ticks at a fixed refresh rate by sleeping the calling thread.
///
/// A late frame reschedules from "now" rather than bursting to catch up.
pub struct FixedRateScheduler {
    period: Duration,
    next_due: Option<Instant>,
    remaining: Option<u64>,
}

impl FixedRateScheduler {
    pub fn new(refresh_rate_hz: u32) -> Self {
        Self {
            period: Duration::from_secs_f64(1.0 / refresh_rate_hz.max(1) as f64),
            next_due: None,
            remaining: None,
        }
    }

    /// Stop after `frames` frames.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameScheduler for FixedRateScheduler {
    fn next_frame(&mut self) -> bool {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return false;
            }
            *remaining -= 1;
        }

        let now = Instant::now();
        match self.next_due {
            Some(due) if due > now => {
                std::thread::sleep(due - now);
                self.next_due = Some(due + self.period);
            }
            _ => self.next_due = Some(now + self.period),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(60, Duration::from_secs_f64(1.0 / 60.0))]
    #[case(1, Duration::from_secs(1))]
    #[case(0, Duration::from_secs(1))]
    fn test_period(#[case] hz: u32, #[case] expected: Duration) {
        assert_eq!(FixedRateScheduler::new(hz).period(), expected);
    }

    #[test]
    fn test_limit_stops_scheduling() {
        let mut scheduler = FixedRateScheduler::new(1000).with_limit(3);
        assert!(scheduler.next_frame());
        assert!(scheduler.next_frame());
        assert!(scheduler.next_frame());
        assert!(!scheduler.next_frame());
    }

    #[test]
    fn test_paces_frames() {
        let mut scheduler = FixedRateScheduler::new(100).with_limit(6);
        let start = Instant::now();
        while scheduler.next_frame() {}
        // Five full periods between six frames.
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
