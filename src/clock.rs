//! Optional fixed-rate pacing of game ticks.

use std::thread;
use std::time::{Duration, Instant};

/// Limits ticks to a fixed rate; an unpaced clock never sleeps
#[derive(Clone, Debug)]
pub struct FrameClock {
    step_duration: Option<Duration>,
    last_step: Instant,
}

impl FrameClock {
    pub fn paced(fps: u32) -> Self {
        Self {
            step_duration: Some(Duration::from_micros(1_000_000 / u64::from(fps.max(1)))),
            last_step: Instant::now(),
        }
    }

    pub fn unpaced() -> Self {
        Self {
            step_duration: None,
            last_step: Instant::now(),
        }
    }

    pub fn new(fps: u32, realtime: bool) -> Self {
        if realtime {
            Self::paced(fps)
        } else {
            Self::unpaced()
        }
    }

    pub fn is_paced(&self) -> bool {
        self.step_duration.is_some()
    }

    /// Block until the next tick is due
    pub fn tick(&mut self) {
        if let Some(step) = self.step_duration {
            let elapsed = self.last_step.elapsed();
            if elapsed < step {
                thread::sleep(step - elapsed);
            }
            self.last_step = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpaced_does_not_sleep() {
        let mut clock = FrameClock::new(30, false);
        assert!(!clock.is_paced());
        let start = Instant::now();
        for _ in 0..1000 {
            clock.tick();
        }
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_paced_holds_rate() {
        let mut clock = FrameClock::paced(200);
        let start = Instant::now();
        for _ in 0..10 {
            clock.tick();
        }
        assert!(start.elapsed() >= Duration::from_millis(45));
    }
}
