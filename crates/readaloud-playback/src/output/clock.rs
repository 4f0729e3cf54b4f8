use std::time::{Duration, Instant};

/// Monotonic clock that can be paused.
#[derive(Debug, Clone)]
pub struct PausableClock {
    accumulated: Duration,
    running_since: Option<Instant>,
}

impl PausableClock {
    pub fn new(paused: bool) -> Self {
        Self {
            accumulated: Duration::ZERO,
            running_since: (!paused).then(Instant::now),
        }
    }

    pub fn now(&self) -> f64 {
        let running = self.running_since.map_or(Duration::ZERO, |since| since.elapsed());
        (self.accumulated + running).as_secs_f64()
    }

    pub const fn is_paused(&self) -> bool {
        self.running_since.is_none()
    }

    pub fn pause(&mut self) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += since.elapsed();
        }
    }

    pub fn resume(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_clock_does_not_advance() {
        let mut clock = PausableClock::new(true);
        assert!(clock.is_paused());
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.now().abs() < f64::EPSILON);

        clock.resume();
        std::thread::sleep(Duration::from_millis(5));
        clock.pause();
        let frozen = clock.now();
        assert!(frozen >= 0.004);
        std::thread::sleep(Duration::from_millis(5));
        assert!((clock.now() - frozen).abs() < f64::EPSILON);
    }
}
