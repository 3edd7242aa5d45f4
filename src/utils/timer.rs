//! Timer utilities
//!
//! Elapsed time for progress counters and per-suite lap times for the
//! batch summary.

use std::time::{Duration, Instant};

/// Simple timer for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
    label: String,
}

impl Timer {
    /// Create and start a new timer
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// Stopwatch recording one lap per finished suite
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    last: Instant,
    laps: Vec<(String, Duration)>,
}

impl Stopwatch {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            laps: Vec::new(),
        }
    }

    /// Close the current lap and store its own duration
    pub fn lap(&mut self, label: impl Into<String>) -> Duration {
        let now = Instant::now();
        let lap = now - self.last;
        self.last = now;
        self.laps.push((label.into(), lap));
        lap
    }

    pub fn total(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn laps(&self) -> &[(String, Duration)] {
        &self.laps
    }

    /// Laps ordered from slowest to fastest
    pub fn slowest(&self, limit: usize) -> Vec<(String, Duration)> {
        let mut laps = self.laps.clone();
        laps.sort_by(|a, b| b.1.cmp(&a.1));
        laps.truncate(limit);
        laps
    }

    pub fn format(&self) -> String {
        let mut output = String::new();
        for (label, duration) in &self.laps {
            output.push_str(&format!("{}: {}ms\n", label, duration.as_millis()));
        }
        output.push_str(&format!("Total: {}ms", self.total().as_millis()));
        output
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_timer() {
        let timer = Timer::start("All tests");
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 10);
        assert_eq!(timer.label(), "All tests");
    }

    #[test]
    fn test_stopwatch_laps_are_not_cumulative() {
        let mut sw = Stopwatch::new();
        sleep(Duration::from_millis(20));
        let first = sw.lap("SuiteA");
        sleep(Duration::from_millis(5));
        let second = sw.lap("SuiteB");

        assert_eq!(sw.laps().len(), 2);
        assert!(first >= Duration::from_millis(20));
        assert!(second < first + Duration::from_millis(5));
        assert_eq!(sw.slowest(1)[0].0, "SuiteA");
        assert!(sw.format().ends_with("ms"));
    }
}
