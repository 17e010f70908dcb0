//! Timing utilities
//!
//! This module provides a timer that logs how long a table operation took,
//! escalating the log level once a threshold is crossed.

use std::time::{Duration, Instant};
use std::fmt::{Display, Formatter, Result as FmtResult};
use log::{debug, info};

/// Timer for measuring execution time
#[derive(Debug, Clone)]
pub struct Timer {
    /// Name of the timer
    name: String,
    
    /// Start time
    start: Instant,
    
    /// Optional slow threshold
    threshold: Option<Duration>,
}

impl Timer {
    /// Create a new timer with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Timer {
            name: name.into(),
            start: Instant::now(),
            threshold: None,
        }
    }
    
    /// Set the threshold above which the operation is reported as slow
    pub fn with_threshold(mut self, threshold: Duration) -> Self {
        self.threshold = Some(threshold);
        self
    }
    
    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
    
    /// Check if the timer has exceeded its threshold
    pub fn is_slow(&self) -> bool {
        match self.threshold {
            Some(threshold) => self.elapsed() > threshold,
            None => false,
        }
    }
    
    /// Log the elapsed time, at info level when slow and debug otherwise
    pub fn log(&self, message: impl Into<String>) {
        let msg = format!("{} {}: {:?}", self.name, message.into(), self.elapsed());
        
        if self.is_slow() {
            info!("{} [SLOW]", msg);
        } else {
            debug!("{}", msg);
        }
    }
}

impl Display for Timer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}: {:?}", self.name, self.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    
    #[test]
    fn test_timer_basic() {
        let timer = Timer::new("test_timer");
        thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
        assert!(timer.to_string().starts_with("test_timer: "));
    }
    
    #[test]
    fn test_timer_threshold() {
        let timer = Timer::new("test_timer").with_threshold(Duration::from_millis(50));
        assert!(!timer.is_slow());
        
        thread::sleep(Duration::from_millis(60));
        assert!(timer.is_slow());
        timer.log("completed");
        
        // Without a threshold nothing is ever slow
        assert!(!Timer::new("unbounded").is_slow());
    }
}
