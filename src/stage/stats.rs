//! Running latency statistics
//!
//! Only the count, the sum and the sum of squares are kept, so mean and variance
//! are O(1) to report without retaining samples.

use std::time::Duration;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StageStats {
    pub count: u64,
    /// Sum of elapsed seconds
    pub sum_t: f64,
    /// Sum of squared elapsed seconds
    pub sum_t2: f64,
}

impl StageStats {
    pub fn record(&mut self, elapsed: Duration) {
        self.record_secs(elapsed.as_secs_f64());
    }

    pub fn record_secs(&mut self, t: f64) {
        self.count += 1;
        self.sum_t += t;
        self.sum_t2 += t * t;
    }

    /// Mean seconds per call; NaN before the first call.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        self.sum_t / self.count as f64
    }

    /// Population variance, clamped at zero against rounding.
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            return f64::NAN;
        }
        let mean = self.mean();
        (self.sum_t2 / self.count as f64 - mean * mean).max(0.0)
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }
}
