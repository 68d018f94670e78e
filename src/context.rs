//! Running moments for the statistics context
//!
//! Accumulators that approximate the distribution from moments (the
//! Gaussian [`NoStorageAccumulator`](crate::accumulators::NoStorageAccumulator))
//! read mean and standard deviation through
//! [`StatisticsContext`](crate::traits::StatisticsContext). [`RunningMoments`]
//! is the canonical provider: a single-pass Welford accumulator the owning
//! statistic updates alongside its quantile accumulator.
//!
//! # Example
//!
//! ```
//! use quantally::RunningMoments;
//!
//! let mut moments = RunningMoments::new();
//! for value in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
//!     moments.add(value);
//! }
//!
//! assert!((moments.mean() - 5.0).abs() < 1e-9);
//! assert!((moments.population_variance() - 4.0).abs() < 1e-9);
//! ```

use crate::traits::StatisticsContext;

/// Single-pass mean/variance tracker using Welford's algorithm
///
/// Numerically stable against catastrophic cancellation; O(1) memory.
/// NaN observations are ignored, matching the accumulators' `register`
/// convention, so moments and quantile estimates stay in step when both are
/// fed the same stream.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunningMoments {
    count: u64,
    mean: f64,
    /// Sum of squared differences from the mean (Welford's M2)
    m2: f64,
}

impl RunningMoments {
    /// Create an empty moments tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one observation
    pub fn add(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }

        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Number of (non-NaN) observations ingested
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Check if no observations have been ingested
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Running mean, or 0 when empty
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Unbiased sample variance (Bessel's correction), or 0 with fewer than
    /// two observations
    pub fn sample_variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// Population variance, or 0 when empty
    pub fn population_variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Sample standard deviation
    pub fn sample_std_dev(&self) -> f64 {
        self.sample_variance().sqrt()
    }

    /// Population standard deviation
    pub fn population_std_dev(&self) -> f64 {
        self.population_variance().sqrt()
    }

    /// Reset to the empty state
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl StatisticsContext for RunningMoments {
    fn count(&self) -> u64 {
        self.count
    }

    fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation — the usual convention for a statistic that
    /// observes a sample of an ongoing process
    fn std_dev(&self) -> f64 {
        self.sample_std_dev()
    }
}
