//! Zero-memory Gaussian quantile approximation

use statrs::distribution::{ContinuousCDF, Normal};

use crate::traits::{
    validate_probability, AccumulatorError, QuantileAccumulator, StatisticsContext,
};

/// Quantile accumulator that stores nothing
///
/// Assumes the observed distribution is normal and answers every query from
/// the mean and standard deviation tracked by the caller's
/// [`StatisticsContext`]. `register` is a no-op; memory cost is zero.
///
/// Appropriate when observations are known to be roughly Gaussian, or when
/// a coarse estimate is worth more than any extra memory.
///
/// # Example
///
/// ```
/// use quantally::prelude::*;
///
/// let mut moments = RunningMoments::new();
/// let acc = NoStorageAccumulator::new();
///
/// for v in [8.0, 9.0, 10.0, 11.0, 12.0] {
///     moments.add(v);
/// }
///
/// // Median of a normal distribution is its mean
/// let median = acc.quantile(&moments, 0.5).unwrap();
/// assert!((median - 10.0).abs() < 1e-9);
/// ```
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoStorageAccumulator;

impl NoStorageAccumulator {
    /// Create a new no-storage accumulator
    pub fn new() -> Self {
        Self
    }

    fn standard_normal() -> Normal {
        Normal::new(0.0, 1.0).expect("standard normal parameters are valid")
    }
}

impl QuantileAccumulator for NoStorageAccumulator {
    /// No-op: the caller's running moments carry all retained information
    fn register(&mut self, _value: f64) {}

    fn quantile(
        &self,
        context: &dyn StatisticsContext,
        probability: f64,
    ) -> Result<f64, AccumulatorError> {
        validate_probability(probability)?;

        if context.count() == 0 {
            return Ok(f64::NAN);
        }

        let mean = context.mean();
        let std_dev = context.std_dev();
        if std_dev == 0.0 {
            // Degenerate distribution: all mass at the mean
            return Ok(mean);
        }

        // Inverse-CDF limits at the endpoints
        if probability == 0.0 {
            return Ok(f64::NEG_INFINITY);
        }
        if probability == 1.0 {
            return Ok(f64::INFINITY);
        }

        Ok(mean + std_dev * Self::standard_normal().inverse_cdf(probability))
    }

    fn cumulative_probability(
        &self,
        context: &dyn StatisticsContext,
        value: f64,
    ) -> Result<f64, AccumulatorError> {
        if context.count() == 0 || value.is_nan() {
            return Ok(f64::NAN);
        }

        let mean = context.mean();
        let std_dev = context.std_dev();
        if std_dev == 0.0 {
            // Step function around the single observed value
            return Ok(if value < mean {
                0.0
            } else if value > mean {
                1.0
            } else {
                0.5
            });
        }

        Ok(Self::standard_normal().cdf((value - mean) / std_dev))
    }

    /// No-op: there is no ingested state to discard
    fn initialize(&mut self) {}
}
