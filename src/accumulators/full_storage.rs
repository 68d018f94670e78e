//! Exact quantiles from full observation storage

use crate::traits::{
    validate_probability, AccumulatorError, QuantileAccumulator, StatisticsContext,
};

/// Quantile accumulator that stores every observation
///
/// Keeps all ingested values in a sorted vector and answers queries from
/// exact order statistics. Memory grows linearly with the stream; this is
/// the ground-truth implementation the approximate accumulators are
/// calibrated against.
///
/// Insertion keeps the vector sorted (binary search + shift), so `register`
/// is O(n) in the worst case — the accepted cost of exactness.
///
/// # Quantile semantics
///
/// `quantile(p)` linearly interpolates at position `p * (N - 1)` over the
/// sorted values (the "inclusive" scheme, equivalent to NumPy's default
/// `linear` method). `cumulative_probability(v)` uses the midpoint rule for
/// ties: `(count_below + count_equal / 2) / N`, so for three observations of
/// `10.0` the CDF at `10.0` is `0.5`.
///
/// # Example
///
/// ```
/// use quantally::prelude::*;
///
/// let moments = RunningMoments::new();
/// let mut acc = FullStorageAccumulator::new();
///
/// for v in [4.0, 1.0, 3.0, 2.0, 5.0] {
///     acc.register(v);
/// }
///
/// assert_eq!(acc.quantile(&moments, 0.5).unwrap(), 3.0);
/// assert_eq!(acc.quantile(&moments, 0.25).unwrap(), 2.0);
/// ```
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FullStorageAccumulator {
    /// All ingested values, kept sorted ascending
    values: Vec<f64>,
}

impl FullStorageAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    /// Number of observations ingested
    pub fn count(&self) -> usize {
        self.values.len()
    }

    /// Check if no observations have been ingested
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest ingested value
    pub fn min(&self) -> Option<f64> {
        self.values.first().copied()
    }

    /// Largest ingested value
    pub fn max(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// The ingested values in ascending order
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

impl QuantileAccumulator for FullStorageAccumulator {
    fn register(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }

        let pos = self.values.partition_point(|&v| v < value);
        self.values.insert(pos, value);
    }

    fn quantile(
        &self,
        _context: &dyn StatisticsContext,
        probability: f64,
    ) -> Result<f64, AccumulatorError> {
        validate_probability(probability)?;

        let n = self.values.len();
        if n == 0 {
            return Ok(f64::NAN);
        }
        if n == 1 {
            return Ok(self.values[0]);
        }

        let pos = probability * (n - 1) as f64;
        let lower = pos.floor() as usize;
        let upper = pos.ceil() as usize;
        if lower == upper {
            return Ok(self.values[lower]);
        }

        let fraction = pos - lower as f64;
        Ok(self.values[lower] + fraction * (self.values[upper] - self.values[lower]))
    }

    fn cumulative_probability(
        &self,
        _context: &dyn StatisticsContext,
        value: f64,
    ) -> Result<f64, AccumulatorError> {
        let n = self.values.len();
        if n == 0 || value.is_nan() {
            return Ok(f64::NAN);
        }

        let below = self.values.partition_point(|&v| v < value);
        let at_or_below = self.values.partition_point(|&v| v <= value);
        let equal = at_or_below - below;

        Ok((below as f64 + equal as f64 / 2.0) / n as f64)
    }

    fn initialize(&mut self) {
        self.values.clear();
    }
}
