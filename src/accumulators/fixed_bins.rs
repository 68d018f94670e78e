//! Equal-width histogram quantile accumulator

use crate::traits::{
    validate_probability, AccumulatorError, QuantileAccumulator, StatisticsContext,
};

/// Quantile accumulator over a fixed grid of equal-width bins
///
/// The value range is declared at construction time as `bin_count` bins of
/// width `bin_width`, with bin `i` centered at
/// `first_bin_center + i * bin_width` and covering
/// `[center - width/2, center + width/2)`. Observations outside the grid are
/// tallied in separate below-range and above-range counters. Memory is
/// constant in the stream length and queries interpolate linearly inside a
/// bin's span.
///
/// Out-of-range observations have no known position, only a side. The
/// convention here: for quantile queries their mass collapses onto the
/// nearest edge of the grid, and for CDF queries a value below the grid
/// reports 0 while a value at or beyond its end reports 1.
///
/// # Example
///
/// ```
/// use quantally::prelude::*;
///
/// // Five bins centered 5.0, 5.5, ..., 7.0
/// let mut acc = FixedBinsAccumulator::new(5.0, 0.5, 5).unwrap();
/// let moments = RunningMoments::new();
///
/// acc.register(5.7); // falls in the bin centered at 5.5
///
/// let p = acc.cumulative_probability(&moments, 5.5).unwrap();
/// assert!((p - 0.5).abs() < 1e-12);
/// ```
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FixedBinsAccumulator {
    /// Center of bin 0; bin `i` is centered at `first_bin_center + i * bin_width`
    first_bin_center: f64,
    bin_width: f64,
    /// Per-bin observation counts
    bins: Vec<u64>,
    /// Observations that fell below bin 0's span
    below_count: u64,
    /// Observations that fell beyond the last bin's span
    above_count: u64,
    /// Total observations, including out-of-range ones
    total: u64,
}

impl FixedBinsAccumulator {
    /// Create an accumulator with `bin_count` bins of width `bin_width`,
    /// bin 0 centered at `first_bin_center`
    ///
    /// Errors with [`AccumulatorError::InvalidBinGeometry`] when the center
    /// is NaN or infinite, the width is NaN, infinite, or non-positive, or
    /// `bin_count` is zero.
    pub fn new(
        first_bin_center: f64,
        bin_width: f64,
        bin_count: usize,
    ) -> Result<Self, AccumulatorError> {
        if !first_bin_center.is_finite()
            || !bin_width.is_finite()
            || bin_width <= 0.0
            || bin_count == 0
        {
            return Err(AccumulatorError::InvalidBinGeometry {
                first_bin_center,
                bin_width,
                bin_count,
            });
        }

        Ok(Self {
            first_bin_center,
            bin_width,
            bins: vec![0; bin_count],
            below_count: 0,
            above_count: 0,
            total: 0,
        })
    }

    /// Number of bins
    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    /// Width of every bin
    pub fn bin_width(&self) -> f64 {
        self.bin_width
    }

    /// Center of bin `index`
    ///
    /// Errors with [`AccumulatorError::BinIndexOutOfRange`] when `index` is
    /// not in `[0, bin_count)`.
    pub fn bin_center(&self, index: usize) -> Result<f64, AccumulatorError> {
        if index >= self.bins.len() {
            return Err(AccumulatorError::BinIndexOutOfRange {
                index,
                bin_count: self.bins.len(),
            });
        }
        Ok(self.first_bin_center + index as f64 * self.bin_width)
    }

    /// Observation count of bin `index`
    pub fn bin_observation_count(&self, index: usize) -> Result<u64, AccumulatorError> {
        if index >= self.bins.len() {
            return Err(AccumulatorError::BinIndexOutOfRange {
                index,
                bin_count: self.bins.len(),
            });
        }
        Ok(self.bins[index])
    }

    /// Observations that fell below the grid
    pub fn below_count(&self) -> u64 {
        self.below_count
    }

    /// Observations that fell beyond the grid
    pub fn above_count(&self) -> u64 {
        self.above_count
    }

    /// Total observations ingested, in and out of range
    pub fn count(&self) -> u64 {
        self.total
    }

    /// Lower edge of bin 0's span
    fn grid_start(&self) -> f64 {
        self.first_bin_center - self.bin_width / 2.0
    }

    /// Upper edge of the last bin's span
    fn grid_end(&self) -> f64 {
        self.first_bin_center + (self.bins.len() - 1) as f64 * self.bin_width
            + self.bin_width / 2.0
    }
}

impl QuantileAccumulator for FixedBinsAccumulator {
    fn register(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }

        // Nearest-center assignment, rounding half up so each span is
        // closed on the left and open on the right
        let offset = ((value - self.first_bin_center) / self.bin_width + 0.5).floor();
        if offset < 0.0 {
            self.below_count += 1;
        } else if offset >= self.bins.len() as f64 {
            self.above_count += 1;
        } else {
            self.bins[offset as usize] += 1;
        }
        self.total += 1;
    }

    fn quantile(
        &self,
        _context: &dyn StatisticsContext,
        probability: f64,
    ) -> Result<f64, AccumulatorError> {
        validate_probability(probability)?;

        if self.total == 0 {
            return Ok(f64::NAN);
        }

        let target = probability * self.total as f64;
        let mut cumulative = self.below_count as f64;

        if self.below_count > 0 && target <= cumulative {
            return Ok(self.grid_start());
        }

        for (i, &count) in self.bins.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let next = cumulative + count as f64;
            if target <= next {
                let fraction = if target <= cumulative {
                    0.0
                } else {
                    (target - cumulative) / count as f64
                };
                let left_edge =
                    self.first_bin_center + i as f64 * self.bin_width - self.bin_width / 2.0;
                return Ok(left_edge + fraction * self.bin_width);
            }
            cumulative = next;
        }

        // Remaining mass fell beyond the grid
        Ok(self.grid_end())
    }

    fn cumulative_probability(
        &self,
        _context: &dyn StatisticsContext,
        value: f64,
    ) -> Result<f64, AccumulatorError> {
        if self.total == 0 || value.is_nan() {
            return Ok(f64::NAN);
        }

        let start = self.grid_start();
        if value < start {
            return Ok(0.0);
        }
        if value >= self.grid_end() {
            return Ok(1.0);
        }

        let index = (((value - start) / self.bin_width).floor() as usize).min(self.bins.len() - 1);
        let in_range: u64 = self.bins[..index].iter().sum();
        let bin_left_edge = start + index as f64 * self.bin_width;
        let fraction = ((value - bin_left_edge) / self.bin_width).clamp(0.0, 1.0);

        let cumulative =
            self.below_count as f64 + in_range as f64 + fraction * self.bins[index] as f64;
        Ok(cumulative / self.total as f64)
    }

    fn initialize(&mut self) {
        self.bins.iter_mut().for_each(|c| *c = 0);
        self.below_count = 0;
        self.above_count = 0;
        self.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::RunningMoments;

    fn ctx() -> RunningMoments {
        RunningMoments::new()
    }

    #[test]
    fn construction_validation_matrix() {
        for center in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(
                    FixedBinsAccumulator::new(center, 0.5, 5),
                    Err(AccumulatorError::InvalidBinGeometry { .. })
                ),
                "center={} should be rejected",
                center
            );
        }
        for width in [f64::NAN, 0.0, -1.0, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(
                    FixedBinsAccumulator::new(5.0, width, 5),
                    Err(AccumulatorError::InvalidBinGeometry { .. })
                ),
                "width={} should be rejected",
                width
            );
        }
        assert!(matches!(
            FixedBinsAccumulator::new(5.0, 0.5, 0),
            Err(AccumulatorError::InvalidBinGeometry { .. })
        ));

        assert!(FixedBinsAccumulator::new(5.0, 0.5, 5).is_ok());
    }

    #[test]
    fn bin_centers_and_index_bounds() {
        let acc = FixedBinsAccumulator::new(5.0, 0.5, 5).unwrap();

        assert_eq!(acc.bin_center(0).unwrap(), 5.0);
        assert_eq!(acc.bin_center(4).unwrap(), 7.0);
        assert!(matches!(
            acc.bin_center(5),
            Err(AccumulatorError::BinIndexOutOfRange {
                index: 5,
                bin_count: 5
            })
        ));
    }

    #[test]
    fn register_routes_to_bins_and_range_counters() {
        let mut acc = FixedBinsAccumulator::new(5.0, 0.5, 5).unwrap();

        acc.register(5.7); // bin 1 (centered 5.5)
        acc.register(5.0); // bin 0
        acc.register(4.0); // below 4.75
        acc.register(8.0); // above 7.25
        acc.register(7.2); // bin 4 (centered 7.0)

        assert_eq!(acc.bin_observation_count(0).unwrap(), 1);
        assert_eq!(acc.bin_observation_count(1).unwrap(), 1);
        assert_eq!(acc.bin_observation_count(4).unwrap(), 1);
        assert_eq!(acc.below_count(), 1);
        assert_eq!(acc.above_count(), 1);
        assert_eq!(acc.count(), 5);
    }

    #[test]
    fn bin_spans_are_closed_left_open_right() {
        let mut acc = FixedBinsAccumulator::new(5.0, 0.5, 5).unwrap();
        acc.register(4.75); // left edge of bin 0
        acc.register(5.25); // left edge of bin 1, excluded from bin 0
        acc.register(7.25); // right edge of the grid

        assert_eq!(acc.bin_observation_count(0).unwrap(), 1);
        assert_eq!(acc.bin_observation_count(1).unwrap(), 1);
        assert_eq!(acc.above_count(), 1);
        assert_eq!(acc.below_count(), 0);
    }

    #[test]
    fn count_invariant_holds() {
        let mut acc = FixedBinsAccumulator::new(0.0, 1.0, 10).unwrap();
        for i in -5..20 {
            acc.register(i as f64 * 0.7);
        }

        let in_bins: u64 = (0..acc.bin_count())
            .map(|i| acc.bin_observation_count(i).unwrap())
            .sum();
        assert_eq!(acc.count(), acc.below_count() + acc.above_count() + in_bins);
    }

    #[test]
    fn cdf_boundary_law() {
        // Spec calibration: one observation at 5.7 in the bin spanning
        // [5.25, 5.75)
        let mut acc = FixedBinsAccumulator::new(5.0, 0.5, 5).unwrap();
        acc.register(5.7);
        let c = ctx();

        assert_eq!(acc.cumulative_probability(&c, 5.2).unwrap(), 0.0);
        assert_eq!(acc.cumulative_probability(&c, 5.5).unwrap(), 0.5);
        assert_eq!(acc.cumulative_probability(&c, 5.8).unwrap(), 1.0);
        assert_eq!(acc.cumulative_probability(&c, 25.8).unwrap(), 1.0);
    }

    #[test]
    fn cdf_quarter_way_offset() {
        let mut acc = FixedBinsAccumulator::new(5.0, 0.5, 5).unwrap();
        acc.register(5.5);
        acc.register(5.5);
        let c = ctx();

        // Quarter-way into the bin span [5.25, 5.75): offset = count/(4n)
        let p = acc.cumulative_probability(&c, 5.375).unwrap();
        assert!((p - 0.25).abs() < 1e-12, "p={}", p);
    }

    #[test]
    fn quantile_interpolates_within_bin() {
        let mut acc = FixedBinsAccumulator::new(5.0, 0.5, 5).unwrap();
        for _ in 0..4 {
            acc.register(5.5);
        }
        let c = ctx();

        // All mass in the bin spanning [5.25, 5.75)
        assert_eq!(acc.quantile(&c, 0.0).unwrap(), 5.25);
        assert_eq!(acc.quantile(&c, 0.5).unwrap(), 5.5);
        assert_eq!(acc.quantile(&c, 1.0).unwrap(), 5.75);

        let q = acc.quantile(&c, 0.25).unwrap();
        assert!((q - 5.375).abs() < 1e-12, "q={}", q);
    }

    #[test]
    fn quantile_spans_multiple_bins() {
        let mut acc = FixedBinsAccumulator::new(0.0, 1.0, 3).unwrap();
        acc.register(0.0); // bin 0
        acc.register(1.0); // bin 1
        acc.register(1.0);
        acc.register(2.0); // bin 2
        let c = ctx();

        // p = 0.25 lands exactly on the edge between bin 0 and bin 1
        assert_eq!(acc.quantile(&c, 0.25).unwrap(), 0.5);
        // p = 0.5 is halfway through bin 1's two observations
        assert_eq!(acc.quantile(&c, 0.5).unwrap(), 1.0);
        assert_eq!(acc.quantile(&c, 1.0).unwrap(), 2.5);
    }

    #[test]
    fn out_of_range_mass_collapses_to_grid_edges() {
        let mut acc = FixedBinsAccumulator::new(0.0, 1.0, 3).unwrap();
        acc.register(-10.0);
        acc.register(1.0);
        acc.register(10.0);
        let c = ctx();

        assert_eq!(acc.quantile(&c, 0.0).unwrap(), -0.5);
        assert_eq!(acc.quantile(&c, 1.0).unwrap(), 2.5);
    }

    #[test]
    fn empty_returns_nan() {
        let acc = FixedBinsAccumulator::new(0.0, 1.0, 3).unwrap();
        assert!(acc.quantile(&ctx(), 0.5).unwrap().is_nan());
        assert!(acc.cumulative_probability(&ctx(), 1.0).unwrap().is_nan());
    }

    #[test]
    fn invalid_probability_rejected() {
        let mut acc = FixedBinsAccumulator::new(0.0, 1.0, 3).unwrap();
        acc.register(1.0);
        for p in [-0.001, 1.001, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(
                    acc.quantile(&ctx(), p),
                    Err(AccumulatorError::InvalidProbability(_))
                ),
                "p={} should be rejected",
                p
            );
        }
    }

    #[test]
    fn initialize_preserves_geometry() {
        let mut acc = FixedBinsAccumulator::new(5.0, 0.5, 5).unwrap();
        acc.register(5.7);
        acc.register(100.0);
        acc.initialize();

        assert_eq!(acc.count(), 0);
        assert_eq!(acc.below_count(), 0);
        assert_eq!(acc.above_count(), 0);
        assert_eq!(acc.bin_count(), 5);
        assert_eq!(acc.bin_center(2).unwrap(), 6.0);
        assert!(acc.quantile(&ctx(), 0.5).unwrap().is_nan());
    }
}
