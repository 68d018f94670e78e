//! t-digest quantile accumulator
//!
//! A t-digest summarizes a stream as a small ordered set of centroids
//! (mean, weight). Centroid sizes are governed by the k1 arcsine scale
//! function, which keeps clusters small near the extremes and lets them grow
//! toward the median — the defining t-digest property that concentrates
//! accuracy in the tails.
//!
//! # Performance note
//!
//! Incoming values land in a buffer and are only merged into centroids when
//! the buffer fills or a query arrives. Queries take `&self`, so the flush
//! happens through interior mutability (`RefCell`) rather than by cloning
//! the digest per query.
//!
//! # Thread safety
//!
//! `TDigestAccumulator` is `Send` but **not `Sync`** because of the internal
//! `RefCell`. Shared access requires an external lock, consistent with the
//! single-threaded contract of
//! [`QuantileAccumulator`](crate::traits::QuantileAccumulator).

use core::cell::RefCell;

use crate::traits::{
    validate_probability, AccumulatorError, QuantileAccumulator, StatisticsContext,
};

/// Compression used by [`TDigestAccumulator::with_default_compression`]
pub const DEFAULT_COMPRESSION: f64 = 100.0;

/// A cluster of nearby observations, summarized by mean and weight
#[derive(Clone, Debug, PartialEq)]
pub struct Centroid {
    /// Mean of the clustered observations
    pub mean: f64,
    /// Number of observations in the cluster
    pub weight: u64,
}

impl Centroid {
    /// Create a centroid from a mean and weight
    pub fn new(mean: f64, weight: u64) -> Self {
        Self { mean, weight }
    }

    /// Fold another cluster into this one, keeping the weighted mean
    fn absorb(&mut self, mean: f64, weight: u64) {
        let combined = self.weight + weight;
        self.mean =
            (self.mean * self.weight as f64 + mean * weight as f64) / combined as f64;
        self.weight = combined;
    }
}

/// Mutable digest state behind the `RefCell`
#[derive(Clone, Debug)]
struct DigestState {
    /// Centroids in ascending mean order once compressed
    centroids: Vec<Centroid>,
    /// Raw values awaiting their first merge
    buffer: Vec<f64>,
}

/// Bounded-memory quantile accumulator based on Dunning's merging t-digest
///
/// Memory is O(compression) regardless of stream length. Estimation error
/// shrinks roughly in inverse proportion to the compression parameter and is
/// smallest near the extremes.
///
/// # Example
///
/// ```
/// use quantally::prelude::*;
///
/// let mut digest = TDigestAccumulator::new(100.0).unwrap();
/// let moments = RunningMoments::new();
///
/// for i in 1..=1000 {
///     digest.register(i as f64);
/// }
///
/// let p99 = digest.quantile(&moments, 0.99).unwrap();
/// assert!(p99 > 950.0 && p99 <= 1000.0);
/// ```
#[derive(Debug)]
pub struct TDigestAccumulator {
    compression: f64,
    state: RefCell<DigestState>,
    /// Buffered values before a forced merge
    buffer_capacity: usize,
    /// Total ingested weight
    count: u64,
    min: f64,
    max: f64,
}

impl Clone for TDigestAccumulator {
    fn clone(&self) -> Self {
        Self {
            compression: self.compression,
            state: RefCell::new(self.state.borrow().clone()),
            buffer_capacity: self.buffer_capacity,
            count: self.count,
            min: self.min,
            max: self.max,
        }
    }
}

impl Default for TDigestAccumulator {
    fn default() -> Self {
        Self::with_default_compression()
    }
}

impl TDigestAccumulator {
    /// Create a digest with the given compression parameter
    ///
    /// Higher compression keeps more centroids: better accuracy, more
    /// memory. Typical values are 100–1000.
    ///
    /// Errors with [`AccumulatorError::InvalidCompression`] unless
    /// `compression` is finite and positive.
    pub fn new(compression: f64) -> Result<Self, AccumulatorError> {
        if !compression.is_finite() || compression <= 0.0 {
            return Err(AccumulatorError::InvalidCompression(compression));
        }

        let buffer_capacity = (compression * 2.0) as usize;
        Ok(Self {
            compression,
            state: RefCell::new(DigestState {
                centroids: Vec::with_capacity(compression as usize),
                buffer: Vec::with_capacity(buffer_capacity),
            }),
            buffer_capacity,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        })
    }

    /// Create a digest with compression [`DEFAULT_COMPRESSION`]
    pub fn with_default_compression() -> Self {
        Self::new(DEFAULT_COMPRESSION).expect("default compression is valid")
    }

    /// The compression parameter
    pub fn compression(&self) -> f64 {
        self.compression
    }

    /// Total ingested weight
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Smallest ingested value, `None` when empty
    pub fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    /// Largest ingested value, `None` when empty
    pub fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }

    /// Current number of centroids, excluding still-buffered values
    pub fn centroid_count(&self) -> usize {
        self.state.borrow().centroids.len()
    }

    /// Force the buffer into centroids now
    pub fn compress(&mut self) {
        Self::flush(self.state.get_mut(), self.compression);
    }

    /// Merge another digest into this one
    ///
    /// Errors with [`AccumulatorError::IncompatibleCompression`] when the
    /// two digests were built with different compression (beyond a relative
    /// tolerance that forgives serialization drift).
    pub fn merge(&mut self, other: &Self) -> Result<(), AccumulatorError> {
        let avg = (self.compression + other.compression) * 0.5;
        if avg > 0.0 && (self.compression - other.compression).abs() / avg > 1e-6 {
            return Err(AccumulatorError::IncompatibleCompression {
                expected: self.compression,
                found: other.compression,
            });
        }

        let state = self.state.get_mut();
        let other_state = other.state.borrow();

        let mut combined = core::mem::take(&mut state.centroids);
        combined.extend(other_state.centroids.iter().cloned());
        combined.extend(state.buffer.drain(..).map(|v| Centroid::new(v, 1)));
        combined.extend(other_state.buffer.iter().map(|&v| Centroid::new(v, 1)));
        combined.sort_by(|a, b| a.mean.total_cmp(&b.mean));

        state.centroids = Self::merge_ordered(combined, self.compression);
        self.count += other.count;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);

        Ok(())
    }

    /// Ingest one value; NaN is ignored
    fn ingest(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }

        // get_mut bypasses the RefCell check since we hold &mut self
        let state = self.state.get_mut();
        state.buffer.push(value);
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        if state.buffer.len() >= self.buffer_capacity {
            Self::flush(state, self.compression);
        }
    }

    /// Merge buffered values into the centroid set
    fn flush(state: &mut DigestState, compression: f64) {
        if state.buffer.is_empty() {
            return;
        }

        state.buffer.sort_by(|a, b| a.total_cmp(b));
        let mut combined: Vec<Centroid> = state
            .buffer
            .drain(..)
            .map(|v| Centroid::new(v, 1))
            .collect();

        if !state.centroids.is_empty() {
            combined.extend(state.centroids.drain(..));
            combined.sort_by(|a, b| a.mean.total_cmp(&b.mean));
        }

        state.centroids = Self::merge_ordered(combined, compression);
    }

    /// Flush from a `&self` query path via the `RefCell`
    fn flush_for_query(&self) {
        if self.state.borrow().buffer.is_empty() {
            return;
        }
        let mut state = self.state.borrow_mut();
        Self::flush(&mut state, self.compression);
    }

    /// Recompress a mean-ordered centroid list under the k-scale limit
    ///
    /// Adjacent clusters are merged while the k-scale span of the combined
    /// cluster stays within one unit, which is what concentrates resolution
    /// at the tails.
    fn merge_ordered(ordered: Vec<Centroid>, compression: f64) -> Vec<Centroid> {
        if ordered.is_empty() {
            return Vec::new();
        }

        let total_weight: u64 = ordered.iter().map(|c| c.weight).sum();
        let mut merged = Vec::with_capacity((compression * 2.0) as usize);

        let mut current = ordered[0].clone();
        let mut weight_before = 0u64;

        for candidate in ordered.into_iter().skip(1) {
            let proposed = current.weight + candidate.weight;
            let q0 = weight_before as f64 / total_weight as f64;
            let q1 = (weight_before + proposed) as f64 / total_weight as f64;

            if Self::k_scale(q1, compression) - Self::k_scale(q0, compression) <= 1.0 {
                current.absorb(candidate.mean, candidate.weight);
            } else {
                weight_before += current.weight;
                merged.push(current);
                current = candidate;
            }
        }

        merged.push(current);
        merged
    }

    /// k1 scale function: `k(q) = δ·(asin(2q−1)/π + ½)`
    ///
    /// The argument is clamped to [-1, 1] so floating-point drift in the
    /// cumulative weights cannot produce NaN.
    #[inline]
    fn k_scale(q: f64, compression: f64) -> f64 {
        let x = (2.0 * q - 1.0).clamp(-1.0, 1.0);
        compression * (x.asin() / core::f64::consts::PI + 0.5)
    }

    /// Quantile over a compressed centroid list
    ///
    /// The distribution is modeled as a piecewise-linear curve through each
    /// centroid's midpoint in cumulative-weight space —
    /// `(weight_before + weight/2, mean)` — anchored at `(0, min)` and
    /// `(count, max)`. Unit-weight centroids therefore act as point masses.
    fn quantile_from(centroids: &[Centroid], count: u64, min: f64, max: f64, p: f64) -> f64 {
        debug_assert!(count > 0);

        if centroids.is_empty() {
            // Everything was still buffered and empty: interpolate the range
            return min + (max - min) * p;
        }
        if p <= 0.0 {
            return min;
        }
        if p >= 1.0 {
            return max;
        }

        let target = p * count as f64;
        let mut prev_rank = 0.0_f64;
        let mut prev_value = min;
        let mut cumulative = 0.0_f64;

        for centroid in centroids {
            let mid_rank = cumulative + centroid.weight as f64 / 2.0;
            if target < mid_rank {
                let span = mid_rank - prev_rank;
                if span <= 0.0 {
                    return prev_value;
                }
                let t = (target - prev_rank) / span;
                return prev_value + t * (centroid.mean - prev_value);
            }
            cumulative += centroid.weight as f64;
            prev_rank = mid_rank;
            prev_value = centroid.mean;
        }

        // Past the last midpoint: interpolate toward max
        let span = count as f64 - prev_rank;
        if span <= 0.0 {
            return max;
        }
        let t = (target - prev_rank) / span;
        prev_value + t * (max - prev_value)
    }

    /// Cumulative probability, the inverse walk of [`Self::quantile_from`]
    fn cdf_from(centroids: &[Centroid], count: u64, min: f64, max: f64, value: f64) -> f64 {
        debug_assert!(count > 0);

        // >= max checked first so min == max (all values equal) yields 1.0
        if value >= max {
            return 1.0;
        }
        if value <= min {
            return 0.0;
        }

        if centroids.is_empty() {
            let span = max - min;
            if span <= 0.0 {
                return 0.5;
            }
            return (value - min) / span;
        }

        let mut prev_rank = 0.0_f64;
        let mut prev_value = min;
        let mut cumulative = 0.0_f64;

        for centroid in centroids {
            let mid_rank = cumulative + centroid.weight as f64 / 2.0;
            if value < centroid.mean {
                let span = centroid.mean - prev_value;
                if span <= 0.0 {
                    return prev_rank / count as f64;
                }
                let t = (value - prev_value) / span;
                return (prev_rank + t * (mid_rank - prev_rank)) / count as f64;
            }
            cumulative += centroid.weight as f64;
            prev_rank = mid_rank;
            prev_value = centroid.mean;
        }

        let span = max - prev_value;
        if span <= 0.0 {
            return 1.0;
        }
        let t = (value - prev_value) / span;
        (prev_rank + t * (count as f64 - prev_rank)) / count as f64
    }
}

impl QuantileAccumulator for TDigestAccumulator {
    fn register(&mut self, value: f64) {
        self.ingest(value);
    }

    fn quantile(
        &self,
        _context: &dyn StatisticsContext,
        probability: f64,
    ) -> Result<f64, AccumulatorError> {
        validate_probability(probability)?;

        if self.count == 0 {
            return Ok(f64::NAN);
        }

        self.flush_for_query();
        let state = self.state.borrow();
        Ok(Self::quantile_from(
            &state.centroids,
            self.count,
            self.min,
            self.max,
            probability,
        ))
    }

    fn cumulative_probability(
        &self,
        _context: &dyn StatisticsContext,
        value: f64,
    ) -> Result<f64, AccumulatorError> {
        if self.count == 0 || value.is_nan() {
            return Ok(f64::NAN);
        }

        self.flush_for_query();
        let state = self.state.borrow();
        Ok(Self::cdf_from(
            &state.centroids,
            self.count,
            self.min,
            self.max,
            value,
        ))
    }

    fn initialize(&mut self) {
        let state = self.state.get_mut();
        state.centroids.clear();
        state.buffer.clear();
        self.count = 0;
        self.min = f64::INFINITY;
        self.max = f64::NEG_INFINITY;
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TDigestAccumulator {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let state = self.state.borrow();
        let mut s = serializer.serialize_struct("TDigestAccumulator", 6)?;
        s.serialize_field("compression", &self.compression)?;
        s.serialize_field("centroids", &state.centroids)?;
        s.serialize_field("buffer", &state.buffer)?;
        s.serialize_field("count", &self.count)?;
        s.serialize_field("min", &self.min)?;
        s.serialize_field("max", &self.max)?;
        s.end()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Centroid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeTuple;
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.mean)?;
        tuple.serialize_element(&self.weight)?;
        tuple.end()
    }
}
