//! Core traits for quantile accumulators
//!
//! All accumulators implement the [`QuantileAccumulator`] capability trait.
//! Implementations that approximate the distribution from running moments
//! read those moments through the narrow [`StatisticsContext`] interface.

use core::fmt::Debug;

/// Error raised by accumulator constructors and queries
///
/// Every variant corresponds to a caller mistake; a failed call never leaves
/// the accumulator partially mutated. "No data ingested yet" is deliberately
/// *not* an error — queries on an empty accumulator return `Ok(f64::NAN)`.
#[derive(Debug, Clone, PartialEq)]
pub enum AccumulatorError {
    /// Probability outside `[0, 1]`, NaN, or infinite
    InvalidProbability(f64),
    /// Bin geometry with non-finite center, non-positive or non-finite
    /// width, or zero bins
    InvalidBinGeometry {
        first_bin_center: f64,
        bin_width: f64,
        bin_count: usize,
    },
    /// Compression that is not finite and positive
    InvalidCompression(f64),
    /// Bin index outside `[0, bin_count)`
    BinIndexOutOfRange { index: usize, bin_count: usize },
    /// Digests with different compression cannot be merged
    IncompatibleCompression { expected: f64, found: f64 },
}

impl core::fmt::Display for AccumulatorError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AccumulatorError::InvalidProbability(p) => {
                write!(f, "probability must be in [0, 1], got {}", p)
            }
            AccumulatorError::InvalidBinGeometry {
                first_bin_center,
                bin_width,
                bin_count,
            } => {
                write!(
                    f,
                    "invalid bin geometry: center={}, width={}, count={}",
                    first_bin_center, bin_width, bin_count
                )
            }
            AccumulatorError::InvalidCompression(c) => {
                write!(f, "compression must be finite and positive, got {}", c)
            }
            AccumulatorError::BinIndexOutOfRange { index, bin_count } => {
                write!(f, "bin index {} out of range for {} bins", index, bin_count)
            }
            AccumulatorError::IncompatibleCompression { expected, found } => {
                write!(
                    f,
                    "incompatible compression: expected {}, found {}",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for AccumulatorError {}

/// Read-only view of the running statistics maintained by the owning
/// statistic object
///
/// Accumulators never compute moments themselves; the owner tracks them and
/// hands accumulators this narrow interface. Only the Gaussian
/// [`NoStorageAccumulator`](crate::accumulators::NoStorageAccumulator)
/// actually reads the moments — the others consult `count()` at most.
pub trait StatisticsContext {
    /// Number of observations ingested by the owning statistic
    fn count(&self) -> u64;

    /// Running mean of the ingested observations
    fn mean(&self) -> f64;

    /// Running sample standard deviation of the ingested observations
    fn std_dev(&self) -> f64;
}

/// Streaming quantile estimation capability
///
/// The four implementations trade memory for accuracy in different ways:
///
/// | Accumulator | Memory | Accuracy |
/// |-------------|--------|----------|
/// | [`FullStorageAccumulator`](crate::accumulators::FullStorageAccumulator) | O(n) | exact |
/// | [`TDigestAccumulator`](crate::accumulators::TDigestAccumulator) | O(compression) | bounded, best at tails |
/// | [`FixedBinsAccumulator`](crate::accumulators::FixedBinsAccumulator) | O(bins) | bounded by bin width |
/// | [`NoStorageAccumulator`](crate::accumulators::NoStorageAccumulator) | O(1) | Gaussian assumption |
///
/// Callers hold a `&mut dyn QuantileAccumulator` (or a concrete type) and
/// stay substitutable across all four.
///
/// # Contract
///
/// - `register` ingests one observation; NaN observations are ignored to
///   prevent poisoning the estimate.
/// - `quantile`/`cumulative_probability` reject invalid probabilities with
///   [`AccumulatorError::InvalidProbability`] and return `Ok(f64::NAN)` when
///   no data has been ingested (the empty-state sentinel).
/// - `initialize` returns the accumulator to its freshly constructed state,
///   keeping construction parameters.
///
/// # Thread safety
///
/// Accumulators perform no internal locking. Sharing one instance across
/// threads requires external mutual exclusion around every call.
pub trait QuantileAccumulator: Debug {
    /// Ingest a single observation
    fn register(&mut self, value: f64);

    /// Value at cumulative probability `probability`
    ///
    /// Errors when `probability` is NaN, infinite, or outside `[0, 1]`.
    /// Returns `Ok(f64::NAN)` when no data has been ingested.
    fn quantile(
        &self,
        context: &dyn StatisticsContext,
        probability: f64,
    ) -> Result<f64, AccumulatorError>;

    /// Cumulative probability at `value`, in `[0, 1]`
    ///
    /// Returns `Ok(f64::NAN)` when no data has been ingested or when `value`
    /// is NaN.
    fn cumulative_probability(
        &self,
        context: &dyn StatisticsContext,
        value: f64,
    ) -> Result<f64, AccumulatorError>;

    /// Discard all ingested data, keeping construction parameters
    fn initialize(&mut self);
}

/// Reject probabilities outside `[0, 1]`, NaN, and infinities
///
/// Shared by every accumulator so the rejection behavior cannot drift.
pub(crate) fn validate_probability(probability: f64) -> Result<(), AccumulatorError> {
    if probability.is_nan() || !(0.0..=1.0).contains(&probability) {
        return Err(AccumulatorError::InvalidProbability(probability));
    }
    Ok(())
}
