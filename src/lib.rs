//! # Quantally
//!
//! Interchangeable streaming quantile accumulators.
//!
//! A quantile accumulator ingests an unbounded stream of `f64` observations
//! and answers two queries at any time: the value at a cumulative
//! probability (quantile) and the cumulative probability at a value (CDF).
//! The four implementations cover the whole memory/accuracy spectrum, from
//! storing everything to storing nothing:
//!
//! - **Exact**: [`FullStorageAccumulator`] keeps every observation sorted
//! - **Sketched**: [`TDigestAccumulator`] compresses the stream into
//!   centroids with accuracy concentrated at the tails
//! - **Binned**: [`FixedBinsAccumulator`] counts into a pre-declared
//!   equal-width grid
//! - **Parametric**: [`NoStorageAccumulator`] assumes normality and reads
//!   running moments from the caller
//!
//! All four implement the [`QuantileAccumulator`](traits::QuantileAccumulator)
//! trait, so the owning statistic stays polymorphic over the choice.
//!
//! ## Quick start
//!
//! ```rust
//! use quantally::prelude::*;
//!
//! let mut moments = RunningMoments::new();
//! let mut digest = TDigestAccumulator::with_default_compression();
//!
//! for i in 0..10_000 {
//!     let latency_ms = (i % 100) as f64;
//!     moments.add(latency_ms);
//!     digest.register(latency_ms);
//! }
//!
//! let p99 = digest.quantile(&moments, 0.99).unwrap();
//! println!("p99 latency: {:.1} ms", p99);
//! ```
//!
//! ## Contract highlights
//!
//! - Probabilities outside `[0, 1]` (including NaN and infinities) are
//!   rejected with [`AccumulatorError::InvalidProbability`](traits::AccumulatorError)
//! - Queries on an empty accumulator return `Ok(f64::NAN)` — a sentinel,
//!   not an error
//! - `initialize()` resets ingested data while keeping construction
//!   parameters
//! - No accumulator locks internally; concurrent use requires external
//!   mutual exclusion
//!
//! ## Feature flags
//!
//! - `serde`: serialization support for accumulator state

pub mod accumulators;
pub mod context;
pub mod traits;

pub mod prelude {
    pub use crate::accumulators::{
        FixedBinsAccumulator, FullStorageAccumulator, NoStorageAccumulator, TDigestAccumulator,
    };
    pub use crate::context::RunningMoments;
    pub use crate::traits::{AccumulatorError, QuantileAccumulator, StatisticsContext};
}

pub use accumulators::{
    Centroid, FixedBinsAccumulator, FullStorageAccumulator, NoStorageAccumulator,
    TDigestAccumulator,
};
pub use context::RunningMoments;
pub use traits::{AccumulatorError, QuantileAccumulator, StatisticsContext};
