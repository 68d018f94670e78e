//! Quantile accumulator implementations
//!
//! Four interchangeable implementations of
//! [`QuantileAccumulator`](crate::traits::QuantileAccumulator), from exact
//! and memory-hungry to approximate and memory-free:
//!
//! - [`FullStorageAccumulator`]: stores every observation; exact quantiles
//! - [`TDigestAccumulator`]: compressed centroid sketch; bounded memory
//! - [`FixedBinsAccumulator`]: equal-width histogram over a declared range
//! - [`NoStorageAccumulator`]: Gaussian approximation from running moments
//!
//! # Example
//!
//! ```
//! use quantally::prelude::*;
//!
//! let mut moments = RunningMoments::new();
//! let mut digest = TDigestAccumulator::with_default_compression();
//!
//! for i in 1..=1000 {
//!     let value = i as f64;
//!     moments.add(value);
//!     digest.register(value);
//! }
//!
//! let median = digest.quantile(&moments, 0.5).unwrap();
//! assert!((median - 500.5).abs() < 10.0);
//! ```

mod fixed_bins;
mod full_storage;
mod no_storage;
mod tdigest;

pub use fixed_bins::FixedBinsAccumulator;
pub use full_storage::FullStorageAccumulator;
pub use no_storage::NoStorageAccumulator;
pub use tdigest::{Centroid, TDigestAccumulator};
