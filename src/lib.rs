//! Type reduction for interval type-2 fuzzy logic systems.
//!
//! An interval type-2 output is described by an [`IntervalSet`]: primary
//! values `[left, right]` each weighted by a membership interval
//! `[lower, upper]`. Type reduction collapses it into a [`ReducedInterval`]
//! (or, for BMM, LBMM and NT, a single number) with one of the algorithms in
//! [`algorithms`].
//!
//! ```
//! use it2_type_reduction::{Algorithm, IntervalSet, TypeReducer};
//!
//! let intervals: IntervalSet = [
//!     [1., 2., 0.2, 0.6],
//!     [2., 3., 0.5, 0.9],
//!     [3., 4., 0.1, 0.4],
//! ]
//! .into_iter()
//! .collect();
//!
//! let reduction = TypeReducer::default().with_algorithm(Algorithm::Ekm).reduce(&intervals).unwrap();
//! let (left, right) = reduction.bounds();
//!
//! assert!(1. <= left && left <= right && right <= 4.);
//! ```

pub mod aggregation;
pub mod algorithms;
pub mod backend;
mod domain;
mod error;
mod interval;
mod math;
pub mod ops;
mod reducer;
mod set;

pub use aggregation::{Aggregation, ConsequentKey, Consequents, Fired};
pub use algorithms::Algorithm;
pub use backend::{Accelerated, Backend, BackendKind, Reference};
pub use domain::domain;
pub use error::{Result, TypeReductionError};
pub use interval::{crisp, crisp_all, trim, validate, Interval, IntervalSet, ReducedInterval, Reduction};
pub use ops::{SNorm, TNorm};
pub use reducer::{ReducerConfig, TypeReducer};
pub use set::{Firing, It2Set};
