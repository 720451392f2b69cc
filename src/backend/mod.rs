//! Interchangeable implementations of the reduction contract.
//!
//! A [`Backend`] maps an [`Algorithm`] and an interval slice to a
//! [`Reduction`]. [`Reference`] runs the plain algorithms; [`Accelerated`]
//! swaps in faster versions of KM, EKM, EIASC and WM that agree with the
//! reference to within `1e-6`. Which one runs is a configuration choice
//! (see [`BackendKind`]), callers never change.

use std::fmt;
use std::sync::OnceLock;

use fixed_map::Map;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::algorithms::{Algorithm, ReduceFn};
use crate::error::Result;
use crate::interval::{Interval, Reduction};

mod accelerated;

/// Something that can type-reduce an interval set with any [`Algorithm`].
pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    fn reduce(&self, algorithm: Algorithm, intervals: &[Interval], params: &[f64]) -> Result<Reduction>;
}

/// The straightforward implementations in [`crate::algorithms`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Reference;

impl Backend for Reference {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn reduce(&self, algorithm: Algorithm, intervals: &[Interval], params: &[f64]) -> Result<Reduction> {
        algorithm.call(intervals, params)
    }
}

/// Prefix-sum and binary-search versions of KM, EKM and EIASC plus a two-pass
/// WM. Other algorithms fall through to [`Reference`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Accelerated;

impl Backend for Accelerated {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn reduce(&self, algorithm: Algorithm, intervals: &[Interval], params: &[f64]) -> Result<Reduction> {
        let reduce = accelerated_table()
            .get(algorithm)
            .copied()
            .unwrap_or_else(|| algorithm.reference());

        reduce(intervals, params)
    }
}

/// The algorithms with an accelerated version, keyed by algorithm
fn accelerated_table() -> &'static Map<Algorithm, ReduceFn> {
    static TABLE: OnceLock<Map<Algorithm, ReduceFn>> = OnceLock::new();

    TABLE.get_or_init(|| {
        let mut table: Map<Algorithm, ReduceFn> = Map::new();

        table.insert(Algorithm::Km, |intervals, _| accelerated::km(intervals).map(Reduction::from));
        table.insert(Algorithm::Ekm, |intervals, _| accelerated::ekm(intervals).map(Reduction::from));
        table.insert(Algorithm::Eiasc, |intervals, _| {
            accelerated::eiasc(intervals).map(Reduction::from)
        });
        table.insert(Algorithm::Wm, |intervals, _| accelerated::wm(intervals).map(Reduction::from));

        debug!("accelerated backend overrides KM, EKM, EIASC and WM");

        table
    })
}

/// Serializable choice of backend.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Reference,
    Accelerated,
}

impl BackendKind {
    pub fn backend(self) -> &'static dyn Backend {
        match self {
            Self::Reference => &Reference,
            Self::Accelerated => &Accelerated,
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backend().name())
    }
}

#[test]
fn test_backend_kind_names() {
    assert_eq!(BackendKind::default(), BackendKind::Reference);
    assert_eq!(BackendKind::Reference.to_string(), "reference");
    assert_eq!(BackendKind::Accelerated.to_string(), "accelerated");
}

#[test]
fn test_accelerated_falls_through_to_reference() {
    let intervals = [Interval::point(1., 0.2, 0.6), Interval::point(4., 0.5, 0.9)];

    assert!(accelerated_table().contains_key(Algorithm::Eiasc));
    assert!(!accelerated_table().contains_key(Algorithm::Nt));

    for algorithm in [Algorithm::Twekm, Algorithm::Nt] {
        assert_eq!(
            Accelerated.reduce(algorithm, &intervals, &[]),
            Reference.reduce(algorithm, &intervals, &[])
        );
    }
}

#[test]
fn test_backends_agree_on_fixture() {
    let intervals: Vec<Interval> = [
        [1., 2., 0., 0.],
        [1., 2., 3., 4.],
        [2., 3., 4., 5.],
        [3., 4., 5., 6.],
        [4., 5., 6., 7.],
        [1., 2., 0., 0.],
        [0., 2., 10., 10.],
    ]
    .into_iter()
    .map(Interval::from)
    .collect();

    for algorithm in Algorithm::ALL {
        let params: Vec<f64> = match algorithm {
            Algorithm::Wekm => vec![1.; intervals.len()],
            Algorithm::Bmm | Algorithm::Lbmm => vec![0.5, 0.5],
            _ => Vec::new(),
        };
        let (left, right) = Reference.reduce(algorithm, &intervals, &params).unwrap().bounds();
        let (fast_left, fast_right) = Accelerated.reduce(algorithm, &intervals, &params).unwrap().bounds();

        assert!((left - fast_left).abs() < 1e-6, "{algorithm} left: {left} vs {fast_left}");
        assert!((right - fast_right).abs() < 1e-6, "{algorithm} right: {right} vs {fast_right}");
    }
}
