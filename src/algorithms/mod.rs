//! The type reduction algorithms.
//!
//! Every algorithm consumes an unordered slice of [`Interval`]s. Two-sided
//! algorithms sort and trim their own copy once per side and return a
//! [`ReducedInterval`](crate::ReducedInterval); BMM, LBMM and NT return a crisp
//! number.

use std::fmt;
use std::str::FromStr;

use fixed_map::Key;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeReductionError};
use crate::interval::{trim_by, Interval, Reduction};

mod closed_form;
mod eiasc;
mod karnik_mendel;

pub use closed_form::{bmm, lbmm, nt, wm};
pub use eiasc::eiasc;
pub use karnik_mendel::{ekm, km, twekm, wekm};
pub(crate) use karnik_mendel::initial_switch_point;

/// Selects a type reduction algorithm. EIASC is the default.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Key, PartialEq, Serialize, Deserialize)]
pub enum Algorithm {
    /// Karnik-Mendel
    #[serde(rename = "KM")]
    Km,
    /// Enhanced Karnik-Mendel
    #[serde(rename = "EKM")]
    Ekm,
    /// Weighted EKM, one multiplier per interval
    #[serde(rename = "WEKM")]
    Wekm,
    /// WEKM with the trapezoidal multipliers `[0.5, 1, .., 1, 0.5]`
    #[serde(rename = "TWEKM")]
    Twekm,
    /// Enhanced iterative algorithm with stop condition
    #[default]
    #[serde(rename = "EIASC")]
    Eiasc,
    /// Wu-Mendel uncertainty bounds
    #[serde(rename = "WM")]
    Wm,
    /// Begian-Melek-Mendel
    #[serde(rename = "BMM")]
    Bmm,
    /// BMM extended by Li et al.
    #[serde(rename = "LBMM")]
    Lbmm,
    /// Nie-Tan
    #[serde(rename = "NT")]
    Nt,
}

impl Algorithm {
    pub const ALL: [Algorithm; 9] = [
        Self::Km,
        Self::Ekm,
        Self::Wekm,
        Self::Twekm,
        Self::Eiasc,
        Self::Wm,
        Self::Bmm,
        Self::Lbmm,
        Self::Nt,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Km => "KM",
            Self::Ekm => "EKM",
            Self::Wekm => "WEKM",
            Self::Twekm => "TWEKM",
            Self::Eiasc => "EIASC",
            Self::Wm => "WM",
            Self::Bmm => "BMM",
            Self::Lbmm => "LBMM",
            Self::Nt => "NT",
        }
    }

    /// Whether the output is a `[left, right]` interval rather than a crisp number
    pub fn is_two_sided(self) -> bool {
        !matches!(self, Self::Bmm | Self::Lbmm | Self::Nt)
    }

    /// Whether the algorithm reads caller supplied parameters
    pub fn takes_params(self) -> bool {
        matches!(self, Self::Wekm | Self::Bmm | Self::Lbmm)
    }

    /// Runs the reference implementation of this algorithm.
    pub fn call(self, intervals: &[Interval], params: &[f64]) -> Result<Reduction> {
        self.reference()(intervals, params)
    }

    /// The reference implementation of this algorithm
    pub(crate) fn reference(self) -> ReduceFn {
        match self {
            Self::Km => |intervals, _| km(intervals).map(Reduction::from),
            Self::Ekm => |intervals, _| ekm(intervals).map(Reduction::from),
            Self::Wekm => |intervals, params| wekm(intervals, params).map(Reduction::from),
            Self::Twekm => |intervals, _| twekm(intervals).map(Reduction::from),
            Self::Eiasc => |intervals, _| eiasc(intervals).map(Reduction::from),
            Self::Wm => |intervals, _| wm(intervals).map(Reduction::from),
            Self::Bmm => |intervals, params| {
                let (m, n) = mixing_params(params)?;

                bmm(intervals, m, n).map(Reduction::Crisp)
            },
            Self::Lbmm => |intervals, params| {
                let (m, n) = mixing_params(params)?;

                lbmm(intervals, m, n).map(Reduction::Crisp)
            },
            Self::Nt => |intervals, _| nt(intervals).map(Reduction::Crisp),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = TypeReductionError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().trim_end_matches("_algorithm");

        Self::ALL
            .into_iter()
            .find(|algorithm| algorithm.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| TypeReductionError::invalid_argument("algorithm", format!("unknown algorithm {s:?}")))
    }
}

pub(crate) type ReduceFn = fn(&[Interval], &[f64]) -> Result<Reduction>;

/// Reads the `m, n` coefficients of BMM and LBMM
pub(crate) fn mixing_params(params: &[f64]) -> Result<(f64, f64)> {
    match *params {
        [m, n] if m.is_finite() && n.is_finite() => Ok((m, n)),
        [_, _] => Err(TypeReductionError::invalid_argument(
            "params",
            "mixing coefficients must be finite",
        )),
        _ => Err(TypeReductionError::length_mismatch("params", 2, params.len())),
    }
}

/// Iteration cap for the switch point searches. Monotone convergence needs at
/// most `n + 1` rounds, so exceeding this means the input was malformed.
#[inline]
pub(crate) fn max_iterations(n: usize) -> usize {
    2 * n.max(2)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Side {
    /// Minimizes the centroid over `left` values
    Left,
    /// Maximizes the centroid over `right` values
    Right,
}

/// One side of a reduction: intervals sorted ascending by the side's value,
/// trimmed, and split into the weight used before the switch point (`lead`)
/// and the weight used from the switch point on (`trail`).
///
/// For the left side `lead` is the upper weight, for the right side it is the
/// lower weight, so both sides share [`Pass::centroid`] and
/// [`Pass::switch_point`].
#[derive(Clone, Debug)]
pub(crate) struct Pass {
    pub(crate) side: Side,
    pub(crate) x: Vec<f64>,
    pub(crate) lead: Vec<f64>,
    pub(crate) trail: Vec<f64>,
}

impl Pass {
    pub(crate) fn new(intervals: &[Interval], side: Side) -> Option<Self> {
        Self::build(intervals.iter().map(|interval| (*interval, 1.)), side)
    }

    /// Like [`Pass::new`], with each interval's weights scaled by its multiplier
    pub(crate) fn scaled(intervals: &[Interval], scales: &[f64], side: Side) -> Option<Self> {
        Self::build(intervals.iter().copied().zip(scales.iter().copied()), side)
    }

    fn build(weighted: impl Iterator<Item = (Interval, f64)>, side: Side) -> Option<Self> {
        let mut samples: Vec<[f64; 4]> = weighted
            .map(|(interval, scale)| {
                let value = match side {
                    Side::Left => interval.left,
                    Side::Right => interval.right,
                };

                [value, interval.lower, interval.upper, scale]
            })
            .collect();

        samples.sort_by(|a, b| {
            a.iter()
                .zip(b)
                .map(|(a, b)| a.total_cmp(b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let samples = trim_by(&samples, |s| s[1], |s| s[2])?;
        let mut pass = Pass {
            side,
            x: Vec::with_capacity(samples.len()),
            lead: Vec::with_capacity(samples.len()),
            trail: Vec::with_capacity(samples.len()),
        };

        for &[value, lower, upper, scale] in samples {
            let (lead, trail) = match side {
                Side::Left => (upper, lower),
                Side::Right => (lower, upper),
            };

            pass.x.push(value);
            pass.lead.push(lead * scale);
            pass.trail.push(trail * scale);
        }

        Some(pass)
    }

    pub(crate) fn len(&self) -> usize {
        self.x.len()
    }

    /// The single remaining value when trimming left one interval
    pub(crate) fn single(&self) -> Option<f64> {
        match self.x[..] {
            [value] => Some(value),
            _ => None,
        }
    }

    /// Weighted average with `lead` weights on the first `k` intervals and
    /// `trail` weights on the rest
    pub(crate) fn centroid(&self, k: usize) -> f64 {
        let (num, den) = self.sums(k);

        num / den
    }

    /// Numerator and denominator of [`Pass::centroid`]
    pub(crate) fn sums(&self, k: usize) -> (f64, f64) {
        let mut num = 0.;
        let mut den = 0.;

        for i in 0..self.len() {
            let w = if i < k { self.lead[i] } else { self.trail[i] };

            num += self.x[i] * w;
            den += w;
        }

        (num, den)
    }

    /// Switch point for the estimate `y`: the `k` in `1..n` with
    /// `x[k - 1] < y <= x[k]`, clamped to the ends when `y` lies outside
    pub(crate) fn switch_point(&self, y: f64) -> usize {
        self.x.partition_point(|&value| value < y).clamp(1, self.len() - 1)
    }

    /// Whether `candidate` is a strictly better bound than `current`: lower on
    /// the left side, higher on the right
    pub(crate) fn improves(&self, candidate: f64, current: f64) -> bool {
        match self.side {
            Side::Left => candidate < current,
            Side::Right => candidate > current,
        }
    }
}

#[test]
fn test_algorithm_names_round_trip() {
    for algorithm in Algorithm::ALL {
        assert_eq!(algorithm.name().parse::<Algorithm>(), Ok(algorithm));
        assert_eq!(algorithm.to_string(), algorithm.name());
    }

    assert_eq!("eiasc".parse::<Algorithm>(), Ok(Algorithm::Eiasc));
    assert_eq!("KM_algorithm".parse::<Algorithm>(), Ok(Algorithm::Km));
    assert!("SIMPSON".parse::<Algorithm>().is_err());
    assert_eq!(Algorithm::default(), Algorithm::Eiasc);
}

#[test]
fn test_pass_sorts_and_trims() {
    let intervals = [
        Interval::new(4., 5., 0., 0.),
        Interval::new(3., 6., 0.2, 0.4),
        Interval::new(1., 2., 0.1, 0.3),
        Interval::new(0., 9., 0., 0.),
    ];

    let left = Pass::new(&intervals, Side::Left).unwrap();
    let right = Pass::new(&intervals, Side::Right).unwrap();

    assert_eq!(left.x, vec![1., 3.]);
    assert_eq!(left.lead, vec![0.3, 0.4]);
    assert_eq!(left.trail, vec![0.1, 0.2]);
    // Zero-weight intervals inside the span stay
    assert_eq!(right.x, vec![2., 5., 6.]);
    assert_eq!(right.lead, vec![0.1, 0., 0.2]);
    assert_eq!(right.trail, vec![0.3, 0., 0.4]);
    assert!(Pass::new(&intervals[..1], Side::Left).is_none());
}

#[test]
fn test_switch_point() {
    let intervals: Vec<Interval> = (0..5).map(|i| Interval::point(i as f64, 0.5, 1.)).collect();
    let pass = Pass::new(&intervals, Side::Left).unwrap();

    assert_eq!(pass.switch_point(0.5), 1);
    assert_eq!(pass.switch_point(2.5), 3);
    assert_eq!(pass.switch_point(2.0), 2);
    assert_eq!(pass.switch_point(-1.), 1);
    assert_eq!(pass.switch_point(9.), 4);
    // Just above a sample point belongs to the bracket above it
    assert_eq!(pass.switch_point(2. + 5e-7), 3);
    assert_eq!(pass.switch_point(2. - 5e-7), 2);
}

#[test]
fn test_reference_dispatch_matches_free_functions() {
    let intervals = [Interval::point(1., 0.2, 0.6), Interval::point(4., 0.5, 0.9)];

    assert_eq!(Algorithm::Km.call(&intervals, &[]), km(&intervals).map(Reduction::from));
    assert_eq!(Algorithm::Nt.call(&intervals, &[]), nt(&intervals).map(Reduction::Crisp));
    assert_eq!(
        Algorithm::Bmm.call(&intervals, &[0.3, 0.7]),
        bmm(&intervals, 0.3, 0.7).map(Reduction::Crisp)
    );
    assert!(Algorithm::Lbmm.call(&intervals, &[0.3]).is_err());
}

#[test]
fn test_mixing_params() {
    assert_eq!(mixing_params(&[0.3, 0.7]), Ok((0.3, 0.7)));
    assert!(mixing_params(&[0.3]).is_err());
    assert!(mixing_params(&[0.3, f64::NAN]).is_err());
}
