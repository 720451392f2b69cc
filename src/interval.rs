use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeReductionError};

/// One element of a discretized interval type-2 output: a primary value range
/// `[left, right]` weighted by a membership range `[lower, upper]`.
///
/// Centroid-style reduction places both values on the same domain point.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub left: f64,
    pub right: f64,
    pub lower: f64,
    pub upper: f64,
}

impl Interval {
    pub fn new(left: f64, right: f64, lower: f64, upper: f64) -> Self {
        Self {
            left,
            right,
            lower,
            upper,
        }
    }

    /// An interval whose primary range collapses to a single point
    pub fn point(value: f64, lower: f64, upper: f64) -> Self {
        Self::new(value, value, lower, upper)
    }

    pub fn midpoint(&self) -> f64 {
        (self.left + self.right) / 2.
    }

    fn check(&self, index: usize) -> Result<()> {
        let fields = [
            ("left value", self.left),
            ("right value", self.right),
            ("lower weight", self.lower),
            ("upper weight", self.upper),
        ];

        for (name, value) in fields {
            if !value.is_finite() {
                return Err(TypeReductionError::invalid_element(
                    "intervals",
                    index,
                    format!("{name} is not finite ({value})"),
                ));
            }
        }

        if self.lower < 0. {
            return Err(TypeReductionError::invalid_element(
                "intervals",
                index,
                format!("lower weight {} is negative", self.lower),
            ));
        }
        if self.lower > self.upper {
            return Err(TypeReductionError::invalid_element(
                "intervals",
                index,
                format!("lower weight {} exceeds upper weight {}", self.lower, self.upper),
            ));
        }
        if self.left > self.right {
            return Err(TypeReductionError::invalid_element(
                "intervals",
                index,
                format!("left value {} exceeds right value {}", self.left, self.right),
            ));
        }

        Ok(())
    }
}

impl From<[f64; 4]> for Interval {
    fn from([left, right, lower, upper]: [f64; 4]) -> Self {
        Self::new(left, right, lower, upper)
    }
}

impl From<(f64, f64, f64, f64)> for Interval {
    fn from((left, right, lower, upper): (f64, f64, f64, f64)) -> Self {
        Self::new(left, right, lower, upper)
    }
}

/// An unordered bag of intervals; every algorithm sorts its own copy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalSet(Vec<Interval>);

impl IntervalSet {
    pub fn new() -> Self {
        IntervalSet(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        IntervalSet(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, interval: impl Into<Interval>) {
        self.0.push(interval.into());
    }

    pub fn into_inner(self) -> Vec<Interval> {
        self.0
    }
}

impl Deref for IntervalSet {
    type Target = [Interval];

    fn deref(&self) -> &[Interval] {
        &self.0
    }
}

impl<I: Into<Interval>> FromIterator<I> for IntervalSet {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        IntervalSet(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<Interval>> for IntervalSet {
    fn from(intervals: Vec<Interval>) -> Self {
        IntervalSet(intervals)
    }
}

/// Rejects empty input and any interval that breaks
/// `0 <= lower <= upper`, `left <= right` or holds a non-finite value.
pub fn validate(intervals: &[Interval]) -> Result<()> {
    if intervals.is_empty() {
        return Err(TypeReductionError::EmptyInput);
    }

    intervals
        .iter()
        .enumerate()
        .try_for_each(|(i, interval)| interval.check(i))
}

/// Drops the zero-weight intervals at both ends of an already sorted slice.
///
/// The kept span starts at the first nonzero upper (or lower) weight and ends at
/// the last one. Returns `None` when no upper weight is nonzero.
pub fn trim(intervals: &[Interval]) -> Option<&[Interval]> {
    trim_by(intervals, |i| i.lower, |i| i.upper)
}

pub(crate) fn trim_by<T>(items: &[T], lower: impl Fn(&T) -> f64, upper: impl Fn(&T) -> f64) -> Option<&[T]> {
    let first_upper = items.iter().position(|item| upper(item) > 0.)?;
    let last_upper = items.iter().rposition(|item| upper(item) > 0.)?;
    let (start, end) = match (
        items.iter().position(|item| lower(item) > 0.),
        items.iter().rposition(|item| lower(item) > 0.),
    ) {
        (Some(first_lower), Some(last_lower)) => (first_upper.min(first_lower), last_upper.max(last_lower)),
        _ => (first_upper, last_upper),
    };

    Some(&items[start..=end])
}

/// The type-reduced set `[left, right]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReducedInterval {
    pub left: f64,
    pub right: f64,
}

impl ReducedInterval {
    /// Neutral output used when no rule fired
    pub const ZERO: Self = Self { left: 0., right: 0. };

    pub fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    pub fn crisp(&self) -> f64 {
        crisp(self.left, self.right)
    }
}

/// Output of a type reduction algorithm. Most algorithms produce an interval,
/// BMM, LBMM and NT go straight to a crisp number.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Reduction {
    Interval(ReducedInterval),
    Crisp(f64),
}

impl Reduction {
    pub fn crisp(&self) -> f64 {
        match self {
            Self::Interval(interval) => interval.crisp(),
            Self::Crisp(value) => *value,
        }
    }

    pub fn interval(&self) -> Option<ReducedInterval> {
        match self {
            Self::Interval(interval) => Some(*interval),
            Self::Crisp(_) => None,
        }
    }

    /// The reduced bounds, with a crisp output read as a degenerate interval
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Self::Interval(interval) => (interval.left, interval.right),
            Self::Crisp(value) => (*value, *value),
        }
    }
}

impl From<ReducedInterval> for Reduction {
    fn from(interval: ReducedInterval) -> Self {
        Self::Interval(interval)
    }
}

/// Crisp number of a type-reduced interval: its midpoint
pub fn crisp(left: f64, right: f64) -> f64 {
    (left + right) / 2.
}

/// Crisp numbers for a batch of reductions, e.g. one per evaluated input
pub fn crisp_all(reductions: impl IntoIterator<Item = Reduction>) -> Vec<f64> {
    reductions.into_iter().map(|reduction| reduction.crisp()).collect()
}

#[test]
fn test_validate_rejects_bad_weights() {
    let inverted = [Interval::point(1., 0.2, 0.4), Interval::point(2., 0.5, 0.3)];
    let negative = [Interval::point(1., -0.1, 0.4)];
    let nan = [Interval::new(f64::NAN, 1., 0.1, 0.4)];
    let crossed = [Interval::new(3., 2., 0.1, 0.4)];

    assert_eq!(
        validate(&inverted),
        Err(TypeReductionError::invalid_element(
            "intervals",
            1,
            "lower weight 0.5 exceeds upper weight 0.3"
        ))
    );
    assert!(matches!(
        validate(&negative),
        Err(TypeReductionError::InvalidArgument { index: Some(0), .. })
    ));
    assert!(matches!(
        validate(&nan),
        Err(TypeReductionError::InvalidArgument { index: Some(0), .. })
    ));
    assert!(matches!(
        validate(&crossed),
        Err(TypeReductionError::InvalidArgument { index: Some(0), .. })
    ));
    assert_eq!(validate(&[]), Err(TypeReductionError::EmptyInput));
    assert_eq!(validate(&[Interval::point(5., 0.3, 0.7)]), Ok(()));
}

#[test]
fn test_trim() {
    let intervals = [
        Interval::point(0., 0., 0.),
        Interval::point(1., 0., 0.2),
        Interval::point(2., 0., 0.),
        Interval::point(3., 0.1, 0.5),
        Interval::point(4., 0., 0.),
        Interval::point(5., 0., 0.),
    ];

    let trimmed = trim(&intervals).unwrap();

    assert_eq!(trimmed, &intervals[1..4]);
    assert_eq!(trim(trimmed), Some(trimmed));
    assert_eq!(trim(&intervals[4..]), None);
    assert_eq!(trim(&[]), None);
}

#[test]
fn test_crisp() {
    let reduced = ReducedInterval::new(0.1, 0.3);

    assert!((reduced.crisp() - 0.2).abs() < 1e-12);
    assert_eq!(Reduction::Crisp(4.).crisp(), 4.);
    assert_eq!(Reduction::Crisp(4.).bounds(), (4., 4.));
    assert_eq!(Reduction::from(reduced).interval(), Some(reduced));
    assert_eq!(
        crisp_all([Reduction::Crisp(1.), ReducedInterval::new(2., 4.).into()]),
        vec![1., 3.]
    );
}

#[test]
fn test_interval_set_collects() {
    let set: IntervalSet = [[1., 2., 0., 0.5], [2., 3., 0.1, 0.2]].into_iter().collect();

    assert_eq!(set.len(), 2);
    assert_eq!(set[1], Interval::new(2., 3., 0.1, 0.2));
    assert_eq!(set[0].midpoint(), 1.5);
}
