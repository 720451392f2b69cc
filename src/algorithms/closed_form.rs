//! Non-iterative reductions: Wu-Mendel bounds and the direct crisp methods.

use log::debug;

use crate::error::{Result, TypeReductionError};
use crate::interval::{validate, Interval, ReducedInterval};

/// The intervals that carry weight. Zero-weight intervals never change a
/// weighted sum, they only matter for the extreme primary values.
fn weighted(intervals: &[Interval]) -> Result<Vec<&Interval>> {
    validate(intervals)?;

    let weighted: Vec<_> = intervals.iter().filter(|interval| interval.upper > 0.).collect();

    if weighted.is_empty() {
        return Err(TypeReductionError::EmptyInput);
    }

    Ok(weighted)
}

/// `Σ weight * value / Σ weight`, `None` when the weights sum to zero
fn weighted_mean<'i>(
    intervals: &[&'i Interval],
    weight: impl Fn(&'i Interval) -> f64,
    value: impl Fn(&'i Interval) -> f64,
) -> Option<f64> {
    let (num, den) = intervals.iter().fold((0., 0.), |(num, den), &interval| {
        let w = weight(interval);

        (num + w * value(interval), den + w)
    });

    (den > 0.).then(|| num / den)
}

fn total(intervals: &[&Interval], f: impl Fn(&Interval) -> f64) -> f64 {
    intervals.iter().map(|&interval| f(interval)).sum()
}

fn extremes(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| (min.min(v), max.max(v)))
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0. {
        0.
    } else {
        num / den
    }
}

/// Wu-Mendel uncertainty bounds: a closed-form approximation of the KM
/// interval that averages an inner and an outer bound for each side.
pub fn wm(intervals: &[Interval]) -> Result<ReducedInterval> {
    let intervals = weighted(intervals)?;

    if let [single] = intervals[..] {
        return Ok(ReducedInterval::new(single.left, single.right));
    }

    let (left_min, left_max) = extremes(intervals.iter().map(|i| i.left));
    let (right_min, right_max) = extremes(intervals.iter().map(|i| i.right));

    let upper_left = weighted_mean(&intervals, |i| i.upper, |i| i.left).unwrap_or(left_min);
    let upper_right = weighted_mean(&intervals, |i| i.upper, |i| i.right).unwrap_or(right_max);
    let lower_left = weighted_mean(&intervals, |i| i.lower, |i| i.left);
    let lower_right = weighted_mean(&intervals, |i| i.lower, |i| i.right);

    let y_l_sup = lower_left.map_or(upper_left, |lower_left| lower_left.min(upper_left));
    let y_r_inf = lower_right.map_or(upper_right, |lower_right| lower_right.max(upper_right));

    let lower_sum = total(&intervals, |i| i.lower);
    let upper_sum = total(&intervals, |i| i.upper);

    let (y_l_inf, y_r_sup) = if lower_sum > 0. {
        let c = total(&intervals, |i| i.upper - i.lower) / (lower_sum * upper_sum);

        let p = total(&intervals, |i| i.lower * (i.left - left_min));
        let q = total(&intervals, |i| i.upper * (left_max - i.left));
        let y_l_inf = y_l_sup - c * ratio(p * q, p + q);

        let p = total(&intervals, |i| i.upper * (i.right - right_min));
        let q = total(&intervals, |i| i.lower * (right_max - i.right));
        let y_r_sup = y_r_inf + c * ratio(p * q, p + q);

        (y_l_inf, y_r_sup)
    } else {
        // Without any lower weight the inner bounds reach the extremes
        (left_min, right_max)
    };

    let y_l_inf = y_l_inf.max(left_min);
    let y_r_sup = y_r_sup.min(right_max);

    debug!("WM bounds: left [{y_l_inf}, {y_l_sup}], right [{y_r_inf}, {y_r_sup}]");

    Ok(ReducedInterval::new((y_l_inf + y_l_sup) / 2., (y_r_inf + y_r_sup) / 2.))
}

/// Begian-Melek-Mendel: `m` times the lower-weighted mean plus `n` times the
/// upper-weighted mean of the interval midpoints.
pub fn bmm(intervals: &[Interval], m: f64, n: f64) -> Result<f64> {
    let intervals = weighted(intervals)?;
    let upper = weighted_mean(&intervals, |i| i.upper, Interval::midpoint).unwrap_or_default();
    let lower = weighted_mean(&intervals, |i| i.lower, Interval::midpoint).unwrap_or(upper);

    Ok(m * lower + n * upper)
}

/// BMM extended by Li et al.: the lower-weighted mean runs over the left
/// values and the upper-weighted mean over the right values.
pub fn lbmm(intervals: &[Interval], m: f64, n: f64) -> Result<f64> {
    let intervals = weighted(intervals)?;
    let upper = weighted_mean(&intervals, |i| i.upper, |i| i.right).unwrap_or_default();
    let lower = weighted_mean(&intervals, |i| i.lower, |i| i.left).unwrap_or(upper);

    Ok(m * lower + n * upper)
}

/// Nie-Tan: the midpoints averaged with the sum of both weights.
pub fn nt(intervals: &[Interval]) -> Result<f64> {
    let intervals = weighted(intervals)?;

    Ok(weighted_mean(&intervals, |i| i.lower + i.upper, Interval::midpoint).unwrap_or_default())
}

#[test]
fn test_wm_uniform_weights_is_exact() {
    let intervals: Vec<Interval> = [1., 2., 4.].into_iter().map(|x| Interval::point(x, 0.5, 0.5)).collect();
    let reduced = wm(&intervals).unwrap();

    assert!((reduced.left - 7. / 3.).abs() < 1e-12);
    assert!((reduced.right - 7. / 3.).abs() < 1e-12);
}

#[test]
fn test_wm_stays_between_extremes() {
    let intervals = [
        Interval::point(0., 0., 0.4),
        Interval::point(1., 0.2, 0.9),
        Interval::point(2., 0.6, 1.),
        Interval::point(3., 0.1, 0.3),
    ];
    let reduced = wm(&intervals).unwrap();

    assert!(0. <= reduced.left);
    assert!(reduced.left <= reduced.right);
    assert!(reduced.right <= 3.);
}

#[test]
fn test_wm_without_lower_weights() {
    let intervals = [Interval::point(0., 0., 1.), Interval::point(4., 0., 1.)];
    let reduced = wm(&intervals).unwrap();

    // Outer bounds are the upper means (2), inner bounds the extremes
    assert_eq!(reduced, ReducedInterval::new(1., 3.));
}

#[test]
fn test_bmm_and_nt() {
    let intervals = [Interval::new(0., 2., 0.5, 1.), Interval::new(4., 6., 0.5, 0.5)];

    // Lower mean of midpoints is 3, upper mean is (1 + 2.5) / 1.5
    let upper = (1. * 1. + 5. * 0.5) / 1.5;
    let crisp = bmm(&intervals, 0.5, 0.5).unwrap();
    assert!((crisp - (0.5 * 3. + 0.5 * upper)).abs() < 1e-12);

    let crisp = lbmm(&intervals, 0.5, 0.5).unwrap();
    let upper = (2. * 1. + 6. * 0.5) / 1.5;
    assert!((crisp - (0.5 * 2. + 0.5 * upper)).abs() < 1e-12);

    let crisp = nt(&intervals).unwrap();
    assert!((crisp - (1. * 1.5 + 5. * 1.) / 2.5).abs() < 1e-12);
}

#[test]
fn test_crisp_methods_reject_empty() {
    let intervals = [Interval::point(1., 0., 0.)];

    assert_eq!(nt(&intervals), Err(TypeReductionError::EmptyInput));
    assert_eq!(bmm(&intervals, 0.5, 0.5), Err(TypeReductionError::EmptyInput));
    assert_eq!(wm(&intervals), Err(TypeReductionError::EmptyInput));
}
