//! Karnik-Mendel and its enhanced variants.

use log::{debug, error, trace};

use super::{max_iterations, Algorithm, Pass, Side};
use crate::error::{Result, TypeReductionError};
use crate::interval::{validate, Interval, ReducedInterval};

/// Karnik-Mendel: restarts from the midpoint-weighted centroid and re-scans
/// for the switch point until the centroid stops improving.
pub fn km(intervals: &[Interval]) -> Result<ReducedInterval> {
    validate(intervals)?;

    let (left, right) = passes(Pass::new(intervals, Side::Left), Pass::new(intervals, Side::Right))?;

    Ok(ReducedInterval::new(km_side(&left)?, km_side(&right)?))
}

/// Enhanced Karnik-Mendel: starts from an empirical switch point guess and
/// updates the weighted sums incrementally.
pub fn ekm(intervals: &[Interval]) -> Result<ReducedInterval> {
    validate(intervals)?;

    let (left, right) = passes(Pass::new(intervals, Side::Left), Pass::new(intervals, Side::Right))?;

    Ok(ReducedInterval::new(
        ekm_side(&left, Algorithm::Ekm)?,
        ekm_side(&right, Algorithm::Ekm)?,
    ))
}

/// Weighted EKM. `weights[i]` multiplies both weights of `intervals[i]` and
/// must be finite and positive.
pub fn wekm(intervals: &[Interval], weights: &[f64]) -> Result<ReducedInterval> {
    validate(intervals)?;

    if weights.len() != intervals.len() {
        return Err(TypeReductionError::length_mismatch(
            "weights",
            intervals.len(),
            weights.len(),
        ));
    }

    if let Some((i, weight)) = weights
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w <= 0.)
    {
        return Err(TypeReductionError::invalid_element(
            "weights",
            i,
            format!("multiplier {weight} must be finite and positive"),
        ));
    }

    let (left, right) = passes(
        Pass::scaled(intervals, weights, Side::Left),
        Pass::scaled(intervals, weights, Side::Right),
    )?;

    Ok(ReducedInterval::new(
        ekm_side(&left, Algorithm::Wekm)?,
        ekm_side(&right, Algorithm::Wekm)?,
    ))
}

/// WEKM with the multipliers fixed to 0.5 on the first and last interval of
/// each sorted side and 1 everywhere in between.
pub fn twekm(intervals: &[Interval]) -> Result<ReducedInterval> {
    validate(intervals)?;

    let (mut left, mut right) = passes(Pass::new(intervals, Side::Left), Pass::new(intervals, Side::Right))?;

    for pass in [&mut left, &mut right] {
        let last = pass.len() - 1;

        if last > 0 {
            for i in [0, last] {
                pass.lead[i] *= 0.5;
                pass.trail[i] *= 0.5;
            }
        }
    }

    Ok(ReducedInterval::new(
        ekm_side(&left, Algorithm::Twekm)?,
        ekm_side(&right, Algorithm::Twekm)?,
    ))
}

fn passes(left: Option<Pass>, right: Option<Pass>) -> Result<(Pass, Pass)> {
    left.zip(right).ok_or(TypeReductionError::EmptyInput)
}

fn km_side(pass: &Pass) -> Result<f64> {
    if let Some(value) = pass.single() {
        return Ok(value);
    }

    let n = pass.len();
    let (num, den) = (0..n).fold((0., 0.), |(num, den), i| {
        let w = (pass.lead[i] + pass.trail[i]) / 2.;

        (num + pass.x[i] * w, den + w)
    });
    let mut y_prime = num / den;
    let cap = max_iterations(n);

    // The estimates are monotone, so the first one that does not improve on
    // its predecessor marks the fixed point
    for iteration in 1..=cap {
        let k = pass.switch_point(y_prime);
        let y = pass.centroid(k);

        if !pass.improves(y, y_prime) {
            debug!("KM {:?} converged to {y_prime} after {iteration} iterations (k = {k})", pass.side);

            return Ok(y_prime);
        }

        trace!("KM {:?} iteration {iteration}: k = {k}, y = {y}", pass.side);
        y_prime = y;
    }

    error!("KM {:?} gave up after {cap} iterations at y = {y_prime}", pass.side);

    Err(TypeReductionError::convergence(Algorithm::Km, cap))
}

/// Published EKM starting guess, `round(n / 2.4)` for the left side and
/// `round(n / 1.7)` for the right side, kept inside `1..n`
pub(crate) fn initial_switch_point(n: usize, side: Side) -> usize {
    let divisor = match side {
        Side::Left => 2.4,
        Side::Right => 1.7,
    };
    let k = (n as f64 / divisor).round_ties_even() as usize;

    k.clamp(1, n.saturating_sub(1).max(1))
}

fn ekm_side(pass: &Pass, algorithm: Algorithm) -> Result<f64> {
    if let Some(value) = pass.single() {
        return Ok(value);
    }

    let n = pass.len();
    let mut k = initial_switch_point(n, pass.side);
    let (mut num, mut den) = pass.sums(k);
    let mut y = num / den;
    let cap = max_iterations(n);

    for iteration in 1..=cap {
        let k_next = pass.switch_point(y);

        if k_next == k {
            debug!("{algorithm} {:?} converged to {y} after {iteration} iterations (k = {k})", pass.side);

            return Ok(y);
        }

        let (d_num, d_den) = (k.min(k_next)..k.max(k_next)).fold((0., 0.), |(d_num, d_den), i| {
            let d = pass.lead[i] - pass.trail[i];

            (d_num + pass.x[i] * d, d_den + d)
        });

        let den_before = den;

        if k_next > k {
            num += d_num;
            den += d_den;
        } else {
            num -= d_num;
            den -= d_den;
        }

        // Most of the weight cancelled out, so the running sums kept little
        // precision
        if den <= den_before / 2. {
            trace!("{algorithm} {:?} recomputing sums at k = {k_next}", pass.side);
            (num, den) = pass.sums(k_next);
        }

        let y_next = num / den;

        if !pass.improves(y_next, y) {
            debug!("{algorithm} {:?} settled at {y} after {iteration} iterations (k = {k_next})", pass.side);

            return Ok(y);
        }

        trace!("{algorithm} {:?} iteration {iteration}: k {k} -> {k_next}", pass.side);
        k = k_next;
        y = y_next;
    }

    error!("{algorithm} {:?} gave up after {cap} iterations at y = {y}", pass.side);

    Err(TypeReductionError::convergence(algorithm, cap))
}

#[cfg(test)]
fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_initial_switch_point() {
    assert_eq!(initial_switch_point(2, Side::Left), 1);
    assert_eq!(initial_switch_point(2, Side::Right), 1);
    // 6 / 2.4 = 2.5 rounds half to even
    assert_eq!(initial_switch_point(6, Side::Left), 2);
    assert_eq!(initial_switch_point(12, Side::Left), 5);
    assert_eq!(initial_switch_point(12, Side::Right), 7);
    assert_eq!(initial_switch_point(100, Side::Right), 59);
}

#[test]
fn test_km_two_points() {
    // Left: all upper weight on 0 gives (0 * 1 + 1 * 0.5) / 1.5
    let intervals = [Interval::point(0., 0.5, 1.), Interval::point(1., 0.5, 1.)];
    let reduced = km(&intervals).unwrap();

    assert_close(reduced.left, 1. / 3.);
    assert_close(reduced.right, 2. / 3.);
    assert_eq!(ekm(&intervals).unwrap(), reduced);
}

#[test]
fn test_single_interval() {
    let intervals = [Interval::new(5., 5., 0.3, 0.7)];

    assert_eq!(km(&intervals), Ok(ReducedInterval::new(5., 5.)));
    assert_eq!(ekm(&intervals), Ok(ReducedInterval::new(5., 5.)));
    assert_eq!(wekm(&intervals, &[2.]), Ok(ReducedInterval::new(5., 5.)));
    assert_eq!(twekm(&intervals), Ok(ReducedInterval::new(5., 5.)));
}

#[test]
fn test_all_zero_is_empty() {
    let intervals = [Interval::point(1., 0., 0.), Interval::point(2., 0., 0.)];

    assert_eq!(km(&intervals), Err(TypeReductionError::EmptyInput));
    assert_eq!(ekm(&intervals), Err(TypeReductionError::EmptyInput));
    assert_eq!(km(&[]), Err(TypeReductionError::EmptyInput));
}

#[test]
fn test_fixed_point_just_above_a_sample() {
    // The left bound lands about 5e-7 above 5
    let intervals = [
        Interval::point(1., 0., 1e-4),
        Interval::point(5., 0., 1.),
        Interval::point(9.005, 1e-4, 1e-4),
    ];
    let left = (1e-4 + 5. + 9.005e-4) / 1.0002;

    for reduced in [km(&intervals), ekm(&intervals), wekm(&intervals, &[1.; 3])] {
        let reduced = reduced.unwrap();

        assert_close(reduced.left, left);
        assert_close(reduced.right, 9.005);
    }

    assert!(twekm(&intervals).is_ok());
}

#[test]
fn test_tiny_tail_keeps_precision() {
    // Dropping the heavy interval from the sums must not cost the tail its
    // digits
    let intervals = [Interval::point(3., 0., 1.), Interval::point(10., 1e-12, 1e-12)];

    for reduced in [km(&intervals), ekm(&intervals)] {
        let reduced = reduced.unwrap();

        assert_close(reduced.right, 10.);
        assert_close(reduced.left, 3.);
    }
}

#[test]
fn test_wekm_unit_weights_match_ekm() {
    let intervals: Vec<Interval> = (0..20)
        .map(|i| {
            let x = i as f64 * 0.5;
            let upper = 1. - (x - 4.).abs() / 6.;

            Interval::point(x, upper * 0.6, upper)
        })
        .collect();
    let ones = vec![1.; intervals.len()];

    assert_eq!(wekm(&intervals, &ones).unwrap(), ekm(&intervals).unwrap());
}

#[test]
fn test_wekm_rejects_bad_weights() {
    let intervals = [Interval::point(0., 0.5, 1.), Interval::point(1., 0.5, 1.)];

    assert_eq!(
        wekm(&intervals, &[1.]),
        Err(TypeReductionError::length_mismatch("weights", 2, 1))
    );
    assert!(matches!(
        wekm(&intervals, &[1., -1.]),
        Err(TypeReductionError::InvalidArgument { index: Some(1), .. })
    ));
    assert!(matches!(
        wekm(&intervals, &[f64::NAN, 1.]),
        Err(TypeReductionError::InvalidArgument { index: Some(0), .. })
    ));
}

#[test]
fn test_wekm_weights_follow_intervals() {
    let intervals = [
        Interval::point(2., 0.2, 0.8),
        Interval::point(0., 0.2, 0.8),
        Interval::point(1., 0.2, 0.8),
    ];
    let shuffled = [intervals[2], intervals[0], intervals[1]];

    assert_eq!(
        wekm(&intervals, &[3., 1., 2.]).unwrap(),
        wekm(&shuffled, &[2., 3., 1.]).unwrap()
    );
}

#[test]
fn test_twekm_halves_the_ends() {
    let intervals = [
        Interval::point(0., 0.2, 0.6),
        Interval::point(1., 0.4, 0.8),
        Interval::point(2., 0.1, 0.5),
        Interval::point(3., 0.3, 0.9),
    ];

    assert_eq!(twekm(&intervals).unwrap(), wekm(&intervals, &[0.5, 1., 1., 0.5]).unwrap());
}
