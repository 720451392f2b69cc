use log::{debug, error};

use crate::algorithms::{initial_switch_point, max_iterations, Algorithm, Pass, Side};
use crate::error::{Result, TypeReductionError};
use crate::interval::{validate, Interval, ReducedInterval};

/// Cumulative sums over a [`Pass`] so any centroid costs O(1).
///
/// `lead_num[k]` is `Σ x[i] * lead[i]` over `i < k` and `trail_num[k]` is
/// `Σ x[i] * trail[i]` over `i >= k`, likewise for the denominators. Both
/// sides only ever add, so a tiny tail keeps its digits next to a heavy head.
struct PrefixSums<'p> {
    pass: &'p Pass,
    lead_num: Vec<f64>,
    lead_den: Vec<f64>,
    trail_num: Vec<f64>,
    trail_den: Vec<f64>,
}

impl<'p> PrefixSums<'p> {
    fn new(pass: &'p Pass) -> Self {
        let n = pass.len();
        let mut sums = PrefixSums {
            pass,
            lead_num: vec![0.; n + 1],
            lead_den: vec![0.; n + 1],
            trail_num: vec![0.; n + 1],
            trail_den: vec![0.; n + 1],
        };

        for i in 0..n {
            sums.lead_num[i + 1] = sums.lead_num[i] + pass.x[i] * pass.lead[i];
            sums.lead_den[i + 1] = sums.lead_den[i] + pass.lead[i];
        }

        for i in (0..n).rev() {
            sums.trail_num[i] = sums.trail_num[i + 1] + pass.x[i] * pass.trail[i];
            sums.trail_den[i] = sums.trail_den[i + 1] + pass.trail[i];
        }

        sums
    }

    fn len(&self) -> usize {
        self.pass.len()
    }

    fn centroid(&self, k: usize) -> f64 {
        (self.lead_num[k] + self.trail_num[k]) / (self.lead_den[k] + self.trail_den[k])
    }

    /// Mean with each interval weighted halfway between `lead` and `trail`
    fn midpoint_centroid(&self) -> f64 {
        let n = self.len();

        (self.lead_num[n] + self.trail_num[0]) / (self.lead_den[n] + self.trail_den[0])
    }

    fn switch_point(&self, y: f64) -> usize {
        self.pass.x.partition_point(|&x| x < y).clamp(1, self.len() - 1)
    }

    /// First `k` in `1..n` whose centroid does not exceed `x[k]`. The
    /// predicate is monotone in `k` and always holds at `n - 1`.
    fn optimal_switch_point(&self) -> usize {
        let (mut lo, mut hi) = (1, self.len() - 1);

        while lo < hi {
            let mid = lo + (hi - lo) / 2;

            if self.centroid(mid) <= self.pass.x[mid] {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        lo
    }
}

fn passes(intervals: &[Interval]) -> Result<(Pass, Pass)> {
    validate(intervals)?;

    Pass::new(intervals, Side::Left)
        .zip(Pass::new(intervals, Side::Right))
        .ok_or(TypeReductionError::EmptyInput)
}

pub(super) fn km(intervals: &[Interval]) -> Result<ReducedInterval> {
    let (left, right) = passes(intervals)?;

    Ok(ReducedInterval::new(
        iterate(&left, Algorithm::Km)?,
        iterate(&right, Algorithm::Km)?,
    ))
}

pub(super) fn ekm(intervals: &[Interval]) -> Result<ReducedInterval> {
    let (left, right) = passes(intervals)?;

    Ok(ReducedInterval::new(
        iterate(&left, Algorithm::Ekm)?,
        iterate(&right, Algorithm::Ekm)?,
    ))
}

/// KM and EKM only differ in where the iteration starts.
fn iterate(pass: &Pass, algorithm: Algorithm) -> Result<f64> {
    if let Some(value) = pass.single() {
        return Ok(value);
    }

    let sums = PrefixSums::new(pass);
    let cap = max_iterations(pass.len());
    let (mut k, mut y) = match algorithm {
        Algorithm::Ekm => {
            let k = initial_switch_point(pass.len(), pass.side);

            (k, sums.centroid(k))
        },
        _ => (0, sums.midpoint_centroid()),
    };

    for iteration in 1..=cap {
        let k_next = sums.switch_point(y);
        let y_next = sums.centroid(k_next);

        if k_next == k || !pass.improves(y_next, y) {
            debug!("accelerated {algorithm} {:?} converged after {iteration} iterations", pass.side);

            return Ok(y);
        }

        k = k_next;
        y = y_next;
    }

    error!("accelerated {algorithm} {:?} gave up after {cap} iterations at y = {y}", pass.side);

    Err(TypeReductionError::convergence(algorithm, cap))
}

pub(super) fn eiasc(intervals: &[Interval]) -> Result<ReducedInterval> {
    let (left, right) = passes(intervals)?;
    let side = |pass: &Pass| match pass.single() {
        Some(value) => value,
        None => {
            let sums = PrefixSums::new(pass);

            sums.centroid(sums.optimal_switch_point())
        },
    };

    Ok(ReducedInterval::new(side(&left), side(&right)))
}

/// Every sum the Wu-Mendel bounds need. The first pass finds the extremes,
/// the second accumulates everything else with the distances to the extremes
/// taken per interval, so no sum is recovered by subtracting two others.
#[derive(Default)]
struct Moments {
    count: usize,
    lower: f64,
    upper: f64,
    spread: f64,
    lower_left: f64,
    upper_left: f64,
    lower_right: f64,
    upper_right: f64,
    left_min: f64,
    left_max: f64,
    right_min: f64,
    right_max: f64,
    /// `Σ lower * (left - left_min)`
    left_rise: f64,
    /// `Σ upper * (left_max - left)`
    left_fall: f64,
    /// `Σ upper * (right - right_min)`
    right_rise: f64,
    /// `Σ lower * (right_max - right)`
    right_fall: f64,
}

impl Moments {
    fn gather(intervals: &[Interval]) -> Self {
        let weighted = || intervals.iter().filter(|interval| interval.upper > 0.);
        let mut m = Moments {
            left_min: f64::INFINITY,
            left_max: f64::NEG_INFINITY,
            right_min: f64::INFINITY,
            right_max: f64::NEG_INFINITY,
            ..Default::default()
        };

        for interval in weighted() {
            m.count += 1;
            m.left_min = m.left_min.min(interval.left);
            m.left_max = m.left_max.max(interval.left);
            m.right_min = m.right_min.min(interval.right);
            m.right_max = m.right_max.max(interval.right);
        }

        for interval in weighted() {
            m.lower += interval.lower;
            m.upper += interval.upper;
            m.spread += interval.upper - interval.lower;
            m.lower_left += interval.lower * interval.left;
            m.upper_left += interval.upper * interval.left;
            m.lower_right += interval.lower * interval.right;
            m.upper_right += interval.upper * interval.right;
            m.left_rise += interval.lower * (interval.left - m.left_min);
            m.left_fall += interval.upper * (m.left_max - interval.left);
            m.right_rise += interval.upper * (interval.right - m.right_min);
            m.right_fall += interval.lower * (m.right_max - interval.right);
        }

        m
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0. {
        0.
    } else {
        num / den
    }
}

pub(super) fn wm(intervals: &[Interval]) -> Result<ReducedInterval> {
    validate(intervals)?;

    let m = Moments::gather(intervals);

    match m.count {
        0 => return Err(TypeReductionError::EmptyInput),
        1 => return Ok(ReducedInterval::new(m.left_min, m.right_max)),
        _ => {},
    }

    let upper_left = m.upper_left / m.upper;
    let upper_right = m.upper_right / m.upper;

    let (y_l_sup, y_r_inf, y_l_inf, y_r_sup) = if m.lower > 0. {
        let y_l_sup = (m.lower_left / m.lower).min(upper_left);
        let y_r_inf = (m.lower_right / m.lower).max(upper_right);
        let c = m.spread / (m.lower * m.upper);

        let (p, q) = (m.left_rise, m.left_fall);
        let y_l_inf = y_l_sup - c * ratio(p * q, p + q);

        let (p, q) = (m.right_rise, m.right_fall);
        let y_r_sup = y_r_inf + c * ratio(p * q, p + q);

        (y_l_sup, y_r_inf, y_l_inf, y_r_sup)
    } else {
        (upper_left, upper_right, m.left_min, m.right_max)
    };

    let y_l_inf = y_l_inf.max(m.left_min);
    let y_r_sup = y_r_sup.min(m.right_max);

    Ok(ReducedInterval::new((y_l_inf + y_l_sup) / 2., (y_r_inf + y_r_sup) / 2.))
}

#[cfg(test)]
fn spread_intervals(n: usize) -> Vec<Interval> {
    (0..n)
        .map(|i| {
            let x = i as f64 * 7. % 13.;
            let upper = 0.2 + (i % 5) as f64 * 0.15;

            Interval::new(x, x + 0.5 + (i % 3) as f64, upper * 0.4, upper)
        })
        .collect()
}

#[test]
fn test_prefix_centroid_matches_pass() {
    let intervals = spread_intervals(9);
    let pass = Pass::new(&intervals, Side::Left).unwrap();
    let sums = PrefixSums::new(&pass);

    for k in 0..=pass.len() {
        assert!((sums.centroid(k) - pass.centroid(k)).abs() < 1e-12);
    }
}

#[test]
fn test_accelerated_matches_reference() {
    for n in [2, 3, 8, 21, 40] {
        let intervals = spread_intervals(n);

        for (fast, slow) in [
            (km(&intervals).unwrap(), crate::algorithms::km(&intervals).unwrap()),
            (ekm(&intervals).unwrap(), crate::algorithms::ekm(&intervals).unwrap()),
            (eiasc(&intervals).unwrap(), crate::algorithms::eiasc(&intervals).unwrap()),
            (wm(&intervals).unwrap(), crate::algorithms::wm(&intervals).unwrap()),
        ] {
            assert!((fast.left - slow.left).abs() < 1e-6, "n = {n}: {fast:?} vs {slow:?}");
            assert!((fast.right - slow.right).abs() < 1e-6, "n = {n}: {fast:?} vs {slow:?}");
        }
    }
}

#[test]
fn test_tiny_tail_after_heavy_head() {
    let intervals = [Interval::point(3., 0., 1.), Interval::point(10., 1e-12, 1e-12)];

    for (fast, slow) in [
        (km(&intervals).unwrap(), crate::algorithms::km(&intervals).unwrap()),
        (ekm(&intervals).unwrap(), crate::algorithms::ekm(&intervals).unwrap()),
        (eiasc(&intervals).unwrap(), crate::algorithms::eiasc(&intervals).unwrap()),
        (wm(&intervals).unwrap(), crate::algorithms::wm(&intervals).unwrap()),
    ] {
        assert!((fast.left - slow.left).abs() < 1e-9, "{fast:?} vs {slow:?}");
        assert!((fast.right - slow.right).abs() < 1e-9, "{fast:?} vs {slow:?}");
    }

    assert!((km(&intervals).unwrap().right - 10.).abs() < 1e-9);
}

#[test]
fn test_accelerated_rejects_empty() {
    let intervals = [Interval::point(1., 0., 0.)];

    assert_eq!(eiasc(&intervals), Err(TypeReductionError::EmptyInput));
    assert_eq!(wm(&intervals), Err(TypeReductionError::EmptyInput));
    assert_eq!(km(&[]), Err(TypeReductionError::EmptyInput));
}
