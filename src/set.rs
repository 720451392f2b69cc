//! Interval type-2 fuzzy sets sampled on a discrete domain.

use std::iter::repeat;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeReductionError};
use crate::interval::Interval;
use crate::math::interp;
use crate::ops::{SNorm, TNorm};

/// Interval-valued firing strength of a rule
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Firing {
    pub lower: f64,
    pub upper: f64,
}

impl Firing {
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !(0. ..=1.).contains(&lower) || !(0. ..=1.).contains(&upper) {
            return Err(TypeReductionError::invalid_argument(
                "firing",
                format!("[{lower}, {upper}] is not within [0, 1]"),
            ));
        }

        if lower > upper {
            return Err(TypeReductionError::invalid_argument(
                "firing",
                format!("lower strength {lower} exceeds upper strength {upper}"),
            ));
        }

        Ok(Firing { lower, upper })
    }
}

/// Lower and upper membership grades of an IT2 fuzzy set, one pair per
/// domain sample.
#[derive(Clone, Debug, PartialEq)]
pub struct It2Set {
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl It2Set {
    /// Grades are clamped into `[0, 1]`. Fails on non-finite grades, on
    /// curves of different length and wherever `lower > upper`.
    pub fn new(lower: Vec<f64>, upper: Vec<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(TypeReductionError::length_mismatch("lower", upper.len(), lower.len()));
        }

        let clamp = |argument: &'static str, mut grades: Vec<f64>| {
            for (i, grade) in grades.iter_mut().enumerate() {
                if !grade.is_finite() {
                    return Err(TypeReductionError::invalid_element(
                        argument,
                        i,
                        format!("membership grade {grade} is not finite"),
                    ));
                }

                *grade = grade.clamp(0., 1.);
            }

            Ok(grades)
        };

        let lower = clamp("lower", lower)?;
        let upper = clamp("upper", upper)?;

        if let Some(i) = (0..lower.len()).find(|&i| lower[i] > upper[i]) {
            return Err(TypeReductionError::invalid_element(
                "lower",
                i,
                format!("lower grade {} exceeds upper grade {}", lower[i], upper[i]),
            ));
        }

        Ok(It2Set { lower, upper })
    }

    /// Samples piecewise-linear membership functions given as `(x, grade)`
    /// coordinates on `domain`.
    pub fn from_points(domain: &[f64], lower: &[(f64, f64)], upper: &[(f64, f64)]) -> Result<Self> {
        Self::new(
            interp(domain.iter().copied(), lower),
            interp(domain.iter().copied(), upper),
        )
    }

    /// A set with every grade zero
    pub fn empty(len: usize) -> Self {
        It2Set {
            lower: vec![0.; len],
            upper: vec![0.; len],
        }
    }

    pub fn len(&self) -> usize {
        self.upper.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upper.is_empty()
    }

    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    fn same_len(&self, other: &It2Set) -> Result<()> {
        if self.len() != other.len() {
            return Err(TypeReductionError::length_mismatch("set", self.len(), other.len()));
        }

        Ok(())
    }

    /// Intersection under `t_norm`
    pub fn meet(&self, other: &It2Set, t_norm: TNorm) -> Result<Self> {
        self.same_len(other)?;

        Ok(It2Set {
            lower: t_norm.call(self.lower.iter().copied(), other.lower.iter().copied()).collect(),
            upper: t_norm.call(self.upper.iter().copied(), other.upper.iter().copied()).collect(),
        })
    }

    /// Union under `s_norm`
    pub fn join(&self, other: &It2Set, s_norm: SNorm) -> Result<Self> {
        self.same_len(other)?;

        Ok(It2Set {
            lower: s_norm.call(self.lower.iter().copied(), other.lower.iter().copied()).collect(),
            upper: s_norm.call(self.upper.iter().copied(), other.upper.iter().copied()).collect(),
        })
    }

    /// Cuts the set by a rule's firing strength: lower grades meet the lower
    /// strength and upper grades the upper strength.
    pub fn fire(&self, firing: Firing, t_norm: TNorm) -> Self {
        It2Set {
            lower: t_norm.call(self.lower.iter().copied(), repeat(firing.lower)).collect(),
            upper: t_norm.call(self.upper.iter().copied(), repeat(firing.upper)).collect(),
        }
    }

    /// Standard complement. The footprint of uncertainty flips, so the new
    /// lower grade is `1 - upper`.
    pub fn negate(&self) -> Self {
        It2Set {
            lower: self.upper.iter().map(|u| 1. - u).collect(),
            upper: self.lower.iter().map(|l| 1. - l).collect(),
        }
    }

    /// One point interval per domain sample, weighted by the grades there
    pub fn intervals(&self, domain: &[f64]) -> Result<Vec<Interval>> {
        if domain.len() != self.len() {
            return Err(TypeReductionError::length_mismatch("domain", self.len(), domain.len()));
        }

        Ok(domain
            .iter()
            .zip(self.lower.iter().zip(&self.upper))
            .map(|(&x, (&lower, &upper))| Interval::point(x, lower, upper))
            .collect())
    }
}

#[cfg(test)]
fn triangle(domain: &[f64], a: f64, b: f64, c: f64, height: f64) -> It2Set {
    It2Set::from_points(domain, &[(a, 0.), (b, height), (c, 0.)], &[(a, 0.), (b, 1.), (c, 0.)]).unwrap()
}

#[test]
fn test_new_validates() {
    assert!(It2Set::new(vec![0.1, 0.2], vec![0.5]).is_err());
    assert!(matches!(
        It2Set::new(vec![0.1, 0.6], vec![0.5, 0.5]),
        Err(TypeReductionError::InvalidArgument { index: Some(1), .. })
    ));
    assert!(It2Set::new(vec![f64::NAN], vec![1.]).is_err());

    let set = It2Set::new(vec![-0.5, 0.3], vec![0.2, 1.5]).unwrap();
    assert_eq!(set.lower(), &[0., 0.3]);
    assert_eq!(set.upper(), &[0.2, 1.]);
}

#[test]
fn test_from_points() {
    let domain = [0., 1., 2., 3., 4.];
    let set = triangle(&domain, 0., 2., 4., 0.5);

    assert_eq!(set.upper(), &[0., 0.5, 1., 0.5, 0.]);
    assert_eq!(set.lower(), &[0., 0.25, 0.5, 0.25, 0.]);
}

#[test]
fn test_meet_join_fire() {
    let domain = [0., 1., 2., 3., 4.];
    let a = triangle(&domain, 0., 1., 2., 0.5);
    let b = triangle(&domain, 1., 2., 3., 0.5);

    let union = a.join(&b, SNorm::Max).unwrap();
    assert_eq!(union.upper(), &[0., 1., 1., 0., 0.]);

    let overlap = a.meet(&b, TNorm::Min).unwrap();
    assert_eq!(overlap.upper(), &[0.; 5]);

    let fired = union.fire(Firing::new(0.2, 0.6).unwrap(), TNorm::Min);
    assert_eq!(fired.upper(), &[0., 0.6, 0.6, 0., 0.]);
    assert_eq!(fired.lower(), &[0., 0.2, 0.2, 0., 0.]);

    assert!(a.meet(&It2Set::empty(3), TNorm::Min).is_err());
}

#[test]
fn test_negate() {
    let set = It2Set::new(vec![0.25, 0.], vec![0.5, 1.]).unwrap();
    let negated = set.negate();

    assert_eq!(negated.lower(), &[0.5, 0.]);
    assert_eq!(negated.upper(), &[0.75, 1.]);
    assert_eq!(negated.negate(), set);
}

#[test]
fn test_firing_bounds() {
    assert!(Firing::new(0.3, 0.2).is_err());
    assert!(Firing::new(0., 1.5).is_err());
    assert!(Firing::new(f64::NAN, 1.).is_err());
    assert_eq!(Firing::new(0., 1.), Ok(Firing { lower: 0., upper: 1. }));
}
