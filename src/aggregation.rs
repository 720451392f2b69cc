//! Turning the fired rules of an IT2 fuzzy system into an interval set and
//! type reducing it.
//!
//! Every strategy builds its [`Interval`]s differently and then hands them to
//! a [`TypeReducer`] unchanged.

use log::debug;
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::algorithms::Algorithm;
use crate::error::{Result, TypeReductionError};
use crate::interval::{Interval, Reduction};
use crate::math::argmax;
use crate::ops::{SNorm, TNorm};
use crate::reducer::TypeReducer;
use crate::set::{Firing, It2Set};

new_key_type! {
    /// A consequent key
    pub struct ConsequentKey;
}

/// Store of the consequent sets rules point at.
#[derive(Clone, Debug, Default)]
pub struct Consequents(SlotMap<ConsequentKey, It2Set>);

impl Consequents {
    pub fn new() -> Self {
        Self(SlotMap::with_key())
    }

    pub fn add(&mut self, set: It2Set) -> ConsequentKey {
        self.0.insert(set)
    }

    pub fn get(&self, key: ConsequentKey) -> Option<&It2Set> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A rule after inference: how strongly it fired and which consequent it
/// concludes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fired {
    pub firing: Firing,
    pub consequent: ConsequentKey,
}

impl Fired {
    pub fn new(firing: Firing, consequent: ConsequentKey) -> Self {
        Fired { firing, consequent }
    }
}

/// Type reduction strategy for a rule base output
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Aggregation {
    /// Centroid of the union of all fired consequents
    #[default]
    Centroid,
    /// Center of sets: one interval per rule at its consequent's centroid
    CoSet,
    /// Center of sums: like centroid, over the pointwise sum of fired sets
    CoSum,
    /// One point per rule at the peak of its fired set
    Height,
    /// Height with each rule de-weighted by the square of its spread
    ModiHe(Vec<f64>),
}

impl Aggregation {
    pub fn call(
        &self,
        fired: &[Fired],
        consequents: &Consequents,
        domain: &[f64],
        t_norm: TNorm,
        s_norm: SNorm,
        reducer: &TypeReducer,
    ) -> Result<Reduction> {
        debug!("{self:?} over {} fired rules", fired.len());

        let sets = || fired_sets(fired, consequents, t_norm);

        match self {
            Self::Centroid => {
                let union = sets()?
                    .iter()
                    .try_fold(It2Set::empty(domain.len()), |union, set| union.join(set, s_norm))?;

                centroid(&union, domain, reducer)
            },
            Self::CoSet => center_of_sets(fired, consequents, domain, reducer),
            Self::CoSum => center_of_sum(&sets()?, domain, reducer),
            Self::Height => height(&sets()?, domain, reducer),
            Self::ModiHe(spreads) => modified_height(&sets()?, spreads, domain, reducer),
        }
    }
}

fn lookup(consequents: &Consequents, index: usize, key: ConsequentKey) -> Result<&It2Set> {
    consequents
        .get(key)
        .ok_or_else(|| TypeReductionError::invalid_element("fired", index, "unknown consequent key"))
}

/// Each rule's consequent cut by its firing strength
fn fired_sets(fired: &[Fired], consequents: &Consequents, t_norm: TNorm) -> Result<Vec<It2Set>> {
    fired
        .iter()
        .enumerate()
        .map(|(i, rule)| Ok(lookup(consequents, i, rule.consequent)?.fire(rule.firing, t_norm)))
        .collect()
}

/// Reduces a single set, one interval per domain sample.
pub fn centroid(set: &It2Set, domain: &[f64], reducer: &TypeReducer) -> Result<Reduction> {
    reducer.reduce(&set.intervals(domain)?)
}

/// Sums the lower and upper curves of `sets` pointwise and reduces the sum
/// like [`centroid`].
pub fn center_of_sum(sets: &[It2Set], domain: &[f64], reducer: &TypeReducer) -> Result<Reduction> {
    let mut lower = vec![0.; domain.len()];
    let mut upper = vec![0.; domain.len()];

    for set in sets {
        if set.len() != domain.len() {
            return Err(TypeReductionError::length_mismatch("set", domain.len(), set.len()));
        }

        for (sum, grade) in lower.iter_mut().zip(set.lower()) {
            *sum += grade;
        }
        for (sum, grade) in upper.iter_mut().zip(set.upper()) {
            *sum += grade;
        }
    }

    let intervals: Vec<Interval> = domain
        .iter()
        .zip(lower.into_iter().zip(upper))
        .map(|(&x, (lower, upper))| Interval::point(x, lower, upper))
        .collect();

    reducer.reduce(&intervals)
}

/// One point per set where its upper curve peaks (the first such sample),
/// with each weight divided by `scale(i)`.
fn peaks(sets: &[It2Set], domain: &[f64], scale: impl Fn(usize) -> f64) -> Result<Vec<Interval>> {
    sets.iter()
        .enumerate()
        .map(|(i, set)| {
            if set.len() != domain.len() {
                return Err(TypeReductionError::length_mismatch("set", domain.len(), set.len()));
            }

            let peak = argmax(set.upper())
                .ok_or_else(|| TypeReductionError::invalid_element("set", i, "no membership grades"))?;
            let divisor = scale(i);

            Ok(Interval::point(
                domain[peak],
                set.lower()[peak] / divisor,
                set.upper()[peak] / divisor,
            ))
        })
        .collect()
}

pub fn height(sets: &[It2Set], domain: &[f64], reducer: &TypeReducer) -> Result<Reduction> {
    reducer.reduce(&peaks(sets, domain, |_| 1.)?)
}

/// [`height`] with the weights of `sets[i]` divided by `spreads[i]²`.
pub fn modified_height(
    sets: &[It2Set],
    spreads: &[f64],
    domain: &[f64],
    reducer: &TypeReducer,
) -> Result<Reduction> {
    if spreads.len() != sets.len() {
        return Err(TypeReductionError::length_mismatch("spreads", sets.len(), spreads.len()));
    }

    if let Some((i, spread)) = spreads
        .iter()
        .enumerate()
        .find(|(_, s)| !s.is_finite() || **s == 0.)
    {
        return Err(TypeReductionError::invalid_element(
            "spreads",
            i,
            format!("spread {spread} must be finite and nonzero"),
        ));
    }

    reducer.reduce(&peaks(sets, domain, |i| spreads[i] * spreads[i])?)
}

/// Center of sets. Each consequent's centroid is computed once, however many
/// rules share it, then every rule contributes that centroid weighted by its
/// firing strength.
pub fn center_of_sets(
    fired: &[Fired],
    consequents: &Consequents,
    domain: &[f64],
    reducer: &TypeReducer,
) -> Result<Reduction> {
    let algorithm = match reducer.algorithm() {
        algorithm if algorithm.is_two_sided() && !algorithm.takes_params() => algorithm,
        _ => Algorithm::Eiasc,
    };
    let mut centroids: SecondaryMap<ConsequentKey, (f64, f64)> = SecondaryMap::new();
    let mut intervals = Vec::with_capacity(fired.len());

    for (i, rule) in fired.iter().enumerate() {
        let (left, right) = match centroids.get(rule.consequent) {
            Some(&bounds) => bounds,
            None => {
                let set = lookup(consequents, i, rule.consequent)?;
                let bounds = reducer.reduce_with(algorithm, &set.intervals(domain)?)?.bounds();

                centroids.insert(rule.consequent, bounds);
                bounds
            },
        };

        intervals.push(Interval::new(left, right, rule.firing.lower, rule.firing.upper));
    }

    debug!("CoSet reused {} consequent centroids for {} rules", centroids.len(), fired.len());

    reducer.reduce(&intervals)
}

#[cfg(test)]
fn shoulder_system() -> (Vec<f64>, Consequents, ConsequentKey, ConsequentKey) {
    let domain = crate::domain::domain(0., 10., 101).unwrap();
    let mut consequents = Consequents::new();
    let low = consequents.add(
        It2Set::from_points(&domain, &[(0., 0.8), (3., 0.)], &[(0., 1.), (5., 0.)]).unwrap(),
    );
    let high = consequents.add(
        It2Set::from_points(&domain, &[(7., 0.), (10., 0.8)], &[(5., 0.), (10., 1.)]).unwrap(),
    );

    (domain, consequents, low, high)
}

#[test]
fn test_consequents_store() {
    let (_, consequents, low, high) = shoulder_system();

    assert_eq!(consequents.len(), 2);
    assert_ne!(low, high);
    assert!(consequents.get(low).is_some());
    assert!(Consequents::new().get(low).is_none());
}

#[test]
fn test_symmetric_rules_balance() {
    let (domain, consequents, low, high) = shoulder_system();
    let firing = Firing::new(0.4, 0.7).unwrap();
    let fired = [Fired::new(firing, low), Fired::new(firing, high)];
    let reducer = TypeReducer::default();

    // Product keeps each peak where it was, min would flatten it into a plateau
    for aggregation in [
        Aggregation::Centroid,
        Aggregation::CoSet,
        Aggregation::CoSum,
        Aggregation::Height,
        Aggregation::ModiHe(vec![2., 2.]),
    ] {
        let crisp = aggregation
            .call(&fired, &consequents, &domain, TNorm::Product, SNorm::Max, &reducer)
            .unwrap()
            .crisp();

        assert!((crisp - 5.).abs() < 1e-6, "{aggregation:?}: {crisp}");
    }
}

#[test]
fn test_stronger_rule_pulls_output() {
    let (domain, consequents, low, high) = shoulder_system();
    let fired = [
        Fired::new(Firing::new(0.1, 0.2).unwrap(), low),
        Fired::new(Firing::new(0.6, 0.9).unwrap(), high),
    ];
    let reducer = TypeReducer::default();

    for aggregation in [Aggregation::Centroid, Aggregation::CoSet, Aggregation::CoSum] {
        let crisp = aggregation
            .call(&fired, &consequents, &domain, TNorm::Product, SNorm::Max, &reducer)
            .unwrap()
            .crisp();

        assert!(crisp > 5., "{aggregation:?}: {crisp}");
    }
}

#[test]
fn test_height_picks_peaks() {
    let domain = [0., 1., 2., 3.];
    let sets = [
        It2Set::new(vec![0., 0.2, 0.1, 0.], vec![0.1, 0.5, 0.3, 0.]).unwrap(),
        It2Set::new(vec![0., 0., 0.3, 0.4], vec![0., 0.2, 0.6, 0.6]).unwrap(),
    ];
    let reducer = TypeReducer::default().with_algorithm(Algorithm::Nt);

    // Peaks at 1 with (0.2, 0.5) and at 2 with (0.3, 0.6)
    let expected = (1. * 0.7 + 2. * 0.9) / 1.6;
    let crisp = height(&sets, &domain, &reducer).unwrap().crisp();
    assert!((crisp - expected).abs() < 1e-12);

    // Spreads of 1 and 2 quarter the second rule's weights
    let expected = (1. * 0.7 + 2. * 0.225) / 0.925;
    let crisp = modified_height(&sets, &[1., 2.], &domain, &reducer).unwrap().crisp();
    assert!((crisp - expected).abs() < 1e-12);

    assert!(modified_height(&sets, &[1.], &domain, &reducer).is_err());
    assert!(modified_height(&sets, &[1., 0.], &domain, &reducer).is_err());
}

#[test]
fn test_center_of_sum_adds_both_curves() {
    let domain = [0., 1.];
    let sets = [
        It2Set::new(vec![0.2, 0.], vec![0.4, 0.]).unwrap(),
        It2Set::new(vec![0.1, 0.3], vec![0.1, 0.5]).unwrap(),
    ];
    let reducer = TypeReducer::default().with_algorithm(Algorithm::Nt);

    // Summed curves: lower (0.3, 0.3), upper (0.5, 0.5)
    let crisp = center_of_sum(&sets, &domain, &reducer).unwrap().crisp();
    assert!((crisp - 0.5).abs() < 1e-12);
}

#[test]
fn test_no_rules_fired() {
    let (domain, consequents, low, _) = shoulder_system();
    let fired = [Fired::new(Firing::new(0., 0.).unwrap(), low)];
    let reducer = TypeReducer::default();

    let reduction = Aggregation::Centroid
        .call(&fired, &consequents, &domain, TNorm::Min, SNorm::Max, &reducer)
        .unwrap();
    assert_eq!(reduction.crisp(), 0.);

    let strict = reducer.with_empty_fallback(false);
    assert!(Aggregation::Height
        .call(&[], &consequents, &domain, TNorm::Min, SNorm::Max, &strict)
        .unwrap_err()
        .is_empty_input());
}

#[test]
fn test_unknown_consequent() {
    let (domain, consequents, _, _) = shoulder_system();
    let fired = [Fired::new(Firing::new(0.5, 1.).unwrap(), ConsequentKey::default())];

    for aggregation in [Aggregation::CoSet, Aggregation::Centroid] {
        assert!(aggregation
            .call(&fired, &consequents, &domain, TNorm::Min, SNorm::Max, &TypeReducer::default())
            .is_err());
    }
}
