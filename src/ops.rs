use num::Float;
use serde::{Deserialize, Serialize};

/// Triangular norm used to intersect membership grades, i.e. to apply a
/// firing strength to a consequent set.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TNorm {
    #[default]
    Min,
    Product,
    Lukasiewicz,
    Drastic,
    NilpotentMinimum,
    HamacherProduct,
}

impl TNorm {
    pub fn apply<F: Float>(self, a: F, b: F) -> F {
        match self {
            Self::Min => a.min(b),
            Self::Product => a * b,
            Self::Lukasiewicz => F::max(F::zero(), a + b - F::one()),
            Self::Drastic => {
                if a == F::one() {
                    b
                } else if b == F::one() {
                    a
                } else {
                    F::zero()
                }
            },
            Self::NilpotentMinimum => {
                if a + b > F::one() {
                    a.min(b)
                } else {
                    F::zero()
                }
            },
            Self::HamacherProduct => {
                if a == F::zero() && b == F::zero() {
                    F::zero()
                } else {
                    a * b / (a + b - a * b)
                }
            },
        }
    }

    /// Element-wise [`TNorm::apply`] over two membership curves.
    pub fn call<F: Float>(
        self,
        u: impl IntoIterator<Item = F>,
        v: impl IntoIterator<Item = F>,
    ) -> impl Iterator<Item = F> {
        u.into_iter().zip(v).map(move |(u, v)| self.apply(u, v))
    }
}

/// Triangular conorm used to unite membership grades, i.e. to aggregate
/// fired consequents.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SNorm {
    #[default]
    Max,
    ProbabilisticSum,
    BoundedSum,
    Drastic,
    NilpotentMaximum,
    EinsteinSum,
}

impl SNorm {
    pub fn apply<F: Float>(self, a: F, b: F) -> F {
        match self {
            Self::Max => a.max(b),
            Self::ProbabilisticSum => a + b - a * b,
            Self::BoundedSum => F::min(F::one(), a + b),
            Self::Drastic => {
                if a == F::zero() {
                    b
                } else if b == F::zero() {
                    a
                } else {
                    F::one()
                }
            },
            Self::NilpotentMaximum => {
                if a + b < F::one() {
                    a.max(b)
                } else {
                    F::one()
                }
            },
            Self::EinsteinSum => (a + b) / (F::one() + a * b),
        }
    }

    /// Element-wise [`SNorm::apply`] over two membership curves.
    pub fn call<F: Float>(
        self,
        u: impl IntoIterator<Item = F>,
        v: impl IntoIterator<Item = F>,
    ) -> impl Iterator<Item = F> {
        u.into_iter().zip(v).map(move |(u, v)| self.apply(u, v))
    }
}

#[cfg(test)]
const T_NORMS: [TNorm; 6] = [
    TNorm::Min,
    TNorm::Product,
    TNorm::Lukasiewicz,
    TNorm::Drastic,
    TNorm::NilpotentMinimum,
    TNorm::HamacherProduct,
];

#[cfg(test)]
const S_NORMS: [SNorm; 6] = [
    SNorm::Max,
    SNorm::ProbabilisticSum,
    SNorm::BoundedSum,
    SNorm::Drastic,
    SNorm::NilpotentMaximum,
    SNorm::EinsteinSum,
];

#[test]
fn test_t_norm_values() {
    assert_eq!(TNorm::Min.apply(0.3, 0.6), 0.3);
    assert_eq!(TNorm::Product.apply(0.5, 0.5), 0.25);
    assert!((TNorm::Lukasiewicz.apply(0.7, 0.6) - 0.3).abs() < 1e-12);
    assert_eq!(TNorm::Lukasiewicz.apply(0.2, 0.3), 0.);
    assert_eq!(TNorm::Drastic.apply(1., 0.4), 0.4);
    assert_eq!(TNorm::Drastic.apply(0.9, 0.4), 0.);
    assert_eq!(TNorm::NilpotentMinimum.apply(0.7, 0.6), 0.6);
    assert_eq!(TNorm::NilpotentMinimum.apply(0.5, 0.5), 0.);
    assert_eq!(TNorm::HamacherProduct.apply(0., 0.), 0.);
    assert!((TNorm::HamacherProduct.apply(0.5, 0.5) - 1. / 3.).abs() < 1e-12);
}

#[test]
fn test_s_norm_values() {
    assert_eq!(SNorm::Max.apply(0.3, 0.6), 0.6);
    assert_eq!(SNorm::ProbabilisticSum.apply(0.5, 0.5), 0.75);
    assert_eq!(SNorm::BoundedSum.apply(0.7, 0.6), 1.);
    assert_eq!(SNorm::Drastic.apply(0., 0.4), 0.4);
    assert_eq!(SNorm::Drastic.apply(0.1, 0.4), 1.);
    assert_eq!(SNorm::NilpotentMaximum.apply(0.2, 0.3), 0.3);
    assert_eq!(SNorm::NilpotentMaximum.apply(0.5, 0.5), 1.);
    assert_eq!(SNorm::EinsteinSum.apply(0.5, 0.5), 0.8);
}

#[test]
fn test_norm_identities() {
    let grades = [0., 0.1, 0.35, 0.5, 0.8, 1.];

    for &a in &grades {
        for t_norm in T_NORMS {
            assert!((t_norm.apply(a, 1.) - a).abs() < 1e-12, "{t_norm:?}({a}, 1)");
            assert!((t_norm.apply(1., a) - a).abs() < 1e-12, "{t_norm:?}(1, {a})");
        }

        for s_norm in S_NORMS {
            assert!((s_norm.apply(a, 0.) - a).abs() < 1e-12, "{s_norm:?}({a}, 0)");
            assert!((s_norm.apply(0., a) - a).abs() < 1e-12, "{s_norm:?}(0, {a})");
        }
    }
}

#[test]
fn test_call_is_element_wise() {
    let u = [0.2f32, 0.9, 1.];
    let v = [0.5f32, 0.5, 0.3];

    let met: Vec<f32> = TNorm::Min.call(u, v).collect();
    let joined: Vec<f32> = SNorm::Max.call(u, v).collect();

    assert_eq!(met, vec![0.2, 0.5, 0.3]);
    assert_eq!(joined, vec![0.5, 0.9, 1.]);
}
