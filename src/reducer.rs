use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::algorithms::Algorithm;
use crate::backend::{Backend, BackendKind};
use crate::error::Result;
use crate::interval::{Interval, ReducedInterval, Reduction};

/// Everything needed to pick and run a reduction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReducerConfig {
    pub algorithm: Algorithm,
    pub backend: BackendKind,
    /// WEKM multipliers, or the `[m, n]` coefficients of BMM and LBMM
    pub params: Vec<f64>,
    /// Return `(0, 0)` (or `0` for crisp algorithms) instead of
    /// [`EmptyInput`](crate::TypeReductionError::EmptyInput)
    pub empty_fallback: bool,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        ReducerConfig {
            algorithm: Algorithm::default(),
            backend: BackendKind::default(),
            params: Vec::new(),
            empty_fallback: true,
        }
    }
}

/// Runs the configured [`Algorithm`] on the configured [`Backend`].
///
/// ```
/// use it2_type_reduction::{Algorithm, Interval, TypeReducer};
///
/// let reducer = TypeReducer::default().with_algorithm(Algorithm::Km);
/// let reduced = reducer
///     .reduce(&[Interval::point(0., 0.5, 1.), Interval::point(1., 0.5, 1.)])
///     .unwrap();
///
/// assert!((reduced.crisp() - 0.5).abs() < 1e-9);
/// ```
#[derive(Clone, Default)]
pub struct TypeReducer {
    config: ReducerConfig,
    custom: Option<Arc<dyn Backend>>,
}

impl TypeReducer {
    pub fn new(config: ReducerConfig) -> Self {
        TypeReducer { config, custom: None }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.config.algorithm = algorithm;
        self
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.config.backend = backend;
        self.custom = None;
        self
    }

    /// Replaces the built-in backends with a caller supplied one
    pub fn with_custom_backend(mut self, backend: impl Backend + 'static) -> Self {
        self.custom = Some(Arc::new(backend));
        self
    }

    pub fn with_params(mut self, params: impl Into<Vec<f64>>) -> Self {
        self.config.params = params.into();
        self
    }

    pub fn with_empty_fallback(mut self, empty_fallback: bool) -> Self {
        self.config.empty_fallback = empty_fallback;
        self
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    pub fn algorithm(&self) -> Algorithm {
        self.config.algorithm
    }

    pub fn backend(&self) -> &dyn Backend {
        match &self.custom {
            Some(backend) => backend.as_ref(),
            None => self.config.backend.backend(),
        }
    }

    pub fn reduce(&self, intervals: &[Interval]) -> Result<Reduction> {
        self.reduce_with(self.config.algorithm, intervals)
    }

    /// Like [`TypeReducer::reduce`] with another algorithm but the same
    /// backend, params and fallback
    pub fn reduce_with(&self, algorithm: Algorithm, intervals: &[Interval]) -> Result<Reduction> {
        let backend = self.backend();

        debug!(
            "Reducing {} intervals with {algorithm} on the {} backend",
            intervals.len(),
            backend.name()
        );

        match backend.reduce(algorithm, intervals, &self.config.params) {
            Err(e) if e.is_empty_input() && self.config.empty_fallback => {
                warn!("{algorithm}: {e}, falling back to zero");

                Ok(if algorithm.is_two_sided() {
                    Reduction::Interval(ReducedInterval::ZERO)
                } else {
                    Reduction::Crisp(0.)
                })
            },
            result => result,
        }
    }
}

impl From<ReducerConfig> for TypeReducer {
    fn from(config: ReducerConfig) -> Self {
        Self::new(config)
    }
}

impl fmt::Debug for TypeReducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeReducer")
            .field("config", &self.config)
            .field("backend", &self.backend().name())
            .finish()
    }
}

#[cfg(test)]
struct Midpoints;

#[cfg(test)]
impl Backend for Midpoints {
    fn name(&self) -> &'static str {
        "midpoints"
    }

    fn reduce(&self, _: Algorithm, intervals: &[Interval], _: &[f64]) -> Result<Reduction> {
        let sum: f64 = intervals.iter().map(Interval::midpoint).sum();

        Ok(Reduction::Crisp(sum / intervals.len() as f64))
    }
}

#[test]
fn test_config_defaults() {
    let config: ReducerConfig = serde_json::from_str("{}").unwrap();

    assert_eq!(config, ReducerConfig::default());
    assert_eq!(config.algorithm, Algorithm::Eiasc);
    assert_eq!(config.backend, BackendKind::Reference);
    assert!(config.empty_fallback);
}

#[test]
fn test_config_json_round_trip() {
    let json = r#"{"algorithm": "BMM", "backend": "accelerated", "params": [0.3, 0.7]}"#;
    let config: ReducerConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.algorithm, Algorithm::Bmm);
    assert_eq!(config.backend, BackendKind::Accelerated);
    assert_eq!(config.params, vec![0.3, 0.7]);

    let back: ReducerConfig = serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
    assert_eq!(back, config);
}

#[test]
fn test_empty_fallback() {
    let zeros = [Interval::point(1., 0., 0.)];
    let reducer = TypeReducer::default();

    assert_eq!(reducer.reduce(&zeros), Ok(Reduction::Interval(ReducedInterval::ZERO)));
    assert_eq!(reducer.reduce_with(Algorithm::Nt, &[]), Ok(Reduction::Crisp(0.)));

    let strict = reducer.with_empty_fallback(false);
    assert!(strict.reduce(&zeros).unwrap_err().is_empty_input());
}

#[test]
fn test_invalid_input_is_not_swallowed() {
    let reducer = TypeReducer::default().with_algorithm(Algorithm::Bmm).with_params([0.5]);

    assert!(reducer.reduce(&[Interval::point(1., 0.5, 1.)]).is_err());
    assert!(TypeReducer::default()
        .reduce(&[Interval::point(1., 0.8, 0.2)])
        .is_err());
}

#[test]
fn test_custom_backend() {
    let reducer = TypeReducer::default().with_custom_backend(Midpoints);
    let intervals = [Interval::new(0., 2., 0., 1.), Interval::new(2., 4., 0., 1.)];

    assert_eq!(reducer.backend().name(), "midpoints");
    assert_eq!(reducer.reduce(&intervals), Ok(Reduction::Crisp(2.)));

    let reducer = reducer.with_backend(BackendKind::Accelerated);
    assert_eq!(reducer.backend().name(), "accelerated");
}
