//! Error types for type reduction.

use thiserror::Error;

use crate::algorithms::Algorithm;

/// Everything that can go wrong while reducing an interval set.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeReductionError {
    /// No interval carries any weight, either because the input was empty or
    /// because every upper weight is zero. Callers usually treat this as
    /// "no rule fired".
    #[error("Empty input: no interval has a nonzero upper weight")]
    EmptyInput,

    /// A malformed interval, parameter or set was supplied.
    #[error("Invalid argument '{argument}'{}: {reason}", at_index(.index))]
    InvalidArgument {
        /// The name of the argument
        argument: &'static str,
        /// Position of the offending element, when there is one
        index: Option<usize>,
        /// What is wrong with it
        reason: String,
    },

    /// An iterative algorithm did not settle on a switch point within its
    /// iteration cap. This only happens on malformed input that slipped past
    /// validation.
    #[error("{algorithm} did not converge within {iterations} iterations")]
    Convergence {
        /// The algorithm that gave up
        algorithm: Algorithm,
        /// How many iterations were spent
        iterations: usize,
    },
}

fn at_index(index: &Option<usize>) -> String {
    index.map(|i| format!(" at index {i}")).unwrap_or_default()
}

/// A specialized `Result` type for type reduction.
pub type Result<T> = std::result::Result<T, TypeReductionError>;

impl TypeReductionError {
    /// Create an error for an invalid argument that is not tied to a position.
    ///
    /// # Example
    /// ```
    /// use it2_type_reduction::TypeReductionError;
    ///
    /// let error = TypeReductionError::invalid_argument("params", "expected 2 values");
    /// assert!(error.to_string().contains("params"));
    /// ```
    pub fn invalid_argument(argument: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            index: None,
            reason: reason.into(),
        }
    }

    /// Create an error for an invalid element of a sequence argument.
    ///
    /// # Example
    /// ```
    /// use it2_type_reduction::TypeReductionError;
    ///
    /// let error = TypeReductionError::invalid_element("intervals", 3, "lower weight exceeds upper weight");
    /// assert!(error.to_string().contains("at index 3"));
    /// ```
    pub fn invalid_element(argument: &'static str, index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument,
            index: Some(index),
            reason: reason.into(),
        }
    }

    /// Create an error for a sequence argument whose length doesn't match.
    pub fn length_mismatch(argument: &'static str, expected: usize, actual: usize) -> Self {
        Self::invalid_argument(argument, format!("expected {expected} values, got {actual}"))
    }

    /// Create an error for an algorithm that exceeded its iteration cap.
    pub fn convergence(algorithm: Algorithm, iterations: usize) -> Self {
        Self::Convergence { algorithm, iterations }
    }

    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}

#[test]
fn test_empty_input_message() {
    assert_eq!(
        TypeReductionError::EmptyInput.to_string(),
        "Empty input: no interval has a nonzero upper weight"
    );
    assert!(TypeReductionError::EmptyInput.is_empty_input());
}

#[test]
fn test_invalid_argument_message() {
    let error = TypeReductionError::invalid_argument("params", "expected 2 values");
    assert_eq!(error.to_string(), "Invalid argument 'params': expected 2 values");

    let error = TypeReductionError::invalid_element("intervals", 4, "lower weight is NaN");
    assert_eq!(
        error.to_string(),
        "Invalid argument 'intervals' at index 4: lower weight is NaN"
    );
}

#[test]
fn test_length_mismatch_message() {
    let error = TypeReductionError::length_mismatch("params", 5, 3);
    assert_eq!(error.to_string(), "Invalid argument 'params': expected 5 values, got 3");
}

#[test]
fn test_convergence_message() {
    let error = TypeReductionError::convergence(Algorithm::Km, 40);
    assert_eq!(error.to_string(), "KM did not converge within 40 iterations");
    assert!(!error.is_empty_input());
}
