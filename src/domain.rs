use crate::error::{Result, TypeReductionError};

/// Samples the output domain `[min, max]` at `n` evenly spaced points, the
/// way `numpy.linspace` does. Both ends are hit exactly, so a set sampled on
/// the domain puts its first and last membership on `min` and `max`.
pub fn domain(min: f64, max: f64, n: usize) -> Result<Vec<f64>> {
    if !min.is_finite() || !max.is_finite() {
        return Err(TypeReductionError::invalid_argument(
            "domain",
            format!("bounds [{min}, {max}] must be finite"),
        ));
    }

    if min > max {
        return Err(TypeReductionError::invalid_argument(
            "domain",
            format!("lower bound {min} exceeds upper bound {max}"),
        ));
    }

    let samples = match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n - 1) as f64;

            (0..n)
                .map(|i| if i == n - 1 { max } else { min + step * i as f64 })
                .collect()
        },
    };

    Ok(samples)
}

#[test]
fn test_domain_samples() {
    assert_eq!(domain(0., 1., 5), Ok(vec![0., 0.25, 0.5, 0.75, 1.]));
    assert_eq!(domain(3., 7., 1), Ok(vec![3.]));
    assert_eq!(domain(3., 7., 0), Ok(Vec::new()));
}

#[test]
fn test_domain_ends_exactly_on_max() {
    let samples = domain(0., 0.3, 7).unwrap();

    assert_eq!(samples.len(), 7);
    assert_eq!(samples.last(), Some(&0.3));
    assert!(samples.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_domain_rejects_bad_bounds() {
    assert!(matches!(
        domain(2., 1., 10),
        Err(TypeReductionError::InvalidArgument { argument: "domain", .. })
    ));
    assert!(domain(0., f64::INFINITY, 10).is_err());
}
