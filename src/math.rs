use num::Float;

/// Similar to numpy.interp: piecewise-linear through `coords`, held flat
/// outside of the first and last x coordinate
pub(crate) fn interp<F: Float>(x_input: impl IntoIterator<Item = F>, coords: &[(F, F)]) -> Vec<F> {
    x_input
        .into_iter()
        .map(|x| {
            let (Some(&(x_first, y_first)), Some(&(x_last, y_last))) = (coords.first(), coords.last()) else {
                return F::zero();
            };

            // Base cases
            if x <= x_first {
                return y_first;
            }
            if x >= x_last {
                return y_last;
            }

            for window in coords.windows(2) {
                let (x1, y1) = window[0];
                let (x2, y2) = window[1];

                // Actual interpolation
                if x1 <= x && x <= x2 {
                    if x2 == x1 {
                        return y2;
                    }

                    return y1 + (x - x1) * (y2 - y1) / (x2 - x1);
                }
            }

            y_last
        })
        .collect()
}

/// Index of the first maximum, like numpy.argmax
pub(crate) fn argmax<F: Float>(values: &[F]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, F)>, (i, &v)| match best {
            Some((_, b)) if v <= b => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

#[test]
fn test_interp() {
    let x = [0., 1., 1.5, 2.72, 3.24];
    let coords = [(1., 3.), (2., 2.), (3., 0.)];

    assert_eq!(interp(x, &coords), vec![3., 3., 2.5, 0.5599999999999996, 0.]);

    let x = [2.5, -1., 7.5];
    let coords = [(0., 0.), (1., 2.), (2., 5.), (3., 3.), (4.5, 2.)];

    assert_eq!(interp(x, &coords), vec![4., 0., 2.]);
}

#[test]
fn test_interp_vertical_edge() {
    // A crisp step: both points share an x coordinate
    let coords = [(0., 0.), (1., 0.), (1., 1.), (2., 1.)];

    assert_eq!(interp([0.5, 1., 1.5], &coords), vec![0., 0., 1.]);
}

#[test]
fn test_argmax_takes_first_peak() {
    assert_eq!(argmax(&[0.1, 0.9, 0.3, 0.9]), Some(1));
    assert_eq!(argmax::<f64>(&[]), None);
}
