//! Randomized properties every algorithm has to satisfy.

use it2_type_reduction::algorithms::{bmm, eiasc, ekm, km, lbmm, nt, twekm, wekm};
use it2_type_reduction::{
    trim, Accelerated, Algorithm, Backend, BackendKind, Interval, ReducedInterval, Reference, TypeReducer,
    TypeReductionError,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const TWO_SIDED: [Algorithm; 6] = [
    Algorithm::Km,
    Algorithm::Ekm,
    Algorithm::Wekm,
    Algorithm::Twekm,
    Algorithm::Eiasc,
    Algorithm::Wm,
];

/// `n` valid intervals with values in `[0, 100]`. About one in ten carries no
/// weight at all, so trimming gets exercised.
fn random_intervals(rng: &mut StdRng, n: usize) -> Vec<Interval> {
    (0..n)
        .map(|_| {
            let left = rng.random_range(0.0..95.0);
            let right = left + rng.random_range(0.0..5.0);
            let upper = if rng.random_bool(0.1) { 0. } else { rng.random_range(0.01..=1.0) };
            let lower = upper * rng.random_range(0.0..=1.0);

            Interval::new(left, right, lower, upper)
        })
        .collect()
}

/// Integer primary values, so repeated values and ties with the centroid are
/// common. Weights run from 1 down to 1e-12 and lower weights are often zero.
fn stiff_intervals(rng: &mut StdRng, n: usize) -> Vec<Interval> {
    (0..n)
        .map(|_| {
            let left = f64::from(rng.random_range(0..=20u8));
            let right = left + f64::from(rng.random_range(0..=1u8));
            let upper = if rng.random_bool(0.15) {
                0.
            } else {
                rng.random_range(0.1..=1.0) * 10f64.powi(-rng.random_range(0..=12i32))
            };
            let lower = if rng.random_bool(0.4) { 0. } else { upper * rng.random_range(0.0..=1.0) };

            Interval::new(left, right, lower, upper)
        })
        .collect()
}

fn ensure_weighted(intervals: &mut [Interval]) {
    if intervals.iter().all(|i| i.upper == 0.) {
        intervals[0].upper = 0.5;
    }
}

fn params_for(algorithm: Algorithm, n: usize) -> Vec<f64> {
    match algorithm {
        Algorithm::Wekm => (0..n).map(|i| 1. + (i % 3) as f64 * 0.25).collect(),
        Algorithm::Bmm | Algorithm::Lbmm => vec![0.4, 0.6],
        _ => Vec::new(),
    }
}

fn assert_close(actual: (f64, f64), expected: (f64, f64), tolerance: f64, context: &str) {
    assert!(
        (actual.0 - expected.0).abs() <= tolerance && (actual.1 - expected.1).abs() <= tolerance,
        "{context}: {actual:?} vs {expected:?}"
    );
}

#[test]
fn test_ordering_invariance() {
    let mut rng = StdRng::seed_from_u64(7);

    for n in [1, 2, 3, 10, 37] {
        let mut intervals = random_intervals(&mut rng, n);
        ensure_weighted(&mut intervals);

        for algorithm in Algorithm::ALL {
            let params = params_for(algorithm, n);
            let expected = algorithm.call(&intervals, &params).unwrap().bounds();

            // WEKM multipliers travel with their intervals
            let mut paired: Vec<(Interval, f64)> = intervals
                .iter()
                .copied()
                .zip(params.iter().copied().chain(std::iter::repeat(0.)))
                .collect();
            paired.shuffle(&mut rng);

            let shuffled: Vec<Interval> = paired.iter().map(|(i, _)| *i).collect();
            let shuffled_params = match algorithm {
                Algorithm::Wekm => paired.iter().map(|(_, w)| *w).collect(),
                _ => params.clone(),
            };
            let actual = algorithm.call(&shuffled, &shuffled_params).unwrap().bounds();

            assert_close(actual, expected, 1e-9, &format!("{algorithm}, n = {n}"));
        }
    }
}

#[test]
fn test_bounds() {
    let mut rng = StdRng::seed_from_u64(11);

    for _ in 0..200 {
        let n = rng.random_range(1..=60);
        let mut intervals = random_intervals(&mut rng, n);
        ensure_weighted(&mut intervals);

        let min_left = intervals.iter().map(|i| i.left).fold(f64::INFINITY, f64::min);
        let max_right = intervals.iter().map(|i| i.right).fold(f64::NEG_INFINITY, f64::max);

        for algorithm in TWO_SIDED {
            let reduced = algorithm
                .call(&intervals, &params_for(algorithm, n))
                .unwrap()
                .interval()
                .unwrap();

            assert!(reduced.left <= reduced.right + 1e-9, "{algorithm}: {reduced:?}");
            assert!(min_left <= reduced.left + 1e-9, "{algorithm}: {reduced:?} below {min_left}");
            assert!(reduced.right <= max_right + 1e-9, "{algorithm}: {reduced:?} above {max_right}");
        }
    }
}

#[test]
fn test_single_interval() {
    let intervals = [Interval::new(5., 5., 0.3, 0.7)];

    for algorithm in TWO_SIDED {
        let reduced = algorithm.call(&intervals, &params_for(algorithm, 1)).unwrap();

        assert_eq!(reduced.interval(), Some(ReducedInterval::new(5., 5.)), "{algorithm}");
    }
}

#[test]
fn test_uniform_weights_give_the_weighted_average() {
    let mut rng = StdRng::seed_from_u64(3);

    for n in [2, 5, 17, 50] {
        let w = rng.random_range(0.1..=1.0);
        let values: Vec<f64> = (0..n).map(|_| rng.random_range(0.0..100.0)).collect();
        let intervals: Vec<Interval> = values.iter().map(|&x| Interval::point(x, w, w)).collect();
        let mean = values.iter().sum::<f64>() / n as f64;

        for reduced in [km(&intervals), ekm(&intervals), eiasc(&intervals)] {
            let reduced = reduced.unwrap();

            assert_close((reduced.left, reduced.right), (mean, mean), 1e-9, &format!("n = {n}"));
        }
    }
}

#[test]
fn test_km_ekm_eiasc_agree() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..500 {
        let n = rng.random_range(2..=50);
        let mut intervals = random_intervals(&mut rng, n);
        ensure_weighted(&mut intervals);

        let km = km(&intervals).unwrap();
        let ekm = ekm(&intervals).unwrap();
        let eiasc = eiasc(&intervals).unwrap();

        assert_close((ekm.left, ekm.right), (km.left, km.right), 1e-6, "EKM vs KM");
        assert_close((eiasc.left, eiasc.right), (km.left, km.right), 1e-6, "EIASC vs KM");
    }
}

#[test]
fn test_regression_fixture() {
    let intervals: Vec<Interval> = [
        (1., 2., 0., 0.),
        (1., 2., 0., 0.),
        (1., 2., 0., 0.),
        (1., 2., 0., 0.),
        (1., 2., 3., 4.),
        (2., 3., 4., 5.),
        (3., 4., 5., 6.),
        (4., 5., 6., 7.),
        (1., 2., 0., 0.),
        (1., 2., 0., 0.),
        (1., 2., 0., 0.),
        (0., 2., 10., 10.),
    ]
    .into_iter()
    .map(Interval::from)
    .collect();

    // 51/29 and 97/30
    let pinned = (1.7586206896551724, 3.2333333333333334);

    for reduced in [km(&intervals), ekm(&intervals), eiasc(&intervals)] {
        let reduced = reduced.unwrap();

        assert_close((reduced.left, reduced.right), pinned, 1e-12, "fixture");
    }
}

#[test]
fn test_trim_idempotent() {
    let mut rng = StdRng::seed_from_u64(5);

    for _ in 0..100 {
        let n = rng.random_range(1..=30);
        let intervals = random_intervals(&mut rng, n);

        if let Some(once) = trim(&intervals) {
            assert_eq!(trim(once), Some(once));
            assert!(once.first().is_some_and(|i| i.upper > 0.));
            assert!(once.last().is_some_and(|i| i.upper > 0.));
        } else {
            assert!(intervals.iter().all(|i| i.upper == 0.));
        }
    }
}

#[test]
fn test_crisp_methods_stay_within_midpoints() {
    let mut rng = StdRng::seed_from_u64(13);

    for _ in 0..200 {
        let n = rng.random_range(1..=40);
        let mut intervals = random_intervals(&mut rng, n);
        ensure_weighted(&mut intervals);

        let midpoints = intervals.iter().map(Interval::midpoint);
        let low = midpoints.clone().fold(f64::INFINITY, f64::min) - 1e-9;
        let high = midpoints.fold(f64::NEG_INFINITY, f64::max) + 1e-9;
        let m = rng.random_range(0.0..=1.0);

        for crisp in [nt(&intervals).unwrap(), bmm(&intervals, m, 1. - m).unwrap()] {
            assert!(low <= crisp && crisp <= high, "{crisp} outside [{low}, {high}]");
        }

        let crisp = lbmm(&intervals, m, 1. - m).unwrap();
        let min_left = intervals.iter().map(|i| i.left).fold(f64::INFINITY, f64::min);
        let max_right = intervals.iter().map(|i| i.right).fold(f64::NEG_INFINITY, f64::max);
        assert!(min_left - 1e-9 <= crisp && crisp <= max_right + 1e-9);
    }
}

#[test]
fn test_weighted_variants() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut intervals = random_intervals(&mut rng, 25);
    ensure_weighted(&mut intervals);

    let ones = vec![1.; intervals.len()];
    assert_eq!(wekm(&intervals, &ones), ekm(&intervals));

    let reduced = twekm(&intervals).unwrap();
    let ekm = ekm(&intervals).unwrap();
    // Halving two end weights moves the bounds, but only a little
    assert!((reduced.left - ekm.left).abs() < 10.);
    assert!((reduced.right - ekm.right).abs() < 10.);

    assert!(matches!(
        wekm(&intervals, &ones[1..]),
        Err(TypeReductionError::InvalidArgument { argument: "weights", .. })
    ));
}

#[test]
fn test_backends_agree() {
    let mut rng = StdRng::seed_from_u64(23);

    for _ in 0..300 {
        let n = rng.random_range(1..=80);
        let mut intervals = random_intervals(&mut rng, n);
        ensure_weighted(&mut intervals);

        for algorithm in Algorithm::ALL {
            let params = params_for(algorithm, n);
            let reference = Reference.reduce(algorithm, &intervals, &params).unwrap();
            let accelerated = Accelerated.reduce(algorithm, &intervals, &params).unwrap();

            assert_close(
                accelerated.bounds(),
                reference.bounds(),
                1e-6,
                &format!("{algorithm}, n = {n}"),
            );
        }
    }
}

#[test]
fn test_invalid_intervals_are_rejected() {
    let bad = [
        Interval::new(0., 1., 0.6, 0.5),
        Interval::new(2., 1., 0.1, 0.5),
        Interval::new(0., f64::NAN, 0.1, 0.5),
        Interval::new(0., 1., -0.1, 0.5),
    ];

    for interval in bad {
        let intervals = [Interval::point(3., 0.2, 0.4), interval];

        for algorithm in Algorithm::ALL {
            let error = algorithm.call(&intervals, &params_for(algorithm, 2)).unwrap_err();

            assert!(
                matches!(error, TypeReductionError::InvalidArgument { index: Some(1), .. }),
                "{algorithm}: {error}"
            );
        }
    }
}

#[test]
fn test_fixed_point_just_above_a_sample() {
    // The left bound sits about 5e-7 above the middle value
    let intervals = [
        Interval::point(1., 0., 1e-4),
        Interval::point(5., 0., 1.),
        Interval::point(9.005, 1e-4, 1e-4),
    ];
    let expected = eiasc(&intervals).unwrap();

    assert_close(
        (expected.left, expected.right),
        ((1e-4 + 5. + 9.005e-4) / 1.0002, 9.005),
        1e-12,
        "EIASC",
    );

    for (name, reduced) in [
        ("KM", km(&intervals)),
        ("EKM", ekm(&intervals)),
        ("WEKM", wekm(&intervals, &[1.; 3])),
    ] {
        let reduced = reduced.unwrap_or_else(|error| panic!("{name}: {error}"));

        assert_close((reduced.left, reduced.right), (expected.left, expected.right), 1e-9, name);
    }

    assert!(twekm(&intervals).is_ok());

    for backend in [BackendKind::Reference, BackendKind::Accelerated] {
        let reduced = TypeReducer::default()
            .with_algorithm(Algorithm::Km)
            .with_backend(backend)
            .reduce(&intervals)
            .unwrap();

        assert_close(reduced.bounds(), (expected.left, expected.right), 1e-9, &backend.to_string());
    }
}

#[test]
fn test_backends_agree_on_a_tiny_tail() {
    let intervals = [Interval::point(3., 0., 1.), Interval::point(10., 1e-12, 1e-12)];

    for algorithm in [Algorithm::Km, Algorithm::Ekm, Algorithm::Eiasc, Algorithm::Wm] {
        let reference = Reference.reduce(algorithm, &intervals, &[]).unwrap().bounds();
        let accelerated = Accelerated.reduce(algorithm, &intervals, &[]).unwrap().bounds();

        assert_close(accelerated, reference, 1e-9, &algorithm.to_string());
    }

    let (_, right) = Accelerated.reduce(Algorithm::Km, &intervals, &[]).unwrap().bounds();
    assert!((right - 10.).abs() < 1e-9, "{right}");
}

#[test]
fn test_stiff_inputs_converge_and_agree() {
    let mut rng = StdRng::seed_from_u64(29);

    for _ in 0..500 {
        let n = rng.random_range(2..=40);
        let mut intervals = stiff_intervals(&mut rng, n);
        ensure_weighted(&mut intervals);

        let km = km(&intervals).unwrap_or_else(|error| panic!("KM on {intervals:?}: {error}"));
        let ekm = ekm(&intervals).unwrap_or_else(|error| panic!("EKM on {intervals:?}: {error}"));
        let eiasc = eiasc(&intervals).unwrap();

        assert_close((ekm.left, ekm.right), (km.left, km.right), 1e-6, "EKM vs KM");
        assert_close((eiasc.left, eiasc.right), (km.left, km.right), 1e-6, "EIASC vs KM");

        for algorithm in Algorithm::ALL {
            let params = params_for(algorithm, n);
            let reference = Reference
                .reduce(algorithm, &intervals, &params)
                .unwrap_or_else(|error| panic!("{algorithm} on {intervals:?}: {error}"));
            let accelerated = Accelerated
                .reduce(algorithm, &intervals, &params)
                .unwrap_or_else(|error| panic!("accelerated {algorithm} on {intervals:?}: {error}"));

            assert_close(
                accelerated.bounds(),
                reference.bounds(),
                1e-6,
                &format!("{algorithm}, n = {n}"),
            );
        }
    }
}
