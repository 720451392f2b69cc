//! End to end: configuration, fired rules, aggregation and crisp output.

use it2_type_reduction::aggregation::{center_of_sets, centroid};
use it2_type_reduction::{
    crisp_all, domain, Aggregation, Algorithm, BackendKind, Consequents, Firing, Fired, It2Set, ReducerConfig,
    Reduction, SNorm, TNorm, TypeReducer,
};

struct System {
    domain: Vec<f64>,
    consequents: Consequents,
    fired: Vec<Fired>,
}

/// Three Gaussian-ish consequents on `[0, 10]`; the middle one fired by two
/// rules.
fn system() -> System {
    let domain = domain(0., 10., 201).unwrap();
    let mut consequents = Consequents::new();
    let mut bump = |center: f64| {
        let upper = domain.iter().map(|x| (-(x - center).powi(2) / 2.).exp()).collect();
        let lower = domain.iter().map(|x| 0.6 * (-(x - center).powi(2) / 1.2).exp()).collect();

        consequents.add(It2Set::new(lower, upper).unwrap())
    };
    let low = bump(2.);
    let mid = bump(5.);
    let high = bump(8.);

    let fired = vec![
        Fired::new(Firing::new(0.1, 0.3).unwrap(), low),
        Fired::new(Firing::new(0.5, 0.8).unwrap(), mid),
        Fired::new(Firing::new(0.2, 0.4).unwrap(), mid),
        Fired::new(Firing::new(0.3, 0.6).unwrap(), high),
    ];

    System {
        domain,
        consequents,
        fired,
    }
}

fn aggregations() -> [Aggregation; 5] {
    [
        Aggregation::Centroid,
        Aggregation::CoSet,
        Aggregation::CoSum,
        Aggregation::Height,
        Aggregation::ModiHe(vec![1., 1.5, 1.5, 2.]),
    ]
}

#[test]
fn test_every_strategy_and_algorithm() {
    let System {
        domain,
        consequents,
        fired,
    } = system();

    // WEKM needs one multiplier per interval, and the interval count differs per strategy
    for algorithm in Algorithm::ALL.into_iter().filter(|&a| a != Algorithm::Wekm) {
        let params = match algorithm {
            Algorithm::Bmm | Algorithm::Lbmm => vec![0.5, 0.5],
            _ => Vec::new(),
        };
        let reducer = TypeReducer::default().with_algorithm(algorithm).with_params(params);

        for aggregation in aggregations() {
            let reduction = aggregation
                .call(&fired, &consequents, &domain, TNorm::Min, SNorm::Max, &reducer)
                .unwrap();
            let crisp = reduction.crisp();

            assert!((0. ..=10.).contains(&crisp), "{algorithm} {aggregation:?}: {crisp}");
            assert_eq!(matches!(reduction, Reduction::Interval(_)), algorithm.is_two_sided());
        }
    }
}

#[test]
fn test_backends_agree_end_to_end() {
    let System {
        domain,
        consequents,
        fired,
    } = system();

    for algorithm in [Algorithm::Km, Algorithm::Ekm, Algorithm::Eiasc, Algorithm::Wm] {
        let reference = TypeReducer::default().with_algorithm(algorithm);
        let accelerated = reference.clone().with_backend(BackendKind::Accelerated);

        for aggregation in aggregations() {
            let (l1, r1) = aggregation
                .call(&fired, &consequents, &domain, TNorm::Product, SNorm::ProbabilisticSum, &reference)
                .unwrap()
                .bounds();
            let (l2, r2) = aggregation
                .call(&fired, &consequents, &domain, TNorm::Product, SNorm::ProbabilisticSum, &accelerated)
                .unwrap()
                .bounds();

            assert!((l1 - l2).abs() < 1e-6 && (r1 - r2).abs() < 1e-6, "{algorithm} {aggregation:?}");
        }
    }
}

#[test]
fn test_configured_from_json() {
    let config: ReducerConfig = serde_json::from_str(r#"{"algorithm": "KM", "backend": "accelerated"}"#).unwrap();
    let reducer = TypeReducer::from(config);
    let System {
        domain,
        consequents,
        fired,
    } = system();

    assert_eq!(reducer.backend().name(), "accelerated");

    let outputs: Vec<Reduction> = aggregations()
        .iter()
        .map(|aggregation| {
            aggregation
                .call(&fired, &consequents, &domain, TNorm::Product, SNorm::Max, &reducer)
                .unwrap()
        })
        .collect();

    let crisps = crisp_all(outputs);
    assert_eq!(crisps.len(), 5);
    // The middle consequent dominates, so every strategy lands near it
    for crisp in crisps {
        assert!((4. ..6.).contains(&crisp), "{crisp}");
    }
}

#[test]
fn test_center_of_sets_matches_manual_construction() {
    let System {
        domain,
        consequents,
        fired,
    } = system();
    let reducer = TypeReducer::default();

    let manual: Vec<it2_type_reduction::Interval> = fired
        .iter()
        .map(|rule| {
            let set = consequents.get(rule.consequent).unwrap();
            let (left, right) = centroid(set, &domain, &reducer).unwrap().bounds();

            it2_type_reduction::Interval::new(left, right, rule.firing.lower, rule.firing.upper)
        })
        .collect();

    assert_eq!(
        center_of_sets(&fired, &consequents, &domain, &reducer),
        reducer.reduce(&manual)
    );
}
