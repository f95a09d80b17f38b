use rand::{
    Rng,
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use rtnorm::coverage::CoverageConfig;
use rtnorm::ransac::RansacConfig;
use rtnorm::stats::pearson_correlation;
use rtnorm::{
    CandidateSelection,
    IterativeOutlierRemover,
    NormalizerError,
    OutlierMethod,
    Point,
    RtNormalizationConfig,
    Termination,
    fit_robust,
    remove_outliers,
};

fn to_points(pairs: &[(f64, f64)]) -> Vec<Point> {
    pairs.iter().copied().map(Point::from).collect()
}

/// Nine well correlated (measured RT, reference RT) pairs.
fn clean_pairs() -> Vec<Point> {
    to_points(&[
        (1497.57, 1881.0),
        (2045.98, 2409.0),
        (2151.48, 2509.0),
        (1924.08, 2291.0),
        (612.98, 990.0),
        (1086.25, 1470.0),
        (1133.89, 1519.0),
        (799.53, 1188.0),
        (1397.15, 1765.0),
    ])
}

/// The clean pairs with one egregious outlier at position 4.
fn pairs_with_outlier() -> Vec<Point> {
    let mut out = clean_pairs();
    out.insert(4, Point { x: 1700.0, y: 900.0 });
    out
}

#[test]
fn test_clean_pairs_are_untouched() {
    let pairs = clean_pairs();
    assert!(pearson_correlation(&pairs).unwrap() > 0.9999);
    let kept = remove_outliers(&pairs, 0.95, 0.6).unwrap();
    assert_eq!(kept, pairs);
}

#[test]
fn test_outlier_is_removed() {
    let kept = remove_outliers(&pairs_with_outlier(), 0.8, 0.9).unwrap();
    assert_eq!(kept, clean_pairs());
}

#[test]
fn test_outlier_tolerated_by_low_threshold() {
    // r is about 0.78 with the outlier, which already beats 0.6
    let pairs = pairs_with_outlier();
    let kept = remove_outliers(&pairs, 0.95, 0.6).unwrap();
    assert_eq!(kept, pairs);
}

#[test]
fn test_retention_floor_blocks_removal() {
    // ceil(10 * 0.95) = 10, so nothing may be dropped
    let pairs = pairs_with_outlier();
    let res = IterativeOutlierRemover::new(0.95, 0.99)
        .unwrap()
        .run(&pairs)
        .unwrap();
    assert_eq!(res.termination, Termination::RetentionFloor);
    assert_eq!(res.kept, pairs);
    assert!(res.removed_indices.is_empty());
}

#[test]
fn test_detailed_removal() {
    let res = IterativeOutlierRemover::new(0.8, 0.9)
        .unwrap()
        .run(&pairs_with_outlier())
        .unwrap();
    assert_eq!(res.removed_indices, vec![4]);
    assert_eq!(res.termination, Termination::ThresholdMet);
    assert!(res.correlation.unwrap() > 0.9999);
}

#[test]
fn test_idempotence() {
    for (fraction, threshold) in [(0.8, 0.9), (0.95, 0.6), (0.5, 0.999), (0.95, 0.99)] {
        let once = remove_outliers(&pairs_with_outlier(), fraction, threshold).unwrap();
        let twice = remove_outliers(&once, fraction, threshold).unwrap();
        assert_eq!(once, twice);
    }
}

#[test]
fn test_idempotence_on_noisy_lines() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    for _ in 0..200 {
        let n = rng.gen_range(3..40);
        let slope = rng.gen_range(0.5..2.0);
        let noise = rng.gen_range(0.1..20.0);
        let mut pairs: Vec<Point> = (0..n)
            .map(|i| {
                let x = 10.0 * i as f64 + rng.gen_range(-1.0..1.0);
                Point {
                    x,
                    y: slope * x + rng.gen_range(-noise..noise),
                }
            })
            .collect();
        if n > 5 && rng.gen_bool(0.5) {
            let k = rng.gen_range(0..n);
            pairs[k].y += rng.gen_range(-500.0..500.0);
        }

        for (fraction, threshold) in [(0.7, 0.999), (0.95, 0.6), (0.8, 0.9)] {
            let remover = IterativeOutlierRemover::new(fraction, threshold).unwrap();
            let first = remover.run(&pairs).unwrap();
            let second = remover.run(&first.kept).unwrap();
            assert_eq!(first.kept, second.kept, "n = {}", n);
            assert!(second.removed_indices.is_empty());
            if first.termination == Termination::RetentionFloor {
                assert_eq!(first.kept, pairs);
                assert!(first.removed_indices.is_empty());
            }
        }
    }
}

#[test]
fn test_small_inputs_unchanged() {
    let pairs = pairs_with_outlier();
    for n in 0..3 {
        let kept = remove_outliers(&pairs[..n], 0.95, 0.99).unwrap();
        assert_eq!(kept, pairs[..n].to_vec());
    }
    let res = IterativeOutlierRemover::default().run(&pairs[..2]).unwrap();
    assert_eq!(res.termination, Termination::TooFewPoints);
}

#[test]
fn test_invalid_parameters_checked_first() {
    let pairs = &pairs_with_outlier()[..2];
    assert!(matches!(
        remove_outliers(pairs, 0.0, 0.6),
        Err(NormalizerError::InvalidParameter { .. })
    ));
    assert!(matches!(
        remove_outliers(pairs, 0.95, 1.01),
        Err(NormalizerError::InvalidParameter { .. })
    ));
}

#[test]
fn test_order_is_preserved() {
    let x = [
        1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        17.0, 18.0, 19.0, 1.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0, 28.0, 29.0, 30.0,
    ];
    let y = [
        1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0,
        17.0, 18.0, 19.0, 20.0, 1.0, 22.0, 23.0, 24.0, 25.0, 26.0, 27.0, 28.0, 29.0, 30.0,
    ];
    let pairs: Vec<Point> = x.iter().zip(y.iter()).map(|(&x, &y)| Point { x, y }).collect();

    for candidate in [CandidateSelection::Residual, CandidateSelection::Jackknife] {
        for use_chauvenet in [false, true] {
            let res = IterativeOutlierRemover::new(0.2, 0.9f64.sqrt())
                .unwrap()
                .with_candidate(candidate)
                .with_chauvenet(use_chauvenet)
                .run(&pairs)
                .unwrap();
            assert_eq!(res.kept.len(), 28);
            assert_eq!(res.kept[18], Point { x: 19.0, y: 19.0 });
            assert_eq!(res.kept[19], Point { x: 22.0, y: 22.0 });
            let mut removed = res.removed_indices.clone();
            removed.sort();
            assert_eq!(removed, vec![19, 20]);
        }
    }
}

#[test]
fn test_fit_robust_methods() {
    let pairs = pairs_with_outlier();
    for method in [OutlierMethod::IterResidual, OutlierMethod::IterJackknife, OutlierMethod::Ransac] {
        let config = RtNormalizationConfig {
            outlier_method: method,
            min_retained_fraction: 0.8,
            correlation_threshold: 0.9,
            ransac: RansacConfig {
                max_residual: 50.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let fit = fit_robust(&pairs, &config).unwrap();
        assert_eq!(fit.removed_indices, vec![4], "{:?}", method);
        assert_eq!(fit.kept, clean_pairs());
        assert!((fit.slope - 0.98370).abs() < 1e-4);
        assert!((fit.intercept - 397.698).abs() < 1e-2);
        assert!(fit.rmse(&fit.kept) < 10.0);
        assert!((fit.predict(1000.0) - (0.98370 * 1000.0 + 397.698)).abs() < 0.2);
    }
}

#[test]
fn test_fit_robust_without_removal_fails() {
    let config = RtNormalizationConfig {
        outlier_method: OutlierMethod::None,
        correlation_threshold: 0.9,
        ..Default::default()
    };
    let err = fit_robust(&pairs_with_outlier(), &config).unwrap_err();
    assert!(matches!(err, NormalizerError::UnableToFit { .. }));

    let fit = fit_robust(&clean_pairs(), &config).unwrap();
    assert!(fit.removed_indices.is_empty());
    assert_eq!(fit.termination, Termination::ThresholdMet);
}

#[test]
fn test_fit_robust_too_few_pairs() {
    let pairs = vec![Point { x: 1.0, y: 2.0 }];
    let err = fit_robust(&pairs, &RtNormalizationConfig::default()).unwrap_err();
    assert_eq!(
        err,
        NormalizerError::InsufficientPoints {
            required: 2,
            found: 1
        }
    );
}

#[test]
fn test_fit_robust_coverage() {
    // Reference RTs of the clean pairs fill 6 of 10 bins
    let mut config = RtNormalizationConfig {
        min_retained_fraction: 0.8,
        correlation_threshold: 0.9,
        coverage: Some(CoverageConfig {
            min_bins_filled: 8,
            ..Default::default()
        }),
        ..Default::default()
    };
    let err = fit_robust(&pairs_with_outlier(), &config).unwrap_err();
    assert_eq!(
        err,
        NormalizerError::InsufficientCoverage {
            filled_bins: 6,
            required: 8
        }
    );

    if let Some(coverage) = config.coverage.as_mut() {
        coverage.min_bins_filled = 6;
    }
    assert!(fit_robust(&pairs_with_outlier(), &config).is_ok());
}

#[test]
fn test_config_from_partial_json() {
    let config: RtNormalizationConfig =
        serde_json::from_str(r#"{"outlier_method": "ransac", "ransac": {"seed": 7}}"#).unwrap();
    assert_eq!(config.outlier_method, OutlierMethod::Ransac);
    assert_eq!(config.ransac.seed, 7);
    assert_eq!(config.ransac.max_iterations, 1000);
    assert_eq!(config.min_retained_fraction, 0.95);
    assert_eq!(config.correlation_threshold, 0.6);
}
