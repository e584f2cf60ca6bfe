//! Property-based tests for running stage statistics

use bamboo::stage::StageStats;
use proptest::prelude::*;

proptest! {
    #[test]
    fn test_mean_and_stddev_match_direct_formulae(
        samples in proptest::collection::vec(0.0f64..10.0, 1..64)
    ) {
        let mut stats = StageStats::default();
        for &t in &samples {
            stats.record_secs(t);
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / n;

        prop_assert_eq!(stats.count, samples.len() as u64);
        prop_assert!((stats.mean() - mean).abs() < 1e-9);
        prop_assert!((stats.stddev() - variance.sqrt()).abs() < 1e-6);
        prop_assert!(stats.variance() >= 0.0);
    }

    #[test]
    fn test_constant_samples_have_zero_spread(t in 0.0f64..5.0, n in 1usize..50) {
        let mut stats = StageStats::default();
        for _ in 0..n {
            stats.record_secs(t);
        }
        prop_assert!((stats.mean() - t).abs() < 1e-9);
        prop_assert!(stats.stddev() < 1e-6);
    }
}
