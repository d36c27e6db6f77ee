//! Property-based tests for the sampler using proptest.

use proptest::prelude::*;

use arff_core::{
    DataProvider, DataSet, FourierModel, MseLoss, NormalEquations, RwmConfig, RwmExecutor,
    TrainingOptions, acceptance_probability,
};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex64;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn grid(n: usize, dim: usize) -> DataSet {
    let x: Vec<_> = (0..n)
        .map(|j| DVector::from_fn(dim, |i, _| ((j * (i + 1)) % n) as f64 / n as f64))
        .collect();
    let y = x.iter().map(|x| x.sum().sin()).collect();
    DataSet::from_real(x, y).unwrap()
}

fn options(config: RwmConfig) -> TrainingOptions<NormalEquations, MseLoss> {
    TrainingOptions::new(config, NormalEquations::new(1e-4), MseLoss).unwrap()
}

// --- Acceptance rule properties ---

proptest! {
    #[test]
    fn acceptance_is_a_probability(
        re0 in -10.0f64..10.0,
        im0 in -10.0f64..10.0,
        re1 in -10.0f64..10.0,
        im1 in -10.0f64..10.0,
        gamma in 0.01f64..20.0,
    ) {
        let p = acceptance_probability(Complex64::new(re0, im0), Complex64::new(re1, im1), gamma);
        prop_assert!((0.0..=1.0).contains(&p));
    }

    #[test]
    fn larger_amplitude_is_always_accepted(
        re in -5.0f64..5.0,
        im in -5.0f64..5.0,
        scale in 1.01f64..4.0,
        gamma in 0.01f64..20.0,
    ) {
        let current = Complex64::new(re, im);
        prop_assert_eq!(acceptance_probability(current, current * scale, gamma), 1.0);
    }
}

// --- Epoch invariants ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn epoch_preserves_feature_count_and_cutoff(
        seed in any::<u64>(),
        features in 1usize..8,
        dim in 1usize..3,
        step_size in 0.1f64..3.0,
        cutoff in 2.0f64..6.0,
    ) {
        let config = RwmConfig {
            epochs: 3,
            inner_steps: 4,
            step_size,
            burn_in: 1,
            max_frequency_norm: Some(cutoff),
            ..Default::default()
        };
        let options = options(config);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut model = FourierModel::random(features, dim, &mut rng).unwrap();
        for w in &mut model.omega {
            let norm = w.norm();
            if norm > 1.0 {
                *w /= norm;
            }
        }
        let data = DataProvider::fixed(grid(24, dim));
        let mut executor = RwmExecutor::new(&options, DMatrix::identity(dim, dim)).unwrap();

        for epoch in 1..=3 {
            let batch = data.batch(epoch, &mut rng);
            let report = executor.run_epoch(epoch, &mut model, &batch, &mut rng).unwrap();
            prop_assert!((0.0..=1.0).contains(&report.acceptance_rate));
            prop_assert_eq!(model.len(), features);
            prop_assert_eq!(model.beta.len(), features);
            prop_assert!(model.max_frequency_norm() <= cutoff);
        }
    }

    #[test]
    fn minibatches_have_requested_size(
        seed in any::<u64>(),
        n in 2usize..40,
        fraction in 0.05f64..1.0,
    ) {
        let batch_size = ((n as f64 * fraction).ceil() as usize).clamp(1, n);
        let provider = DataProvider::minibatch(grid(n, 1), batch_size).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for epoch in 1..=3 {
            prop_assert_eq!(provider.batch(epoch, &mut rng).len(), batch_size);
        }
    }
}
