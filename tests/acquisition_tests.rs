//! Integration tests for acquisition functions, the averaged surface and
//! the gradient-ascent maximizer.

use hypersphere::Error;
use hypersphere::acquisition::{
    AcquisitionFunction, AcquisitionMaximizer, AcquisitionSurface, ExpectedImprovement,
    LowerConfidenceBound, ProbabilityOfImprovement,
};
use hypersphere::gp::GpModel;
use hypersphere::surrogate::{Inference, ParameterSample, SurrogateModel};

// =============================================================================
// Expected improvement
// =============================================================================

#[test]
fn test_ei_is_non_negative() {
    let ei = ExpectedImprovement;
    for mean in [-5.0, -1.0, 0.0, 0.5, 3.0, 50.0] {
        for variance in [0.0, 1e-12, 0.01, 1.0, 100.0] {
            let v = ei.evaluate(mean, variance, 0.0).value;
            assert!(v >= 0.0, "EI({mean}, {variance}) = {v}");
            assert!(!v.is_nan());
        }
    }
}

#[test]
fn test_ei_zero_variance_is_zero() {
    let ei = ExpectedImprovement;
    assert_eq!(ei.evaluate(-1.0, 0.0, 0.0).value, 0.0);
    assert_eq!(ei.evaluate(1.0, 0.0, 0.0).value, 0.0);
}

#[test]
fn test_ei_increases_with_variance() {
    let ei = ExpectedImprovement;
    let values: Vec<f64> = [0.1, 0.25, 0.5, 1.0, 4.0]
        .iter()
        .map(|&var| ei.evaluate(0.5, var, 0.0).value)
        .collect();
    assert!(values.windows(2).all(|w| w[0] < w[1]), "{values:?}");
}

#[test]
fn test_ei_increases_as_mean_decreases() {
    let ei = ExpectedImprovement;
    let values: Vec<f64> = [1.0, 0.5, 0.0, -0.5, -1.0]
        .iter()
        .map(|&mean| ei.evaluate(mean, 0.25, 0.0).value)
        .collect();
    assert!(values.windows(2).all(|w| w[0] < w[1]), "{values:?}");
}

#[test]
fn test_ei_stays_monotone_deep_in_the_tail() {
    let ei = ExpectedImprovement;

    // z = −mean runs from 10 down to −30
    let by_mean: Vec<f64> = (0..=4000)
        .map(|i| ei.evaluate(-10.0 + f64::from(i) * 0.01, 1.0, 0.0).value)
        .collect();
    assert!(by_mean.iter().all(|v| v.is_finite() && *v > 0.0));
    for (i, w) in by_mean.windows(2).enumerate() {
        assert!(w[0] >= w[1], "EI rose between mean steps {i} and {}", i + 1);
    }

    for mean in [2.0, 5.0, 8.0, 12.0, 20.0] {
        let by_std: Vec<f64> = (0..=1500)
            .map(|j| {
                let std = 0.5 + f64::from(j) * 0.001;
                ei.evaluate(mean, std * std, 0.0).value
            })
            .collect();
        for (j, w) in by_std.windows(2).enumerate() {
            assert!(w[0] <= w[1], "EI fell with std at mean {mean}, step {j}");
        }
    }

    let narrow = ei.evaluate(8.0, 0.999 * 0.999, 0.0).value;
    let wide = ei.evaluate(8.0, 1.001 * 1.001, 0.0).value;
    assert!(narrow < wide, "{narrow} vs {wide}");
    let worse = ei.evaluate(8.01, 1.0, 0.0).value;
    let better = ei.evaluate(7.99, 1.0, 0.0).value;
    assert!(worse < better, "{worse} vs {better}");
}

#[test]
fn test_ei_derivatives_have_expected_signs() {
    let v = ExpectedImprovement.evaluate(0.2, 0.3, 0.0);
    assert!(v.d_mean < 0.0);
    assert!(v.d_variance > 0.0);
}

#[test]
fn test_ei_ignores_non_finite_predictions() {
    let ei = ExpectedImprovement;
    assert_eq!(ei.evaluate(f64::NAN, 1.0, 0.0).value, 0.0);
    assert_eq!(ei.evaluate(0.0, f64::INFINITY, 0.0).value, 0.0);
}

// =============================================================================
// Probability of improvement and LCB
// =============================================================================

#[test]
fn test_pi_is_a_probability() {
    let pi = ProbabilityOfImprovement;
    for mean in [-3.0, 0.0, 3.0] {
        let v = pi.evaluate(mean, 1.0, 0.0).value;
        assert!((0.0..=1.0).contains(&v));
    }
    assert!((pi.evaluate(0.0, 1.0, 0.0).value - 0.5).abs() < 1e-6);
}

#[test]
fn test_lcb_rewards_uncertainty_and_low_mean() {
    let lcb = LowerConfidenceBound::default();
    let base = lcb.evaluate(0.0, 1.0, 0.0).value;
    assert!((base - 2.0).abs() < 1e-12);
    assert!(lcb.evaluate(0.0, 4.0, 0.0).value > base);
    assert!(lcb.evaluate(-1.0, 1.0, 0.0).value > base);
    assert!((lcb.evaluate(0.5, 0.0, 0.0).value + 0.5).abs() < 1e-12);
}

// =============================================================================
// Surface and maximizer on a fitted GP
// =============================================================================

fn fitted() -> (hypersphere::gp::GpInference, Vec<ParameterSample>, f64) {
    let inputs: Vec<Vec<f64>> = (0..8).map(|i| vec![f64::from(i) / 7.0]).collect();
    let outputs: Vec<f64> = inputs.iter().map(|x| (x[0] - 0.6).powi(2)).collect();
    let gp = GpModel::new().bind(&inputs, &outputs).unwrap();
    let mut rng = fastrand::Rng::with_seed(5);
    let samples = gp.sample_posterior(4, 5, 2, &mut rng).unwrap();
    let reference = outputs.iter().copied().fold(f64::INFINITY, f64::min);
    (gp, samples, reference)
}

#[test]
fn test_surface_sums_over_samples() {
    let (gp, samples, reference) = fitted();
    let ei = ExpectedImprovement;
    let surface = AcquisitionSurface::new(&gp, &samples, &ei, reference).unwrap();
    let total = surface.evaluate(&[0.55]).unwrap();

    let mut expected = 0.0;
    for sample in &samples {
        let single = AcquisitionSurface::new(&gp, core::slice::from_ref(sample), &ei, reference)
            .unwrap();
        expected += single.evaluate(&[0.55]).unwrap();
    }
    assert!((total - expected).abs() < 1e-9 * expected.abs().max(1.0));
}

#[test]
fn test_surface_gradient_matches_finite_difference() {
    let (gp, samples, reference) = fitted();
    let lcb = LowerConfidenceBound::default();
    let surface = AcquisitionSurface::new(&gp, &samples, &lcb, reference).unwrap();
    let x = 0.37;
    let (_, grad) = surface.value_and_gradient(&[x]).unwrap();
    let h = 1e-6;
    let fd = (surface.evaluate(&[x + h]).unwrap() - surface.evaluate(&[x - h]).unwrap()) / (2.0 * h);
    assert!(
        (grad[0] - fd).abs() < 1e-4 * fd.abs().max(1.0),
        "analytic {} vs fd {fd}",
        grad[0]
    );
}

#[test]
fn test_surface_requires_samples() {
    let (gp, _, reference) = fitted();
    let ei = ExpectedImprovement;
    assert!(matches!(
        AcquisitionSurface::new(&gp, &[], &ei, reference),
        Err(Error::EmptySamples)
    ));
}

#[test]
fn test_maximizer_reports_acquisition_at_proposal() {
    let (gp, samples, reference) = fitted();
    let maximizer = AcquisitionMaximizer::builder()
        .steps(50)
        .learning_rate(0.02)
        .acquisition(LowerConfidenceBound::default())
        .build()
        .unwrap();
    let lcb = LowerConfidenceBound::default();
    let surface = AcquisitionSurface::new(&gp, &samples, &lcb, reference).unwrap();

    let starts = vec![vec![0.1], vec![0.9]];
    let proposal = maximizer
        .propose_with_restarts(&gp, &samples, reference, &starts)
        .unwrap();
    assert!(proposal.point[0].is_finite());
    let at_point = surface.evaluate(&proposal.point).unwrap();
    assert!((proposal.acquisition - at_point).abs() < 1e-12 * at_point.abs().max(1.0));

    for start in &starts {
        let single = maximizer.propose(&gp, &samples, reference, start).unwrap();
        assert!(surface.evaluate(&single).unwrap() <= proposal.acquisition + 1e-12);
    }
}
