#![cfg(feature = "serde")]

use hypersphere::prelude::*;

fn assert_close(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() <= 1e-12 * x.abs().max(1.0), "{x} vs {y}");
    }
}

fn assert_same_observation(a: &Observation, b: &Observation) {
    assert_close(&a.euclidean, &b.euclidean);
    assert_close(&a.spherical, &b.spherical);
    assert_close(&[a.value], &[b.value]);
}

#[test]
fn round_trip_dataset_after_run() {
    let mut optimizer = SphereOptimizer::builder(2)
        .n_samples(2)
        .n_thin(1)
        .seed(11)
        .build()
        .unwrap();
    optimizer
        .optimize(2, &|x: &[f64]| Ok::<_, Error>(x.iter().map(|v| v * v).sum()))
        .unwrap();

    let json = serde_json::to_string(optimizer.dataset()).unwrap();
    let loaded: Dataset = serde_json::from_str(&json).unwrap();

    assert_eq!(loaded.len(), optimizer.dataset().len());
    for (a, b) in loaded.iter().zip(optimizer.dataset()) {
        assert_same_observation(a, b);
    }
}

#[test]
fn round_trip_observation() {
    let obs = Observation {
        euclidean: vec![0.0, 1.0, 0.0],
        spherical: vec![1.0, std::f64::consts::FRAC_PI_2, 0.0],
        value: -0.25,
    };
    let json = serde_json::to_string(&obs).unwrap();
    assert!(json.contains("\"spherical\""));
    let loaded: Observation = serde_json::from_str(&json).unwrap();
    assert_same_observation(&loaded, &obs);
}

#[test]
fn round_trip_parameter_sample() {
    let sample = ParameterSample::new(vec![0.0, -0.5, 1.25, -6.0]);
    let json = serde_json::to_string(&sample).unwrap();
    let loaded: ParameterSample = serde_json::from_str(&json).unwrap();
    assert_close(loaded.as_slice(), sample.as_slice());
}

#[test]
fn round_trip_enums_and_axis_order() {
    for phase in [
        LoopPhase::Initializing,
        LoopPhase::Fitting,
        LoopPhase::Proposing,
        LoopPhase::Evaluating,
        LoopPhase::Terminated,
    ] {
        let json = serde_json::to_string(&phase).unwrap();
        assert_eq!(serde_json::from_str::<LoopPhase>(&json).unwrap(), phase);
    }

    for policy in [DegeneratePolicy::FirstCanonical, DegeneratePolicy::AllCanonical] {
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(serde_json::from_str::<DegeneratePolicy>(&json).unwrap(), policy);
    }

    let order = AxisOrder::new(vec![2, 0, 1]).unwrap();
    let json = serde_json::to_string(&order).unwrap();
    assert_eq!(serde_json::from_str::<AxisOrder>(&json).unwrap(), order);
}
