use cmlmc::rates::RateModel;
use cmlmc::report::MlmcEstimate;
use std::fs::File;

fn estimate() -> MlmcEstimate {
    MlmcEstimate {
        expectation: 1.05,
        total_error: 0.06,
        iterations: 4,
        optimal_level: 2,
        sample_counts: vec![31, 25, 25],
        level_means: vec![1.2, -0.1, -0.05],
        rates: RateModel {
            c_alpha: 1.0,
            alpha: 0.5,
            c_beta: 1e-3,
            beta: 1.0,
            c_cost: 1.25e-4,
            gamma: 1.0,
        },
        history: Vec::new(),
    }
}

#[test]
fn relative_error_against_reference() {
    let estimate = estimate();
    assert!((estimate.relative_error(1.0) - 0.05).abs() < 1e-12);
    assert!((estimate.relative_error(-1.05) - 2.0).abs() < 1e-12);
}

#[test]
fn estimate_is_written_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("estimate.json");
    estimate().write_json(&path).unwrap();

    let file = File::open(&path).unwrap();
    let read_back: MlmcEstimate = serde_json::from_reader(file).unwrap();
    assert_eq!(read_back, estimate());
}

#[test]
fn writing_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("estimate.json");
    assert!(estimate().write_json(path).is_err());
}
