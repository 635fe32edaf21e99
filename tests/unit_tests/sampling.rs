use cmlmc::error::MlmcError;
use cmlmc::sampling::RandomInput;
use matrixcompare::assert_scalar_eq;

#[test]
fn same_seed_gives_same_draws() {
    let input = RandomInput::default();
    let mut first = input.sampler(7).unwrap();
    let mut second = input.sampler(7).unwrap();
    let mut other = input.sampler(8).unwrap();

    let a: Vec<f64> = (0..20).map(|_| first.draw()).collect();
    let b: Vec<f64> = (0..20).map(|_| second.draw()).collect();
    let c: Vec<f64> = (0..20).map(|_| other.draw()).collect();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn beta_draws_match_distribution() {
    let mut sampler = RandomInput::Beta { alpha: 2.0, beta: 6.0 }
        .sampler(42)
        .unwrap();
    let draws: Vec<f64> = (0..20_000).map(|_| sampler.draw()).collect();
    assert!(draws.iter().all(|&x| x > 0.0 && x < 1.0));

    let mean = draws.iter().sum::<f64>() / draws.len() as f64;
    assert_scalar_eq!(mean, 0.25, comp = abs, tol = 0.01);
}

#[test]
fn normal_draws_match_distribution() {
    let mut sampler = RandomInput::Normal {
        mean: 3.0,
        std_dev: 0.5,
    }
    .sampler(1)
    .unwrap();
    let draws: Vec<f64> = (0..20_000).map(|_| sampler.draw()).collect();
    let mean = draws.iter().sum::<f64>() / draws.len() as f64;
    let variance = draws.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (draws.len() - 1) as f64;
    assert_scalar_eq!(mean, 3.0, comp = abs, tol = 0.02);
    assert_scalar_eq!(variance, 0.25, comp = abs, tol = 0.02);
}

#[test]
fn invalid_parameters_are_rejected() {
    let beta = RandomInput::Beta { alpha: -1.0, beta: 6.0 }.sampler(0);
    assert!(matches!(beta, Err(MlmcError::InvalidSettings(_))));

    let normal = RandomInput::Normal {
        mean: 0.0,
        std_dev: f64::NAN,
    }
    .sampler(0);
    assert!(matches!(normal, Err(MlmcError::InvalidSettings(_))));
}

#[test]
fn random_input_json_representation() {
    let input: RandomInput =
        serde_json::from_str(r#"{ "distribution": "normal", "mean": 1.0, "std_dev": 2.0 }"#).unwrap();
    assert_eq!(
        input,
        RandomInput::Normal {
            mean: 1.0,
            std_dev: 2.0
        }
    );

    let json = serde_json::to_value(RandomInput::default()).unwrap();
    assert_eq!(json["distribution"], "beta");
    assert_eq!(json["alpha"], 2.0);
    assert_eq!(json["beta"], 6.0);
}
