use cmlmc::error::MlmcError;
use cmlmc::sampling::RandomInput;
use cmlmc::settings::MlmcSettings;
use std::io::Write;

#[test]
fn default_settings_are_valid() {
    let settings = MlmcSettings::default();
    assert!(settings.validate().is_ok());
    assert_eq!(settings.screening_levels, 3);
    assert_eq!(settings.screening_samples, 25);
    assert_eq!(settings.min_sample_batch, 6);
    assert_eq!(settings.max_level, 4);
    assert_eq!(settings.refinement().num_dofs(0), 25.0);
    assert_eq!(settings.schedule().num_continuation_iterations(), 4);
    assert_eq!(settings.prior().k1, 0.1);
}

#[test]
fn missing_keys_take_default_values() {
    let settings = MlmcSettings::from_json_str(
        r#"{
            "final_tolerance": 0.05,
            "max_level": 6,
            "random_input": { "distribution": "normal", "mean": 0.0, "std_dev": 1.0 }
        }"#,
    )
    .unwrap();
    assert_eq!(
        settings,
        MlmcSettings {
            final_tolerance: 0.05,
            max_level: 6,
            random_input: RandomInput::Normal {
                mean: 0.0,
                std_dev: 1.0
            },
            ..MlmcSettings::default()
        }
    );
}

#[test]
fn unknown_keys_are_rejected() {
    assert!(MlmcSettings::from_json_str(r#"{ "tolerance": 0.1 }"#).is_err());
}

#[test]
fn json_round_trip_of_defaults() {
    let json = serde_json::to_string(&MlmcSettings::default()).unwrap();
    assert_eq!(MlmcSettings::from_json_str(&json).unwrap(), MlmcSettings::default());
}

#[test]
fn invalid_settings_are_rejected() {
    let cases = vec![
        MlmcSettings {
            refinement_factor: 1.0,
            ..Default::default()
        },
        MlmcSettings {
            k1: 0.0,
            ..Default::default()
        },
        MlmcSettings {
            r2: 0.9,
            ..Default::default()
        },
        MlmcSettings {
            final_tolerance: 0.5,
            ..Default::default()
        },
        MlmcSettings {
            screening_levels: 2,
            ..Default::default()
        },
        MlmcSettings {
            screening_levels: 6,
            ..Default::default()
        },
        MlmcSettings {
            screening_samples: 1,
            ..Default::default()
        },
        MlmcSettings {
            min_sample_batch: 1,
            ..Default::default()
        },
        MlmcSettings {
            max_iterations: Some(0),
            ..Default::default()
        },
        MlmcSettings {
            random_input: RandomInput::Beta { alpha: 0.0, beta: 1.0 },
            ..Default::default()
        },
    ];

    for settings in cases {
        assert!(
            matches!(settings.validate(), Err(MlmcError::InvalidSettings(_))),
            "Settings should be invalid: {:?}",
            settings
        );
    }
}

#[test]
fn invalid_json_settings_fail_validation() {
    let err = MlmcSettings::from_json_str(r#"{ "screening_samples": 1 }"#).unwrap_err();
    assert!(err.to_string().contains("screening_samples"));
}

#[test]
fn settings_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{ "seed": 1234, "confidence": 2.0 }}"#).unwrap();

    let settings = MlmcSettings::from_json_file(file.path()).unwrap();
    assert_eq!(settings.seed, 1234);
    assert_eq!(settings.confidence, 2.0);
    assert!(MlmcSettings::from_json_file(file.path().with_extension("missing")).is_err());
}
