use brownian_forecast::config::{Config, ConfigOverrides, ModelConfig};
use brownian_forecast::{ForecastError, ModelKind};

#[test]
fn parse_default_toml() {
    let toml_str = r#"
[model]
window_size = 30
prediction_steps = 10
num_simulations = 2000

[models.garch]
num_simulations = 500

[simulation]
seed = 11
low_percentile = 2.5
high_percentile = 97.5
batch_size = 64
dt = 1.0
timeout_ms = 1500
max_invalid_fraction = 0.25

[logging]
level = "debug"
json = true
"#;
    let config = Config::from_toml_str(toml_str).unwrap();
    assert_eq!(config.model.window_size, 30);
    assert_eq!(config.model.prediction_steps, 10);
    assert_eq!(config.simulation.seed, Some(11));
    assert!((config.simulation.low_percentile - 2.5).abs() < f64::EPSILON);
    assert_eq!(config.simulation.timeout_ms, Some(1500));
    assert!(config.logging.json);

    let garch = config.defaults_for(ModelKind::Garch).unwrap();
    assert_eq!(garch.num_simulations, 500);
    assert_eq!(garch.window_size, 30);
    assert_eq!(config.defaults_for(ModelKind::Heston).unwrap().num_simulations, 2000);
}

#[test]
/// An empty document is a valid config: every section has defaults.
fn empty_toml_uses_builtin_defaults() {
    let config = Config::from_toml_str("").unwrap();
    assert_eq!(config.model, ModelConfig::default());
    assert_eq!(config.simulation.batch_size, 256);
    assert_eq!(config.simulation.seed, None);
    assert_eq!(config.logging.level, "info");
    assert!(config.source.is_none());
}

#[test]
fn repo_default_config_parses() {
    let text = include_str!("../config/default.toml");
    let config = Config::from_toml_str(text).unwrap();
    assert_eq!(config.defaults_for(ModelKind::Heston).unwrap().window_size, 100);
}

#[test]
fn zero_in_per_model_section_is_rejected() {
    let err = Config::from_toml_str("[models.gbm]\nprediction_steps = 0\n").unwrap_err();
    assert!(format!("{err:#}").contains("prediction_steps"));
}

#[test]
fn malformed_percentiles_are_rejected() {
    assert!(Config::from_toml_str("[simulation]\nlow_percentile = 80.0\n").is_err());
    assert!(Config::from_toml_str("[simulation]\nbatch_size = 0\n").is_err());
}

#[test]
fn missing_explicit_config_file_is_an_error() {
    let path = std::path::Path::new("does/not/exist.toml");
    assert!(Config::load(Some(path)).is_err());
}

#[test]
fn overrides_deserialize_and_reject_unknown_fields() {
    let overrides: ConfigOverrides = serde_json::from_str(r#"{"window_size": 40}"#).unwrap();
    assert_eq!(overrides.window_size, Some(40));
    assert!(overrides.num_simulations.is_none());
    assert!(serde_json::from_str::<ConfigOverrides>(r#"{"window": 40}"#).is_err());
}

#[test]
fn zero_override_is_invalid_config() {
    let err = ModelConfig::default()
        .merged(&ConfigOverrides {
            num_simulations: Some(0),
            ..ConfigOverrides::default()
        })
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidConfig(_)));
}
