mod common;

use brownian_forecast::config::{Config, ConfigOverrides, SimulationSettings};
use brownian_forecast::simulation::RunControl;
use brownian_forecast::{ForecastError, ModelKind, ModelRegistry};

use common::gbm_prices;

fn overrides(window: usize, steps: usize, sims: usize) -> ConfigOverrides {
    ConfigOverrides {
        window_size: Some(window),
        prediction_steps: Some(steps),
        num_simulations: Some(sims),
    }
}

#[test]
fn catalog_lists_every_model_with_parameter_names() {
    let catalog = ModelRegistry::default().catalog();
    let entries: Vec<(&str, &str, Vec<&str>)> = catalog
        .iter()
        .map(|d| (d.kind.as_str(), d.name, d.parameters.to_vec()))
        .collect();
    assert_eq!(
        entries,
        vec![
            (
                "heston",
                "Heston Model",
                vec!["mu", "kappa", "theta", "sigma", "rho", "v0"]
            ),
            ("garch", "GARCH(1,1) Model", vec!["omega", "alpha", "beta", "mu"]),
            ("gbm", "Geometric Brownian Motion", vec!["mu", "sigma"]),
        ]
    );
}

#[test]
fn unknown_model_is_unsupported() {
    let err = ModelRegistry::default().get_model("arima").unwrap_err();
    assert_eq!(err, ForecastError::UnsupportedModel("arima".to_string()));
}

#[test]
/// Every model produces a well-ordered fan chart on ordinary data.
fn predict_works_for_every_model() {
    let registry = ModelRegistry::default();
    let prices = gbm_prices(300, 100.0, 0.0001, 0.012, 31);
    for kind in ModelKind::ALL {
        let handle = registry.handle(kind).unwrap();
        let result = handle
            .predict_with(&prices, &overrides(120, 6, 500), Some(3), &RunControl::new())
            .unwrap();
        assert_eq!(result.model, kind);
        assert_eq!(result.steps.len(), 6);
        assert_eq!(result.valid_paths + result.invalid_paths, 500);
        assert_eq!(result.terminal_returns.len(), result.valid_paths);
        assert!((0.0..=1.0).contains(&result.prob_up));
        for s in &result.steps {
            assert!(s.low <= s.median && s.median <= s.high, "{kind}: {s:?}");
        }
        assert_eq!(
            result.calibration.parameters.len(),
            kind.parameter_names().len()
        );
    }
}

#[test]
fn same_seed_gives_same_forecast() {
    let registry = ModelRegistry::default();
    let prices = gbm_prices(120, 100.0, 0.0002, 0.01, 5);
    let handle = registry.get_model("heston").unwrap();
    let run = || {
        handle
            .predict_with(&prices, &overrides(100, 5, 400), Some(17), &RunControl::new())
            .unwrap()
    };
    let (a, b) = (run(), run());
    assert_eq!(a.steps, b.steps);
    assert_eq!(a.terminal_returns, b.terminal_returns);
}

#[test]
fn zero_override_is_rejected_before_work() {
    let registry = ModelRegistry::default();
    let prices = gbm_prices(120, 100.0, 0.0, 0.01, 5);
    let err = registry
        .get_model("gbm")
        .unwrap()
        .predict(
            &prices,
            &ConfigOverrides {
                num_simulations: Some(0),
                ..ConfigOverrides::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, ForecastError::InvalidConfig(_)));
}

#[test]
fn overrides_do_not_leak_between_calls() {
    let registry = ModelRegistry::default();
    let handle = registry.get_model("gbm").unwrap();
    let before = handle.defaults();
    let prices = gbm_prices(120, 100.0, 0.0, 0.01, 5);
    handle.predict(&prices, &overrides(30, 2, 50)).unwrap();
    assert_eq!(handle.defaults(), before);
}

#[test]
fn configured_timeout_cancels_long_runs() {
    let config = Config {
        simulation: SimulationSettings {
            timeout_ms: Some(0),
            ..SimulationSettings::default()
        },
        ..Config::default()
    };
    let registry = ModelRegistry::new(&config).unwrap();
    let prices = gbm_prices(120, 100.0, 0.0, 0.01, 5);
    let err = registry
        .get_model("gbm")
        .unwrap()
        .predict(&prices, &ConfigOverrides::default())
        .unwrap_err();
    assert!(matches!(err, ForecastError::SimulationTimeout { .. }));
}

#[test]
fn forecast_serializes_to_json() {
    let registry = ModelRegistry::default();
    let prices = gbm_prices(80, 100.0, 0.0, 0.01, 6);
    let result = registry
        .get_model("gbm")
        .unwrap()
        .predict_with(&prices, &overrides(40, 3, 100), Some(2), &RunControl::new())
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["model"], "gbm");
    assert_eq!(json["steps"].as_array().unwrap().len(), 3);
    assert!(json["calibration"]["heuristic"].is_string());
}
