//! Single-shot forecasts and walk-forward trading signals.

use std::time::Instant;

use rayon::prelude::*;

use crate::config::{ModelConfig, SimulationSettings};
use crate::error::{ForecastError, Result};
use crate::forecast::Aggregator;
use crate::model::forecast::ForecastResult;
use crate::model::signal::{Signal, SignalCounts, SignalReport};
use crate::simulation::{entropy_seed, stream_seed, RunControl, Simulator};
use crate::stochastic::calibrate::calibrate;
use crate::stochastic::kind::ModelKind;

pub fn validate_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(ForecastError::InvalidConfig(format!(
            "signal threshold must be finite and >= 0, got {threshold}"
        )));
    }
    Ok(())
}

/// BUY above `threshold`, SELL below `-threshold`, HOLD in between (inclusive).
pub fn decide(expected_return: f64, threshold: f64) -> Result<Signal> {
    validate_threshold(threshold)?;
    Ok(classify(expected_return, threshold))
}

fn classify(expected_return: f64, threshold: f64) -> Signal {
    if expected_return > threshold {
        Signal::Buy
    } else if expected_return < -threshold {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

fn base_seed(settings: &SimulationSettings) -> u64 {
    settings.seed.unwrap_or_else(entropy_seed)
}

/// Calibrate on the trailing window, simulate from the last price and aggregate.
pub fn predict(
    kind: ModelKind,
    prices: &[f64],
    config: ModelConfig,
    settings: &SimulationSettings,
    control: &RunControl,
) -> Result<ForecastResult> {
    config.validate()?;
    settings.validate()?;
    let aggregator = Aggregator::from_settings(settings)?;
    let calibration = calibrate(kind, prices, config.window_size)?;
    let last_price = prices[prices.len() - 1];

    let started = Instant::now();
    let ensemble = Simulator::new(settings).simulate(
        &calibration.params,
        last_price,
        config.prediction_steps,
        config.num_simulations,
        base_seed(settings),
        control,
    )?;
    let result = aggregator.aggregate(&ensemble, last_price, &calibration)?;
    tracing::info!(
        model = %kind,
        window = config.window_size,
        steps = config.prediction_steps,
        paths = config.num_simulations,
        invalid = result.invalid_paths,
        expected_return = result.expected_return,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Forecast computed"
    );
    Ok(result)
}

/// Walk-forward signals for every index in `[window_size, prices.len())`.
///
/// Index `i` is calibrated on `prices[i - window_size..i]` and simulated from
/// `prices[i - 1]` with seed `stream_seed(base, i)`. Any failing index fails the call.
pub fn generate_signals(
    kind: ModelKind,
    prices: &[f64],
    config: ModelConfig,
    threshold: f64,
    settings: &SimulationSettings,
    control: &RunControl,
) -> Result<SignalReport> {
    config.validate()?;
    settings.validate()?;
    validate_threshold(threshold)?;
    let window = config.window_size;
    if prices.len() < window {
        return Err(ForecastError::InsufficientData {
            required: window,
            available: prices.len(),
        });
    }
    if window < kind.required_history() {
        return Err(ForecastError::InsufficientData {
            required: kind.required_history(),
            available: window,
        });
    }

    let simulator = Simulator::new(settings);
    let aggregator = Aggregator::from_settings(settings)?;
    let base = base_seed(settings);
    let started = Instant::now();
    let expected_returns: Vec<f64> = (window..prices.len())
        .into_par_iter()
        .map(|i| {
            if control.should_stop() {
                return Err(ForecastError::SimulationTimeout {
                    completed_paths: 0,
                    requested_paths: config.num_simulations,
                });
            }
            expected_return_at(
                kind,
                &prices[i - window..i],
                &config,
                &simulator,
                &aggregator,
                stream_seed(base, i as u64),
                control,
            )
        })
        .collect::<Result<_>>()?;

    let signals: Vec<Signal> = expected_returns
        .iter()
        .map(|r| classify(*r, threshold))
        .collect();
    let counts = SignalCounts::tally(&signals);
    tracing::info!(
        model = %kind,
        window,
        threshold,
        buy = counts.buy,
        sell = counts.sell,
        hold = counts.hold,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Signals generated"
    );
    Ok(SignalReport {
        model: kind,
        threshold,
        window_size: window,
        first_index: window,
        signals,
        counts,
        expected_returns,
    })
}

fn expected_return_at(
    kind: ModelKind,
    window_prices: &[f64],
    config: &ModelConfig,
    simulator: &Simulator,
    aggregator: &Aggregator,
    seed: u64,
    control: &RunControl,
) -> Result<f64> {
    let calibration = calibrate(kind, window_prices, window_prices.len())?;
    let last_price = window_prices[window_prices.len() - 1];
    let ensemble = simulator.simulate(
        &calibration.params,
        last_price,
        config.prediction_steps,
        config.num_simulations,
        seed,
        control,
    )?;
    aggregator.expected_return(&ensemble, last_price)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decide_is_symmetric_around_zero() {
        assert_eq!(decide(0.03, 0.02).unwrap(), Signal::Buy);
        assert_eq!(decide(-0.03, 0.02).unwrap(), Signal::Sell);
        assert_eq!(decide(0.02, 0.02).unwrap(), Signal::Hold);
        assert_eq!(decide(-0.02, 0.02).unwrap(), Signal::Hold);
        assert_eq!(decide(0.0, 0.0).unwrap(), Signal::Hold);
    }

    #[test]
    fn negative_or_nan_threshold_is_rejected() {
        assert!(matches!(
            decide(0.1, -0.01),
            Err(ForecastError::InvalidConfig(_))
        ));
        assert!(decide(0.1, f64::NAN).is_err());
    }

    #[test]
    fn series_equal_to_window_yields_no_signals() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let config = ModelConfig {
            window_size: 20,
            prediction_steps: 2,
            num_simulations: 10,
        };
        let settings = SimulationSettings {
            seed: Some(1),
            ..SimulationSettings::default()
        };
        let report =
            generate_signals(ModelKind::Gbm, &prices, config, 0.01, &settings, &RunControl::new())
                .unwrap();
        assert!(report.signals.is_empty());
        assert_eq!(report.counts.total(), 0);
    }
}
