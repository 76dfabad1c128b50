use crate::config::SimulationSettings;
use crate::error::{ForecastError, Result};
use crate::model::forecast::{CalibrationSummary, ForecastResult, StepStats};
use crate::simulation::SimulatedEnsemble;
use crate::stats::{mean, percentile_sorted, sample_std};
use crate::stochastic::calibrate::Calibration;

/// Reduces a simulated ensemble to per-step and terminal statistics.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    low_percentile: f64,
    high_percentile: f64,
}

impl Aggregator {
    pub fn new(low_percentile: f64, high_percentile: f64) -> Result<Self> {
        let ordered = low_percentile.is_finite()
            && high_percentile.is_finite()
            && (0.0..=50.0).contains(&low_percentile)
            && (50.0..=100.0).contains(&high_percentile);
        if !ordered {
            return Err(ForecastError::InvalidConfig(format!(
                "percentiles must satisfy 0 <= low <= 50 <= high <= 100, got low={low_percentile} high={high_percentile}"
            )));
        }
        Ok(Self {
            low_percentile,
            high_percentile,
        })
    }

    pub fn from_settings(settings: &SimulationSettings) -> Result<Self> {
        Self::new(settings.low_percentile, settings.high_percentile)
    }

    /// `(S_T - S_0) / S_0` for every valid path. Fails on an ensemble with no valid path.
    pub fn terminal_returns(&self, ensemble: &SimulatedEnsemble, last_price: f64) -> Result<Vec<f64>> {
        if ensemble.paths.is_empty() {
            return Err(ForecastError::InvalidParameters(format!(
                "no valid paths out of {} simulated",
                ensemble.requested
            )));
        }
        Ok(ensemble
            .paths
            .iter()
            .filter_map(|p| p.terminal_price())
            .map(|s_t| (s_t - last_price) / last_price)
            .collect())
    }

    /// Mean terminal return only, without the per-step statistics.
    pub fn expected_return(&self, ensemble: &SimulatedEnsemble, last_price: f64) -> Result<f64> {
        Ok(mean(&self.terminal_returns(ensemble, last_price)?))
    }

    pub fn aggregate(
        &self,
        ensemble: &SimulatedEnsemble,
        last_price: f64,
        calibration: &Calibration,
    ) -> Result<ForecastResult> {
        let terminal_returns = self.terminal_returns(ensemble, last_price)?;

        let mut column = Vec::with_capacity(ensemble.paths.len());
        let mut steps = Vec::with_capacity(ensemble.steps);
        for t in 0..ensemble.steps {
            column.clear();
            column.extend(ensemble.paths.iter().map(|p| p.prices[t]));
            column.sort_by(f64::total_cmp);
            steps.push(StepStats {
                step: t + 1,
                mean: mean(&column),
                median: percentile_sorted(&column, 50.0),
                low: percentile_sorted(&column, self.low_percentile),
                high: percentile_sorted(&column, self.high_percentile),
            });
        }
        let up = terminal_returns.iter().filter(|r| **r > 0.0).count();

        Ok(ForecastResult {
            model: calibration.params.kind(),
            last_price,
            steps,
            low_percentile: self.low_percentile,
            high_percentile: self.high_percentile,
            expected_return: mean(&terminal_returns),
            return_std: sample_std(&terminal_returns),
            prob_up: up as f64 / terminal_returns.len() as f64,
            terminal_returns,
            valid_paths: ensemble.valid(),
            invalid_paths: ensemble.invalid,
            calibration: CalibrationSummary::from(calibration),
            computed_at_ms: chrono::Utc::now().timestamp_millis(),
        })
    }
}
