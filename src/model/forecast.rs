use serde::Serialize;

use crate::stochastic::calibrate::Calibration;
use crate::stochastic::kind::ModelKind;

/// Cross-path statistics of the simulated price at one horizon step (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepStats {
    pub step: usize,
    pub mean: f64,
    pub median: f64,
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationSummary {
    pub heuristic: &'static str,
    pub sample_size: usize,
    pub parameters: Vec<(&'static str, f64)>,
    pub feller_satisfied: Option<bool>,
}

impl From<&Calibration> for CalibrationSummary {
    fn from(c: &Calibration) -> Self {
        let feller_satisfied = match &c.params {
            crate::stochastic::params::CalibratedParameters::Heston(p) => Some(p.feller_satisfied()),
            _ => None,
        };
        Self {
            heuristic: c.heuristic,
            sample_size: c.sample_size,
            parameters: c.params.named_values(),
            feller_satisfied,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub model: ModelKind,
    pub last_price: f64,
    pub steps: Vec<StepStats>,
    pub low_percentile: f64,
    pub high_percentile: f64,
    /// `(S_T - S_0) / S_0` per valid path.
    pub terminal_returns: Vec<f64>,
    pub expected_return: f64,
    pub return_std: f64,
    /// Fraction of valid paths ending above `last_price`.
    pub prob_up: f64,
    pub valid_paths: usize,
    pub invalid_paths: usize,
    pub calibration: CalibrationSummary,
    pub computed_at_ms: i64,
}

impl ForecastResult {
    pub fn mean_path(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.mean).collect()
    }

    pub fn terminal(&self) -> Option<&StepStats> {
        self.steps.last()
    }
}
