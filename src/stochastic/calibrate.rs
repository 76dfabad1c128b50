//! Moment-based parameter estimation from a trailing price window.
//!
//! None of these estimators is maximum likelihood. They are fast, closed-form (or
//! one-dimensional root finding) heuristics that produce parameters in the right
//! domain and of the right order of magnitude for short windows:
//!
//! - GBM: mean and sample deviation of log returns.
//! - GARCH(1,1): persistence from the decay of the squared-residual autocorrelation
//!   (`rho_k = rho_1 * (alpha + beta)^(k-1)`), fitted in log space over the significant
//!   lags and falling back to `rho_1` when the fit is not stationary. The alpha/beta split
//!   inverts the GARCH(1,1) lag-1 autocorrelation, omega comes from variance targeting.
//! - Heston: rolling realized variance supplies theta, kappa (autocorrelation decay),
//!   vol-of-vol (increments) and rho (correlation with return innovations).

use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::stats::{
    autocorrelation, correlation, least_squares_slope, log_returns, mean, sample_std,
    sample_variance,
};
use crate::stochastic::kind::ModelKind;
use crate::stochastic::params::{CalibratedParameters, GarchParams, GbmParams, HestonParams};

pub const GBM_HEURISTIC: &str = "gbm-log-return-moments";
pub const GARCH_HEURISTIC: &str = "garch-squared-residual-acf";
pub const GARCH_LAG_ONE_HEURISTIC: &str = "garch-squared-residual-acf/lag-one";
pub const GARCH_FLAT_HEURISTIC: &str = "garch-squared-residual-acf/no-clustering";
pub const HESTON_HEURISTIC: &str = "heston-realized-variance-moments";

const HESTON_RV_MIN_WINDOW: usize = 3;
const HESTON_RV_MAX_WINDOW: usize = 20;
const HESTON_PHI_MIN: f64 = 0.05;
const HESTON_PHI_MAX: f64 = 0.999;
const SPLIT_ITERATIONS: usize = 64;
const GARCH_MAX_LAG: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Calibration {
    pub params: CalibratedParameters,
    pub heuristic: &'static str,
    /// Number of log returns the estimate was computed from.
    pub sample_size: usize,
}

/// Calibrate `kind` on the trailing `window_size` prices of `prices`.
pub fn calibrate(kind: ModelKind, prices: &[f64], window_size: usize) -> Result<Calibration> {
    let min_history = kind.required_history();
    if window_size < min_history {
        return Err(ForecastError::InsufficientData {
            required: min_history,
            available: window_size,
        });
    }
    if prices.len() < window_size {
        return Err(ForecastError::InsufficientData {
            required: window_size,
            available: prices.len(),
        });
    }
    let window = &prices[prices.len() - window_size..];
    if let Some(bad) = window.iter().find(|p| !p.is_finite() || **p <= 0.0) {
        return Err(ForecastError::InvalidParameters(format!(
            "calibration window contains a non-positive or non-finite price ({bad})"
        )));
    }
    let returns = log_returns(window);

    let calibration = match kind {
        ModelKind::Gbm => calibrate_gbm(&returns)?,
        ModelKind::Garch => calibrate_garch(&returns)?,
        ModelKind::Heston => calibrate_heston(&returns)?,
    };
    tracing::debug!(
        model = %kind,
        heuristic = calibration.heuristic,
        samples = calibration.sample_size,
        params = ?calibration.params.named_values(),
        "Calibrated parameters"
    );
    Ok(calibration)
}

fn calibrate_gbm(returns: &[f64]) -> Result<Calibration> {
    let params = GbmParams::new(mean(returns), sample_std(returns))?;
    Ok(Calibration {
        params: CalibratedParameters::Gbm(params),
        heuristic: GBM_HEURISTIC,
        sample_size: returns.len(),
    })
}

fn calibrate_garch(returns: &[f64]) -> Result<Calibration> {
    let n = returns.len();
    let mu = mean(returns);
    let sq: Vec<f64> = returns.iter().map(|r| (r - mu) * (r - mu)).collect();
    let var = mean(&sq);
    if var <= 0.0 {
        return Err(ForecastError::InvalidParameters(
            "garch calibration window has zero return variance".to_string(),
        ));
    }

    let bound = 2.0 / (n as f64).sqrt();
    let rho1 = autocorrelation(&sq, 1).unwrap_or(0.0);
    let (alpha, beta, heuristic) = if rho1 <= bound {
        (0.0, 0.0, GARCH_FLAT_HEURISTIC)
    } else {
        let (persistence, heuristic) = match decay_rate(&sq, rho1, bound) {
            Some(p) if p < 1.0 => (p, GARCH_HEURISTIC),
            fitted => {
                if let Some(p) = fitted {
                    tracing::debug!(
                        fitted = p,
                        rho1,
                        "Squared-residual decay fit is not stationary; using lag-1 persistence"
                    );
                }
                (rho1, GARCH_LAG_ONE_HEURISTIC)
            }
        };
        if !persistence.is_finite() || persistence >= 1.0 {
            return Err(ForecastError::InvalidParameters(format!(
                "garch persistence estimate {persistence:.4} is not stationary"
            )));
        }
        let alpha = split_persistence(rho1, persistence);
        (alpha, (persistence - alpha).max(0.0), heuristic)
    };

    let omega = var * (1.0 - alpha - beta);
    let params = GarchParams::new(omega, alpha, beta, mu)?;
    Ok(Calibration {
        params: CalibratedParameters::Garch(params),
        heuristic,
        sample_size: n,
    })
}

/// Geometric decay of the squared-residual autocorrelation, `exp` of the least-squares
/// slope of `ln rho_k` on `k` over the leading run of significant lags.
/// `None` when fewer than two lags are significant.
fn decay_rate(sq: &[f64], rho1: f64, bound: f64) -> Option<f64> {
    let mut lags = vec![1.0];
    let mut log_rhos = vec![rho1.ln()];
    for k in 2..=GARCH_MAX_LAG {
        match autocorrelation(sq, k) {
            Some(rho) if rho > bound => {
                lags.push(k as f64);
                log_rhos.push(rho.ln());
            }
            _ => break,
        }
    }
    if lags.len() < 2 {
        return None;
    }
    least_squares_slope(&lags, &log_rhos).map(f64::exp)
}

/// Solve `rho1 = a(1 - p² + a·p) / (1 - p² + a²)` for `a` in `[0, p]`.
fn split_persistence(rho1: f64, p: f64) -> f64 {
    let f = |a: f64| a * (1.0 - p * p + a * p) / (1.0 - p * p + a * a) - rho1;
    if f(p) <= 0.0 {
        return p;
    }
    let (mut lo, mut hi) = (0.0, p);
    for _ in 0..SPLIT_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if f(mid) < 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

fn calibrate_heston(returns: &[f64]) -> Result<Calibration> {
    let n = returns.len();
    let mu = mean(returns);
    let v0 = sample_variance(returns);
    let rv_window = (n / 5).clamp(HESTON_RV_MIN_WINDOW, HESTON_RV_MAX_WINDOW);

    let sq: Vec<f64> = returns.iter().map(|r| (r - mu) * (r - mu)).collect();
    let rv: Vec<f64> = sq.windows(rv_window).map(mean).collect();
    let theta = mean(&rv);

    // Lag rv_window is the first lag at which rolling windows stop overlapping.
    let phi = autocorrelation(&rv, rv_window)
        .unwrap_or(HESTON_PHI_MIN)
        .clamp(HESTON_PHI_MIN, HESTON_PHI_MAX);
    let kappa = -phi.ln() / rv_window as f64;

    let increments: Vec<f64> = rv.windows(2).map(|w| w[1] - w[0]).collect();
    let sigma = if theta > 0.0 {
        sample_std(&increments) / theta.sqrt()
    } else {
        0.0
    };

    // increments[k] is the variance change realized with return rv_window + k.
    let innovations: Vec<f64> = returns[rv_window..].iter().map(|r| r - mu).collect();
    let rho = correlation(&innovations, &increments).unwrap_or(0.0);

    let params = HestonParams::new(mu, kappa, theta, sigma, rho, v0)?;
    if !params.feller_satisfied() {
        tracing::debug!(
            kappa,
            theta,
            sigma,
            "Heston calibration violates the Feller condition; variance may touch zero"
        );
    }
    Ok(Calibration {
        params: CalibratedParameters::Heston(params),
        heuristic: HESTON_HEURISTIC,
        sample_size: n,
    })
}
