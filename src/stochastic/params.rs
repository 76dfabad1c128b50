use serde::Serialize;

use crate::error::{ForecastError, Result};
use crate::stochastic::kind::ModelKind;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GbmParams {
    pub mu: f64,
    pub sigma: f64,
}

impl GbmParams {
    pub fn new(mu: f64, sigma: f64) -> Result<Self> {
        ensure_finite("gbm", &[("mu", mu), ("sigma", sigma)])?;
        if sigma < 0.0 {
            return Err(invalid(format!("gbm sigma must be >= 0, got {sigma}")));
        }
        Ok(Self { mu, sigma })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GarchParams {
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
    pub mu: f64,
}

impl GarchParams {
    pub fn new(omega: f64, alpha: f64, beta: f64, mu: f64) -> Result<Self> {
        ensure_finite(
            "garch",
            &[("omega", omega), ("alpha", alpha), ("beta", beta), ("mu", mu)],
        )?;
        if omega <= 0.0 {
            return Err(invalid(format!("garch omega must be > 0, got {omega}")));
        }
        if alpha < 0.0 || beta < 0.0 {
            return Err(invalid(format!(
                "garch alpha and beta must be >= 0, got alpha={alpha} beta={beta}"
            )));
        }
        if alpha + beta >= 1.0 {
            return Err(invalid(format!(
                "garch requires alpha + beta < 1 for stationarity, got {}",
                alpha + beta
            )));
        }
        Ok(Self {
            omega,
            alpha,
            beta,
            mu,
        })
    }

    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// Long-run variance `omega / (1 - alpha - beta)`.
    pub fn unconditional_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HestonParams {
    pub mu: f64,
    pub kappa: f64,
    pub theta: f64,
    pub sigma: f64,
    pub rho: f64,
    pub v0: f64,
}

impl HestonParams {
    pub fn new(mu: f64, kappa: f64, theta: f64, sigma: f64, rho: f64, v0: f64) -> Result<Self> {
        ensure_finite(
            "heston",
            &[
                ("mu", mu),
                ("kappa", kappa),
                ("theta", theta),
                ("sigma", sigma),
                ("rho", rho),
                ("v0", v0),
            ],
        )?;
        if kappa <= 0.0 {
            return Err(invalid(format!("heston kappa must be > 0, got {kappa}")));
        }
        if theta < 0.0 || sigma < 0.0 || v0 < 0.0 {
            return Err(invalid(format!(
                "heston theta, sigma and v0 must be >= 0, got theta={theta} sigma={sigma} v0={v0}"
            )));
        }
        if !(-1.0..=1.0).contains(&rho) {
            return Err(invalid(format!("heston rho must lie in [-1, 1], got {rho}")));
        }
        Ok(Self {
            mu,
            kappa,
            theta,
            sigma,
            rho,
            v0,
        })
    }

    /// `2·kappa·theta > sigma²`: the variance process stays away from zero.
    pub fn feller_satisfied(&self) -> bool {
        2.0 * self.kappa * self.theta > self.sigma * self.sigma
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "model", rename_all = "lowercase")]
pub enum CalibratedParameters {
    Gbm(GbmParams),
    Garch(GarchParams),
    Heston(HestonParams),
}

impl CalibratedParameters {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Gbm(_) => ModelKind::Gbm,
            Self::Garch(_) => ModelKind::Garch,
            Self::Heston(_) => ModelKind::Heston,
        }
    }

    /// Values in the order of [`ModelKind::parameter_names`].
    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::Gbm(p) => vec![p.mu, p.sigma],
            Self::Garch(p) => vec![p.omega, p.alpha, p.beta, p.mu],
            Self::Heston(p) => vec![p.mu, p.kappa, p.theta, p.sigma, p.rho, p.v0],
        }
    }

    pub fn named_values(&self) -> Vec<(&'static str, f64)> {
        self.kind()
            .parameter_names()
            .iter()
            .copied()
            .zip(self.values())
            .collect()
    }
}

fn ensure_finite(model: &str, values: &[(&str, f64)]) -> Result<()> {
    for (name, v) in values {
        if !v.is_finite() {
            return Err(invalid(format!("{model} {name} is not finite ({v})")));
        }
    }
    Ok(())
}

fn invalid(msg: String) -> ForecastError {
    ForecastError::InvalidParameters(msg)
}
