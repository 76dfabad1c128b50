use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Heston,
    Garch,
    Gbm,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Heston, ModelKind::Garch, ModelKind::Gbm];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heston => "heston",
            Self::Garch => "garch",
            Self::Gbm => "gbm",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Heston => "Heston Model",
            Self::Garch => "GARCH(1,1) Model",
            Self::Gbm => "Geometric Brownian Motion",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Heston => "Stochastic volatility with price/variance correlation",
            Self::Garch => "Conditional volatility with ARCH/GARCH effects",
            Self::Gbm => "Classical geometric Brownian motion",
        }
    }

    /// Parameter names in the order the calibrated values are reported.
    pub fn parameter_names(self) -> &'static [&'static str] {
        match self {
            Self::Heston => &["mu", "kappa", "theta", "sigma", "rho", "v0"],
            Self::Garch => &["omega", "alpha", "beta", "mu"],
            Self::Gbm => &["mu", "sigma"],
        }
    }

    /// Minimum number of prices the estimator needs in a calibration window.
    pub fn required_history(self) -> usize {
        match self {
            Self::Gbm => 3,
            Self::Garch => 10,
            Self::Heston => 10,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heston" => Ok(Self::Heston),
            "garch" => Ok(Self::Garch),
            "gbm" => Ok(Self::Gbm),
            _ => Err(ForecastError::UnsupportedModel(s.trim().to_string())),
        }
    }
}
