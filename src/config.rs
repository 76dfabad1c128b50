use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;
use crate::stochastic::kind::ModelKind;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const CONFIG_PATH_ENV: &str = "BROWNIAN_FORECAST_CONFIG";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub model: ModelConfig,
    pub models: ModelDefaults,
    pub simulation: SimulationSettings,
    pub logging: LoggingConfig,
    /// File the config was read from; `None` means built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Per-call model configuration. Always used as an immutable snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    pub window_size: usize,
    pub prediction_steps: usize,
    pub num_simulations: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            window_size: 50,
            prediction_steps: 5,
            num_simulations: 1000,
        }
    }
}

/// Caller-supplied replacements for individual [`ModelConfig`] fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigOverrides {
    pub window_size: Option<usize>,
    pub prediction_steps: Option<usize>,
    pub num_simulations: Option<usize>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.window_size.is_none() && self.prediction_steps.is_none() && self.num_simulations.is_none()
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<(), ForecastError> {
        for (name, value) in [
            ("window_size", self.window_size),
            ("prediction_steps", self.prediction_steps),
            ("num_simulations", self.num_simulations),
        ] {
            if value == 0 {
                return Err(ForecastError::InvalidConfig(format!(
                    "{name} must be a positive integer"
                )));
            }
        }
        Ok(())
    }

    /// New snapshot with `overrides` applied on top of `self`; `self` is untouched.
    pub fn merged(&self, overrides: &ConfigOverrides) -> Result<Self, ForecastError> {
        let merged = Self {
            window_size: overrides.window_size.unwrap_or(self.window_size),
            prediction_steps: overrides.prediction_steps.unwrap_or(self.prediction_steps),
            num_simulations: overrides.num_simulations.unwrap_or(self.num_simulations),
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// Optional per-kind adjustments layered over `[model]`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelDefaults {
    pub heston: Option<ConfigOverrides>,
    pub garch: Option<ConfigOverrides>,
    pub gbm: Option<ConfigOverrides>,
}

impl ModelDefaults {
    pub fn for_kind(&self, kind: ModelKind) -> ConfigOverrides {
        match kind {
            ModelKind::Heston => self.heston,
            ModelKind::Garch => self.garch,
            ModelKind::Gbm => self.gbm,
        }
        .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    pub seed: Option<u64>,
    pub low_percentile: f64,
    pub high_percentile: f64,
    /// Paths simulated between two cancellation checks.
    pub batch_size: usize,
    /// Step length in bars.
    pub dt: f64,
    pub timeout_ms: Option<u64>,
    pub max_invalid_fraction: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            seed: None,
            low_percentile: 5.0,
            high_percentile: 95.0,
            batch_size: 256,
            dt: 1.0,
            timeout_ms: None,
            max_invalid_fraction: 0.5,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> Result<(), ForecastError> {
        let (lo, hi) = (self.low_percentile, self.high_percentile);
        if !(lo.is_finite() && hi.is_finite() && (0.0..=50.0).contains(&lo) && (50.0..=100.0).contains(&hi)) {
            return Err(ForecastError::InvalidConfig(format!(
                "percentiles must satisfy 0 <= low <= 50 <= high <= 100, got low={lo} high={hi}"
            )));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::InvalidConfig(
                "batch_size must be > 0".to_string(),
            ));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ForecastError::InvalidConfig(format!(
                "dt must be positive, got {}",
                self.dt
            )));
        }
        if !(0.0..=1.0).contains(&self.max_invalid_fraction) {
            return Err(ForecastError::InvalidConfig(format!(
                "max_invalid_fraction must lie in [0, 1], got {}",
                self.max_invalid_fraction
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load from `path`, else `$BROWNIAN_FORECAST_CONFIG`, else `config/default.toml`.
    ///
    /// A missing file yields the built-in defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };
        if !config_path.exists() {
            if path.is_some() {
                anyhow::bail!("config file {} does not exist", config_path.display());
            }
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }

        let config_str = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config = Self::from_toml_str(&config_str)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config.source = Some(config_path);
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("invalid config toml")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        self.model.validate()?;
        for kind in ModelKind::ALL {
            self.defaults_for(kind)?;
        }
        self.simulation.validate()
    }

    /// Default snapshot for `kind`: `[model]` merged with `[models.<kind>]`.
    pub fn defaults_for(&self, kind: ModelKind) -> Result<ModelConfig, ForecastError> {
        self.model.merged(&self.models.for_kind(kind))
    }
}
