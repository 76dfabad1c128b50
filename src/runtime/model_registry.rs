use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::config::{Config, ConfigOverrides, ModelConfig, SimulationSettings};
use crate::error::{ForecastError, Result};
use crate::model::forecast::ForecastResult;
use crate::model::signal::SignalReport;
use crate::signal;
use crate::simulation::RunControl;
use crate::stochastic::kind::ModelKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelDescriptor {
    pub kind: ModelKind,
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [&'static str],
}

impl ModelDescriptor {
    fn of(kind: ModelKind) -> Self {
        Self {
            kind,
            name: kind.display_name(),
            description: kind.description(),
            parameters: kind.parameter_names(),
        }
    }
}

/// Stateless entry point for one model kind. Holds only defaults; every call
/// builds its own config snapshot.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    kind: ModelKind,
    defaults: ModelConfig,
    settings: SimulationSettings,
}

impl ModelHandle {
    pub fn new(kind: ModelKind, defaults: ModelConfig, settings: SimulationSettings) -> Self {
        Self {
            kind,
            defaults,
            settings,
        }
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn defaults(&self) -> ModelConfig {
        self.defaults
    }

    pub fn describe(&self) -> ModelDescriptor {
        ModelDescriptor::of(self.kind)
    }

    pub fn predict(&self, prices: &[f64], overrides: &ConfigOverrides) -> Result<ForecastResult> {
        self.predict_with(prices, overrides, None, &RunControl::new())
    }

    /// `seed` replaces the configured seed for this call only.
    pub fn predict_with(
        &self,
        prices: &[f64],
        overrides: &ConfigOverrides,
        seed: Option<u64>,
        control: &RunControl,
    ) -> Result<ForecastResult> {
        let config = self.defaults.merged(overrides)?;
        let settings = self.call_settings(seed);
        let control = self.call_control(control);
        signal::predict(self.kind, prices, config, &settings, &control)
    }

    pub fn generate_signals(
        &self,
        prices: &[f64],
        overrides: &ConfigOverrides,
        threshold: f64,
    ) -> Result<SignalReport> {
        self.generate_signals_with(prices, overrides, threshold, None, &RunControl::new())
    }

    pub fn generate_signals_with(
        &self,
        prices: &[f64],
        overrides: &ConfigOverrides,
        threshold: f64,
        seed: Option<u64>,
        control: &RunControl,
    ) -> Result<SignalReport> {
        let config = self.defaults.merged(overrides)?;
        let settings = self.call_settings(seed);
        let control = self.call_control(control);
        signal::generate_signals(self.kind, prices, config, threshold, &settings, &control)
    }

    fn call_settings(&self, seed: Option<u64>) -> SimulationSettings {
        SimulationSettings {
            seed: seed.or(self.settings.seed),
            ..self.settings
        }
    }

    /// Applies the configured timeout unless the caller already set a deadline.
    fn call_control(&self, control: &RunControl) -> RunControl {
        match (control.deadline(), self.settings.timeout_ms) {
            (None, Some(ms)) => control.clone().with_timeout(Duration::from_millis(ms)),
            _ => control.clone(),
        }
    }
}

/// One handle per model kind, built once at startup and shared by reference.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    handles: BTreeMap<ModelKind, ModelHandle>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        let settings = SimulationSettings::default();
        let handles = ModelKind::ALL
            .into_iter()
            .map(|kind| (kind, ModelHandle::new(kind, ModelConfig::default(), settings)))
            .collect();
        Self { handles }
    }
}

impl ModelRegistry {
    pub fn new(config: &Config) -> Result<Self> {
        config.simulation.validate()?;
        let mut handles = BTreeMap::new();
        for kind in ModelKind::ALL {
            let defaults = config.defaults_for(kind)?;
            handles.insert(kind, ModelHandle::new(kind, defaults, config.simulation));
        }
        tracing::debug!(models = handles.len(), "Model registry initialised");
        Ok(Self { handles })
    }

    /// Case-insensitive lookup; unknown names are `UnsupportedModel`.
    pub fn get_model(&self, name: &str) -> Result<&ModelHandle> {
        let kind: ModelKind = name.parse()?;
        self.handle(kind)
    }

    pub fn handle(&self, kind: ModelKind) -> Result<&ModelHandle> {
        self.handles
            .get(&kind)
            .ok_or_else(|| ForecastError::UnsupportedModel(kind.to_string()))
    }

    pub fn catalog(&self) -> Vec<ModelDescriptor> {
        ModelKind::ALL
            .into_iter()
            .filter_map(|kind| self.handles.get(&kind))
            .map(ModelHandle::describe)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.get_model(" GBM ").unwrap().kind(), ModelKind::Gbm);
        assert_eq!(registry.get_model("Heston").unwrap().kind(), ModelKind::Heston);
    }

    #[test]
    fn configured_timeout_does_not_override_caller_deadline() {
        let settings = SimulationSettings {
            timeout_ms: Some(60_000),
            ..SimulationSettings::default()
        };
        let handle = ModelHandle::new(ModelKind::Gbm, ModelConfig::default(), settings);
        let immediate = RunControl::new().with_deadline(std::time::Instant::now());
        assert!(handle.call_control(&immediate).should_stop());
        assert!(!handle.call_control(&RunControl::new()).should_stop());
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ModelRegistry>();
    }
}
