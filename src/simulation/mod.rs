pub mod control;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::config::SimulationSettings;
use crate::error::{ForecastError, Result};
use crate::stochastic::kind::ModelKind;
use crate::stochastic::params::CalibratedParameters;
use crate::stochastic::path::{simulate_path, SimulatedPath};

pub use control::{CancelToken, RunControl};

/// Valid paths of one simulation call plus the count of discarded ones.
#[derive(Debug, Clone)]
pub struct SimulatedEnsemble {
    pub steps: usize,
    pub requested: usize,
    pub paths: Vec<SimulatedPath>,
    pub invalid: usize,
}

impl SimulatedEnsemble {
    pub fn valid(&self) -> usize {
        self.paths.len()
    }
}

/// SplitMix64 finalizer.
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Seed of the independent sub-stream `index` derived from `base`.
pub fn stream_seed(base: u64, index: u64) -> u64 {
    mix64(base ^ mix64(index))
}

pub fn stream_rng(base: u64, index: u64) -> StdRng {
    StdRng::seed_from_u64(stream_seed(base, index))
}

/// Fresh base seed for callers that did not pin one.
pub fn entropy_seed() -> u64 {
    rand::random()
}

#[derive(Debug, Clone, Copy)]
pub struct Simulator {
    dt: f64,
    batch_size: usize,
    max_invalid_fraction: f64,
}

impl Simulator {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            dt: settings.dt,
            batch_size: settings.batch_size.max(1),
            max_invalid_fraction: settings.max_invalid_fraction,
        }
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Accepts up to `max_invalid_fraction` discarded paths (inclusive).
    fn check_invalid(&self, model: ModelKind, invalid: usize, requested: usize) -> Result<()> {
        if invalid == 0 {
            return Ok(());
        }
        if invalid as f64 / requested as f64 > self.max_invalid_fraction {
            return Err(ForecastError::InvalidParameters(format!(
                "{invalid} of {requested} simulated paths produced non-finite values"
            )));
        }
        tracing::warn!(
            model = %model,
            invalid,
            requested,
            "Discarded invalid simulation paths"
        );
        Ok(())
    }

    /// Simulate `num_paths` independent paths of `steps` bars starting at `last_price`.
    ///
    /// Path `i` draws from `stream_rng(seed, i)`, so the ensemble only depends on
    /// `seed` and not on how batches were scheduled across threads.
    pub fn simulate(
        &self,
        params: &CalibratedParameters,
        last_price: f64,
        steps: usize,
        num_paths: usize,
        seed: u64,
        control: &RunControl,
    ) -> Result<SimulatedEnsemble> {
        if steps == 0 || num_paths == 0 {
            return Err(ForecastError::InvalidConfig(format!(
                "steps and num_paths must be > 0, got steps={steps} num_paths={num_paths}"
            )));
        }
        if !last_price.is_finite() || last_price <= 0.0 {
            return Err(ForecastError::InvalidParameters(format!(
                "last price must be positive and finite, got {last_price}"
            )));
        }

        let mut paths = Vec::with_capacity(num_paths);
        let mut invalid = 0usize;
        let mut start = 0usize;
        while start < num_paths {
            if control.should_stop() {
                tracing::warn!(
                    model = %params.kind(),
                    completed = start,
                    requested = num_paths,
                    "Simulation cancelled"
                );
                return Err(ForecastError::SimulationTimeout {
                    completed_paths: start,
                    requested_paths: num_paths,
                });
            }
            let end = (start + self.batch_size).min(num_paths);
            let batch: Vec<Option<SimulatedPath>> = (start..end)
                .into_par_iter()
                .map(|i| {
                    let mut rng = stream_rng(seed, i as u64);
                    simulate_path(params, last_price, steps, self.dt, &mut rng)
                })
                .collect();
            for path in batch {
                match path {
                    Some(p) => paths.push(p),
                    None => invalid += 1,
                }
            }
            start = end;
        }

        self.check_invalid(params.kind(), invalid, num_paths)?;

        Ok(SimulatedEnsemble {
            steps,
            requested: num_paths,
            paths,
            invalid,
        })
    }
}
