use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

use crate::stochastic::params::{CalibratedParameters, GarchParams, GbmParams, HestonParams};

/// One simulated trajectory. Index `t` holds the state after `t + 1` steps.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulatedPath {
    pub prices: Vec<f64>,
    pub variances: Vec<f64>,
}

impl SimulatedPath {
    pub fn terminal_price(&self) -> Option<f64> {
        self.prices.last().copied()
    }
}

/// Per-path state, carrying its own copy of the parameters it steps with.
#[derive(Debug, Clone, Copy)]
enum PathState {
    Gbm { price: f64, p: GbmParams },
    Garch { price: f64, h: f64, p: GarchParams },
    Heston { log_price: f64, v: f64, p: HestonParams },
}

impl PathState {
    fn initial(params: &CalibratedParameters, last_price: f64) -> Self {
        match *params {
            CalibratedParameters::Gbm(p) => Self::Gbm {
                price: last_price,
                p,
            },
            CalibratedParameters::Garch(p) => Self::Garch {
                price: last_price,
                h: p.unconditional_variance(),
                p,
            },
            CalibratedParameters::Heston(p) => Self::Heston {
                log_price: last_price.ln(),
                v: p.v0,
                p,
            },
        }
    }

    /// Advance one bar. Returns `(price, variance)` after the step.
    fn step<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) -> (f64, f64) {
        match self {
            Self::Gbm { price, p } => {
                *price = gbm_step(*price, p, dt, rng.sample(StandardNormal));
                (*price, p.sigma * p.sigma)
            }
            Self::Garch { price, h, p } => {
                let (next_price, next_h) = garch_step(*price, *h, p, dt, rng.sample(StandardNormal));
                *price = next_price;
                *h = next_h;
                (*price, *h)
            }
            Self::Heston { log_price, v, p } => {
                let z_s: f64 = rng.sample(StandardNormal);
                let z_i: f64 = rng.sample(StandardNormal);
                let (next_log, next_v) = heston_step(*log_price, *v, p, dt, z_s, z_i);
                *log_price = next_log;
                *v = next_v;
                (log_price.exp(), *v)
            }
        }
    }
}

pub fn gbm_step(price: f64, p: &GbmParams, dt: f64, z: f64) -> f64 {
    let drift = (p.mu - 0.5 * p.sigma * p.sigma) * dt;
    price * (drift + p.sigma * dt.sqrt() * z).exp()
}

/// Returns `(next_price, next_conditional_variance)`.
pub fn garch_step(price: f64, h: f64, p: &GarchParams, dt: f64, z: f64) -> (f64, f64) {
    let eps = h.sqrt() * z;
    let next_price = price * (p.mu * dt + eps * dt.sqrt()).exp();
    let next_h = p.omega + p.alpha * eps * eps + p.beta * h;
    (next_price, next_h)
}

/// Full-truncation Euler step. Returns `(next_log_price, next_variance)`, variance `>= 0`.
pub fn heston_step(log_price: f64, v: f64, p: &HestonParams, dt: f64, z_s: f64, z_i: f64) -> (f64, f64) {
    let z_v = p.rho * z_s + (1.0 - p.rho * p.rho).max(0.0).sqrt() * z_i;
    let v_pos = v.max(0.0);
    let next_log = log_price + (p.mu - 0.5 * v_pos) * dt + (v_pos * dt).sqrt() * z_s;
    let next_v = v + p.kappa * (p.theta - v) * dt + p.sigma * (v_pos * dt).sqrt() * z_v;
    (next_log, next_v.max(0.0))
}

/// Simulate one path of `steps` bars from `last_price`.
///
/// Returns `None` as soon as a non-finite or non-positive price, or a non-finite
/// variance, appears: the path is then excluded from aggregation.
pub fn simulate_path<R: Rng + ?Sized>(
    params: &CalibratedParameters,
    last_price: f64,
    steps: usize,
    dt: f64,
    rng: &mut R,
) -> Option<SimulatedPath> {
    let mut state = PathState::initial(params, last_price);
    let mut prices = Vec::with_capacity(steps);
    let mut variances = Vec::with_capacity(steps);
    for _ in 0..steps {
        let (price, variance) = state.step(dt, rng);
        if !price.is_finite() || price <= 0.0 || !variance.is_finite() {
            return None;
        }
        prices.push(price);
        variances.push(variance);
    }
    Some(SimulatedPath { prices, variances })
}
