#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Prices whose log returns are iid N(mu, sigma²), starting at `start`.
pub fn gbm_prices(n: usize, start: f64, mu: f64, sigma: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut prices = Vec::with_capacity(n);
    let mut log_price = start.ln();
    prices.push(start);
    for _ in 1..n {
        let z: f64 = rng.sample(StandardNormal);
        log_price += mu + sigma * z;
        prices.push(log_price.exp());
    }
    prices
}

/// Prices driven by GARCH(1,1) log returns with zero mean.
pub fn garch_prices(n: usize, omega: f64, alpha: f64, beta: f64, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut h = omega / (1.0 - alpha - beta);
    let mut log_price = 100f64.ln();
    let mut prices = Vec::with_capacity(n);
    prices.push(100.0);
    for _ in 1..n {
        let z: f64 = rng.sample(StandardNormal);
        let eps = h.sqrt() * z;
        log_price += eps;
        prices.push(log_price.exp());
        h = omega + alpha * eps * eps + beta * h;
    }
    prices
}
