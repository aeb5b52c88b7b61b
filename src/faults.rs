//! Probabilistic failure injection for simulated sources and decoders

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Failure rate used by the simulated source and decoder (30%)
pub const DEFAULT_FAILURE_RATE: f64 = 0.3;

/// Decides, call by call, whether an operation should fail
#[derive(Debug, Clone)]
pub struct FaultInjector {
    rate: f64,
    rng: StdRng,
}

impl FaultInjector {
    /// Injector with an entropy-seeded generator. `rate` is clamped to `0.0..=1.0`.
    pub fn new(rate: f64) -> Self {
        Self {
            rate: clamp_rate(rate),
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible injector
    pub fn seeded(rate: f64, seed: u64) -> Self {
        Self {
            rate: clamp_rate(rate),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Injector that never fails
    pub fn disabled() -> Self {
        Self::seeded(0.0, 0)
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn should_fail(&mut self) -> bool {
        self.rng.gen_bool(self.rate)
    }
}

impl Default for FaultInjector {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_RATE)
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) }
}
