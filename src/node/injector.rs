//! Simulated fault injection for PRIMARY.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// What PRIMARY does with one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Respond,
    /// Close without replying.
    Crash,
    /// Stall past any poll timeout, then close.
    Hang,
}

/// Decides, per request, whether to fail.
pub trait FailureInjector: Send + Sync + 'static {
    fn decide(&self) -> Decision;
}

/// Fails with probability `failure_chance`, split evenly between crash and hang.
#[derive(Debug)]
pub struct RandomInjector {
    failure_chance: f64,
    rng: Mutex<StdRng>,
}

impl RandomInjector {
    pub fn new(failure_chance: f64) -> Self {
        Self::with_rng(failure_chance, StdRng::from_entropy())
    }

    /// Deterministic sequence for a given seed.
    pub fn seeded(failure_chance: f64, seed: u64) -> Self {
        Self::with_rng(failure_chance, StdRng::seed_from_u64(seed))
    }

    fn with_rng(failure_chance: f64, rng: StdRng) -> Self {
        Self {
            failure_chance: failure_chance.clamp(0.0, 1.0),
            rng: Mutex::new(rng),
        }
    }

    pub fn failure_chance(&self) -> f64 {
        self.failure_chance
    }
}

impl FailureInjector for RandomInjector {
    fn decide(&self) -> Decision {
        let mut rng = self.rng.lock().expect("injector rng mutex poisoned");
        // gen::<f64>() is in [0, 1): chance 0 never fails, chance 1 always does.
        if rng.gen::<f64>() >= self.failure_chance {
            return Decision::Respond;
        }
        if rng.gen_bool(0.5) {
            Decision::Crash
        } else {
            Decision::Hang
        }
    }
}

/// Always returns the same decision.
#[derive(Debug, Clone, Copy)]
pub struct FixedInjector(pub Decision);

impl FailureInjector for FixedInjector {
    fn decide(&self) -> Decision {
        self.0
    }
}
