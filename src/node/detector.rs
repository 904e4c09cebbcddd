//! PRIMARY's detection step.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::state::StateValue;

/// Produces a fresh state value on each served request.
pub trait Detector: Send + Sync + 'static {
    fn detect(&self) -> StateValue;
}

/// Fair coin between `Clear` and `ObstacleDetected`.
#[derive(Debug)]
pub struct RandomDetector {
    rng: Mutex<StdRng>,
}

impl RandomDetector {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Default for RandomDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for RandomDetector {
    fn detect(&self) -> StateValue {
        let mut rng = self.rng.lock().expect("detector rng mutex poisoned");
        if rng.gen_bool(0.5) {
            StateValue::ObstacleDetected
        } else {
            StateValue::Clear
        }
    }
}

/// Always reports the same value.
#[derive(Debug, Clone, Copy)]
pub struct FixedDetector(pub StateValue);

impl Detector for FixedDetector {
    fn detect(&self) -> StateValue {
        self.0
    }
}
