use std::sync::Mutex;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// Decides whether the next boundary call fails as if the network dropped it.
pub trait FailurePolicy: Send + Sync + 'static {
    fn should_fail(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFail;

impl FailurePolicy for NeverFail {
    fn should_fail(&self) -> bool { false }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysFail;

impl FailurePolicy for AlwaysFail {
    fn should_fail(&self) -> bool { true }
}

/// Fails when a uniform sample in `[0, 1)` falls below `probability`.
#[derive(Debug)]
pub struct RandomFailure {
    probability: f64,
    rng: Mutex<StdRng>,
}

impl RandomFailure {
    pub fn from_entropy(probability: f64) -> Self {
        Self::with_rng(probability, StdRng::from_entropy())
    }

    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self::with_rng(probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(probability: f64, rng: StdRng) -> Self {
        Self { probability: probability.clamp(0.0, 1.0), rng: Mutex::new(rng) }
    }

    pub fn probability(&self) -> f64 { self.probability }
}

impl FailurePolicy for RandomFailure {
    fn should_fail(&self) -> bool {
        let sample: f64 = match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0.0..1.0),
            Err(poisoned) => poisoned.into_inner().gen_range(0.0..1.0),
        };
        sample < self.probability
    }
}

/// Policy picked from configuration: disabled simulation never fails.
pub enum ConfiguredFailure {
    Disabled(NeverFail),
    Random(RandomFailure),
}

impl ConfiguredFailure {
    pub fn new(enabled: bool, probability: f64, seed: Option<u64>) -> Self {
        if !enabled { return Self::Disabled(NeverFail); }
        match seed {
            Some(seed) => Self::Random(RandomFailure::seeded(probability, seed)),
            None => Self::Random(RandomFailure::from_entropy(probability)),
        }
    }
}

impl FailurePolicy for ConfiguredFailure {
    fn should_fail(&self) -> bool {
        match self {
            ConfiguredFailure::Disabled(p) => p.should_fail(),
            ConfiguredFailure::Random(p) => p.should_fail(),
        }
    }
}
