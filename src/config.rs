use std::time::Duration;

use thiserror::Error;

use crate::domain::error::Operation;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key}: expected a non-negative integer of milliseconds, got `{value}`")]
    InvalidDelay { key: &'static str, value: String },
    #[error("{key}: expected `true` or `false`, got `{value}`")]
    InvalidFlag { key: &'static str, value: String },
    #[error("{key}: expected a rate between 0.0 and 1.0, got `{value}`")]
    InvalidRate { key: &'static str, value: String },
    #[error("{key}: expected an unsigned integer seed, got `{value}`")]
    InvalidSeed { key: &'static str, value: String },
}

/// Artificial latency per operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub get_all: Duration,
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Delays {
    pub fn zero() -> Self {
        Self { get_all: Duration::ZERO, create: Duration::ZERO, update: Duration::ZERO, delete: Duration::ZERO }
    }

    pub fn for_operation(&self, op: Operation) -> Duration {
        match op {
            Operation::GetAll => self.get_all,
            Operation::Create => self.create,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            get_all: Duration::from_millis(800),
            create: Duration::from_millis(600),
            update: Duration::from_millis(500),
            delete: Duration::from_millis(400),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub delays: Delays,
    pub simulate_errors: bool,
    pub error_rate: f64,
    pub rng_seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { delays: Delays::default(), simulate_errors: false, error_rate: 0.1, rng_seed: None }
    }
}

impl SimulationConfig {
    /// No latency and no injected failures.
    pub fn instant() -> Self {
        Self { delays: Delays::zero(), ..Self::default() }
    }

    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let delay = |key: &'static str, fallback: Duration| match lookup(key) {
            None => Ok(fallback),
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidDelay { key, value: v }),
        };

        let delays = Delays {
            get_all: delay("TODO_DELAY_GET_MS", defaults.delays.get_all)?,
            create: delay("TODO_DELAY_CREATE_MS", defaults.delays.create)?,
            update: delay("TODO_DELAY_UPDATE_MS", defaults.delays.update)?,
            delete: delay("TODO_DELAY_DELETE_MS", defaults.delays.delete)?,
        };

        let simulate_errors = match lookup("TODO_ENABLE_ERROR_SIMULATION") {
            None => defaults.simulate_errors,
            Some(v) => match v.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" | "" => false,
                _ => return Err(ConfigError::InvalidFlag { key: "TODO_ENABLE_ERROR_SIMULATION", value: v }),
            },
        };

        let error_rate = match lookup("TODO_ERROR_RATE") {
            None => defaults.error_rate,
            Some(v) => match v.trim().parse::<f64>() {
                Ok(rate) if (0.0..=1.0).contains(&rate) => rate,
                _ => return Err(ConfigError::InvalidRate { key: "TODO_ERROR_RATE", value: v }),
            },
        };

        let rng_seed = match lookup("TODO_RNG_SEED") {
            None => None,
            Some(v) => Some(
                v.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSeed { key: "TODO_RNG_SEED", value: v.clone() })?,
            ),
        };

        Ok(Self { delays, simulate_errors, error_rate, rng_seed })
    }
}
