//! Configuration of an evaluation session.

use std::path::Path;

use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::access::AccessPattern;
use crate::filters::Wavelet;
use crate::logger::LoggerConfig;
use crate::LiftingError;

/// How the input signal is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    /// `0, 1, 2, ...`
    Ascending,
    /// Uniform in `0..100`, from the session seed.
    #[default]
    Random,
}

/// Complete configuration for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Wavelet whose analysis and synthesis stages form the chain.
    pub wavelet: Wavelet,

    /// Input signal generator.
    pub input: InputKind,

    /// Length of the input signal.
    pub num_values: usize,

    /// Order in which slots are forced.
    pub order: AccessPattern,

    /// Seed for [`InputKind::Random`].
    pub seed: u64,

    /// Logger tunables.
    pub logger: LoggerConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            wavelet: Wavelet::LeGall5_3,
            input: InputKind::Random,
            num_values: 16,
            order: AccessPattern::Block,
            seed: 42,
            logger: LoggerConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, LiftingError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn with_wavelet(mut self, wavelet: Wavelet) -> Self {
        self.wavelet = wavelet;
        self
    }

    pub fn with_input(mut self, input: InputKind) -> Self {
        self.input = input;
        self
    }

    pub fn with_num_values(mut self, num_values: usize) -> Self {
        self.num_values = num_values;
        self
    }

    pub fn with_order(mut self, order: AccessPattern) -> Self {
        self.order = order;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_logger(mut self, logger: LoggerConfig) -> Self {
        self.logger = logger;
        self
    }

    /// Generate the input signal described by this configuration.
    pub fn generate_input(&self) -> Vec<i64> {
        match self.input {
            InputKind::Ascending => (0..self.num_values as i64).collect(),
            InputKind::Random => {
                let mut rng = StdRng::seed_from_u64(self.seed);
                (0..self.num_values).map(|_| rng.gen_range(0..100)).collect()
            }
        }
    }
}
