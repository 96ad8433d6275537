//! Runner configuration

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Configuration for [`FuzzRunner`](crate::FuzzRunner) runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzConfig {
    /// Number of generated or mutated inputs per target
    pub iterations: usize,

    /// Random seed for reproducibility (None = random)
    pub seed: Option<u64>,

    /// Maximum length of generated strings and byte sequences
    pub max_len: usize,

    /// Whether to continue after first failure
    pub continue_on_failure: bool,

    /// Maximum failures before stopping
    pub max_failures: usize,

    /// Include edge cases (NaN, Inf, MIN/MAX, empty)
    pub include_edge_cases: bool,

    /// Include boundary values
    pub include_boundaries: bool,

    /// Probability of mutating a corpus entry instead of generating a fresh input
    pub mutation_rate: f64,

    /// Run every seeded corpus entry once before fuzzing
    pub replay_corpus: bool,

    /// Output directory for corpora and reports
    pub output_dir: Option<String>,

    /// Verbosity level (0-3)
    pub verbosity: u8,
}

impl Default for FuzzConfig {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            seed: None,
            max_len: 256,
            continue_on_failure: true,
            max_failures: 100,
            include_edge_cases: true,
            include_boundaries: true,
            mutation_rate: 0.5,
            replay_corpus: true,
            output_dir: None,
            verbosity: 1,
        }
    }
}

impl FuzzConfig {
    /// Create a quick fuzzing config for CI
    pub fn ci() -> Self {
        Self {
            iterations: 1000,
            verbosity: 0,
            ..Default::default()
        }
    }

    /// Create an exhaustive fuzzing config for local testing
    pub fn exhaustive() -> Self {
        Self {
            iterations: 1_000_000,
            max_len: 4096,
            max_failures: 1000,
            verbosity: 2,
            ..Default::default()
        }
    }

    /// Create a minimal config for quick sanity checks
    pub fn minimal() -> Self {
        Self {
            iterations: 100,
            max_len: 32,
            ..Default::default()
        }
    }

    /// Builder: set iterations
    pub fn with_iterations(mut self, n: usize) -> Self {
        self.iterations = n;
        self
    }

    /// Builder: set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder: set max string/bytes length
    pub fn with_max_len(mut self, len: usize) -> Self {
        self.max_len = len;
        self
    }

    /// Builder: set mutation probability (clamped to 0..=1)
    pub fn with_mutation_rate(mut self, rate: f64) -> Self {
        self.mutation_rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        self
    }

    /// Builder: set failure cap
    pub fn with_max_failures(mut self, n: usize) -> Self {
        self.max_failures = n;
        self
    }

    /// Builder: toggle corpus replay
    pub fn with_replay(mut self, replay: bool) -> Self {
        self.replay_corpus = replay;
        self
    }

    /// Builder: set output directory
    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// Builder: set verbosity
    pub fn with_verbosity(mut self, level: u8) -> Self {
        self.verbosity = level;
        self
    }

    /// Builder: continue on failure
    pub fn continue_after_failures(mut self, cont: bool) -> Self {
        self.continue_on_failure = cont;
        self
    }

    /// Load from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Save as pretty JSON
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
