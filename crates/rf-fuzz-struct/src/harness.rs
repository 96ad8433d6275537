//! Fuzzing harness and runner

use crate::config::FuzzConfig;
use crate::driver::{add_example, register_target, EntryPoint, FuzzDriver};
use crate::generators::ScalarGenerator;
use crate::record::Record;
use crate::scalar::Scalar;
use crate::{FuzzError, Result};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of a fuzzing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzResult {
    /// Record type the target takes
    pub target: String,

    /// Number of scalars per input
    pub schema_len: usize,

    /// Total inputs run (replayed + fuzzed)
    pub iterations: usize,

    /// Number of successful iterations
    pub successes: usize,

    /// Number of failures
    pub failures: usize,

    /// Number of panics caught
    pub panics: usize,

    /// Corpus entries replayed before fuzzing
    pub corpus_replayed: usize,

    /// Total duration
    pub duration_ms: u64,

    /// Seed used (for reproducibility)
    pub seed: u64,

    /// List of failures with details
    pub failure_details: Vec<FuzzFailure>,

    /// Whether all iterations passed
    pub passed: bool,
}

/// Details of a fuzzing failure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuzzFailure {
    /// Iteration number when failure occurred
    pub iteration: usize,

    /// Type of failure
    pub failure_type: FailureType,

    /// Where the input came from
    pub source: InputSource,

    /// Description of the failure
    pub description: String,

    /// Input that caused the failure; can be seeded back as-is
    pub input: Vec<Scalar>,
}

/// Type of fuzzing failure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FailureType {
    /// Target panicked
    Panic,
    /// Target reported an error through [`FuzzContext::error`]
    AssertionFailed,
    /// Input did not fit the record's schema
    ShapeMismatch,
    /// Record contains a field the codec cannot handle
    Unsupported,
}

/// Origin of a fuzz input
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum InputSource {
    Corpus,
    Mutated,
    Generated,
}

/// Handle passed to the target on every call
#[derive(Debug, Default)]
pub struct FuzzContext {
    iteration: usize,
    errors: Vec<String>,
}

impl FuzzContext {
    fn new(iteration: usize) -> Self {
        Self {
            iteration,
            errors: Vec::new(),
        }
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn log(&self, message: impl AsRef<str>) {
        log::debug!("[{}] {}", self.iteration, message.as_ref());
    }

    /// Mark this input as failing without panicking
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// In-process corpus-based driver
pub struct FuzzRunner {
    config: FuzzConfig,
    corpus: Vec<Vec<Scalar>>,
}

impl FuzzRunner {
    /// Create a new fuzzing runner
    pub fn new(config: FuzzConfig) -> Self {
        Self {
            config,
            corpus: Vec::new(),
        }
    }

    pub fn config(&self) -> &FuzzConfig {
        &self.config
    }

    pub fn corpus(&self) -> &[Vec<Scalar>] {
        &self.corpus
    }

    /// Seed the corpus with a typed example
    pub fn add<T: Record>(&mut self, value: &T) -> Result<()> {
        add_example(self, value)
    }

    /// Fuzz a typed target
    pub fn fuzz<T, F>(&mut self, target: F) -> Result<FuzzResult>
    where
        T: Record,
        F: Fn(&mut FuzzContext, T) + Send + Sync + 'static,
    {
        register_target(self, target)
    }

    /// Run `entry` against the corpus, then against fuzzed inputs
    pub fn execute(&self, entry: &EntryPoint<FuzzContext>) -> FuzzResult {
        let seed = self.config.seed.unwrap_or_else(rand::random);
        let mut generator = ScalarGenerator::new(Some(seed), self.config.max_len)
            .with_edge_cases(self.config.include_edge_cases)
            .with_boundaries(self.config.include_boundaries);

        let schema = entry.schema();
        log::info!(
            "Fuzzing {} ({} scalars): {} corpus entries, {} iterations, seed {}",
            entry.name(),
            schema.len(),
            self.corpus.len(),
            self.config.iterations,
            seed
        );

        // Only well-shaped entries are worth mutating
        let mutable: Vec<&Vec<Scalar>> = self.corpus.iter().filter(|s| schema.matches(s)).collect();

        let mut tally = Tally::default();
        let start = Instant::now();

        if self.config.replay_corpus {
            for input in &self.corpus {
                if self.should_stop(&tally) {
                    break;
                }
                self.run_one(entry, &mut tally, InputSource::Corpus, input.clone());
                tally.replayed += 1;
            }
        }

        for _ in 0..self.config.iterations {
            if self.should_stop(&tally) {
                break;
            }

            let (source, input) = if !mutable.is_empty() && generator.chance(self.config.mutation_rate) {
                let mut input = mutable[generator.index(mutable.len())].clone();
                generator.mutate(&mut input);
                (InputSource::Mutated, input)
            } else {
                (InputSource::Generated, generator.sequence(schema))
            };

            self.run_one(entry, &mut tally, source, input);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        let result = FuzzResult {
            target: entry.name().to_string(),
            schema_len: schema.len(),
            iterations: tally.successes + tally.failures,
            successes: tally.successes,
            failures: tally.failures,
            panics: tally.panics,
            corpus_replayed: tally.replayed,
            duration_ms,
            seed,
            failure_details: tally.failure_details,
            passed: tally.failures == 0,
        };
        log::info!("{}: {}", result.target, result.summary());

        if let Some(dir) = &self.config.output_dir {
            if !result.passed {
                if let Err(e) = result.save_failures(dir) {
                    log::warn!("Could not save failing inputs to {dir}: {e}");
                }
            }
        }

        result
    }

    fn should_stop(&self, tally: &Tally) -> bool {
        (!self.config.continue_on_failure && tally.failures > 0)
            || tally.failure_details.len() >= self.config.max_failures
    }

    fn run_one(
        &self,
        entry: &EntryPoint<FuzzContext>,
        tally: &mut Tally,
        source: InputSource,
        input: Vec<Scalar>,
    ) {
        let iteration = tally.successes + tally.failures;
        let mut ctx = FuzzContext::new(iteration);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| entry.call(&mut ctx, input.clone())));

        let (failure_type, description) = match outcome {
            Ok(Ok(())) if !ctx.failed() => {
                tally.successes += 1;
                return;
            }
            Ok(Ok(())) => (FailureType::AssertionFailed, ctx.errors().join("; ")),
            Ok(Err(FuzzError::ShapeMismatch(mismatch))) => {
                (FailureType::ShapeMismatch, mismatch.to_string())
            }
            Ok(Err(e)) => (FailureType::Unsupported, e.to_string()),
            Err(panic_info) => {
                tally.panics += 1;
                (FailureType::Panic, panic_message(&*panic_info))
            }
        };

        tally.failures += 1;
        if self.config.verbosity >= 1 {
            log::warn!("{failure_type:?} at iteration {iteration}: {description}");
        }
        tally.failure_details.push(FuzzFailure {
            iteration,
            failure_type,
            source,
            description,
            input,
        });
    }

    /// Write the corpus as a JSON array of scalar sequences
    pub fn save_corpus(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        write_json(path, &self.corpus)?;
        log::info!("Saved {} corpus entries to {}", self.corpus.len(), path.display());
        Ok(())
    }

    /// Append entries from a file written by [`save_corpus`](Self::save_corpus)
    pub fn load_corpus(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let entries: Vec<Vec<Scalar>> = serde_json::from_str(&content)?;
        let count = entries.len();
        self.corpus.extend(entries);
        log::info!("Loaded {} corpus entries from {}", count, path.display());
        Ok(count)
    }
}

impl FuzzDriver for FuzzRunner {
    type Context = FuzzContext;
    type Output = FuzzResult;

    fn seed(&mut self, scalars: Vec<Scalar>) {
        self.corpus.push(scalars);
    }

    fn run(&mut self, entry: EntryPoint<FuzzContext>) -> FuzzResult {
        self.execute(&entry)
    }
}

#[derive(Default)]
struct Tally {
    successes: usize,
    failures: usize,
    panics: usize,
    replayed: usize,
    failure_details: Vec<FuzzFailure>,
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

impl FuzzResult {
    /// Check if the fuzzing run passed
    pub fn is_pass(&self) -> bool {
        self.passed
    }

    /// Get pass rate
    pub fn pass_rate(&self) -> f64 {
        if self.iterations == 0 {
            1.0
        } else {
            self.successes as f64 / self.iterations as f64
        }
    }

    /// Get iterations per second
    pub fn iterations_per_sec(&self) -> f64 {
        if self.duration_ms == 0 {
            0.0
        } else {
            self.iterations as f64 * 1000.0 / self.duration_ms as f64
        }
    }

    /// Inputs of every recorded failure, ready to be seeded again
    pub fn failing_inputs(&self) -> Vec<Vec<Scalar>> {
        self.failure_details.iter().map(|f| f.input.clone()).collect()
    }

    /// Save failing inputs as `<dir>/<target>-failures.json`
    pub fn save_failures(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(format!("{}-failures.json", self.target));
        write_json(&path, &self.failing_inputs())?;
        Ok(path)
    }

    /// Get summary string
    pub fn summary(&self) -> String {
        format!(
            "{} - {} iterations, {} failures ({:.2}% pass rate) in {}ms ({:.0} iter/s)",
            if self.passed { "PASS" } else { "FAIL" },
            self.iterations,
            self.failures,
            self.pass_rate() * 100.0,
            self.duration_ms,
            self.iterations_per_sec()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzz_record;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fuzz_record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Knob {
            pub level: u8,
            pub label: Option<String>,
        }
    }

    fn quiet(config: FuzzConfig) -> FuzzConfig {
        config.with_verbosity(0)
    }

    #[test]
    fn test_fuzz_no_failures() {
        let mut runner = FuzzRunner::new(quiet(FuzzConfig::minimal().with_seed(42)));
        let result = runner
            .fuzz(|_ctx: &mut FuzzContext, knob: Knob| {
                let _ = knob.level.saturating_add(1);
            })
            .unwrap();

        assert!(result.passed);
        assert_eq!(result.failures, 0);
        assert_eq!(result.iterations, 100);
        assert_eq!(result.target, "Knob");
        assert_eq!(result.schema_len, 3);
    }

    #[test]
    fn test_fuzz_catches_panic() {
        let mut runner = FuzzRunner::new(quiet(
            FuzzConfig::minimal().with_seed(42).with_iterations(500),
        ));
        let result = runner
            .fuzz(|_ctx: &mut FuzzContext, knob: Knob| {
                if knob.level == u8::MAX {
                    panic!("level overflow");
                }
            })
            .unwrap();

        assert!(!result.passed);
        assert!(result.panics > 0);
        let failure = &result.failure_details[0];
        assert_eq!(failure.failure_type, FailureType::Panic);
        assert_eq!(failure.description, "level overflow");
        assert_eq!(failure.input[0], Scalar::U8(u8::MAX));
    }

    #[test]
    fn test_context_error_is_assertion_failure() {
        let mut runner = FuzzRunner::new(quiet(
            FuzzConfig::minimal().with_seed(1).with_iterations(0),
        ));
        runner
            .add(&Knob {
                level: 3,
                label: Some("bad".into()),
            })
            .unwrap();

        let result = runner
            .fuzz(|ctx: &mut FuzzContext, knob: Knob| {
                if knob.label.as_deref() == Some("bad") {
                    ctx.error("bad label");
                }
            })
            .unwrap();

        assert_eq!(result.corpus_replayed, 1);
        assert_eq!(result.failures, 1);
        assert_eq!(result.failure_details[0].failure_type, FailureType::AssertionFailed);
        assert_eq!(result.failure_details[0].source, InputSource::Corpus);
        assert_eq!(result.failure_details[0].description, "bad label");
    }

    #[test]
    fn test_mismatched_seed_is_reported() {
        let mut runner = FuzzRunner::new(quiet(
            FuzzConfig::minimal().with_seed(1).with_iterations(10),
        ));
        runner.seed(vec![Scalar::Bool(true)]);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let result = runner
            .fuzz(move |_ctx: &mut FuzzContext, _knob: Knob| {
                counter.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();

        assert_eq!(result.failures, 1);
        assert_eq!(result.failure_details[0].failure_type, FailureType::ShapeMismatch);
        // The bad seed is never mutated, so every fuzzed input reaches the target
        assert_eq!(calls.load(Ordering::Relaxed), 10);
    }

    #[test]
    fn test_stops_after_first_failure() {
        let config = FuzzConfig::minimal()
            .with_seed(9)
            .with_iterations(50)
            .continue_after_failures(false);
        let mut runner = FuzzRunner::new(quiet(config));

        let result = runner
            .fuzz(|_ctx: &mut FuzzContext, _knob: Knob| panic!("always"))
            .unwrap();

        assert_eq!(result.iterations, 1);
        assert_eq!(result.failures, 1);
    }

    #[test]
    fn test_max_failures() {
        let config = FuzzConfig::minimal()
            .with_seed(9)
            .with_iterations(50)
            .with_max_failures(5);
        let mut runner = FuzzRunner::new(quiet(config));

        let result = runner
            .fuzz(|ctx: &mut FuzzContext, _knob: Knob| ctx.error("nope"))
            .unwrap();

        assert_eq!(result.failures, 5);
    }

    #[test]
    fn test_mutation_reaches_target() {
        let config = FuzzConfig::minimal()
            .with_seed(11)
            .with_iterations(200)
            .with_mutation_rate(1.0)
            .with_replay(false);
        let mut runner = FuzzRunner::new(quiet(config));
        runner.add(&Knob { level: 10, label: None }).unwrap();

        let result = runner.fuzz(|_ctx: &mut FuzzContext, _knob: Knob| {}).unwrap();

        assert_eq!(result.corpus_replayed, 0);
        assert_eq!(result.iterations, 200);
    }

    #[test]
    fn test_nan_mutation_rate_generates_fresh_inputs() {
        let mut config = FuzzConfig::minimal().with_seed(8).with_iterations(20);
        config.mutation_rate = f64::NAN;
        let mut runner = FuzzRunner::new(quiet(config));
        runner.add(&Knob { level: 1, label: None }).unwrap();

        let result = runner.fuzz(|_ctx: &mut FuzzContext, _knob: Knob| {}).unwrap();

        assert!(result.passed);
        assert_eq!(result.iterations, 21);
    }

    #[test]
    fn test_reproducibility() {
        fn levels(seed: u64) -> Vec<u8> {
            let mut runner = FuzzRunner::new(quiet(
                FuzzConfig::minimal().with_seed(seed).with_iterations(50),
            ));
            let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
            let sink = Arc::clone(&seen);
            runner
                .fuzz(move |_ctx: &mut FuzzContext, knob: Knob| sink.lock().push(knob.level))
                .unwrap();
            let levels = seen.lock().clone();
            levels
        }

        assert_eq!(levels(12345), levels(12345));
        assert_eq!(levels(12345).len(), 50);
    }

    #[test]
    fn test_corpus_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corpus").join("knob.json");

        let mut runner = FuzzRunner::new(FuzzConfig::minimal());
        runner.add(&Knob { level: 1, label: None }).unwrap();
        runner
            .add(&Knob {
                level: 2,
                label: Some("two".into()),
            })
            .unwrap();
        runner.save_corpus(&path).unwrap();

        let mut fresh = FuzzRunner::new(FuzzConfig::minimal());
        assert_eq!(fresh.load_corpus(&path).unwrap(), 2);
        assert_eq!(fresh.corpus(), runner.corpus());
    }

    #[test]
    fn test_failures_saved_to_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = FuzzConfig::minimal()
            .with_seed(4)
            .with_iterations(5)
            .with_output_dir(dir.path().to_string_lossy().to_string());
        let mut runner = FuzzRunner::new(quiet(config));

        let result = runner
            .fuzz(|ctx: &mut FuzzContext, _knob: Knob| ctx.error("always"))
            .unwrap();

        let saved = dir.path().join("Knob-failures.json");
        let content = fs::read_to_string(saved).unwrap();
        let inputs: Vec<Vec<Scalar>> = serde_json::from_str(&content).unwrap();
        assert_eq!(inputs.len(), result.failures);
    }
}
