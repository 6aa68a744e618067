//! Configuration loading for the cogsl toolchain.
//!
//! `defaults/cogsl.default.toml` is embedded into every binary so that docs and
//! runtime behavior stay in sync. Applications layer user-specific files, environment
//! variables and single-key overrides on top of those defaults via [`Loader`] before
//! deserializing into [`CogslConfig`].

use crate::cogsl::lexing::{LexError, LexResult, LineBreakPolicy, ReadPolicy, TokenizerConfig};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TOML: &str = include_str!("../../defaults/cogsl.default.toml");

/// Top-level configuration consumed by cogsl applications.
#[derive(Debug, Clone, Deserialize)]
pub struct CogslConfig {
    pub tokenizer: TokenizerSection,
    pub queue: QueueSection,
    pub read: ReadSection,
}

/// Buffer and chunking knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenizerSection {
    pub chunk_size: usize,
    pub growth_factor: usize,
    pub initial_capacity: usize,
    pub max_buffer_size: usize,
    pub line_breaks: LineBreakPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueueSection {
    pub capacity: usize,
}

/// Empty-read handling; zero disables a limit.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadSection {
    pub max_empty_reads: u32,
    pub timeout_ms: u64,
    pub backoff_ms: u64,
}

impl CogslConfig {
    /// Runtime tokenizer configuration, validated.
    pub fn tokenizer_config(&self) -> LexResult<TokenizerConfig> {
        let read_policy = ReadPolicy {
            max_empty_reads: (self.read.max_empty_reads > 0).then_some(self.read.max_empty_reads),
            timeout: (self.read.timeout_ms > 0).then(|| Duration::from_millis(self.read.timeout_ms)),
            backoff: Duration::from_millis(self.read.backoff_ms),
        };
        let config = TokenizerConfig::new()
            .chunk_size(self.tokenizer.chunk_size)
            .growth_factor(self.tokenizer.growth_factor)
            .initial_capacity(self.tokenizer.initial_capacity)
            .max_buffer_size(self.tokenizer.max_buffer_size)
            .line_breaks(self.tokenizer.line_breaks)
            .read_policy(read_policy);
        config.validate()?;
        Ok(config)
    }

    /// Token queue capacity; zero means unbounded.
    pub fn queue_capacity(&self) -> usize {
        self.queue.capacity
    }
}

/// Settings for one tokenization run, resolved and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub tokenizer: TokenizerConfig,
    /// Zero means unbounded
    pub queue_capacity: usize,
}

/// Layered configuration sources.
///
/// Precedence, lowest first: embedded defaults, files in the order they were added,
/// `COGSL_*` environment variables, single-key overrides. The environment layer is
/// applied at build time, so it beats every file however the calls are ordered.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
    env: bool,
}

impl Loader {
    pub fn with_defaults() -> Self {
        Self {
            builder: Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml)),
            env: false,
        }
    }

    /// Add a TOML file layer. A missing file fails the build only when `required`.
    pub fn file(mut self, path: impl AsRef<Path>, required: bool) -> Self {
        let layer = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(required);
        self.builder = self.builder.add_source(layer);
        self
    }

    /// Read `COGSL_<SECTION>__<KEY>` variables, e.g. `COGSL_TOKENIZER__CHUNK_SIZE=512`.
    pub fn with_env(mut self) -> Self {
        self.env = true;
        self
    }

    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge every layer into the raw configuration tree.
    pub fn build(self) -> Result<CogslConfig, ConfigError> {
        let mut builder = self.builder;
        if self.env {
            builder = builder.add_source(
                Environment::with_prefix("COGSL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }
        builder.build()?.try_deserialize()
    }

    /// Merge every layer and resolve the run settings, rejecting invalid limits.
    pub fn load(self) -> LexResult<RunSettings> {
        let config = self.build()?;
        Ok(RunSettings {
            tokenizer: config.tokenizer_config()?,
            queue_capacity: config.queue_capacity(),
        })
    }
}

impl From<ConfigError> for LexError {
    fn from(err: ConfigError) -> Self {
        LexError::InvalidConfig(err.to_string())
    }
}
