//! Crate-wide error taxonomy.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ChunkerError>;

/// Errors that can occur while configuring or running the chunker.
///
/// See spec §7 for the propagation policy: configuration errors surface at
/// construction time, encoding errors at call time before analysis begins,
/// and strategy/validator failures are recovered internally and only ever
/// reach the caller as entries in a [`crate::result::ChunkingResult`]'s
/// `errors`/`warnings` lists.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkerError {
    /// A `ChunkConfig` or `StreamingConfig` failed validation.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// Input was not valid UTF-8.
    #[error("input is not valid UTF-8")]
    InvalidEncoding,

    /// The streaming buffer could not admit the next line within
    /// `max_memory_bytes`.
    #[error("streaming memory limit exceeded: {0} bytes requested, ceiling is {1} bytes")]
    MemoryLimitExceeded(usize, usize),

    /// A strategy's `apply` raised unexpectedly. This is a bug-path: the
    /// selector catches it and falls back to the next strategy in priority
    /// order, recording this error on the result.
    #[error("strategy '{0}' failed to execute: {1}")]
    StrategyExecutionFailed(String, String),

    /// Zero chunks were produced for non-empty input.
    #[error("chunking produced zero chunks for non-empty input")]
    EmptyResult,
}

impl ChunkerError {
    pub fn config_invalid(msg: impl Into<String>) -> Self {
        Self::ConfigInvalid(msg.into())
    }

    pub fn strategy_failed(strategy: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::StrategyExecutionFailed(strategy.into(), msg.into())
    }
}
