//! Standalone error types for allocsim-core
//!
//! Uses `thiserror` for clean, idiomatic Rust error definitions.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::warn;

/// Errors produced by the allocator and cache engines.
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimError {
    #[error("allocation of {requested} bytes failed: no fitting free block")]
    AllocationFailed { requested: u64 },

    #[error("invalid block id: {id}")]
    InvalidBlockId { id: i64 },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("{engine} allocator not initialized!")]
    EngineNotInitialized { engine: &'static str },
}

impl SimError {
    /// Create an allocation-failed error.
    pub fn allocation_failed(requested: u64) -> Self {
        #[cfg(feature = "logging")]
        warn!(requested, "allocation failed: no fitting free block");

        Self::AllocationFailed { requested }
    }

    /// Create an invalid-block-id error.
    #[must_use]
    pub fn invalid_block_id(id: i64) -> Self {
        Self::InvalidBlockId { id }
    }

    /// Create an invalid-configuration error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create an engine-not-initialized error.
    #[must_use]
    pub fn engine_not_initialized(engine: &'static str) -> Self {
        Self::EngineNotInitialized { engine }
    }

    /// Stable error code for categorization, e.g. by the CLI or by tests.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "SIM:ALLOC:FAILED",
            Self::InvalidBlockId { .. } => "SIM:ALLOC:INVALID_ID",
            Self::InvalidConfig { .. } => "SIM:CONFIG:INVALID",
            Self::EngineNotInitialized { .. } => "SIM:ENGINE:UNINITIALIZED",
        }
    }
}

/// Result type used throughout the engine crate.
pub type SimResult<T> = core::result::Result<T, SimError>;
