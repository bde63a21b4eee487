// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for runtime operations
//!
//! Two classes matter to callers: configuration errors (rejected before any
//! computation) and shape errors. Neither is retryable.

use neurograd_config::ConfigError;
use neurograd_npu_neural::NeuralError;

/// Runtime errors
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Unknown selector or invalid parameter
    #[error("Configuration error: {0}")]
    Configuration(#[from] NeuralError),

    /// Invalid configuration file contents
    #[error("Configuration file error: {0}")]
    Config(#[from] ConfigError),

    /// A tensor disagrees with the shape implied by its peers or by the forward pass
    #[error("Shape mismatch for {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// `backward` without a retained forward state
    #[error("Backward called without a matching forward pass that retained state")]
    MissingForwardState,

    /// Multi-dimensional population could not be flattened or restored
    #[error("Tensor layout error: {0}")]
    Layout(#[from] ndarray::ShapeError),

    /// Dedicated worker pool could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}

impl RuntimeError {
    pub(crate) fn shape_mismatch(context: &'static str, expected: &[usize], actual: &[usize]) -> Self {
        RuntimeError::ShapeMismatch {
            context,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Raised before any computation because of caller-supplied configuration
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            RuntimeError::Configuration(_) | RuntimeError::Config(_) | RuntimeError::ThreadPool(_)
        )
    }

    pub fn is_shape(&self) -> bool {
        matches!(self, RuntimeError::ShapeMismatch { .. } | RuntimeError::Layout(_))
    }
}

/// Fail with `ShapeMismatch` unless `actual == expected`
pub(crate) fn check_shape(context: &'static str, expected: &[usize], actual: &[usize]) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(RuntimeError::shape_mismatch(context, expected, actual))
    }
}

/// Result type for runtime operations
pub type Result<T> = core::result::Result<T, RuntimeError>;
