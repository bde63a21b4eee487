// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration error types
//!
//! Every variant here is raised before any computation starts.

/// Errors for neuron configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NeuralError {
    #[error("Unknown neuron model: {0}")]
    UnknownNeuronModel(String),

    #[error("Unsupported precision: {0}")]
    UnsupportedPrecision(String),

    #[error("Unknown surrogate gradient: {0}")]
    UnknownSurrogate(String),

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl NeuralError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        NeuralError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = core::result::Result<T, NeuralError>;
