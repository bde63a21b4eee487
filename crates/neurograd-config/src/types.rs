// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to a section of `neurograd.toml`:
//!
//! ```toml
//! [neuron]
//! model = "lif"
//! v_threshold = 1.0
//! v_reset = 0.0        # omit for soft reset
//! tau = 2.0
//! detach_reset = false
//!
//! [surrogate]
//! name = "sigmoid"
//! alpha = 4.0          # optional, per-function default otherwise
//!
//! [execution]
//! precision = "fp32"
//! max_threads = 0      # 0 = rayon global pool
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeurogradConfig {
    pub neuron: NeuronConfig,
    pub surrogate: SurrogateConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

/// Neuron layer parameters
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct NeuronConfig {
    /// `if`, `lif` or `plif`
    pub model: String,
    pub v_threshold: f32,
    /// Present selects hard reset, absent selects soft reset.
    /// A missing key deserializes to `None` regardless of `Default`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v_reset: Option<f32>,
    /// Membrane time constant; ignored by IF neurons
    pub tau: f32,
    pub detach_reset: bool,
}

impl Default for NeuronConfig {
    fn default() -> Self {
        Self {
            model: "lif".to_string(),
            v_threshold: 1.0,
            v_reset: Some(0.0),
            tau: 2.0,
            detach_reset: false,
        }
    }
}

/// Surrogate gradient selection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SurrogateConfig {
    pub name: String,
    /// Sharpness override (`w` for `piecewise_leaky_relu`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f32>,
}

impl Default for SurrogateConfig {
    fn default() -> Self {
        Self {
            name: "sigmoid".to_string(),
            alpha: None,
        }
    }
}

/// Execution settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// `fp32` (standard) or `fp16` (reduced)
    pub precision: String,
    /// Worker threads for a dedicated pool (0 = shared global pool)
    pub max_threads: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            precision: "fp32".to_string(),
            max_threads: 0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
