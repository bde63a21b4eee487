// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neurograd Neural Math (Platform-Agnostic)
//!
//! Everything a multi-step spiking recurrence needs that is independent of
//! how the recurrence is scheduled:
//! - **Types**: numeric element and lane types (`f32`, `f16`, paired `f16`),
//!   precision selection and configuration errors
//! - **Models**: membrane update rules (IF, LIF, parametric LIF) and the
//!   reset/detach gradient table
//! - **Surrogate**: smooth stand-ins for the derivative of the spike step
//!
//! The runtime crate owns execution (lane planning, parallel forward and
//! backward passes, decay-gradient reduction).

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Core type definitions
pub mod types;

// Membrane update rules and reset handling
pub mod models;

// Surrogate gradient library
pub mod surrogate;

// Re-export types
pub use types::{F16x2, NeuralError, NeuralLane, NeuralValue, Precision, Result};

// Re-export neuron models
pub use models::{
    DecayScale, IFModel, LIFModel, LaneParameters, NeuronModelKind, NeuronParameters,
    ParametricLIFModel, ResetGradient, ResetMode, UpdateRule,
};

// Re-export surrogate functions
pub use surrogate::{Surrogate, SurrogateGradient};
