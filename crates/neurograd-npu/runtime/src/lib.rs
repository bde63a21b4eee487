// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neurograd Multi-Step Runtime
//!
//! Executes a spiking neuron layer over `T` timesteps and backpropagates
//! through it:
//! - **Dispatch**: resolve `(model, reset, detach, precision)` to a kernel variant
//! - **Pairing**: plan lanes, pad odd populations for the paired half path
//! - **Forward**: parallel over lanes, sequential over time
//! - **Backward**: reverse-time recurrence with a pluggable surrogate
//! - **Reduce**: deterministic tree sum of the shared decay gradient
//!
//! ## Example
//! ```no_run
//! use ndarray::Array2;
//! use neurograd_npu_runtime::{forward, backward, LayerSpec};
//! use neurograd_npu_neural::{NeuronModelKind, NeuronParameters};
//!
//! let spec = LayerSpec::new(NeuronModelKind::LeakyIntegrateAndFire)
//!     .with_params(NeuronParameters::new(1.0, Some(0.0)).with_tau(2.0));
//! let x = Array2::<f32>::from_elem((8, 16), 0.7);
//! let v0 = ndarray::Array1::<f32>::zeros(16);
//!
//! let (out, ctx) = forward(x.view(), v0.view(), &spec, true)?;
//! let _grads = backward(ctx.unwrap(), out.spike.view(), out.v.view())?;
//! # Ok::<(), neurograd_npu_runtime::RuntimeError>(())
//! ```

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod backward;
pub mod check;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod forward;
pub mod layer;
pub mod node;
pub mod pairing;
pub mod reduce;

// Runtime-gated per-neuron tracing
mod trace;

pub use check::{check_output_and_grad, check_output_and_grad_default, CheckReport};
pub use context::RunContext;
pub use dispatch::KernelVariant;
pub use error::{Result, RuntimeError};
pub use layer::{backward, backward_nd, forward, forward_nd, BackwardOutput, ForwardOutput, LayerSpec};
pub use node::MultiStepNode;
pub use pairing::{ExecutionStrategy, LanePlan};
pub use reduce::{tree_reduce, DecayParameter};
