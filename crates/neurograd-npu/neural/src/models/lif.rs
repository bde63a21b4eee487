// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # LIF (Leaky Integrate-and-Fire) Neuron Model
//!
//! ## Model Dynamics
//!
//! ```text
//! Hard reset (v_reset present):
//!     h[t] = v[t] + r × (x[t] - v[t] + v_reset)
//!
//! Soft reset:
//!     h[t] = v[t] + r × (x[t] - v[t])
//!
//!     Where:
//!     - r = reciprocal_tau = 1 / tau, fixed for the layer
//!
//! Backward:
//!     grad_x[t]      = grad_h[t] × r
//!     carried term   = grad_h[t+1] × (1 - r)
//! ```

use super::reset::ResetMode;
use super::traits::{DecayScale, LaneParameters, NeuronModelKind, UpdateRule};
use crate::types::NeuralLane;

/// Shared by LIF and parametric LIF, which differ only in decay trainability
#[inline(always)]
pub(crate) fn leaky_h<L: NeuralLane>(v_prev: L, x: L, params: &LaneParameters<L>) -> L {
    match params.reset {
        ResetMode::Hard => params
            .reciprocal_tau
            .mul_add(x - v_prev + params.v_reset, v_prev),
        ResetMode::Soft => params.reciprocal_tau.mul_add(x - v_prev, v_prev),
    }
}

#[inline(always)]
pub(crate) fn leaky_decay<L: NeuralLane>(params: &LaneParameters<L>) -> DecayScale<L> {
    DecayScale {
        reciprocal_tau: params.reciprocal_tau,
        one_sub_reciprocal_tau: params.one_sub_reciprocal_tau,
    }
}

/// LIF neuron model with a fixed decay
#[derive(Debug, Clone, Copy, Default)]
pub struct LIFModel;

impl LIFModel {
    pub fn new() -> Self {
        Self
    }
}

impl UpdateRule for LIFModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::LeakyIntegrateAndFire
    }

    #[inline(always)]
    fn compute_h<L: NeuralLane>(&self, v_prev: L, x: L, params: &LaneParameters<L>) -> L {
        leaky_h(v_prev, x, params)
    }

    #[inline(always)]
    fn decay_scale<L: NeuralLane>(&self, params: &LaneParameters<L>) -> Option<DecayScale<L>> {
        Some(leaky_decay(params))
    }
}
