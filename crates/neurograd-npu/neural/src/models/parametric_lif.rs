// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Parametric LIF Neuron Model
//!
//! Same dynamics as [`LIFModel`](super::LIFModel), but `reciprocal_tau` is a
//! single trainable scalar shared by every neuron of the layer. Backward
//! additionally reduces
//!
//! ```text
//! grad_reciprocal_tau = Σ_{t,n} grad_h[t,n] × (h[t,n] - v[t,n]) / reciprocal_tau
//! ```
//!
//! The division is unstable as `reciprocal_tau` approaches zero; parameter
//! validation keeps it strictly positive but does not bound it away from zero.

use super::lif::{leaky_decay, leaky_h};
use super::traits::{DecayScale, LaneParameters, NeuronModelKind, UpdateRule};
use crate::types::NeuralLane;

/// LIF neuron model with a learnable, population-shared decay
#[derive(Debug, Clone, Copy, Default)]
pub struct ParametricLIFModel;

impl ParametricLIFModel {
    pub fn new() -> Self {
        Self
    }

    /// Contribution of one timestep to the decay gradient
    #[inline(always)]
    pub fn decay_grad_term<L: NeuralLane>(grad_h: L, h: L, v_prev: L, params: &LaneParameters<L>) -> L {
        grad_h * (h - v_prev) / params.reciprocal_tau
    }
}

impl UpdateRule for ParametricLIFModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::ParametricLeakyIntegrateAndFire
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
