// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # IF (Integrate-and-Fire) Neuron Model
//!
//! ```text
//! h[t] = v[t] + x[t]
//! ```
//!
//! No leak: the carried gradient is not scaled and `grad_x = grad_h`.

use super::traits::{DecayScale, LaneParameters, NeuronModelKind, UpdateRule};
use crate::types::NeuralLane;

/// IF (Integrate-and-Fire) neuron model
#[derive(Debug, Clone, Copy, Default)]
pub struct IFModel;

impl IFModel {
    pub fn new() -> Self {
        Self
    }
}

impl UpdateRule for IFModel {
    fn kind(&self) -> NeuronModelKind {
        NeuronModelKind::IntegrateAndFire
    }

    #[inline(always)]
    fn compute_h<L: NeuralLane>(&self, v_prev: L, x: L, _params: &LaneParameters<L>) -> L {
        v_prev + x
    }

    #[inline(always)]
    fn decay_scale<L: NeuralLane>(&self, _params: &LaneParameters<L>) -> Option<DecayScale<L>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NeuronParameters;

    #[test]
    fn test_if_integrates_without_leak() {
        let params = LaneParameters::<f32>::splat(&NeuronParameters::default());
        assert_eq!(IFModel.compute_h(0.25, 0.5, &params), 0.75);
        assert!(IFModel.decay_scale(&params).is_none());
        assert!(!IFModel.learns_decay());
    }
}
