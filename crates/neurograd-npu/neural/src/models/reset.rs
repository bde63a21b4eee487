// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Reset behaviour and its gradient
//!
//! The backward pass needs `d v[t+1] / d h[t]`. It depends on the reset mode
//! and on whether the reset branch is detached from the graph:
//!
//! | reset | detach | `grad_v_to_h`                  |
//! |-------|--------|--------------------------------|
//! | hard  | yes    | `1 - s`                        |
//! | hard  | no     | `1 - s + (v_reset - h) · g`    |
//! | soft  | yes    | `1`                            |
//! | soft  | no     | `1 - v_threshold · g`          |
//!
//! where `s` is the spike and `g` the surrogate gradient at `h - v_threshold`.

use core::fmt;

use super::traits::LaneParameters;
use crate::types::NeuralLane;

/// Post-spike reset mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetMode {
    /// Potential forced to `v_reset`
    Hard,
    /// Potential reduced by `v_threshold`
    Soft,
}

impl ResetMode {
    pub fn from_v_reset(v_reset: Option<f32>) -> Self {
        match v_reset {
            Some(_) => ResetMode::Hard,
            None => ResetMode::Soft,
        }
    }

    pub fn kernel_tag(&self) -> &'static str {
        match self {
            ResetMode::Hard => "hardReset",
            ResetMode::Soft => "softReset",
        }
    }

    /// Potential carried into the next timestep
    ///
    /// Selects per neuron instead of blending with the spike, so a hard
    /// reset lands on `v_reset` exactly.
    #[inline(always)]
    pub fn apply<L: NeuralLane>(self, spike: L, h: L, params: &LaneParameters<L>) -> L {
        match self {
            ResetMode::Hard => spike.select(params.v_reset, h),
            ResetMode::Soft => spike.select(h - params.v_threshold, h),
        }
    }
}

impl fmt::Display for ResetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kernel_tag())
    }
}

/// One row of the reset gradient table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResetGradient {
    HardDetached,
    Hard,
    SoftDetached,
    Soft,
}

impl ResetGradient {
    pub fn select(reset: ResetMode, detach_reset: bool) -> Self {
        match (reset, detach_reset) {
            (ResetMode::Hard, true) => ResetGradient::HardDetached,
            (ResetMode::Hard, false) => ResetGradient::Hard,
            (ResetMode::Soft, true) => ResetGradient::SoftDetached,
            (ResetMode::Soft, false) => ResetGradient::Soft,
        }
    }

    /// `d v[t+1] / d h[t]`
    #[inline(always)]
    pub fn grad_v_to_h<L: NeuralLane>(
        self,
        spike: L,
        h: L,
        grad_s_to_h: L,
        params: &LaneParameters<L>,
    ) -> L {
        let one = L::splat(1.0);
        match self {
            ResetGradient::HardDetached => one - spike,
            ResetGradient::Hard => (params.v_reset - h).mul_add(grad_s_to_h, one - spike),
            ResetGradient::SoftDetached => one,
            ResetGradient::Soft => (L::splat(0.0) - grad_s_to_h).mul_add(params.v_threshold, one),
        }
    }
}
