// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Update-rule abstraction and neuron parameters shared by all models

use core::fmt;
use core::str::FromStr;

use super::reset::ResetMode;
use crate::types::{NeuralError, NeuralLane, Result};

/// Neuron model selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeuronModelKind {
    IntegrateAndFire,
    LeakyIntegrateAndFire,
    ParametricLeakyIntegrateAndFire,
}

impl NeuronModelKind {
    pub const ALL: [NeuronModelKind; 3] = [
        NeuronModelKind::IntegrateAndFire,
        NeuronModelKind::LeakyIntegrateAndFire,
        NeuronModelKind::ParametricLeakyIntegrateAndFire,
    ];

    /// Prefix used in kernel names (`IFNode_fptt_...`)
    pub fn kernel_prefix(&self) -> &'static str {
        match self {
            NeuronModelKind::IntegrateAndFire => "IFNode",
            NeuronModelKind::LeakyIntegrateAndFire => "LIFNode",
            NeuronModelKind::ParametricLeakyIntegrateAndFire => "ParametricLIFNode",
        }
    }

    /// Whether the decay is a trainable parameter with its own gradient
    pub fn learns_decay(&self) -> bool {
        matches!(self, NeuronModelKind::ParametricLeakyIntegrateAndFire)
    }
}

impl fmt::Display for NeuronModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NeuronModelKind::IntegrateAndFire => "if",
            NeuronModelKind::LeakyIntegrateAndFire => "lif",
            NeuronModelKind::ParametricLeakyIntegrateAndFire => "plif",
        };
        f.write_str(name)
    }
}

impl FromStr for NeuronModelKind {
    type Err = NeuralError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "if" | "ifnode" | "integrate_and_fire" => Ok(NeuronModelKind::IntegrateAndFire),
            "lif" | "lifnode" | "leaky_integrate_and_fire" => {
                Ok(NeuronModelKind::LeakyIntegrateAndFire)
            }
            "plif" | "parametric_lif" | "parametriclifnode" | "parametric_leaky_integrate_and_fire" => {
                Ok(NeuronModelKind::ParametricLeakyIntegrateAndFire)
            }
            _ => Err(NeuralError::UnknownNeuronModel(s.to_string())),
        }
    }
}

/// Scalar neuron parameters as supplied by the caller
///
/// `v_reset` doubles as the reset-mode selector: `Some` means hard reset,
/// `None` means soft reset. `reciprocal_tau` is ignored by IF neurons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeuronParameters {
    pub v_threshold: f32,
    pub v_reset: Option<f32>,
    pub reciprocal_tau: f32,
    pub detach_reset: bool,
}

impl Default for NeuronParameters {
    fn default() -> Self {
        Self {
            v_threshold: 1.0,
            v_reset: Some(0.0),
            reciprocal_tau: 0.5, // tau = 2
            detach_reset: false,
        }
    }
}

impl NeuronParameters {
    pub fn new(v_threshold: f32, v_reset: Option<f32>) -> Self {
        Self {
            v_threshold,
            v_reset,
            ..Self::default()
        }
    }

    /// Set the decay from a membrane time constant (`reciprocal_tau = 1 / tau`)
    pub fn with_tau(mut self, tau: f32) -> Self {
        self.reciprocal_tau = 1.0 / tau;
        self
    }

    pub fn with_reciprocal_tau(mut self, reciprocal_tau: f32) -> Self {
        self.reciprocal_tau = reciprocal_tau;
        self
    }

    pub fn with_detach_reset(mut self, detach_reset: bool) -> Self {
        self.detach_reset = detach_reset;
        self
    }

    pub fn reset_mode(&self) -> ResetMode {
        ResetMode::from_v_reset(self.v_reset)
    }

    /// Membrane time constant implied by `reciprocal_tau`
    pub fn tau(&self) -> f32 {
        1.0 / self.reciprocal_tau
    }

    /// Reject values that would make the recurrence meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.v_threshold.is_finite() {
            return Err(NeuralError::invalid(
                "v_threshold",
                format!("must be finite, got {}", self.v_threshold),
            ));
        }
        if let Some(v_reset) = self.v_reset {
            if !v_reset.is_finite() {
                return Err(NeuralError::invalid(
                    "v_reset",
                    format!("must be finite, got {}", v_reset),
                ));
            }
        }
        if !(self.reciprocal_tau.is_finite()
            && self.reciprocal_tau > 0.0
            && self.reciprocal_tau <= 1.0)
        {
            return Err(NeuralError::invalid(
                "reciprocal_tau",
                format!("must be in (0, 1], got {}", self.reciprocal_tau),
            ));
        }
        Ok(())
    }
}

/// Neuron parameters broadcast into a lane
#[derive(Debug, Clone, Copy)]
pub struct LaneParameters<L: NeuralLane> {
    pub v_threshold: L,
    /// Zero under soft reset
    pub v_reset: L,
    pub reciprocal_tau: L,
    pub one_sub_reciprocal_tau: L,
    pub reset: ResetMode,
}

impl<L: NeuralLane> LaneParameters<L> {
    /// Broadcast scalar parameters; `1 - reciprocal_tau` is formed in `f32`
    /// before rounding to the lane element type
    pub fn splat(params: &NeuronParameters) -> Self {
        Self {
            v_threshold: L::splat(params.v_threshold),
            v_reset: L::splat(params.v_reset.unwrap_or(0.0)),
            reciprocal_tau: L::splat(params.reciprocal_tau),
            one_sub_reciprocal_tau: L::splat(1.0 - params.reciprocal_tau),
            reset: params.reset_mode(),
        }
    }
}

/// Decay factors applied on the backward path of leaky models
#[derive(Debug, Clone, Copy)]
pub struct DecayScale<L: NeuralLane> {
    /// Scales `grad_h` into `grad_x`
    pub reciprocal_tau: L,
    /// Scales the gradient carried into the previous timestep
    pub one_sub_reciprocal_tau: L,
}

/// Membrane update rule of one neuron model
pub trait UpdateRule: Copy + fmt::Debug + Send + Sync + 'static {
    fn kind(&self) -> NeuronModelKind;

    /// Pre-threshold potential `h[t]` from `v[t]` and `x[t]`
    fn compute_h<L: NeuralLane>(&self, v_prev: L, x: L, params: &LaneParameters<L>) -> L;

    /// Decay factors for the backward path, `None` when the model has no leak
    fn decay_scale<L: NeuralLane>(&self, params: &LaneParameters<L>) -> Option<DecayScale<L>>;

    /// Whether backward must also produce `grad_reciprocal_tau`
    fn learns_decay(&self) -> bool {
        self.kind().learns_decay()
    }
}
