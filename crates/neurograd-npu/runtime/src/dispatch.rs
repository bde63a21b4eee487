// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Variant Dispatcher
//!
//! A run is fully described by `(model, reset mode, detach_reset, precision)`.
//! The dispatcher resolves that tuple from caller parameters and routes to
//! the monomorphized engine for the matching update rule and lane type.

use core::fmt;

use ndarray::{ArrayView1, ArrayView2};
use half::f16;

use neurograd_npu_neural::{
    F16x2, IFModel, LIFModel, NeuronModelKind, NeuronParameters, ParametricLIFModel, Precision,
    ResetMode, SurrogateGradient, UpdateRule,
};

use crate::backward::{run_backward, BackwardTrace, SavedState};
use crate::forward::{run_forward, ForwardTrace};
use crate::pairing::{ExecutionStrategy, LanePlan};

/// One point of the configuration space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KernelVariant {
    pub model: NeuronModelKind,
    pub reset: ResetMode,
    pub detach_reset: bool,
    pub precision: Precision,
}

impl KernelVariant {
    pub fn new(model: NeuronModelKind, params: &NeuronParameters, precision: Precision) -> Self {
        Self {
            model,
            reset: params.reset_mode(),
            detach_reset: params.detach_reset,
            precision,
        }
    }

    /// e.g. `LIFNode_fptt_hardReset_fp16`
    pub fn forward_kernel_name(&self) -> String {
        format!(
            "{}_fptt_{}_{}",
            self.model.kernel_prefix(),
            self.reset.kernel_tag(),
            self.precision.kernel_suffix()
        )
    }

    /// e.g. `LIFNode_bptt_softReset_detachReset_fp32`
    pub fn backward_kernel_name(&self) -> String {
        let detach = if self.detach_reset { "_detachReset" } else { "" };
        format!(
            "{}_bptt_{}{}_{}",
            self.model.kernel_prefix(),
            self.reset.kernel_tag(),
            detach,
            self.precision.kernel_suffix()
        )
    }

    /// Every supported variant
    pub fn all() -> Vec<KernelVariant> {
        let mut variants = Vec::with_capacity(24);
        for model in NeuronModelKind::ALL {
            for reset in [ResetMode::Hard, ResetMode::Soft] {
                for detach_reset in [false, true] {
                    for precision in [Precision::Standard, Precision::Reduced] {
                        variants.push(KernelVariant {
                            model,
                            reset,
                            detach_reset,
                            precision,
                        });
                    }
                }
            }
        }
        variants
    }

    pub fn default_strategy(&self) -> ExecutionStrategy {
        ExecutionStrategy::select(self.model, self.precision)
    }
}

impl fmt::Display for KernelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.forward_kernel_name())
    }
}

pub(crate) fn forward(
    model: NeuronModelKind,
    plan: &LanePlan,
    x: ArrayView2<'_, f32>,
    v_initial: ArrayView1<'_, f32>,
    params: &NeuronParameters,
) -> ForwardTrace {
    match model {
        NeuronModelKind::IntegrateAndFire => forward_with(IFModel, plan, x, v_initial, params),
        NeuronModelKind::LeakyIntegrateAndFire => forward_with(LIFModel, plan, x, v_initial, params),
        NeuronModelKind::ParametricLeakyIntegrateAndFire => {
            forward_with(ParametricLIFModel, plan, x, v_initial, params)
        }
    }
}

fn forward_with<R: UpdateRule>(
    rule: R,
    plan: &LanePlan,
    x: ArrayView2<'_, f32>,
    v_initial: ArrayView1<'_, f32>,
    params: &NeuronParameters,
) -> ForwardTrace {
    match plan.strategy() {
        ExecutionStrategy::Scalar => run_forward::<R, f32>(rule, plan, x, v_initial, params),
        ExecutionStrategy::Paired => run_forward::<R, F16x2>(rule, plan, x, v_initial, params),
        ExecutionStrategy::ScalarHalf => run_forward::<R, f16>(rule, plan, x, v_initial, params),
    }
}

pub(crate) fn backward(
    model: NeuronModelKind,
    plan: &LanePlan,
    saved: &SavedState<'_>,
    grad_spike: ArrayView2<'_, f32>,
    grad_v: ArrayView2<'_, f32>,
    params: &NeuronParameters,
    surrogate: &dyn SurrogateGradient,
) -> BackwardTrace {
    match model {
        NeuronModelKind::IntegrateAndFire => {
            backward_with(IFModel, plan, saved, grad_spike, grad_v, params, surrogate)
        }
        NeuronModelKind::LeakyIntegrateAndFire => {
            backward_with(LIFModel, plan, saved, grad_spike, grad_v, params, surrogate)
        }
        NeuronModelKind::ParametricLeakyIntegrateAndFire => {
            backward_with(ParametricLIFModel, plan, saved, grad_spike, grad_v, params, surrogate)
        }
    }
}

fn backward_with<R: UpdateRule>(
    rule: R,
    plan: &LanePlan,
    saved: &SavedState<'_>,
    grad_spike: ArrayView2<'_, f32>,
    grad_v: ArrayView2<'_, f32>,
    params: &NeuronParameters,
    surrogate: &dyn SurrogateGradient,
) -> BackwardTrace {
    match plan.strategy() {
        ExecutionStrategy::Scalar => {
            run_backward::<R, f32>(rule, plan, saved, grad_spike, grad_v, params, surrogate)
        }
        ExecutionStrategy::Paired => {
            run_backward::<R, F16x2>(rule, plan, saved, grad_spike, grad_v, params, surrogate)
        }
        ExecutionStrategy::ScalarHalf => {
            run_backward::<R, f16>(rule, plan, saved, grad_spike, grad_v, params, surrogate)
        }
    }
}
