// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Backward Recurrence Engine
//!
//! Reverse-time pass over the retained forward state. Per lane, for
//! `t = T-1 .. 0` with `carry` starting at zero:
//!
//! ```text
//! g        = surrogate(h[t] - v_threshold)
//! dv_dh    = reset table (see ResetGradient)
//!
//! IF:       grad_h = grad_spike·g + (grad_v + carry)·dv_dh
//!           grad_x = grad_h
//! LIF/PLIF: grad_h = grad_spike·g + (grad_v + carry·(1 - r))·dv_dh
//!           grad_x = grad_h·r
//!
//! carry = grad_h
//! ```
//!
//! After the loop, `grad_v_initial = grad_x[0]` for IF and
//! `grad_x[0]·(1 - r)` for the leaky models. When the rule learns its decay,
//! every lane also returns its partial of `grad_reciprocal_tau`.

use ndarray::{Array1, Array2, ArrayView2};
use rayon::prelude::*;
use tracing::trace;

use neurograd_npu_neural::{
    LaneParameters, NeuralLane, NeuronParameters, ParametricLIFModel, ResetGradient,
    SurrogateGradient, UpdateRule,
};

use crate::pairing::{gather, scatter, LanePlan};
use crate::trace::recurrence_trace_cfg;

/// Forward state needed by the backward pass, padded
#[derive(Debug, Clone, Copy)]
pub struct SavedState<'a> {
    pub h: ArrayView2<'a, f32>,
    pub spike: ArrayView2<'a, f32>,
    /// `[T + 1, padded]`, required when the rule learns its decay
    pub v: Option<ArrayView2<'a, f32>>,
}

/// Gradients produced by the backward pass, padded
#[derive(Debug, Clone, PartialEq)]
pub struct BackwardTrace {
    pub grad_x: Array2<f32>,
    pub grad_v_initial: Array1<f32>,
    /// One partial per lane, in lane order
    pub decay_partials: Option<Vec<f32>>,
}

struct LaneGradients {
    lane: usize,
    grad_x: Vec<f32>,
    grad_v_initial: Vec<f32>,
    decay_partial: f32,
}

/// Run the backward recurrence for every lane of `plan`
///
/// `grad_spike` and `grad_v` are `[T, padded]` with zeros in dummy columns.
/// When `rule` learns its decay, `saved.v` must be present; a missing `v`
/// is treated as a zero potential history.
pub fn run_backward<R: UpdateRule, L: NeuralLane>(
    rule: R,
    plan: &LanePlan,
    saved: &SavedState<'_>,
    grad_spike: ArrayView2<'_, f32>,
    grad_v: ArrayView2<'_, f32>,
    params: &NeuronParameters,
    surrogate: &dyn SurrogateGradient,
) -> BackwardTrace {
    let time_steps = saved.h.nrows();
    let width = L::WIDTH;
    let lane_params = LaneParameters::<L>::splat(params);
    let decay = rule.decay_scale(&lane_params);
    let learns_decay = rule.learns_decay();
    let reset_grad = ResetGradient::select(lane_params.reset, params.detach_reset);
    let trace_cfg = recurrence_trace_cfg();
    let zero = L::splat(0.0);

    // Phase 1: Compute in parallel (read-only)
    let lanes: Vec<LaneGradients> = (0..plan.lane_count())
        .into_par_iter()
        .map(|lane| {
            let columns = plan.lane_columns(lane);
            let columns = columns.as_slice();
            let traced = trace_cfg.watches_any(columns);

            let mut grad_x_out = vec![0.0; time_steps * width];
            let mut carry = zero;
            let mut first_grad_x = zero;
            let mut decay_partial = 0.0f32;

            for t in (0..time_steps).rev() {
                let h: L = gather(&saved.h, t, columns);
                let spike: L = gather(&saved.spike, t, columns);
                let grad_s: L = gather(&grad_spike, t, columns);
                let grad_v_t: L = gather(&grad_v, t, columns);

                let grad_s_to_h = (h - lane_params.v_threshold).map(|margin| surrogate.grad(margin));
                let grad_v_to_h = reset_grad.grad_v_to_h(spike, h, grad_s_to_h, &lane_params);

                let (grad_h, grad_x) = match decay {
                    None => {
                        let grad_h = grad_s.mul_add(grad_s_to_h, (grad_v_t + carry) * grad_v_to_h);
                        (grad_h, grad_h)
                    }
                    Some(scale) => {
                        let carried = carry.mul_add(scale.one_sub_reciprocal_tau, grad_v_t);
                        let grad_h = grad_s.mul_add(grad_s_to_h, carried * grad_v_to_h);
                        (grad_h, grad_h * scale.reciprocal_tau)
                    }
                };

                if learns_decay {
                    let v_prev: L = match &saved.v {
                        Some(v) => gather(v, t, columns),
                        None => zero,
                    };
                    decay_partial +=
                        ParametricLIFModel::decay_grad_term(grad_h, h, v_prev, &lane_params)
                            .horizontal_sum();
                }

                scatter(grad_x, &mut grad_x_out[t * width..(t + 1) * width]);

                if traced {
                    for (k, &neuron) in columns.iter().enumerate() {
                        if trace_cfg.watches(neuron) {
                            trace!(
                                target: "neurograd-npu-runtime",
                                "[BWD] neuron={} t={} g={} dv_dh={} grad_h={} grad_x={}",
                                neuron,
                                t,
                                grad_s_to_h.extract(k),
                                grad_v_to_h.extract(k),
                                grad_h.extract(k),
                                grad_x.extract(k)
                            );
                        }
                    }
                }

                carry = grad_h;
                first_grad_x = grad_x;
            }

            let grad_v_initial = match decay {
                None => first_grad_x,
                Some(scale) => first_grad_x * scale.one_sub_reciprocal_tau,
            };
            let mut grad_v_initial_out = vec![0.0; width];
            scatter(grad_v_initial, &mut grad_v_initial_out);

            LaneGradients {
                lane,
                grad_x: grad_x_out,
                grad_v_initial: grad_v_initial_out,
                decay_partial,
            }
        })
        .collect();

    // Phase 2: Scatter lane columns sequentially
    let padded = plan.padded_count();
    let mut grad_x = Array2::zeros((time_steps, padded));
    let mut grad_v_initial = Array1::zeros(padded);
    let mut decay_partials = learns_decay.then(|| Vec::with_capacity(lanes.len()));
    for lane in lanes {
        let columns = plan.lane_columns(lane.lane);
        for (k, &column) in columns.as_slice().iter().enumerate() {
            for t in 0..time_steps {
                grad_x[[t, column]] = lane.grad_x[t * width + k];
            }
            grad_v_initial[column] = lane.grad_v_initial[k];
        }
        if let Some(partials) = decay_partials.as_mut() {
            partials.push(lane.decay_partial);
        }
    }

    BackwardTrace {
        grad_x,
        grad_v_initial,
        decay_partials,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward::run_forward;
    use crate::pairing::ExecutionStrategy;
    use ndarray::array;
    use neurograd_npu_neural::{IFModel, LIFModel, Surrogate};

    #[test]
    fn test_if_detached_single_step() {
        // h = 1.25 spikes; hard + detach gives dv_dh = 0, so only the spike path remains
        let plan = LanePlan::new(ExecutionStrategy::Scalar, 1);
        let params = NeuronParameters::new(1.0, Some(0.0)).with_detach_reset(true);
        let surrogate = Surrogate::PiecewiseQuadratic { alpha: 1.0 };
        let x = array![[1.25f32]];
        let forward = run_forward::<_, f32>(IFModel, &plan, x.view(), array![0.0f32].view(), &params);

        let saved = SavedState {
            h: forward.h.view(),
            spike: forward.spike.view(),
            v: None,
        };
        let grads = run_backward::<_, f32>(
            IFModel,
            &plan,
            &saved,
            array![[2.0f32]].view(),
            array![[5.0f32]].view(),
            &params,
            &surrogate,
        );
        // g = 1 - 0.25 = 0.75
        assert_eq!(grads.grad_x[[0, 0]], 1.5);
        assert_eq!(grads.grad_v_initial[0], 1.5);
        assert!(grads.decay_partials.is_none());
    }

    #[test]
    fn test_lif_carry_is_scaled_by_decay() {
        // Two silent steps with soft reset + detach: dv_dh = 1, no spike gradient
        let plan = LanePlan::new(ExecutionStrategy::Scalar, 1);
        let params = NeuronParameters::new(10.0, None)
            .with_tau(2.0)
            .with_detach_reset(true);
        let surrogate = Surrogate::PiecewiseQuadratic { alpha: 1.0 };
        let x = array![[0.5f32], [0.5]];
        let forward = run_forward::<_, f32>(LIFModel, &plan, x.view(), array![0.0f32].view(), &params);

        let saved = SavedState {
            h: forward.h.view(),
            spike: forward.spike.view(),
            v: None,
        };
        let grads = run_backward::<_, f32>(
            LIFModel,
            &plan,
            &saved,
            Array2::zeros((2, 1)).view(),
            array![[0.0f32], [1.0]].view(),
            &params,
            &surrogate,
        );
        // t=1: grad_h = 1, grad_x = 0.5; t=0: grad_h = 1 * 0.5, grad_x = 0.25
        assert_eq!(grads.grad_x.column(0).to_vec(), vec![0.25, 0.5]);
        assert_eq!(grads.grad_v_initial[0], 0.125);
    }
}
