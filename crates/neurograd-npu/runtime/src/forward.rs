// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # State Recurrence Engine
//!
//! For every lane, strictly in increasing time:
//!
//! ```text
//! h[t]     = rule(v[t], x[t])
//! spike[t] = h[t] >= v_threshold
//! v[t+1]   = reset(spike[t], h[t])
//! ```
//!
//! Lanes are independent. Phase 1 runs them in parallel against read-only
//! inputs and collects per-lane columns; phase 2 scatters those columns into
//! the output tensors. No lane ever writes shared state.
//!
//! All tensors here are in the padded neuron space of the [`LanePlan`].

use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use tracing::trace;

use neurograd_npu_neural::{LaneParameters, NeuralLane, NeuronParameters, UpdateRule};

use crate::pairing::{gather, gather_vector, round_to_element, scatter, LanePlan};
use crate::trace::recurrence_trace_cfg;

/// Everything the forward pass produces, padded
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardTrace {
    /// Pre-reset potential, `[T, padded]`
    pub h: Array2<f32>,
    /// Exactly 0 or 1, `[T, padded]`
    pub spike: Array2<f32>,
    /// Post-reset potential, `[T + 1, padded]`; row 0 is the initial state
    pub v: Array2<f32>,
}

impl ForwardTrace {
    pub fn time_steps(&self) -> usize {
        self.h.nrows()
    }
}

/// Time series of one lane, laid out `[t * WIDTH + k]`
struct LaneSeries {
    lane: usize,
    h: Vec<f32>,
    spike: Vec<f32>,
    v: Vec<f32>,
}

/// Run the forward recurrence for every lane of `plan`
///
/// `x` is `[T, padded]` and `v_initial` is `[padded]`.
pub fn run_forward<R: UpdateRule, L: NeuralLane>(
    rule: R,
    plan: &LanePlan,
    x: ArrayView2<'_, f32>,
    v_initial: ArrayView1<'_, f32>,
    params: &NeuronParameters,
) -> ForwardTrace {
    let time_steps = x.nrows();
    let width = L::WIDTH;
    let lane_params = LaneParameters::<L>::splat(params);
    let trace_cfg = recurrence_trace_cfg();

    // Phase 1: Compute in parallel (read-only)
    let series: Vec<LaneSeries> = (0..plan.lane_count())
        .into_par_iter()
        .map(|lane| {
            let columns = plan.lane_columns(lane);
            let columns = columns.as_slice();
            let traced = trace_cfg.watches_any(columns);

            let mut h_out = vec![0.0; time_steps * width];
            let mut spike_out = vec![0.0; time_steps * width];
            let mut v_out = vec![0.0; time_steps * width];

            let mut v: L = gather_vector(&v_initial, columns);
            for t in 0..time_steps {
                let x_t: L = gather(&x, t, columns);
                let h = rule.compute_h(v, x_t, &lane_params);
                let spike = h.ge_mask(lane_params.v_threshold);
                v = lane_params.reset.apply(spike, h, &lane_params);

                let row = t * width..(t + 1) * width;
                scatter(h, &mut h_out[row.clone()]);
                scatter(spike, &mut spike_out[row.clone()]);
                scatter(v, &mut v_out[row]);

                if traced {
                    for (k, &neuron) in columns.iter().enumerate() {
                        if trace_cfg.watches(neuron) {
                            trace!(
                                target: "neurograd-npu-runtime",
                                "[FWD] neuron={} t={} x={} h={} spike={} v={}",
                                neuron,
                                t,
                                x_t.extract(k),
                                h.extract(k),
                                spike.extract(k),
                                v.extract(k)
                            );
                        }
                    }
                }
            }

            LaneSeries {
                lane,
                h: h_out,
                spike: spike_out,
                v: v_out,
            }
        })
        .collect();

    // Phase 2: Scatter lane columns sequentially
    let padded = plan.padded_count();
    let mut h = Array2::zeros((time_steps, padded));
    let mut spike = Array2::zeros((time_steps, padded));
    let mut v = Array2::zeros((time_steps + 1, padded));
    for (n, &value) in v_initial.iter().enumerate() {
        v[[0, n]] = round_to_element::<L>(value);
    }
    for lane in series {
        let columns = plan.lane_columns(lane.lane);
        for (k, &column) in columns.as_slice().iter().enumerate() {
            for t in 0..time_steps {
                let index = t * width + k;
                h[[t, column]] = lane.h[index];
                spike[[t, column]] = lane.spike[index];
                v[[t + 1, column]] = lane.v[index];
            }
        }
    }

    ForwardTrace { h, spike, v }
}
