// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Cross-precision self check
//!
//! Runs every reset/detach combination of a model at standard and reduced
//! precision on the same random input, backpropagates `sum(spike · v²)`
//! through both, and reports the largest absolute difference per output.

use ndarray::{Array, ArrayD, IxDyn, Zip};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use neurograd_npu_neural::{NeuronModelKind, NeuronParameters, Precision, ResetMode};

use crate::dispatch::KernelVariant;
use crate::error::Result;
use crate::layer::{backward_nd, forward_nd, BackwardOutput, ForwardOutput, LayerSpec};

/// Largest standard-vs-reduced difference for one variant
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    /// The reduced-precision variant that was compared
    pub variant: KernelVariant,
    pub max_errors: Vec<(&'static str, f32)>,
}

impl CheckReport {
    pub fn max_error(&self, name: &str) -> Option<f32> {
        self.max_errors
            .iter()
            .find(|(output, _)| *output == name)
            .map(|&(_, error)| error)
    }
}

/// Compare standard and reduced precision for every reset/detach combination
pub fn check_output_and_grad(
    model: NeuronModelKind,
    population: &[usize],
    time_steps: usize,
    seed: u64,
) -> Result<Vec<CheckReport>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut shape = vec![time_steps];
    shape.extend_from_slice(population);
    let x = ArrayD::from_shape_simple_fn(IxDyn(&shape), || (rng.gen::<f32>() - 0.5) * 3.0);
    let v_initial = ArrayD::<f32>::zeros(IxDyn(population));

    let mut reports = Vec::with_capacity(4);
    for reset in [ResetMode::Hard, ResetMode::Soft] {
        for detach_reset in [false, true] {
            let v_reset = match reset {
                ResetMode::Hard => Some(0.0),
                ResetMode::Soft => None,
            };
            let params = NeuronParameters::new(1.0, v_reset)
                .with_tau(2.0)
                .with_detach_reset(detach_reset);
            let spec = LayerSpec::new(model).with_params(params);

            let (standard_fwd, standard_bwd) = run_with_spike_v_loss(&x, &v_initial, &spec)?;
            let reduced = spec.with_precision(Precision::Reduced);
            let (reduced_fwd, reduced_bwd) = run_with_spike_v_loss(&x, &v_initial, &reduced)?;

            let mut max_errors = vec![
                ("spike", max_abs_diff(&standard_fwd.spike, &reduced_fwd.spike)),
                ("v", max_abs_diff(&standard_fwd.v, &reduced_fwd.v)),
                ("grad_x", max_abs_diff(&standard_bwd.grad_x, &reduced_bwd.grad_x)),
                (
                    "grad_v_initial",
                    max_abs_diff(&standard_bwd.grad_v_initial, &reduced_bwd.grad_v_initial),
                ),
            ];
            if let (Some(a), Some(b)) = (
                standard_bwd.grad_reciprocal_tau,
                reduced_bwd.grad_reciprocal_tau,
            ) {
                max_errors.push(("grad_reciprocal_tau", (a - b).abs()));
            }

            let report = CheckReport {
                variant: reduced.variant(),
                max_errors,
            };
            info!(
                target: "neurograd-npu-runtime",
                "[CHECK] {} max abs error: {:?}",
                report.variant.backward_kernel_name(),
                report.max_errors
            );
            reports.push(report);
        }
    }
    Ok(reports)
}

/// Self check on a `[65, 15, 7]` population over 8 steps
pub fn check_output_and_grad_default(model: NeuronModelKind) -> Result<Vec<CheckReport>> {
    check_output_and_grad(model, &[65, 15, 7], 8, 0)
}

/// Forward, then backward of `loss = sum(spike · v²)`
fn run_with_spike_v_loss(
    x: &ArrayD<f32>,
    v_initial: &ArrayD<f32>,
    spec: &LayerSpec,
) -> Result<(ForwardOutput<IxDyn>, BackwardOutput<IxDyn, IxDyn>)> {
    let (output, context) = forward_nd(x.view(), v_initial.view(), spec, true)?;
    let context = context.ok_or(crate::error::RuntimeError::MissingForwardState)?;

    let grad_spike = output.v.mapv(|v| v * v);
    let grad_v = Zip::from(&output.spike)
        .and(&output.v)
        .map_collect(|&spike, &v| 2.0 * spike * v);
    let grads = backward_nd(context, grad_spike.view(), grad_v.view())?;
    Ok((output, grads))
}

fn max_abs_diff<D: ndarray::Dimension>(a: &Array<f32, D>, b: &Array<f32, D>) -> f32 {
    Zip::from(a)
        .and(b)
        .fold(0.0f32, |max, &x, &y| max.max((x - y).abs()))
}
