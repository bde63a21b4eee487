// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Analytic gradients against central finite differences
//!
//! Loss is `sum(spike) + sum(v²)`. Inputs keep every `h` at least 0.13 away
//! from the threshold, so the narrow surrogate is zero at the operating
//! point and small perturbations never flip a spike: the true gradient
//! then exists and equals the analytic one.

use ndarray::{array, Array1, Array2};

use neurograd_npu_neural::{NeuronModelKind, NeuronParameters, Surrogate};
use neurograd_npu_runtime::{backward, forward, BackwardOutput, LayerSpec};

const EPS: f32 = 0.05;
const DECAY_EPS: f32 = 0.01;

fn inputs() -> (Array2<f32>, Array1<f32>) {
    let x = array![
        [2.5f32, 0.3, 1.8],
        [1.4, 1.3, 0.8],
        [2.4, 2.8, 0.9],
        [1.7, -0.8, 1.8]
    ];
    (x, array![0.0f32, 0.2, -0.3])
}

fn spec(model: NeuronModelKind, v_reset: Option<f32>, detach_reset: bool, reciprocal_tau: f32) -> LayerSpec {
    LayerSpec::new(model)
        .with_params(
            NeuronParameters::new(1.0, v_reset)
                .with_reciprocal_tau(reciprocal_tau)
                .with_detach_reset(detach_reset),
        )
        .with_surrogate(Surrogate::PiecewiseQuadratic { alpha: 10.0 })
}

fn loss(x: &Array2<f32>, v0: &Array1<f32>, spec: &LayerSpec) -> f64 {
    let (out, _) = forward(x.view(), v0.view(), spec, false).unwrap();
    let spikes: f64 = out.spike.iter().map(|&s| s as f64).sum();
    let energy: f64 = out.v.iter().map(|&v| (v as f64) * (v as f64)).sum();
    spikes + energy
}

fn analytic(x: &Array2<f32>, v0: &Array1<f32>, spec: &LayerSpec) -> BackwardOutput {
    let (out, ctx) = forward(x.view(), v0.view(), spec, true).unwrap();
    let grad_spike = Array2::<f32>::ones(out.spike.raw_dim());
    let grad_v = out.v.mapv(|v| 2.0 * v);
    backward(ctx.unwrap(), grad_spike.view(), grad_v.view()).unwrap()
}

fn assert_close(analytic: f32, numeric: f64, what: &str) {
    let tolerance = 1e-3 * (1.0 + analytic.abs() as f64);
    assert!(
        (analytic as f64 - numeric).abs() <= tolerance,
        "{}: analytic {} vs numeric {}",
        what,
        analytic,
        numeric
    );
}

fn check_grad_x(spec: &LayerSpec, grads: &BackwardOutput) {
    let (x, v0) = inputs();
    for t in 0..x.nrows() {
        for n in 0..x.ncols() {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[[t, n]] += EPS;
            minus[[t, n]] -= EPS;
            let step = (plus[[t, n]] - minus[[t, n]]) as f64;
            let numeric = (loss(&plus, &v0, spec) - loss(&minus, &v0, spec)) / step;
            assert_close(grads.grad_x[[t, n]], numeric, &format!("grad_x[{}, {}]", t, n));
        }
    }
}

fn check_grad_v_initial(spec: &LayerSpec, grads: &BackwardOutput) {
    let (x, v0) = inputs();
    for n in 0..v0.len() {
        let mut plus = v0.clone();
        let mut minus = v0.clone();
        plus[n] += EPS;
        minus[n] -= EPS;
        let step = (plus[n] - minus[n]) as f64;
        let numeric = (loss(&x, &plus, spec) - loss(&x, &minus, spec)) / step;
        assert_close(grads.grad_v_initial[n], numeric, &format!("grad_v_initial[{}]", n));
    }
}

#[test]
fn test_if_gradients() {
    let (x, v0) = inputs();
    for v_reset in [Some(0.0), None] {
        for detach_reset in [false, true] {
            let spec = spec(NeuronModelKind::IntegrateAndFire, v_reset, detach_reset, 0.5);
            let grads = analytic(&x, &v0, &spec);
            check_grad_x(&spec, &grads);
            check_grad_v_initial(&spec, &grads);
            assert!(grads.grad_reciprocal_tau.is_none());
        }
    }
}

#[test]
fn test_lif_input_gradients() {
    let (x, v0) = inputs();
    for v_reset in [Some(0.0), None] {
        for detach_reset in [false, true] {
            let spec = spec(NeuronModelKind::LeakyIntegrateAndFire, v_reset, detach_reset, 0.5);
            let grads = analytic(&x, &v0, &spec);
            check_grad_x(&spec, &grads);
        }
    }
}

#[test]
fn test_lif_initial_state_gradient_formula() {
    // grad_v_initial = grad_x[0] * (1 - reciprocal_tau)
    let (x, v0) = inputs();
    let spec = spec(NeuronModelKind::LeakyIntegrateAndFire, Some(0.0), false, 0.5);
    let grads = analytic(&x, &v0, &spec);
    for n in 0..v0.len() {
        assert_eq!(grads.grad_v_initial[n], grads.grad_x[[0, n]] * 0.5);
    }
}

#[test]
fn test_plif_decay_gradient() {
    let (x, v0) = inputs();
    for v_reset in [Some(0.0), None] {
        let model = NeuronModelKind::ParametricLeakyIntegrateAndFire;
        let spec_at = |reciprocal_tau| spec(model, v_reset, false, reciprocal_tau);

        let grads = analytic(&x, &v0, &spec_at(0.5));
        check_grad_x(&spec_at(0.5), &grads);

        let plus = 0.5 + DECAY_EPS;
        let minus = 0.5 - DECAY_EPS;
        let numeric = (loss(&x, &v0, &spec_at(plus)) - loss(&x, &v0, &spec_at(minus)))
            / (plus - minus) as f64;
        assert_close(grads.grad_reciprocal_tau.unwrap(), numeric, "grad_reciprocal_tau");
    }
}
