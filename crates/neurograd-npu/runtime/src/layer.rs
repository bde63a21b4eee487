// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Layer Entry Points
//!
//! `forward` and `backward` over one population of neurons. Tensors cross
//! this boundary as `f32` with time as the slowest axis; padding and lane
//! precision stay internal.

use std::sync::Arc;

use ndarray::{s, Array, ArrayView1, ArrayView2, ArrayViewD, Dimension, Ix1, Ix2, IxDyn};
use tracing::debug;

use neurograd_config::{validate_config, NeurogradConfig};
use neurograd_npu_neural::{
    NeuronModelKind, NeuronParameters, Precision, Surrogate, SurrogateGradient,
};

use crate::context::RunContext;
use crate::dispatch::{self, KernelVariant};
use crate::error::{check_shape, Result, RuntimeError};
use crate::backward::SavedState;
use crate::pairing::{ExecutionStrategy, LanePlan};
use crate::reduce::tree_reduce;

/// Static description of one neuron layer
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub model: NeuronModelKind,
    pub params: NeuronParameters,
    pub precision: Precision,
    pub surrogate: Arc<dyn SurrogateGradient>,
    /// Overrides the default strategy for `(model, precision)`
    pub strategy: Option<ExecutionStrategy>,
}

impl LayerSpec {
    /// Default parameters, standard precision, sigmoid surrogate
    pub fn new(model: NeuronModelKind) -> Self {
        Self {
            model,
            params: NeuronParameters::default(),
            precision: Precision::Standard,
            surrogate: Arc::new(Surrogate::default()),
            strategy: None,
        }
    }

    pub fn with_params(mut self, params: NeuronParameters) -> Self {
        self.params = params;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_surrogate<S: SurrogateGradient + 'static>(mut self, surrogate: S) -> Self {
        self.surrogate = Arc::new(surrogate);
        self
    }

    pub fn with_strategy(mut self, strategy: ExecutionStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
            .unwrap_or_else(|| ExecutionStrategy::select(self.model, self.precision))
    }

    pub fn variant(&self) -> KernelVariant {
        KernelVariant::new(self.model, &self.params, self.precision)
    }

    pub fn validate(&self) -> Result<()> {
        self.params.validate()?;
        if let Some(strategy) = self.strategy {
            strategy.check_precision(self.precision)?;
        }
        Ok(())
    }

    /// Build from a loaded configuration, rejecting invalid values up front
    pub fn from_config(config: &NeurogradConfig) -> Result<Self> {
        validate_config(config)?;

        let model: NeuronModelKind = config.neuron.model.parse()?;
        let precision: Precision = config.execution.precision.parse()?;
        let mut surrogate = Surrogate::from_name(&config.surrogate.name)?;
        if let Some(alpha) = config.surrogate.alpha {
            surrogate = surrogate.with_alpha(alpha);
        }
        surrogate.validate()?;

        let params = NeuronParameters::new(config.neuron.v_threshold, config.neuron.v_reset)
            .with_tau(config.neuron.tau)
            .with_detach_reset(config.neuron.detach_reset);

        let spec = Self::new(model)
            .with_params(params)
            .with_precision(precision)
            .with_surrogate(surrogate);
        spec.validate()?;
        Ok(spec)
    }
}

/// Spikes and post-reset potentials, `[T, ...population]`
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardOutput<D: Dimension = Ix2> {
    pub spike: Array<f32, D>,
    pub v: Array<f32, D>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackwardOutput<D: Dimension = Ix2, S: Dimension = Ix1> {
    pub grad_x: Array<f32, D>,
    pub grad_v_initial: Array<f32, S>,
    /// Present only for the learnable decay model
    pub grad_reciprocal_tau: Option<f32>,
}

/// Run the layer over `x: [T, N]` starting from `v_initial: [N]`
///
/// With `requires_grad`, also returns the context the matching
/// [`backward`] call consumes.
pub fn forward(
    x: ArrayView2<'_, f32>,
    v_initial: ArrayView1<'_, f32>,
    spec: &LayerSpec,
    requires_grad: bool,
) -> Result<(ForwardOutput, Option<RunContext>)> {
    spec.validate()?;
    let (time_steps, neuron_count) = x.dim();
    check_shape("v_initial", &[neuron_count], v_initial.shape())?;

    let variant = spec.variant();
    let plan = LanePlan::new(spec.strategy(), neuron_count);
    debug!(
        target: "neurograd-npu-runtime",
        "[DISPATCH] {} T={} N={} strategy={} padded={}",
        variant.forward_kernel_name(),
        time_steps,
        neuron_count,
        plan.strategy(),
        plan.is_padded()
    );

    let x = plan.pad_columns(x);
    let v_initial = plan.pad_vector(v_initial);
    let trace = dispatch::forward(variant.model, &plan, x.view(), v_initial.view(), &spec.params);

    let output = ForwardOutput {
        spike: plan.strip_columns(trace.spike.view()),
        v: plan.strip_columns(trace.v.slice(s![1.., ..])),
    };
    let context = requires_grad
        .then(|| RunContext::new(variant, plan, spec.params, Arc::clone(&spec.surrogate), trace));
    Ok((output, context))
}

/// Gradients with respect to `x`, `v_initial` and (learnable decay only)
/// `reciprocal_tau`, given upstream gradients of shape `[T, N]`
pub fn backward(
    ctx: RunContext,
    grad_spike: ArrayView2<'_, f32>,
    grad_v: ArrayView2<'_, f32>,
) -> Result<BackwardOutput> {
    let expected = [ctx.time_steps(), ctx.neuron_count()];
    check_shape("grad_spike", &expected, grad_spike.shape())?;
    check_shape("grad_v", &expected, grad_v.shape())?;
    if ctx.variant.model.learns_decay() && ctx.v.is_none() {
        return Err(RuntimeError::MissingForwardState);
    }

    debug!(
        target: "neurograd-npu-runtime",
        "[DISPATCH] {} T={} N={} strategy={}",
        ctx.variant.backward_kernel_name(),
        expected[0],
        expected[1],
        ctx.plan.strategy()
    );

    let plan = ctx.plan;
    let grad_spike = plan.pad_columns(grad_spike);
    let grad_v = plan.pad_columns(grad_v);
    let saved = SavedState {
        h: ctx.h.view(),
        spike: ctx.spike.view(),
        v: ctx.v.as_ref().map(|v| v.view()),
    };
    let trace = dispatch::backward(
        ctx.variant.model,
        &plan,
        &saved,
        grad_spike.view(),
        grad_v.view(),
        &ctx.params,
        ctx.surrogate.as_ref(),
    );

    Ok(BackwardOutput {
        grad_x: plan.strip_columns(trace.grad_x.view()),
        grad_v_initial: plan.strip_vector(trace.grad_v_initial.view()),
        grad_reciprocal_tau: trace.decay_partials.map(|partials| tree_reduce(&partials)),
    })
}

/// [`forward`] over a multi-dimensional population
///
/// `x` is `[T, d1, d2, ...]` and `v_initial` is `[d1, d2, ...]`.
pub fn forward_nd(
    x: ArrayViewD<'_, f32>,
    v_initial: ArrayViewD<'_, f32>,
    spec: &LayerSpec,
    requires_grad: bool,
) -> Result<(ForwardOutput<IxDyn>, Option<RunContext>)> {
    let population = v_initial.shape().to_vec();
    let time_steps = x.shape().first().copied().unwrap_or(0);
    let mut expected = vec![time_steps];
    expected.extend_from_slice(&population);
    check_shape("x", &expected, x.shape())?;

    let neuron_count: usize = population.iter().product();
    let flat_x = x.to_shape((time_steps, neuron_count))?;
    let flat_v = v_initial.to_shape(neuron_count)?;
    let (output, context) = forward(flat_x.view(), flat_v.view(), spec, requires_grad)?;

    let output = ForwardOutput {
        spike: output.spike.into_shape_with_order(expected.clone())?,
        v: output.v.into_shape_with_order(expected)?,
    };
    Ok((output, context.map(|ctx| ctx.with_population(population))))
}

/// [`backward`] for a context produced by [`forward_nd`]
pub fn backward_nd(
    ctx: RunContext,
    grad_spike: ArrayViewD<'_, f32>,
    grad_v: ArrayViewD<'_, f32>,
) -> Result<BackwardOutput<IxDyn, IxDyn>> {
    let population = ctx.population().to_vec();
    let (time_steps, neuron_count) = (ctx.time_steps(), ctx.neuron_count());
    let mut expected = vec![time_steps];
    expected.extend_from_slice(&population);
    check_shape("grad_spike", &expected, grad_spike.shape())?;
    check_shape("grad_v", &expected, grad_v.shape())?;

    let flat_spike = grad_spike.to_shape((time_steps, neuron_count))?;
    let flat_v = grad_v.to_shape((time_steps, neuron_count))?;
    let output = backward(ctx, flat_spike.view(), flat_v.view())?;

    Ok(BackwardOutput {
        grad_x: output.grad_x.into_shape_with_order(expected)?,
        grad_v_initial: output.grad_v_initial.into_shape_with_order(population)?,
        grad_reciprocal_tau: output.grad_reciprocal_tau,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1, Array2, Array3};

    #[test]
    fn test_forward_without_grad_returns_no_context() {
        let spec = LayerSpec::new(NeuronModelKind::IntegrateAndFire);
        let (output, context) =
            forward(array![[0.5f32, 1.5]].view(), Array1::zeros(2).view(), &spec, false).unwrap();
        assert_eq!(output.spike, array![[0.0, 1.0]]);
        assert_eq!(output.v, array![[0.5, 0.0]]);
        assert!(context.is_none());
    }

    #[test]
    fn test_context_keeps_v_only_for_learned_decay() {
        let x = array![[0.5f32, 1.5]];
        let lif = LayerSpec::new(NeuronModelKind::LeakyIntegrateAndFire);
        let (_, ctx) = forward(x.view(), Array1::zeros(2).view(), &lif, true).unwrap();
        assert!(ctx.unwrap().saved_v().is_none());

        let plif = LayerSpec::new(NeuronModelKind::ParametricLeakyIntegrateAndFire);
        let (_, ctx) = forward(x.view(), Array1::zeros(2).view(), &plif, true).unwrap();
        let ctx = ctx.unwrap();
        assert_eq!(ctx.saved_v().unwrap().shape(), &[2, 2]);
        assert_eq!(ctx.saved_h().shape(), &[1, 2]);
    }

    #[test]
    fn test_v_initial_shape_checked() {
        let spec = LayerSpec::new(NeuronModelKind::IntegrateAndFire);
        let err = forward(Array2::zeros((3, 4)).view(), Array1::zeros(5).view(), &spec, false)
            .unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_strategy_override_must_match_precision() {
        let spec = LayerSpec::new(NeuronModelKind::LeakyIntegrateAndFire)
            .with_strategy(ExecutionStrategy::Paired);
        let err = forward(Array2::zeros((1, 2)).view(), Array1::zeros(2).view(), &spec, false)
            .unwrap_err();
        assert!(err.is_configuration());

        let spec = spec.with_precision(Precision::Reduced);
        assert!(forward(Array2::zeros((1, 2)).view(), Array1::zeros(2).view(), &spec, false).is_ok());
    }

    #[test]
    fn test_nd_population_round_trips_shape() {
        let spec = LayerSpec::new(NeuronModelKind::IntegrateAndFire);
        let x = Array3::<f32>::from_elem((2, 2, 3), 0.75);
        let v0 = Array2::<f32>::zeros((2, 3));

        let (output, ctx) = forward_nd(x.view().into_dyn(), v0.view().into_dyn(), &spec, true).unwrap();
        assert_eq!(output.spike.shape(), &[2, 2, 3]);
        assert!(output.spike.iter().skip(6).all(|&s| s == 1.0));

        let ctx = ctx.unwrap();
        assert_eq!(ctx.population(), &[2, 3]);
        let grads = backward_nd(
            ctx,
            Array3::<f32>::ones((2, 2, 3)).view().into_dyn(),
            Array3::<f32>::zeros((2, 2, 3)).view().into_dyn(),
        )
        .unwrap();
        assert_eq!(grads.grad_x.shape(), &[2, 2, 3]);
        assert_eq!(grads.grad_v_initial.shape(), &[2, 3]);
        assert!(grads.grad_reciprocal_tau.is_none());
    }

    #[test]
    fn test_nd_rejects_mismatched_population() {
        let spec = LayerSpec::new(NeuronModelKind::IntegrateAndFire);
        let x = Array3::<f32>::zeros((2, 2, 3));
        let v0 = Array2::<f32>::zeros((3, 2));
        let err = forward_nd(x.view().into_dyn(), v0.view().into_dyn(), &spec, false).unwrap_err();
        assert!(err.is_shape());
    }
}
