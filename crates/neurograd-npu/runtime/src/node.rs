// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Multi-Step Node
//!
//! Stateful wrapper around [`forward`](crate::layer::forward) and
//! [`backward`](crate::layer::backward): it holds the layer description,
//! keeps the run context between the two calls and, for the learnable decay
//! model, owns the shared `reciprocal_tau` and its accumulated gradient.

use ndarray::{Array1, ArrayView1, ArrayView2};
use tracing::info;

use neurograd_config::NeurogradConfig;

use crate::context::RunContext;
use crate::error::{Result, RuntimeError};
use crate::layer::{self, BackwardOutput, ForwardOutput, LayerSpec};
use crate::reduce::DecayParameter;

pub struct MultiStepNode {
    spec: LayerSpec,
    decay: Option<DecayParameter>,
    context: Option<RunContext>,
    /// Dedicated workers; the global rayon pool is used when absent
    pool: Option<rayon::ThreadPool>,
}

impl MultiStepNode {
    pub fn new(spec: LayerSpec) -> Result<Self> {
        spec.validate()?;
        let decay = spec
            .model
            .learns_decay()
            .then(|| DecayParameter::new(spec.params.reciprocal_tau));
        Ok(Self {
            spec,
            decay,
            context: None,
            pool: None,
        })
    }

    pub fn from_config(config: &NeurogradConfig) -> Result<Self> {
        let node = Self::new(LayerSpec::from_config(config)?)?;
        info!(
            target: "neurograd-npu-runtime",
            "Created {} node: {}",
            node.spec.model,
            node.spec.variant().forward_kernel_name()
        );
        match config.execution.max_threads {
            0 => Ok(node),
            threads => node.with_threads(threads),
        }
    }

    /// Run on a dedicated pool of `threads` workers
    pub fn with_threads(mut self, threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("neurograd-worker-{}", index))
            .build()
            .map_err(|e| RuntimeError::ThreadPool(e.to_string()))?;
        self.pool = Some(pool);
        Ok(self)
    }

    pub fn spec(&self) -> &LayerSpec {
        &self.spec
    }

    /// Learnable decay, present for the parametric LIF model only
    pub fn decay(&self) -> Option<&DecayParameter> {
        self.decay.as_ref()
    }

    pub fn decay_mut(&mut self) -> Option<&mut DecayParameter> {
        self.decay.as_mut()
    }

    pub fn has_pending_context(&self) -> bool {
        self.context.is_some()
    }

    /// Resting state for `neuron_count` neurons (`v_reset`, or 0 under soft reset)
    pub fn initial_state(&self, neuron_count: usize) -> Array1<f32> {
        Array1::from_elem(neuron_count, self.spec.params.v_reset.unwrap_or(0.0))
    }

    /// Drop any retained context
    pub fn reset(&mut self) {
        self.context = None;
    }

    /// Forward over `x: [T, N]`; with `requires_grad` the context is kept
    /// for the next [`backward`](Self::backward)
    pub fn forward(
        &mut self,
        x: ArrayView2<'_, f32>,
        v_initial: ArrayView1<'_, f32>,
        requires_grad: bool,
    ) -> Result<ForwardOutput> {
        if let Some(decay) = &self.decay {
            self.spec.params.reciprocal_tau = decay.value();
        }
        let spec = &self.spec;
        let (output, context) = self.install(|| layer::forward(x, v_initial, spec, requires_grad))?;
        self.context = context;
        Ok(output)
    }

    /// Consume the retained context; the decay gradient, if any, is added
    /// to the node's accumulator
    pub fn backward(
        &mut self,
        grad_spike: ArrayView2<'_, f32>,
        grad_v: ArrayView2<'_, f32>,
    ) -> Result<BackwardOutput> {
        let context = self.context.take().ok_or(RuntimeError::MissingForwardState)?;
        let output = self.install(|| layer::backward(context, grad_spike, grad_v))?;
        if let (Some(decay), Some(grad)) = (self.decay.as_mut(), output.grad_reciprocal_tau) {
            decay.accumulate_grad(grad);
        }
        Ok(output)
    }

    fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl std::fmt::Debug for MultiStepNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiStepNode")
            .field("spec", &self.spec)
            .field("decay", &self.decay)
            .field("pending_context", &self.context.is_some())
            .field("threads", &self.pool.as_ref().map(|pool| pool.current_num_threads()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};
    use neurograd_npu_neural::{NeuronModelKind, NeuronParameters};

    #[test]
    fn test_backward_without_forward() {
        let mut node = MultiStepNode::new(LayerSpec::new(NeuronModelKind::LeakyIntegrateAndFire)).unwrap();
        let err = node
            .backward(Array2::zeros((1, 1)).view(), Array2::zeros((1, 1)).view())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::MissingForwardState));
    }

    #[test]
    fn test_context_consumed_once() {
        let mut node = MultiStepNode::new(LayerSpec::new(NeuronModelKind::IntegrateAndFire)).unwrap();
        node.forward(array![[1.5f32]].view(), node.initial_state(1).view(), true).unwrap();
        assert!(node.has_pending_context());

        let grads = array![[1.0f32]];
        assert!(node.backward(grads.view(), grads.view()).is_ok());
        assert!(!node.has_pending_context());
        assert!(node.backward(grads.view(), grads.view()).is_err());
    }

    #[test]
    fn test_decay_gradient_accumulates_across_calls() {
        let spec = LayerSpec::new(NeuronModelKind::ParametricLeakyIntegrateAndFire)
            .with_params(NeuronParameters::new(1.0, None).with_tau(2.0));
        let mut node = MultiStepNode::new(spec).unwrap().with_threads(2).unwrap();
        let x = array![[0.8f32, 2.5], [1.2, 0.1]];
        let grads = Array2::<f32>::ones((2, 2));

        node.forward(x.view(), node.initial_state(2).view(), true).unwrap();
        let first = node.backward(grads.view(), grads.view()).unwrap();
        let step = first.grad_reciprocal_tau.unwrap();
        assert_eq!(node.decay().unwrap().grad(), Some(step));

        node.forward(x.view(), node.initial_state(2).view(), true).unwrap();
        node.backward(grads.view(), grads.view()).unwrap();
        assert_eq!(node.decay().unwrap().grad(), Some(step + step));
    }

    #[test]
    fn test_decay_value_drives_forward() {
        let spec = LayerSpec::new(NeuronModelKind::ParametricLeakyIntegrateAndFire)
            .with_params(NeuronParameters::new(10.0, None).with_tau(2.0));
        let mut node = MultiStepNode::new(spec).unwrap();
        node.decay_mut().unwrap().set_value(0.25);

        let out = node.forward(array![[1.0f32]].view(), node.initial_state(1).view(), false).unwrap();
        assert_eq!(out.v[[0, 0]], 0.25);
        assert!(!node.has_pending_context());
    }
}
