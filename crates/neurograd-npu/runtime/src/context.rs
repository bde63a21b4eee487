// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Forward state retained for exactly one backward pass

use std::sync::Arc;

use ndarray::{s, Array2, ArrayView2};
use neurograd_npu_neural::{NeuronParameters, SurrogateGradient};

use crate::dispatch::KernelVariant;
use crate::forward::ForwardTrace;
use crate::pairing::LanePlan;

/// Saved tensors plus everything needed to replay the variant backwards
///
/// Created by a forward call with `requires_grad` and consumed by value by
/// the matching backward call. Tensors are kept in the padded neuron space.
#[derive(Debug)]
pub struct RunContext {
    pub(crate) variant: KernelVariant,
    pub(crate) plan: LanePlan,
    pub(crate) params: NeuronParameters,
    pub(crate) surrogate: Arc<dyn SurrogateGradient>,
    pub(crate) h: Array2<f32>,
    pub(crate) spike: Array2<f32>,
    /// Full potential history, kept only when the decay is learned
    pub(crate) v: Option<Array2<f32>>,
    /// Caller-facing population shape (`[N]`, or `[d1, d2, ...]`)
    pub(crate) population: Vec<usize>,
}

impl RunContext {
    pub(crate) fn new(
        variant: KernelVariant,
        plan: LanePlan,
        params: NeuronParameters,
        surrogate: Arc<dyn SurrogateGradient>,
        trace: ForwardTrace,
    ) -> Self {
        let v = variant.model.learns_decay().then_some(trace.v);
        Self {
            variant,
            plan,
            params,
            surrogate,
            h: trace.h,
            spike: trace.spike,
            v,
            population: vec![plan.neuron_count()],
        }
    }

    pub(crate) fn with_population(mut self, population: Vec<usize>) -> Self {
        self.population = population;
        self
    }

    pub fn variant(&self) -> &KernelVariant {
        &self.variant
    }

    pub fn plan(&self) -> &LanePlan {
        &self.plan
    }

    /// Parameter snapshot taken at forward time
    pub fn params(&self) -> &NeuronParameters {
        &self.params
    }

    pub fn time_steps(&self) -> usize {
        self.h.nrows()
    }

    pub fn neuron_count(&self) -> usize {
        self.plan.neuron_count()
    }

    pub fn population(&self) -> &[usize] {
        &self.population
    }

    pub fn is_padded(&self) -> bool {
        self.plan.is_padded()
    }

    /// `h` as the caller sees it, `[T, N]`
    pub fn saved_h(&self) -> ArrayView2<'_, f32> {
        self.h.slice(s![.., ..self.neuron_count()])
    }

    pub fn saved_spike(&self) -> ArrayView2<'_, f32> {
        self.spike.slice(s![.., ..self.neuron_count()])
    }

    /// `[T + 1, N]` potential history, present only for the learnable decay model
    pub fn saved_v(&self) -> Option<ArrayView2<'_, f32>> {
        self.v.as_ref().map(|v| v.slice(s![.., ..self.neuron_count()]))
    }
}
