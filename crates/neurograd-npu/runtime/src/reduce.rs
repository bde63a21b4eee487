// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Decay-Parameter Gradient Reducer
//!
//! Each lane accumulates its own partial of `grad_reciprocal_tau` while the
//! backward loop runs. Once every lane has finished, the partials are
//! combined by a pairwise tree whose shape depends only on the number of
//! partials, so the result does not change with the worker count.

use tracing::trace;

/// Partials summed sequentially at the leaves of the tree
const LEAF_SIZE: usize = 64;

/// Deterministic pairwise sum
pub fn tree_reduce(partials: &[f32]) -> f32 {
    if partials.len() <= LEAF_SIZE {
        return partials.iter().sum();
    }
    let (left, right) = partials.split_at(partials.len() / 2);
    let (left_sum, right_sum) = rayon::join(|| tree_reduce(left), || tree_reduce(right));
    left_sum + right_sum
}

/// Population-shared learnable `reciprocal_tau` with its gradient accumulator
///
/// Gradients accumulate across backward calls until [`zero_grad`](Self::zero_grad).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayParameter {
    value: f32,
    grad: Option<f32>,
}

impl DecayParameter {
    pub fn new(reciprocal_tau: f32) -> Self {
        Self {
            value: reciprocal_tau,
            grad: None,
        }
    }

    pub fn from_tau(tau: f32) -> Self {
        Self::new(1.0 / tau)
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn tau(&self) -> f32 {
        1.0 / self.value
    }

    /// Overwrite the value, e.g. after an optimizer step
    pub fn set_value(&mut self, reciprocal_tau: f32) {
        self.value = reciprocal_tau;
    }

    pub fn grad(&self) -> Option<f32> {
        self.grad
    }

    pub fn accumulate_grad(&mut self, grad: f32) {
        let total = self.grad.unwrap_or(0.0) + grad;
        trace!(target: "neurograd-npu-runtime", "[DECAY] grad += {} -> {}", grad, total);
        self.grad = Some(total);
    }

    pub fn zero_grad(&mut self) {
        self.grad = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_input_is_plain_sum() {
        assert_eq!(tree_reduce(&[]), 0.0);
        assert_eq!(tree_reduce(&[1.0, 2.0, 3.5]), 6.5);
    }

    #[test]
    fn test_large_input_is_repeatable() {
        let partials: Vec<f32> = (0..10_000).map(|i| ((i * 37) % 101) as f32 * 0.013 - 0.6).collect();
        let first = tree_reduce(&partials);
        for _ in 0..8 {
            assert_eq!(tree_reduce(&partials).to_bits(), first.to_bits());
        }
        let exact: f64 = partials.iter().map(|&p| p as f64).sum();
        assert!((first as f64 - exact).abs() < 1e-2);
    }

    #[test]
    fn test_same_result_on_any_pool_size() {
        let partials: Vec<f32> = (0..5_000).map(|i| (i as f32).sin()).collect();
        let reference = tree_reduce(&partials);
        for threads in [1, 2, 7] {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
            let sum = pool.install(|| tree_reduce(&partials));
            assert_eq!(sum.to_bits(), reference.to_bits());
        }
    }

    #[test]
    fn test_decay_parameter_accumulates() {
        let mut decay = DecayParameter::from_tau(2.0);
        assert_eq!(decay.value(), 0.5);
        assert_eq!(decay.tau(), 2.0);
        assert_eq!(decay.grad(), None);

        decay.accumulate_grad(1.5);
        decay.accumulate_grad(-0.5);
        assert_eq!(decay.grad(), Some(1.0));

        decay.zero_grad();
        assert_eq!(decay.grad(), None);
        decay.set_value(0.25);
        assert_eq!(decay.tau(), 4.0);
    }
}
