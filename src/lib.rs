//! # Neurograd - Multi-Step Spiking Neurons with Exact Gradients
//!
//! Neurograd simulates a layer of spiking neurons over `T` discrete timesteps
//! and backpropagates through that simulation with hand-derived gradients.
//! The spike nonlinearity is differentiated through a pluggable surrogate.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! neurograd = "0.1"
//! ```
//!
//! ```rust,no_run
//! use neurograd::prelude::*;
//! use ndarray::{Array1, Array2};
//!
//! let spec = LayerSpec::new(NeuronModelKind::ParametricLeakyIntegrateAndFire)
//!     .with_params(NeuronParameters::new(1.0, None).with_tau(2.0))
//!     .with_precision(Precision::Reduced);
//! let mut node = MultiStepNode::new(spec)?;
//!
//! let x = Array2::<f32>::from_elem((8, 128), 0.4);
//! let out = node.forward(x.view(), node.initial_state(128).view(), true)?;
//! let grads = node.backward(out.spike.view(), Array2::zeros((8, 128)).view())?;
//! println!("grad tau: {:?}", node.decay().and_then(|d| d.grad()));
//! # Ok::<(), neurograd::runtime::RuntimeError>(())
//! ```
//!
//! ### From a configuration file
//!
//! ```rust,no_run
//! use std::collections::HashMap;
//! use neurograd::prelude::*;
//!
//! let mut cli = HashMap::new();
//! cli.insert("neuron.tau".to_string(), "4.0".to_string());
//! let config = neurograd::config::load_config(None, Some(&cli))?;
//! neurograd::init_logging(&config)?;
//! let node = MultiStepNode::from_config(&config)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: neurograd-config, neurograd-observability  │
//! │  (TOML + env overrides, tracing setup)                  │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Math: neurograd-npu-neural                             │
//! │  (Lane types, IF/LIF/PLIF rules, resets, surrogates)    │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Execution: neurograd-npu-runtime                       │
//! │  (Dispatch, pairing, forward/backward, decay reduction) │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

// Re-export foundation
pub use neurograd_config as config;
pub use neurograd_observability as observability;

// Re-export neuron math and execution
pub use neurograd_npu_neural as neural;
pub use neurograd_npu_runtime as runtime;

/// Install console logging at `config.logging.level`
///
/// Per-crate debug flags from the process arguments and `NEUROGRAD_DEBUG`
/// are layered on top; `RUST_LOG` replaces both.
pub fn init_logging(config: &config::NeurogradConfig) -> anyhow::Result<()> {
    observability::init_logging(&observability::parse_debug_flags(), &config.logging.level)
}

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::neural::{
        NeuronModelKind, NeuronParameters, Precision, ResetMode, Surrogate, SurrogateGradient,
    };

    pub use crate::runtime::{
        backward, forward, BackwardOutput, DecayParameter, ExecutionStrategy, ForwardOutput,
        KernelVariant, LayerSpec, MultiStepNode, RunContext, RuntimeError,
    };

    pub use crate::config::NeurogradConfig;
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_facade_imports() {
        use crate::prelude::*;
        let spec = LayerSpec::new(NeuronModelKind::IntegrateAndFire);
        assert_eq!(spec.strategy(), ExecutionStrategy::Scalar);
    }
}
