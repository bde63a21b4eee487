// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*
 * Copyright 2025 Neuraville Inc.
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 */

//! # Neuron Update Rules
//!
//! One multi-step recurrence serves every neuron model. A model only decides
//! how the pre-threshold potential `h[t]` is formed from the previous
//! potential and the input, and whether a decay factor scales the gradients
//! flowing back through time.
//!
//! ## Adding a New Neuron Model
//!
//! 1. Create `src/models/your_model.rs`
//! 2. Implement `UpdateRule`
//! 3. Add a `NeuronModelKind` variant and a dispatch arm in the runtime
//! 4. Export in `mod.rs`

pub mod if_node;
pub mod lif;
pub mod parametric_lif;
pub mod reset;
pub mod traits;

// Re-export core types
pub use if_node::IFModel;
pub use lif::LIFModel;
pub use parametric_lif::ParametricLIFModel;
pub use reset::{ResetGradient, ResetMode};
pub use traits::{DecayScale, LaneParameters, NeuronModelKind, NeuronParameters, UpdateRule};
