// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Neural Types Module
//!
//! Numeric element types, lane types used by the recurrence engines, and the
//! configuration error taxonomy.

pub mod error;
pub mod lane;
pub mod numeric;

pub use error::{NeuralError, Result};
pub use lane::{F16x2, NeuralLane, MAX_LANE_WIDTH};
pub use numeric::{NeuralValue, Precision};
