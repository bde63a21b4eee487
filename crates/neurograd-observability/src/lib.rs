// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # neurograd-observability
//!
//! Logging setup shared by every neurograd crate, with per-crate debug flag
//! support. Library crates only emit `tracing` events; binaries, benches and
//! tests call [`init_logging`] once to install a subscriber.

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use init::*;

/// Known neurograd crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "neurograd",
    "neurograd-npu-neural",
    "neurograd-npu-runtime",
    "neurograd-config",
    "neurograd-observability",
];

