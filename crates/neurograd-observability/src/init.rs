// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Console logging initialization

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::{parse_debug_flags, CrateDebugFlags};

/// Build the filter for a base level plus per-crate debug flags
///
/// `RUST_LOG`, when set, replaces the computed directives entirely.
pub fn build_filter(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<EnvFilter> {
    if let Ok(directives) = std::env::var("RUST_LOG") {
        return EnvFilter::try_new(&directives)
            .with_context(|| format!("Invalid RUST_LOG directives: {}", directives));
    }
    let filter = debug_flags.to_filter_string(&base_level.to_lowercase());
    EnvFilter::try_new(&filter).with_context(|| format!("Invalid log filter: {}", filter))
}

/// Install a human-readable console subscriber
///
/// # Errors
/// Fails if the filter is invalid or a global subscriber is already set.
pub fn init_logging(debug_flags: &CrateDebugFlags, base_level: &str) -> Result<()> {
    let env_filter = build_filter(debug_flags, base_level)?;

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_filter(env_filter);

    Registry::default()
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::debug!(
        target: "neurograd-observability",
        base_level,
        debug_crates = ?debug_flags.enabled_crates,
        "logging initialized"
    );
    Ok(())
}

/// Initialize logging from process arguments, `NEUROGRAD_DEBUG` and
/// `NEUROGRAD_LOG_LEVEL` (default `info`)
pub fn init_logging_default() -> Result<()> {
    let level = std::env::var("NEUROGRAD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    init_logging(&parse_debug_flags(), &level)
}
