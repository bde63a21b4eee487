// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Runtime-gated per-neuron tracing of the recurrence
//!
//! Enable with:
//! - `NEUROGRAD_TRACE_RECURRENCE=1`
//!
//! Optional filter:
//! - `NEUROGRAD_TRACE_NEURON=<index>` (single neuron, padded index space)
//!
//! Events are emitted at `TRACE` level, so the subscriber filter must allow
//! them as well.

use std::sync::OnceLock;

pub(crate) struct RecurrenceTraceCfg {
    enabled: bool,
    neuron_filter: Option<usize>,
}

impl RecurrenceTraceCfg {
    fn from_values(enabled: Option<&str>, neuron: Option<&str>) -> Self {
        let enabled = enabled
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let neuron_filter = neuron.and_then(|v| v.trim().parse().ok());
        Self {
            enabled,
            neuron_filter,
        }
    }

    #[inline]
    pub(crate) fn watches(&self, neuron: usize) -> bool {
        self.enabled && self.neuron_filter.map_or(true, |filter| filter == neuron)
    }

    #[inline]
    pub(crate) fn watches_any(&self, neurons: &[usize]) -> bool {
        self.enabled && neurons.iter().any(|&neuron| self.watches(neuron))
    }
}

pub(crate) fn recurrence_trace_cfg() -> &'static RecurrenceTraceCfg {
    static CFG: OnceLock<RecurrenceTraceCfg> = OnceLock::new();
    CFG.get_or_init(|| {
        let enabled = std::env::var("NEUROGRAD_TRACE_RECURRENCE").ok();
        let neuron = std::env::var("NEUROGRAD_TRACE_NEURON").ok();
        RecurrenceTraceCfg::from_values(enabled.as_deref(), neuron.as_deref())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default() {
        let cfg = RecurrenceTraceCfg::from_values(None, Some("3"));
        assert!(!cfg.watches(3));
    }

    #[test]
    fn test_neuron_filter() {
        let cfg = RecurrenceTraceCfg::from_values(Some("true"), Some("3"));
        assert!(cfg.watches(3));
        assert!(!cfg.watches(4));
        assert!(cfg.watches_any(&[1, 3]));

        let all = RecurrenceTraceCfg::from_values(Some("1"), None);
        assert!(all.watches(42));
    }
}
