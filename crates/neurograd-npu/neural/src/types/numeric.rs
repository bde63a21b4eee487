// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Numeric element types and precision selection
//!
//! Tensors cross the public boundary as `f32`. Internally the engines store
//! either `f32` (standard precision) or `f16` (reduced precision).

use core::fmt;
use core::str::FromStr;

use half::f16;

use super::error::NeuralError;

/// Element type stored in simulation tensors
pub trait NeuralValue: Copy + Default + PartialOrd + fmt::Debug + Send + Sync + 'static {
    /// Round an `f32` into this element type
    fn from_f32(value: f32) -> Self;

    /// Widen to `f32` (lossless for every supported type)
    fn to_f32(self) -> f32;

    fn zero() -> Self;
}

impl NeuralValue for f32 {
    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        self
    }

    #[inline(always)]
    fn zero() -> Self {
        0.0
    }
}

impl NeuralValue for f16 {
    #[inline(always)]
    fn from_f32(value: f32) -> Self {
        f16::from_f32(value)
    }

    #[inline(always)]
    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    #[inline(always)]
    fn zero() -> Self {
        f16::ZERO
    }
}

/// Execution precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Precision {
    /// 32-bit float, one neuron per lane
    #[default]
    Standard,
    /// 16-bit float, two neurons per lane where the model allows it
    Reduced,
}

impl Precision {
    /// Suffix used in kernel names (`fp32` / `fp16`)
    pub fn kernel_suffix(&self) -> &'static str {
        match self {
            Precision::Standard => "fp32",
            Precision::Reduced => "fp16",
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kernel_suffix())
    }
}

impl FromStr for Precision {
    type Err = NeuralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fp32" | "f32" | "float32" | "float" | "standard" => Ok(Precision::Standard),
            "fp16" | "f16" | "float16" | "half" | "reduced" => Ok(Precision::Reduced),
            other => Err(NeuralError::UnsupportedPrecision(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precision_parsing() {
        assert_eq!("fp32".parse::<Precision>().unwrap(), Precision::Standard);
        assert_eq!("Half".parse::<Precision>().unwrap(), Precision::Reduced);
        assert_eq!(
            "bf16".parse::<Precision>(),
            Err(NeuralError::UnsupportedPrecision("bf16".to_string()))
        );
    }

    #[test]
    fn test_f16_roundtrip_is_lossless_through_f32() {
        let value = f16::from_f32(0.1);
        assert_eq!(<f16 as NeuralValue>::from_f32(value.to_f32()), value);
    }
}
