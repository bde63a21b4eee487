// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Surrogate Gradients
//!
//! The spike is a unit step of the margin `h - v_threshold`, whose true
//! derivative is zero almost everywhere. The backward pass substitutes a
//! smooth pseudo-derivative supplied through [`SurrogateGradient`]. The
//! recurrence never inspects which function it was given.
//!
//! Standard functions, selectable by name:
//!
//! | name                   | parameters        | `grad(x)`                                  |
//! |------------------------|-------------------|--------------------------------------------|
//! | `sigmoid`              | `alpha = 4`       | `α·σ(αx)·(1 - σ(αx))`                      |
//! | `atan`                 | `alpha = 2`       | `(α/2) / (1 + (π/2·α·x)²)`                 |
//! | `piecewise_leaky_relu` | `w = 1, c = 0.01` | `1/(2w)` if `|x| < w`, else `c`            |
//! | `piecewise_quadratic`  | `alpha = 1`       | `α - α²·|x|` if `|x| <= 1/α`, else `0`     |

use core::f32::consts::FRAC_PI_2;
use core::fmt;
use core::str::FromStr;

use crate::types::{NeuralError, Result};

/// Pseudo-derivative of the spike step
pub trait SurrogateGradient: Send + Sync + fmt::Debug {
    /// Gradient of the spike with respect to `margin = h - v_threshold`
    fn grad(&self, margin: f32) -> f32;

    fn name(&self) -> &'static str;
}

/// Standard surrogate gradient functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Surrogate {
    Sigmoid { alpha: f32 },
    ATan { alpha: f32 },
    PiecewiseLeakyReLU { w: f32, c: f32 },
    PiecewiseQuadratic { alpha: f32 },
}

impl Default for Surrogate {
    fn default() -> Self {
        Surrogate::sigmoid()
    }
}

impl Surrogate {
    pub const NAMES: [&'static str; 4] = [
        "sigmoid",
        "atan",
        "piecewise_leaky_relu",
        "piecewise_quadratic",
    ];

    pub fn sigmoid() -> Self {
        Surrogate::Sigmoid { alpha: 4.0 }
    }

    pub fn atan() -> Self {
        Surrogate::ATan { alpha: 2.0 }
    }

    pub fn piecewise_leaky_relu() -> Self {
        Surrogate::PiecewiseLeakyReLU { w: 1.0, c: 0.01 }
    }

    pub fn piecewise_quadratic() -> Self {
        Surrogate::PiecewiseQuadratic { alpha: 1.0 }
    }

    /// Look up a standard function by name with its default parameters
    pub fn from_name(name: &str) -> Result<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "sigmoid" => Ok(Self::sigmoid()),
            "atan" | "arctan" => Ok(Self::atan()),
            "piecewise_leaky_relu" | "piecewiseleakyrelu" => Ok(Self::piecewise_leaky_relu()),
            "piecewise_quadratic" | "piecewisequadratic" => Ok(Self::piecewise_quadratic()),
            _ => Err(NeuralError::UnknownSurrogate(name.to_string())),
        }
    }

    /// Replace the sharpness parameter (`alpha`, or `w` for the leaky ReLU)
    pub fn with_alpha(self, alpha: f32) -> Self {
        match self {
            Surrogate::Sigmoid { .. } => Surrogate::Sigmoid { alpha },
            Surrogate::ATan { .. } => Surrogate::ATan { alpha },
            Surrogate::PiecewiseLeakyReLU { c, .. } => Surrogate::PiecewiseLeakyReLU { w: alpha, c },
            Surrogate::PiecewiseQuadratic { .. } => Surrogate::PiecewiseQuadratic { alpha },
        }
    }

    pub fn validate(&self) -> Result<()> {
        let (name, value) = match *self {
            Surrogate::Sigmoid { alpha }
            | Surrogate::ATan { alpha }
            | Surrogate::PiecewiseQuadratic { alpha } => ("surrogate.alpha", alpha),
            Surrogate::PiecewiseLeakyReLU { w, c } => {
                if !c.is_finite() {
                    return Err(NeuralError::invalid("surrogate.c", format!("must be finite, got {}", c)));
                }
                ("surrogate.w", w)
            }
        };
        if !(value.is_finite() && value > 0.0) {
            return Err(NeuralError::invalid(name, format!("must be positive, got {}", value)));
        }
        Ok(())
    }
}

impl SurrogateGradient for Surrogate {
    #[inline]
    fn grad(&self, margin: f32) -> f32 {
        match *self {
            Surrogate::Sigmoid { alpha } => {
                let sg = 1.0 / (1.0 + (-alpha * margin).exp());
                alpha * sg * (1.0 - sg)
            }
            Surrogate::ATan { alpha } => {
                let scaled = FRAC_PI_2 * alpha * margin;
                alpha / 2.0 / (1.0 + scaled * scaled)
            }
            Surrogate::PiecewiseLeakyReLU { w, c } => {
                if margin.abs() < w {
                    1.0 / (2.0 * w)
                } else {
                    c
                }
            }
            Surrogate::PiecewiseQuadratic { alpha } => {
                let abs = margin.abs();
                if abs <= 1.0 / alpha {
                    alpha - alpha * alpha * abs
                } else {
                    0.0
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Surrogate::Sigmoid { .. } => "sigmoid",
            Surrogate::ATan { .. } => "atan",
            Surrogate::PiecewiseLeakyReLU { .. } => "piecewise_leaky_relu",
            Surrogate::PiecewiseQuadratic { .. } => "piecewise_quadratic",
        }
    }
}

impl fmt::Display for Surrogate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Surrogate {
    type Err = NeuralError;

    fn from_str(s: &str) -> Result<Self> {
        Surrogate::from_name(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_values_at_threshold() {
        assert!((Surrogate::sigmoid().grad(0.0) - 1.0).abs() < 1e-6);
        assert!((Surrogate::atan().grad(0.0) - 1.0).abs() < 1e-6);
        assert_eq!(Surrogate::piecewise_leaky_relu().grad(0.0), 0.5);
        assert_eq!(Surrogate::piecewise_quadratic().grad(0.0), 1.0);
    }

    #[test]
    fn test_symmetric_and_decaying() {
        for name in Surrogate::NAMES {
            let surrogate = Surrogate::from_name(name).unwrap();
            assert_eq!(surrogate.name(), name);
            assert!((surrogate.grad(0.3) - surrogate.grad(-0.3)).abs() < 1e-6);
            assert!(surrogate.grad(0.0) >= surrogate.grad(0.5));
            assert!(surrogate.grad(50.0).is_finite());
        }
    }

    #[test]
    fn test_piecewise_support() {
        let quadratic = Surrogate::piecewise_quadratic().with_alpha(10.0);
        assert_eq!(quadratic.grad(0.2), 0.0);
        assert!((quadratic.grad(0.05) - 5.0).abs() < 1e-5);

        let leaky = Surrogate::piecewise_leaky_relu();
        assert_eq!(leaky.grad(1.5), 0.01);
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!("ATan".parse::<Surrogate>().unwrap(), Surrogate::atan());
        assert_eq!(
            Surrogate::from_name("erf"),
            Err(NeuralError::UnknownSurrogate("erf".to_string()))
        );
    }

    #[test]
    fn test_validation() {
        assert!(Surrogate::default().validate().is_ok());
        assert!(Surrogate::sigmoid().with_alpha(0.0).validate().is_err());
        assert!(Surrogate::piecewise_leaky_relu().with_alpha(-1.0).validate().is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn grad_is_finite_and_non_negative(margin in -1.0e4f32..1.0e4f32, index in 0usize..4) {
                let surrogate = Surrogate::from_name(Surrogate::NAMES[index]).unwrap();
                let grad = surrogate.grad(margin);
                prop_assert!(grad.is_finite());
                prop_assert!(grad >= 0.0);
            }
        }
    }
}
