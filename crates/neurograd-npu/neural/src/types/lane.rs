// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Lane Types
//!
//! A lane is the unit of work of one recurrence loop: one neuron for the
//! scalar paths (`f32`, `f16`) or two neurons for the paired half path
//! (`F16x2`). Update rules and gradient formulas are written once against
//! [`NeuralLane`] and are oblivious to how many neurons a lane carries.
//!
//! Half arithmetic rounds after every operation (`f16` ops evaluate in `f32`
//! and round back), so a paired lane produces bit-identical results to two
//! scalar half lanes.

use core::fmt;
use core::ops::{Add, Div, Mul, Sub};

use half::f16;

use super::numeric::NeuralValue;

/// Widest lane supported by any strategy
pub const MAX_LANE_WIDTH: usize = 2;

/// Arithmetic over one lane of neurons
pub trait NeuralLane:
    Copy
    + fmt::Debug
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    /// Storage element of the tensors this lane reads and writes
    type Element: NeuralValue;

    /// Neurons per lane
    const WIDTH: usize;

    /// Broadcast a scalar to every neuron of the lane
    fn splat(value: f32) -> Self;

    /// Pack `WIDTH` elements
    fn load(elements: &[Self::Element]) -> Self;

    /// Unpack into `WIDTH` elements
    fn store(self, out: &mut [Self::Element]);

    /// 1 where `self >= rhs`, 0 elsewhere
    fn ge_mask(self, rhs: Self) -> Self;

    /// Per neuron: `on_set` where the mask is non-zero, `on_clear` elsewhere
    fn select(self, on_set: Self, on_clear: Self) -> Self;

    /// `self * a + b`, fused where the element type allows it
    fn mul_add(self, a: Self, b: Self) -> Self;

    /// Apply a scalar function to every neuron (evaluated in `f32`)
    fn map<F: Fn(f32) -> f32>(self, f: F) -> Self;

    /// Sum of the lane's neurons, widened to `f32`
    fn horizontal_sum(self) -> f32;

    /// Value of one neuron, widened to `f32`
    fn extract(self, index: usize) -> f32;
}

impl NeuralLane for f32 {
    type Element = f32;
    const WIDTH: usize = 1;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        value
    }

    #[inline(always)]
    fn load(elements: &[f32]) -> Self {
        elements[0]
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        out[0] = self;
    }

    #[inline(always)]
    fn ge_mask(self, rhs: Self) -> Self {
        if self >= rhs {
            1.0
        } else {
            0.0
        }
    }

    #[inline(always)]
    fn select(self, on_set: Self, on_clear: Self) -> Self {
        if self != 0.0 {
            on_set
        } else {
            on_clear
        }
    }

    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        f32::mul_add(self, a, b)
    }

    #[inline(always)]
    fn map<F: Fn(f32) -> f32>(self, f: F) -> Self {
        f(self)
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f32 {
        self
    }

    #[inline(always)]
    fn extract(self, _index: usize) -> f32 {
        self
    }
}

impl NeuralLane for f16 {
    type Element = f16;
    const WIDTH: usize = 1;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        f16::from_f32(value)
    }

    #[inline(always)]
    fn load(elements: &[f16]) -> Self {
        elements[0]
    }

    #[inline(always)]
    fn store(self, out: &mut [f16]) {
        out[0] = self;
    }

    #[inline(always)]
    fn ge_mask(self, rhs: Self) -> Self {
        if self >= rhs {
            f16::ONE
        } else {
            f16::ZERO
        }
    }

    #[inline(always)]
    fn select(self, on_set: Self, on_clear: Self) -> Self {
        if self != f16::ZERO {
            on_set
        } else {
            on_clear
        }
    }

    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        f16::from_f32(self.to_f32().mul_add(a.to_f32(), b.to_f32()))
    }

    #[inline(always)]
    fn map<F: Fn(f32) -> f32>(self, f: F) -> Self {
        f16::from_f32(f(self.to_f32()))
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f32 {
        self.to_f32()
    }

    #[inline(always)]
    fn extract(self, _index: usize) -> f32 {
        self.to_f32()
    }
}

/// Two half-precision neurons processed as one lane
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct F16x2 {
    pub lo: f16,
    pub hi: f16,
}

impl F16x2 {
    pub const fn new(lo: f16, hi: f16) -> Self {
        Self { lo, hi }
    }

    #[inline(always)]
    fn zip_with(self, rhs: Self, f: impl Fn(f16, f16) -> f16) -> Self {
        Self::new(f(self.lo, rhs.lo), f(self.hi, rhs.hi))
    }
}

impl Add for F16x2 {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a + b)
    }
}

impl Sub for F16x2 {
    type Output = Self;

    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a - b)
    }
}

impl Mul for F16x2 {
    type Output = Self;

    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a * b)
    }
}

impl Div for F16x2 {
    type Output = Self;

    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        self.zip_with(rhs, |a, b| a / b)
    }
}

impl NeuralLane for F16x2 {
    type Element = f16;
    const WIDTH: usize = 2;

    #[inline(always)]
    fn splat(value: f32) -> Self {
        let half = f16::from_f32(value);
        Self::new(half, half)
    }

    #[inline(always)]
    fn load(elements: &[f16]) -> Self {
        Self::new(elements[0], elements[1])
    }

    #[inline(always)]
    fn store(self, out: &mut [f16]) {
        out[0] = self.lo;
        out[1] = self.hi;
    }

    #[inline(always)]
    fn ge_mask(self, rhs: Self) -> Self {
        self.zip_with(rhs, <f16 as NeuralLane>::ge_mask)
    }

    #[inline(always)]
    fn select(self, on_set: Self, on_clear: Self) -> Self {
        Self::new(
            <f16 as NeuralLane>::select(self.lo, on_set.lo, on_clear.lo),
            <f16 as NeuralLane>::select(self.hi, on_set.hi, on_clear.hi),
        )
    }

    #[inline(always)]
    fn mul_add(self, a: Self, b: Self) -> Self {
        Self::new(
            <f16 as NeuralLane>::mul_add(self.lo, a.lo, b.lo),
            <f16 as NeuralLane>::mul_add(self.hi, a.hi, b.hi),
        )
    }

    #[inline(always)]
    fn map<F: Fn(f32) -> f32>(self, f: F) -> Self {
        Self::new(
            <f16 as NeuralLane>::map(self.lo, &f),
            <f16 as NeuralLane>::map(self.hi, &f),
        )
    }

    #[inline(always)]
    fn horizontal_sum(self) -> f32 {
        self.lo.to_f32() + self.hi.to_f32()
    }

    #[inline(always)]
    fn extract(self, index: usize) -> f32 {
        if index == 0 {
            self.lo.to_f32()
        } else {
            self.hi.to_f32()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(value: f32) -> f16 {
        f16::from_f32(value)
    }

    #[test]
    fn test_ge_mask_includes_equality() {
        assert_eq!(1.0f32.ge_mask(1.0), 1.0);
        assert_eq!(0.999f32.ge_mask(1.0), 0.0);

        let pair = F16x2::new(h(1.0), h(0.5));
        assert_eq!(pair.ge_mask(F16x2::splat(1.0)), F16x2::new(f16::ONE, f16::ZERO));
    }

    #[test]
    fn test_pair_matches_two_scalar_half_lanes() {
        let a = F16x2::new(h(0.3), h(-1.7));
        let b = F16x2::new(h(0.7), h(2.9));
        let c = F16x2::new(h(-0.1), h(0.4));

        let fused = a.mul_add(b, c);
        assert_eq!(fused.lo, <f16 as NeuralLane>::mul_add(a.lo, b.lo, c.lo));
        assert_eq!(fused.hi, <f16 as NeuralLane>::mul_add(a.hi, b.hi, c.hi));

        let quotient = a / b;
        assert_eq!(quotient.lo, a.lo / b.lo);
        assert_eq!(quotient.hi, a.hi / b.hi);
    }

    #[test]
    fn test_pair_load_store() {
        let mut out = [f16::ZERO; 2];
        F16x2::load(&[h(1.5), h(2.5)]).store(&mut out);
        assert_eq!(out, [h(1.5), h(2.5)]);
        assert_eq!(F16x2::new(h(1.5), h(2.5)).horizontal_sum(), 4.0);
    }

    #[test]
    fn test_select_is_exact() {
        let reset = 0.25f32;
        assert_eq!(1.0f32.select(reset, 7.3), reset);
        assert_eq!(0.0f32.select(reset, 7.3), 7.3);
    }
}
