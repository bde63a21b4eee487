// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # Precision-Pairing Adapter
//!
//! Chooses how neurons are packed into lanes and owns the "pad before, strip
//! after" contract of the paired half path.
//!
//! | strategy     | element | neurons per lane | used for                        |
//! |--------------|---------|------------------|---------------------------------|
//! | `Scalar`     | `f32`   | 1                | standard precision              |
//! | `Paired`     | `f16`   | 2                | reduced precision, IF and LIF   |
//! | `ScalarHalf` | `f16`   | 1                | reduced precision, PLIF         |
//!
//! A paired lane `i` couples neuron `i` with neuron `i + N/2`. An odd
//! population gets one trailing dummy neuron (zero input, zero state, zero
//! incoming gradient) that is removed from every result.

use core::fmt;

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, CowArray, Ix1, Ix2};
use neurograd_npu_neural::types::MAX_LANE_WIDTH;
use neurograd_npu_neural::{NeuralError, NeuralLane, NeuralValue, NeuronModelKind, Precision};

/// Lane packing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionStrategy {
    Scalar,
    Paired,
    ScalarHalf,
}

impl ExecutionStrategy {
    /// Default strategy for a model at a precision
    pub fn select(model: NeuronModelKind, precision: Precision) -> Self {
        match (precision, model) {
            (Precision::Standard, _) => ExecutionStrategy::Scalar,
            (Precision::Reduced, NeuronModelKind::ParametricLeakyIntegrateAndFire) => {
                ExecutionStrategy::ScalarHalf
            }
            (Precision::Reduced, _) => ExecutionStrategy::Paired,
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            ExecutionStrategy::Scalar => Precision::Standard,
            ExecutionStrategy::Paired | ExecutionStrategy::ScalarHalf => Precision::Reduced,
        }
    }

    pub fn lane_width(&self) -> usize {
        match self {
            ExecutionStrategy::Paired => 2,
            ExecutionStrategy::Scalar | ExecutionStrategy::ScalarHalf => 1,
        }
    }

    /// Reject an explicit strategy that stores a different precision
    pub fn check_precision(&self, precision: Precision) -> Result<(), NeuralError> {
        if self.precision() == precision {
            Ok(())
        } else {
            Err(NeuralError::InvalidParameter {
                name: "strategy",
                reason: format!("{} runs at {}, layer requests {}", self, self.precision(), precision),
            })
        }
    }
}

impl fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExecutionStrategy::Scalar => "scalar",
            ExecutionStrategy::Paired => "paired",
            ExecutionStrategy::ScalarHalf => "scalar-half",
        };
        f.write_str(name)
    }
}

/// Neuron columns covered by one lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneColumns {
    columns: [usize; MAX_LANE_WIDTH],
    width: usize,
}

impl LaneColumns {
    pub fn as_slice(&self) -> &[usize] {
        &self.columns[..self.width]
    }
}

/// Lane layout for one population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanePlan {
    strategy: ExecutionStrategy,
    neuron_count: usize,
    padded_count: usize,
}

impl LanePlan {
    pub fn new(strategy: ExecutionStrategy, neuron_count: usize) -> Self {
        let width = strategy.lane_width();
        Self {
            strategy,
            neuron_count,
            padded_count: neuron_count.div_ceil(width) * width,
        }
    }

    pub fn strategy(&self) -> ExecutionStrategy {
        self.strategy
    }

    /// Real neurons, as seen by the caller
    pub fn neuron_count(&self) -> usize {
        self.neuron_count
    }

    /// Neurons the engines run on
    pub fn padded_count(&self) -> usize {
        self.padded_count
    }

    pub fn is_padded(&self) -> bool {
        self.padded_count != self.neuron_count
    }

    pub fn lane_count(&self) -> usize {
        self.padded_count / self.strategy.lane_width()
    }

    /// Column `k` of lane `i` is `i + k * lane_count`
    pub fn lane_columns(&self, lane: usize) -> LaneColumns {
        let width = self.strategy.lane_width();
        let stride = self.lane_count();
        let mut columns = [0; MAX_LANE_WIDTH];
        for (k, column) in columns.iter_mut().take(width).enumerate() {
            *column = lane + k * stride;
        }
        LaneColumns { columns, width }
    }

    /// `[T, N]` to `[T, padded]`, zero-filling dummy columns
    pub fn pad_columns<'a>(&self, data: ArrayView2<'a, f32>) -> CowArray<'a, f32, Ix2> {
        if !self.is_padded() {
            return CowArray::from(data);
        }
        let mut padded = Array2::zeros((data.nrows(), self.padded_count));
        padded.slice_mut(s![.., ..self.neuron_count]).assign(&data);
        CowArray::from(padded)
    }

    pub fn pad_vector<'a>(&self, data: ArrayView1<'a, f32>) -> CowArray<'a, f32, Ix1> {
        if !self.is_padded() {
            return CowArray::from(data);
        }
        let mut padded = Array1::zeros(self.padded_count);
        padded.slice_mut(s![..self.neuron_count]).assign(&data);
        CowArray::from(padded)
    }

    /// `[rows, padded]` to an owned `[rows, N]`
    pub fn strip_columns(&self, data: ArrayView2<'_, f32>) -> Array2<f32> {
        data.slice(s![.., ..self.neuron_count]).to_owned()
    }

    pub fn strip_vector(&self, data: ArrayView1<'_, f32>) -> Array1<f32> {
        data.slice(s![..self.neuron_count]).to_owned()
    }
}

/// Pack one row of a padded `f32` tensor into a lane, rounding to the lane element
#[inline(always)]
pub(crate) fn gather<L: NeuralLane>(data: &ArrayView2<'_, f32>, row: usize, columns: &[usize]) -> L {
    let mut elements = [<L::Element as NeuralValue>::zero(); MAX_LANE_WIDTH];
    for (element, &column) in elements.iter_mut().zip(columns) {
        *element = L::Element::from_f32(data[[row, column]]);
    }
    L::load(&elements[..L::WIDTH])
}

#[inline(always)]
pub(crate) fn gather_vector<L: NeuralLane>(data: &ArrayView1<'_, f32>, columns: &[usize]) -> L {
    let mut elements = [<L::Element as NeuralValue>::zero(); MAX_LANE_WIDTH];
    for (element, &column) in elements.iter_mut().zip(columns) {
        *element = L::Element::from_f32(data[column]);
    }
    L::load(&elements[..L::WIDTH])
}

/// Unpack a lane into `L::WIDTH` widened values
#[inline(always)]
pub(crate) fn scatter<L: NeuralLane>(value: L, out: &mut [f32]) {
    let mut elements = [<L::Element as NeuralValue>::zero(); MAX_LANE_WIDTH];
    value.store(&mut elements[..L::WIDTH]);
    for (slot, element) in out.iter_mut().zip(&elements[..L::WIDTH]) {
        *slot = element.to_f32();
    }
}

/// Value as stored by the lane element type
#[inline(always)]
pub(crate) fn round_to_element<L: NeuralLane>(value: f32) -> f32 {
    L::Element::from_f32(value).to_f32()
}
