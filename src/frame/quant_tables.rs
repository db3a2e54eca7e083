// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::bit_reader::BitReader;
use crate::block::Matrix;
use crate::error::{Error, Result};
use crate::frame::coeff_order::ZigZagIndexer;
use crate::util::tracing_wrappers::*;
use crate::BLOCK_DIM;

pub const NUM_QUANT_TABLES: usize = 4;

#[repr(u8)]
#[derive(Debug, FromPrimitive, Clone, Copy, PartialEq, Eq)]
pub enum QuantPrecision {
    Bits8 = 0,
    Bits16 = 1,
}

impl QuantPrecision {
    pub fn bytes_per_element(self) -> usize {
        match self {
            QuantPrecision::Bits8 => 1,
            QuantPrecision::Bits16 => 2,
        }
    }
}

impl TryFrom<u8> for QuantPrecision {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or(Error::InvalidQuantPrecision(value))
    }
}

/// A quantization matrix in natural (row-major) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    pub precision: QuantPrecision,
    pub matrix: Matrix<u16>,
}

impl QuantTable {
    pub fn dim(&self) -> usize {
        self.matrix.dim()
    }
}

#[derive(Debug, Default)]
pub struct QuantTables {
    tables: [Option<QuantTable>; NUM_QUANT_TABLES],
}

impl QuantTables {
    /// Stores a table given its values in zig-zag order, replacing any table
    /// previously defined at `destination`.
    pub fn define(
        &mut self,
        destination: u8,
        precision: QuantPrecision,
        dim: usize,
        zigzag_values: &[u16],
        indexer: &mut ZigZagIndexer,
    ) -> Result<()> {
        let slot = self
            .tables
            .get_mut(destination as usize)
            .ok_or(Error::InvalidTableDestination(destination))?;
        let mut matrix = Matrix::new(dim);
        for (&position, &value) in indexer.indices_for(dim).iter().zip(zigzag_values) {
            matrix[position] = value;
        }
        if slot.is_some() {
            debug!(destination, "redefining quantization table");
        }
        *slot = Some(QuantTable { precision, matrix });
        Ok(())
    }

    pub fn get(&self, destination: u8) -> Result<&QuantTable> {
        self.tables
            .get(destination as usize)
            .and_then(Option::as_ref)
            .ok_or(Error::UndefinedTable("quantization", destination))
    }

    /// Defined tables as `(destination, table)`.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &QuantTable)> {
        self.tables
            .iter()
            .enumerate()
            .filter_map(|(i, table)| table.as_ref().map(|table| (i as u8, table)))
    }

    /// Reads the body of a DQT segment, `length` bytes after the length field.
    pub fn read_segment(
        &mut self,
        br: &mut BitReader,
        length: usize,
        indexer: &mut ZigZagIndexer,
    ) -> Result<()> {
        let end = br.byte_offset() + length;
        let invalid_length = Error::InvalidSegmentLength {
            marker: "DQT",
            length: length + 2,
        };
        while br.byte_offset() < end {
            let precision_and_destination = br.read_u8()?;
            let precision = QuantPrecision::try_from(precision_and_destination >> 4)?;
            let destination = precision_and_destination & 0x0f;
            let width = precision.bytes_per_element();
            let dim = table_dim(end - br.byte_offset(), width);
            let num_bytes = dim * dim * width;
            if dim == 0 || br.byte_offset() + num_bytes > end {
                return Err(invalid_length);
            }
            let bytes = br
                .peek(num_bytes)
                .ok_or(Error::TruncatedStream(br.byte_offset()))?;
            let values: Vec<u16> = match precision {
                QuantPrecision::Bits8 => bytes.iter().map(|&b| b as u16).collect(),
                QuantPrecision::Bits16 => bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                    .collect(),
            };
            br.skip_bytes(num_bytes)?;
            trace!(destination, ?precision, dim, ?values, "quantization table");
            self.define(destination, precision, dim, &values, indexer)?;
        }
        if br.byte_offset() != end {
            return Err(invalid_length);
        }
        Ok(())
    }
}

/// Dimension of the next table of a DQT segment: the square root of the
/// element count when the rest of the segment is exactly one square table,
/// the standard block size otherwise.
fn table_dim(remaining: usize, width: usize) -> usize {
    if remaining % width == 0 {
        let count = remaining / width;
        let dim = (count as f64).sqrt() as usize;
        if dim * dim == count {
            return dim;
        }
    }
    BLOCK_DIM
}
