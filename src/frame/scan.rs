// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::rc::Rc;

use crate::bit_reader::BitReader;
use crate::block::Matrix;
use crate::entropy_coding::decode::EntropyReader;
use crate::entropy_coding::huffman::{HuffmanTable, HuffmanTables, TableClass};
use crate::error::{Error, Result};
use crate::frame::coeff_order::ZigZagIndexer;
use crate::frame::quant_tables::QuantTables;
use crate::headers::{FrameHeader, ScanHeader};
use crate::util::tracing_wrappers::*;

const EOB: u8 = 0x00;
const ZRL: u8 = 0xf0;
const ZRL_RUN: usize = 16;

/// Quantized DCT coefficients of one block, in natural order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientBlock {
    pub component_id: u8,
    pub matrix: Matrix<i32>,
}

/// The output of one SOS segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    pub header: ScanHeader,
    pub num_mcus: usize,
    /// Blocks in decode order: MCU by MCU, and within an MCU, component by
    /// component in scan order, row-major within each component.
    pub blocks: Vec<CoefficientBlock>,
}

#[derive(Debug)]
struct ComponentState<'t> {
    id: u8,
    blocks_per_mcu: usize,
    dim: usize,
    order: Rc<[(usize, usize)]>,
    dc_table: &'t HuffmanTable,
    ac_table: &'t HuffmanTable,
    dc_predictor: i32,
}

/// Decodes the entropy-coded segment that follows an SOS header.
#[derive(Debug)]
pub struct ScanDecoder<'t> {
    header: ScanHeader,
    components: Vec<ComponentState<'t>>,
    // None when the frame height is unknown.
    num_mcus: Option<usize>,
}

impl<'t> ScanDecoder<'t> {
    pub fn new(
        header: ScanHeader,
        frame: &FrameHeader,
        huffman_tables: &'t HuffmanTables,
        quant_tables: &QuantTables,
        indexer: &mut ZigZagIndexer,
    ) -> Result<ScanDecoder<'t>> {
        header.validate(frame)?;
        let interleaved = header.is_interleaved();
        let mut components = Vec::with_capacity(header.components.len());
        let mut num_mcus = None;
        for scan_component in &header.components {
            let (_, frame_component) = frame
                .component(scan_component.id)
                .ok_or(Error::UnknownScanComponent(scan_component.id))?;
            let dim = quant_tables.get(frame_component.quant_table)?.dim();
            let blocks_per_mcu = if interleaved {
                frame_component.blocks_per_mcu()
            } else {
                let (blocks_x, blocks_y) = frame.component_blocks(frame_component);
                num_mcus = blocks_y.map(|blocks_y| blocks_x * blocks_y);
                1
            };
            components.push(ComponentState {
                id: scan_component.id,
                blocks_per_mcu,
                dim,
                order: indexer.indices_for(dim),
                dc_table: huffman_tables.get(scan_component.dc_table, TableClass::Dc)?,
                ac_table: huffman_tables.get(scan_component.ac_table, TableClass::Ac)?,
                dc_predictor: 0,
            });
        }
        if interleaved {
            num_mcus = frame.mcus_y().map(|mcus_y| frame.mcus_x() * mcus_y);
        }
        Ok(ScanDecoder {
            header,
            components,
            num_mcus,
        })
    }

    /// Decodes MCUs until the frame is covered or a marker shows up between
    /// two MCUs, leaving `br` on that marker.
    pub fn decode(mut self, br: &mut BitReader) -> Result<Scan> {
        let mut reader = EntropyReader::new(br);
        let mut blocks = Vec::new();
        let mut mcu = 0;
        while self.num_mcus != Some(mcu) {
            if let Some(_marker) = reader.next_marker() {
                if let Some(_expected) = self.num_mcus {
                    warn!(
                        mcu,
                        expected = _expected,
                        marker = _marker,
                        "scan ended before the last MCU"
                    );
                }
                break;
            }
            for component in self.components.iter_mut() {
                for _ in 0..component.blocks_per_mcu {
                    let matrix = decode_block(&mut reader, component)?;
                    blocks.push(CoefficientBlock {
                        component_id: component.id,
                        matrix,
                    });
                }
            }
            mcu += 1;
        }
        reader.finish()?;
        debug!(mcu, blocks = blocks.len(), "decoded scan");
        Ok(Scan {
            header: self.header,
            num_mcus: mcu,
            blocks,
        })
    }
}

fn decode_block(
    reader: &mut EntropyReader,
    component: &mut ComponentState,
) -> Result<Matrix<i32>> {
    let num_coeffs = component.dim * component.dim;
    let mut matrix = Matrix::new(component.dim);

    let category = reader.decode_symbol(component.dc_table)?;
    let diff = reader.read_magnitude(category)?;
    component.dc_predictor = component.dc_predictor.wrapping_add(diff);
    matrix[component.order[0]] = component.dc_predictor;

    let mut k = 1;
    while k < num_coeffs {
        let symbol = reader.decode_symbol(component.ac_table)?;
        let run = (symbol >> 4) as usize;
        let size = symbol & 0x0f;
        match symbol {
            EOB => break,
            ZRL => {
                k += ZRL_RUN;
                continue;
            }
            _ if size == 0 => return Err(Error::InvalidAcSymbol(symbol)),
            _ => {}
        }
        k += run;
        if k >= num_coeffs {
            warn!(symbol, k, "AC run goes past the end of the block");
            break;
        }
        let value = reader.read_magnitude(size)?;
        matrix[component.order[k]] = value;
        k += 1;
    }
    trace!(component = component.id, ?matrix, "block");
    Ok(matrix)
}
