// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::bit_reader::BitReader;
use crate::error::{Error, Result};
use crate::util::tracing_wrappers::*;

pub const HUFFMAN_MAX_BITS: usize = 16;
pub const HUFFMAN_MAX_SYMBOLS: usize = 256;
/// Number of Huffman table destinations per class.
pub const NUM_HUFFMAN_SLOTS: usize = 4;

/// Coefficient class a Huffman table is used for.
#[repr(u8)]
#[derive(Debug, FromPrimitive, Clone, Copy, PartialEq, Eq)]
pub enum TableClass {
    Dc = 0,
    Ac = 1,
}

impl TryFrom<u8> for TableClass {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or(Error::InvalidTableClass(value))
    }
}

#[derive(Debug, Clone, Default)]
struct Node {
    children: [Option<u16>; 2],
    value: Option<u8>,
    // Leaf, or every path below is taken.
    full: bool,
}

/// A canonical Huffman code stored as a binary tree in an arena.
///
/// Codes are placed in the order they are declared: every value takes the
/// leftmost free position at the depth given by its code length. For a
/// histogram of lengths in increasing order this reproduces the code
/// assignment of ISO/IEC 10918-1 Annex C.
#[derive(Debug, Clone)]
pub struct HuffmanTable {
    nodes: Vec<Node>,
    counts: [u8; HUFFMAN_MAX_BITS],
    values: Vec<u8>,
}

/// A code of a [`HuffmanTable`], `length` bits of `code` read MSB first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanCode {
    pub code: u16,
    pub length: u8,
    pub value: u8,
}

impl HuffmanTable {
    /// Builds the tree from the number of codes of each length (1 to 16 bits)
    /// and the symbol values in declaration order.
    pub fn build(counts: &[u8; HUFFMAN_MAX_BITS], values: &[u8]) -> Result<HuffmanTable> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if total > HUFFMAN_MAX_SYMBOLS {
            return Err(Error::MalformedHuffmanTable("more than 256 codes"));
        }
        if total != values.len() {
            return Err(Error::MalformedHuffmanTable(
                "value count does not match code lengths",
            ));
        }
        let mut table = HuffmanTable {
            nodes: vec![Node::default()],
            counts: *counts,
            values: values.to_vec(),
        };
        let lengths = counts
            .iter()
            .enumerate()
            .flat_map(|(i, &count)| std::iter::repeat(i + 1).take(count as usize));
        for (length, &value) in lengths.zip(values) {
            if !table.insert(0, length, value) {
                return Err(Error::MalformedHuffmanTable(
                    "code lengths over-subscribe the code space",
                ));
            }
        }
        trace!(?counts, nodes = table.nodes.len(), "built Huffman table");
        Ok(table)
    }

    fn insert(&mut self, node: usize, length: usize, value: u8) -> bool {
        if self.nodes[node].full {
            return false;
        }
        if length == 0 {
            if self.nodes[node].children != [None, None] {
                return false;
            }
            self.nodes[node].value = Some(value);
            self.nodes[node].full = true;
            return true;
        }
        for side in 0..2 {
            let child = match self.nodes[node].children[side] {
                Some(child) => child as usize,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children[side] = Some(child as u16);
                    child
                }
            };
            if self.insert(child, length - 1, value) {
                let full = self.nodes[node]
                    .children
                    .iter()
                    .all(|c| c.is_some_and(|c| self.nodes[c as usize].full));
                self.nodes[node].full = full;
                return true;
            }
        }
        false
    }

    /// Starts a decode walk at the root.
    pub fn cursor(&self) -> HuffmanCursor<'_> {
        HuffmanCursor {
            table: self,
            node: 0,
        }
    }

    /// Decodes one symbol, pulling bits from `next_bit`.
    pub fn decode(&self, mut next_bit: impl FnMut() -> Result<u8>) -> Result<u8> {
        let mut cursor = self.cursor();
        loop {
            cursor.step(next_bit()?)?;
            if let Some(value) = cursor.symbol_value() {
                return Ok(value);
            }
        }
    }

    pub fn counts(&self) -> &[u8; HUFFMAN_MAX_BITS] {
        &self.counts
    }

    pub fn values(&self) -> &[u8] {
        &self.values
    }

    /// All codes of the table, in increasing code order.
    pub fn codes(&self) -> Vec<HuffmanCode> {
        let mut codes = Vec::with_capacity(self.values.len());
        let mut stack = vec![(0usize, 0u16, 0u8)];
        while let Some((node, code, length)) = stack.pop() {
            let node = &self.nodes[node];
            if let Some(value) = node.value {
                codes.push(HuffmanCode {
                    code,
                    length,
                    value,
                });
                continue;
            }
            // Right first so that the left branch is visited first.
            for side in [1u16, 0] {
                if let Some(child) = node.children[side as usize] {
                    stack.push((child as usize, (code << 1) | side, length + 1));
                }
            }
        }
        codes
    }
}

/// Position of a bit-by-bit walk through a [`HuffmanTable`].
#[derive(Debug, Clone)]
pub struct HuffmanCursor<'a> {
    table: &'a HuffmanTable,
    node: usize,
}

impl HuffmanCursor<'_> {
    /// Follows the left (0) or right (1) branch.
    pub fn step(&mut self, bit: u8) -> Result<()> {
        let next = self.table.nodes[self.node].children[(bit & 1) as usize]
            .ok_or(Error::InvalidHuffmanCode)?;
        self.node = next as usize;
        Ok(())
    }

    pub fn is_symbol_complete(&self) -> bool {
        self.table.nodes[self.node].value.is_some()
    }

    pub fn symbol_value(&self) -> Option<u8> {
        self.table.nodes[self.node].value
    }

    pub fn reset(&mut self) {
        self.node = 0;
    }
}

/// Huffman tables by destination and class, as installed by DHT segments.
#[derive(Debug, Default)]
pub struct HuffmanTables {
    tables: [[Option<HuffmanTable>; 2]; NUM_HUFFMAN_SLOTS],
}

impl HuffmanTables {
    pub fn define(&mut self, destination: u8, class: TableClass, table: HuffmanTable) -> Result<()> {
        let slot = self
            .tables
            .get_mut(destination as usize)
            .ok_or(Error::InvalidTableDestination(destination))?;
        if slot[class as usize].is_some() {
            debug!(destination, ?class, "redefining Huffman table");
        }
        slot[class as usize] = Some(table);
        Ok(())
    }

    pub fn get(&self, destination: u8, class: TableClass) -> Result<&HuffmanTable> {
        let kind = match class {
            TableClass::Dc => "DC Huffman",
            TableClass::Ac => "AC Huffman",
        };
        self.tables
            .get(destination as usize)
            .and_then(|slot| slot[class as usize].as_ref())
            .ok_or(Error::UndefinedTable(kind, destination))
    }

    /// Defined tables as `(destination, class, table)`.
    pub fn iter(&self) -> impl Iterator<Item = (u8, TableClass, &HuffmanTable)> {
        self.tables.iter().enumerate().flat_map(|(dest, slot)| {
            [TableClass::Dc, TableClass::Ac]
                .into_iter()
                .filter_map(move |class| {
                    slot[class as usize]
                        .as_ref()
                        .map(|table| (dest as u8, class, table))
                })
        })
    }

    /// Reads the body of a DHT segment, `length` bytes after the length field.
    pub fn read_segment(&mut self, br: &mut BitReader, length: usize) -> Result<()> {
        let end = br.byte_offset() + length;
        while br.byte_offset() < end {
            let class_and_destination = br.read_u8()?;
            let class = TableClass::try_from(class_and_destination >> 4)?;
            let destination = class_and_destination & 0x0f;
            let counts: [u8; HUFFMAN_MAX_BITS] = array_init::try_array_init(|_| br.read_u8())?;
            let num_values: usize = counts.iter().map(|&c| c as usize).sum();
            if br.byte_offset() + num_values > end {
                return Err(Error::InvalidSegmentLength {
                    marker: "DHT",
                    length: length + 2,
                });
            }
            let values = br
                .peek(num_values)
                .ok_or(Error::TruncatedStream(br.byte_offset()))?;
            br.skip_bytes(num_values)?;
            let table = HuffmanTable::build(&counts, values)?;
            debug!(destination, ?class, num_values, "defined Huffman table");
            self.define(destination, class, table)?;
        }
        if br.byte_offset() != end {
            return Err(Error::InvalidSegmentLength {
                marker: "DHT",
                length: length + 2,
            });
        }
        Ok(())
    }
}
