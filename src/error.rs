// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use thiserror::Error;

use crate::entropy_coding::huffman::HUFFMAN_MAX_BITS;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Stream truncated at byte offset {0}")]
    TruncatedStream(usize),
    #[error("Expected marker prefix 0xff at byte offset {offset}, found {found:#04x}")]
    MissingMarkerPrefix { found: u8, offset: usize },
    #[error("Unrecognized marker {marker:#04x} at byte offset {offset}")]
    UnrecognizedMarker { marker: u8, offset: usize },
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(&'static str),
    #[error("Malformed Huffman table: {0}")]
    MalformedHuffmanTable(&'static str),
    #[error("Invalid Huffman code")]
    InvalidHuffmanCode,
    #[error("Undefined {0} table {1}")]
    UndefinedTable(&'static str, u8),
    #[error("Invalid table destination {0}, expected 0..=3")]
    InvalidTableDestination(u8),
    #[error("Invalid Huffman table class {0}")]
    InvalidTableClass(u8),
    #[error("Invalid quantization table precision {0}")]
    InvalidQuantPrecision(u8),
    #[error("Invalid length {length} for {marker} segment")]
    InvalidSegmentLength { marker: &'static str, length: usize },
    #[error("Invalid sampling factors {h}x{v} for component {component}")]
    InvalidSamplingFactor { component: u8, h: u8, v: u8 },
    #[error("Start of scan before frame header")]
    MissingFrameHeader,
    #[error("Scan references unknown component {0}")]
    UnknownScanComponent(u8),
    #[error("Magnitude category {0} too large, max is {}", HUFFMAN_MAX_BITS - 1)]
    InvalidMagnitudeCategory(u8),
    #[error("Invalid AC symbol {0:#04x}")]
    InvalidAcSymbol(u8),
    #[error("Marker {marker:#04x} inside entropy-coded data at byte offset {offset}")]
    PrematureMarker { marker: u8, offset: usize },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
