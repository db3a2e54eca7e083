// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

#![deny(unsafe_code)]
pub mod bit_reader;
pub mod block;
pub mod decode;
pub mod entropy_coding;
pub mod error;
pub mod frame;
pub mod headers;
pub mod util;

pub use decode::{decode, DecodeOptions, DecodedJpeg, Decoder};

/// Block size used for MCU geometry.
pub const BLOCK_DIM: usize = 8;
