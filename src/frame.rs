// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub mod coeff_order;
pub mod quant_tables;
pub mod scan;

pub use coeff_order::ZigZagIndexer;
pub use quant_tables::{QuantTable, QuantTables};
pub use scan::{CoefficientBlock, Scan, ScanDecoder};
