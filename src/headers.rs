// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

pub mod frame_header;
pub mod marker;
pub mod scan_header;

use crate::bit_reader::BitReader;
use crate::error::{Error, Result};

pub use frame_header::{FrameComponent, FrameHeader};
pub use marker::Marker;
pub use scan_header::{ScanComponent, ScanHeader};

/// A header that occupies a whole marker segment.
pub trait SegmentHeader: Sized {
    const MARKER_NAME: &'static str;

    /// Parses the segment body. `length` counts the bytes after the two-byte
    /// length field.
    fn read(br: &mut BitReader, length: usize) -> Result<Self>;

    fn invalid_length(length: usize) -> Error {
        Error::InvalidSegmentLength {
            marker: Self::MARKER_NAME,
            length: length + 2,
        }
    }
}
