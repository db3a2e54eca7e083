// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::error::{Error, Result};
use crate::headers::SegmentHeader;
use crate::util::tracing_wrappers::*;
use crate::BLOCK_DIM;

const MAX_SAMPLING_FACTOR: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameComponent {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_table: u8,
}

impl FrameComponent {
    pub fn blocks_per_mcu(&self) -> usize {
        self.h_sampling as usize * self.v_sampling as usize
    }
}

/// Frame header of a baseline (SOF0) frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub precision: u8,
    /// Number of lines; 0 when it is only given by a later DNL segment.
    pub height: u16,
    pub width: u16,
    pub components: Vec<FrameComponent>,
    pub max_h_sampling: u8,
    pub max_v_sampling: u8,
}

impl FrameHeader {
    /// Looks up a component by id, returning its index in the frame too.
    pub fn component(&self, id: u8) -> Option<(usize, &FrameComponent)> {
        self.components.iter().enumerate().find(|(_, c)| c.id == id)
    }

    fn mcu_width(&self) -> usize {
        self.max_h_sampling as usize * BLOCK_DIM
    }

    fn mcu_height(&self) -> usize {
        self.max_v_sampling as usize * BLOCK_DIM
    }

    /// Number of MCUs per row of an interleaved scan.
    pub fn mcus_x(&self) -> usize {
        (self.width as usize).div_ceil(self.mcu_width())
    }

    /// Number of MCU rows of an interleaved scan, `None` if the height is
    /// not known.
    pub fn mcus_y(&self) -> Option<usize> {
        (self.height != 0).then(|| (self.height as usize).div_ceil(self.mcu_height()))
    }

    /// Size in blocks of a component's own sample grid, used by
    /// non-interleaved scans. The height is `None` if not known.
    pub fn component_blocks(&self, component: &FrameComponent) -> (usize, Option<usize>) {
        let samples = |size: u16, sampling: u8, max: u8| {
            (size as usize * sampling as usize).div_ceil(max as usize)
        };
        let x = samples(self.width, component.h_sampling, self.max_h_sampling).div_ceil(BLOCK_DIM);
        let y = (self.height != 0).then(|| {
            samples(self.height, component.v_sampling, self.max_v_sampling).div_ceil(BLOCK_DIM)
        });
        (x, y)
    }
}

impl SegmentHeader for FrameHeader {
    const MARKER_NAME: &'static str = "SOF0";

    fn read(br: &mut BitReader, length: usize) -> Result<FrameHeader> {
        if length < 6 {
            return Err(Self::invalid_length(length));
        }
        let precision = br.read_u8()?;
        let height = br.read_u16()?;
        let width = br.read_u16()?;
        let num_components = br.read_u8()? as usize;
        if length != 6 + 3 * num_components {
            return Err(Self::invalid_length(length));
        }
        if precision != 8 {
            warn!(precision, "baseline frame with non-8-bit precision");
        }
        let mut components = Vec::with_capacity(num_components);
        for _ in 0..num_components {
            let id = br.read_u8()?;
            let sampling = br.read_u8()?;
            let (h, v) = (sampling >> 4, sampling & 0x0f);
            if !(1..=MAX_SAMPLING_FACTOR).contains(&h) || !(1..=MAX_SAMPLING_FACTOR).contains(&v) {
                return Err(Error::InvalidSamplingFactor { component: id, h, v });
            }
            let quant_table = br.read_u8()?;
            components.push(FrameComponent {
                id,
                h_sampling: h,
                v_sampling: v,
                quant_table,
            });
        }
        let max_h_sampling = components.iter().map(|c| c.h_sampling).max().unwrap_or(1);
        let max_v_sampling = components.iter().map(|c| c.v_sampling).max().unwrap_or(1);
        let header = FrameHeader {
            precision,
            height,
            width,
            components,
            max_h_sampling,
            max_v_sampling,
        };
        debug!(?header, "frame header");
        Ok(header)
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    fn ycbcr_420() -> Vec<u8> {
        vec![
            8, 0, 17, 0, 33, 3, // precision, 17 lines, 33 samples, 3 components
            1, 0x22, 0, // Y
            2, 0x11, 1, // Cb
            3, 0x11, 1, // Cr
        ]
    }

    #[test]
    fn reads_components() {
        let data = ycbcr_420();
        let header = FrameHeader::read(&mut BitReader::new(&data), data.len()).unwrap();
        assert_eq!(header.height, 17);
        assert_eq!(header.width, 33);
        assert_eq!(header.components.len(), 3);
        assert_eq!((header.max_h_sampling, header.max_v_sampling), (2, 2));
        let (index, cb) = header.component(2).unwrap();
        assert_eq!(index, 1);
        assert_eq!(cb.quant_table, 1);
        assert_eq!(header.components[0].blocks_per_mcu(), 4);
        assert!(header.component(4).is_none());
    }

    #[test]
    fn mcu_geometry() {
        let data = ycbcr_420();
        let header = FrameHeader::read(&mut BitReader::new(&data), data.len()).unwrap();
        assert_eq!(header.mcus_x(), 3);
        assert_eq!(header.mcus_y(), Some(2));
        assert_eq!(header.component_blocks(&header.components[0]), (5, Some(3)));
        assert_eq!(header.component_blocks(&header.components[1]), (3, Some(2)));
    }

    #[test]
    fn unknown_height() {
        let mut data = ycbcr_420();
        data[1] = 0;
        data[2] = 0;
        let header = FrameHeader::read(&mut BitReader::new(&data), data.len()).unwrap();
        assert_eq!(header.mcus_y(), None);
        assert_eq!(header.component_blocks(&header.components[2]).1, None);
    }

    #[test]
    fn length_must_match_components() {
        let data = ycbcr_420();
        let result = FrameHeader::read(&mut BitReader::new(&data), data.len() + 1);
        assert!(matches!(
            result,
            Err(Error::InvalidSegmentLength {
                marker: "SOF0",
                length: 18
            })
        ));
    }

    #[test]
    fn sampling_factor_range() {
        let mut data = ycbcr_420();
        data[7] = 0x05;
        let result = FrameHeader::read(&mut BitReader::new(&data), data.len());
        assert!(matches!(
            result,
            Err(Error::InvalidSamplingFactor {
                component: 1,
                h: 0,
                v: 5
            })
        ));
    }
}
