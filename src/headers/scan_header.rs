// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::error::{Error, Result};
use crate::headers::{FrameHeader, SegmentHeader};
use crate::util::tracing_wrappers::*;

const MAX_SCAN_COMPONENTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanComponent {
    pub id: u8,
    pub dc_table: u8,
    pub ac_table: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHeader {
    pub components: Vec<ScanComponent>,
    pub spectral_start: u8,
    pub spectral_end: u8,
    pub approx_high: u8,
    pub approx_low: u8,
}

impl ScanHeader {
    /// Checks that the scan codes whole sequential blocks of components the
    /// frame declares.
    pub fn validate(&self, frame: &FrameHeader) -> Result<()> {
        if (
            self.spectral_start,
            self.spectral_end,
            self.approx_high,
            self.approx_low,
        ) != (0, 63, 0, 0)
        {
            return Err(Error::UnsupportedFeature(
                "spectral selection or successive approximation",
            ));
        }
        for component in &self.components {
            if frame.component(component.id).is_none() {
                return Err(Error::UnknownScanComponent(component.id));
            }
        }
        Ok(())
    }

    pub fn is_interleaved(&self) -> bool {
        self.components.len() > 1
    }
}

impl SegmentHeader for ScanHeader {
    const MARKER_NAME: &'static str = "SOS";

    fn read(br: &mut BitReader, length: usize) -> Result<ScanHeader> {
        if length < 1 {
            return Err(Self::invalid_length(length));
        }
        let num_components = br.read_u8()? as usize;
        if num_components == 0
            || num_components > MAX_SCAN_COMPONENTS
            || length != 4 + 2 * num_components
        {
            return Err(Self::invalid_length(length));
        }
        let components = (0..num_components)
            .map(|_| -> Result<ScanComponent> {
                let id = br.read_u8()?;
                let tables = br.read_u8()?;
                Ok(ScanComponent {
                    id,
                    dc_table: tables >> 4,
                    ac_table: tables & 0x0f,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let spectral_start = br.read_u8()?;
        let spectral_end = br.read_u8()?;
        let approx = br.read_u8()?;
        let header = ScanHeader {
            components,
            spectral_start,
            spectral_end,
            approx_high: approx >> 4,
            approx_low: approx & 0x0f,
        };
        debug!(?header, "scan header");
        Ok(header)
    }
}
