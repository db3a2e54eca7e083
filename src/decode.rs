// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::{
    bit_reader::BitReader,
    entropy_coding::huffman::HuffmanTables,
    error::{Error, Result},
    frame::{QuantTables, Scan, ScanDecoder, ZigZagIndexer},
    headers::{FrameHeader, Marker, ScanHeader, SegmentHeader},
    util::tracing_wrappers::*,
};

const MARKER_PREFIX: u8 = 0xff;

#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Skip APP0..APP15 segments and keep their payloads instead of failing.
    pub skip_application_segments: bool,
    /// Stop before the scan following this many decoded scans.
    pub max_scans: Option<usize>,
}

impl DecodeOptions {
    pub fn new() -> DecodeOptions {
        DecodeOptions {
            skip_application_segments: false,
            max_scans: None,
        }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Payload of an application segment, without its length field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSegment {
    pub index: u8,
    pub data: Vec<u8>,
}

/// Everything the segments seen so far have defined.
#[derive(Debug, Default)]
pub struct DecoderState {
    pub frame: Option<FrameHeader>,
    pub quant_tables: QuantTables,
    pub huffman_tables: HuffmanTables,
    pub zigzag: ZigZagIndexer,
    pub comment: String,
    pub scans: Vec<Scan>,
    pub restart_interval: u16,
    pub app_segments: Vec<AppSegment>,
}

#[derive(Debug)]
pub struct DecodedJpeg {
    pub frame: Option<FrameHeader>,
    pub quant_tables: QuantTables,
    pub huffman_tables: HuffmanTables,
    pub comment: String,
    pub scans: Vec<Scan>,
    pub restart_interval: u16,
    pub app_segments: Vec<AppSegment>,
}

impl From<DecoderState> for DecodedJpeg {
    fn from(state: DecoderState) -> Self {
        DecodedJpeg {
            frame: state.frame,
            quant_tables: state.quant_tables,
            huffman_tables: state.huffman_tables,
            comment: state.comment,
            scans: state.scans,
            restart_interval: state.restart_interval,
            app_segments: state.app_segments,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderStatus {
    /// Expecting a marker.
    Ready,
    /// EOI was read, the data ran out between segments, or the scan limit
    /// was reached.
    Done,
}

/// Walks the marker segments of a JPEG stream one at a time.
#[derive(Debug)]
pub struct Decoder<'a> {
    br: BitReader<'a>,
    options: DecodeOptions,
    state: DecoderState,
    status: DecoderStatus,
    current_marker: Option<Marker>,
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8], options: DecodeOptions) -> Decoder<'a> {
        Decoder {
            br: BitReader::new(data),
            options,
            state: DecoderState::default(),
            status: DecoderStatus::Ready,
            current_marker: None,
        }
    }

    /// Processes segments until done and hands over what they defined.
    pub fn decode(&mut self) -> Result<DecodedJpeg> {
        while self.status == DecoderStatus::Ready {
            self.step()?;
        }
        Ok(std::mem::take(&mut self.state).into())
    }

    /// Processes one marker segment.
    pub fn step(&mut self) -> Result<DecoderStatus> {
        if self.status == DecoderStatus::Done {
            return Ok(self.status);
        }
        let offset = self.br.byte_offset();
        let Some(prefix) = self.br.read_byte() else {
            warn!(offset, "data ended without EOI");
            self.status = DecoderStatus::Done;
            return Ok(self.status);
        };
        if prefix != MARKER_PREFIX {
            return Err(Error::MissingMarkerPrefix {
                found: prefix,
                offset,
            });
        }
        let mut code = self.br.read_u8()?;
        while code == MARKER_PREFIX {
            debug!(offset = self.br.byte_offset() - 1, "fill byte");
            code = self.br.read_u8()?;
        }
        let marker = Marker::from_u8(code).ok_or(Error::UnrecognizedMarker {
            marker: code,
            offset,
        })?;
        self.current_marker = Some(marker);
        debug!(%marker, offset, "marker");

        let br = &mut self.br;
        let state = &mut self.state;
        match marker {
            Marker::Soi => {}
            Marker::Eoi => self.status = DecoderStatus::Done,
            Marker::Sof(0) => read_frame_header(br, state)?,
            Marker::Sof(n) => return Err(Error::UnsupportedFeature(unsupported_frame_type(n))),
            Marker::Dht => define_huffman_tables(br, state)?,
            Marker::Dqt => define_quant_tables(br, state)?,
            Marker::Dac => return Err(Error::UnsupportedFeature("arithmetic conditioning")),
            Marker::Dnl => return Err(Error::UnsupportedFeature("define number of lines")),
            Marker::Dri => define_restart_interval(br, state)?,
            Marker::Sos => {
                if let Some(max_scans) = self.options.max_scans {
                    if state.scans.len() >= max_scans {
                        debug!(max_scans, "scan limit reached");
                        self.status = DecoderStatus::Done;
                        return Ok(self.status);
                    }
                }
                decode_scan(br, state)?
            }
            Marker::Rst(_) => {
                br.rewind_bytes(1);
                return Err(Error::UnsupportedFeature("restart intervals"));
            }
            Marker::App(index) if self.options.skip_application_segments => {
                read_app_segment(br, state, index)?
            }
            Marker::App(index) if index < 8 => {
                br.rewind_bytes(1);
                return Err(Error::UnsupportedFeature("application segments"));
            }
            Marker::Com => read_comment(br, state)?,
            Marker::App(_)
            | Marker::Jpg
            | Marker::Jpgn(_)
            | Marker::Dhp
            | Marker::Exp
            | Marker::Tem
            | Marker::Res(_) => {
                return Err(Error::UnrecognizedMarker {
                    marker: code,
                    offset,
                })
            }
        }
        Ok(self.status)
    }

    /// Offset of the next byte to read; after a failure, where decoding
    /// stopped.
    pub fn position(&self) -> usize {
        self.br.byte_offset()
    }

    /// The marker of the segment processed last.
    pub fn current_marker(&self) -> Option<Marker> {
        self.current_marker
    }

    pub fn status(&self) -> DecoderStatus {
        self.status
    }

    pub fn state(&self) -> &DecoderState {
        &self.state
    }
}

/// Decodes every segment of `data`.
pub fn decode(data: &[u8], options: DecodeOptions) -> Result<DecodedJpeg> {
    Decoder::new(data, options).decode()
}

fn unsupported_frame_type(n: u8) -> &'static str {
    match n {
        1 => "extended sequential DCT",
        2 => "progressive DCT",
        3 => "lossless sequential",
        5 => "differential sequential DCT",
        6 => "differential progressive DCT",
        7 => "differential lossless",
        _ => "arithmetic coding",
    }
}

/// Reads a segment length field and returns the number of bytes that follow.
fn read_length(br: &mut BitReader, marker: &'static str) -> Result<usize> {
    let length = br.read_u16()? as usize;
    if length < 2 {
        return Err(Error::InvalidSegmentLength { marker, length });
    }
    trace!(marker, length, "segment");
    Ok(length - 2)
}

fn read_frame_header(br: &mut BitReader, state: &mut DecoderState) -> Result<()> {
    let length = read_length(br, FrameHeader::MARKER_NAME)?;
    let frame = FrameHeader::read(br, length)?;
    if state.frame.is_some() {
        warn!("second frame header replaces the first");
    }
    state.frame = Some(frame);
    Ok(())
}

fn define_huffman_tables(br: &mut BitReader, state: &mut DecoderState) -> Result<()> {
    let length = read_length(br, "DHT")?;
    state.huffman_tables.read_segment(br, length)
}

fn define_quant_tables(br: &mut BitReader, state: &mut DecoderState) -> Result<()> {
    let length = read_length(br, "DQT")?;
    state
        .quant_tables
        .read_segment(br, length, &mut state.zigzag)
}

fn define_restart_interval(br: &mut BitReader, state: &mut DecoderState) -> Result<()> {
    let length = read_length(br, "DRI")?;
    if length != 2 {
        return Err(Error::InvalidSegmentLength {
            marker: "DRI",
            length: length + 2,
        });
    }
    let interval = br.read_u16()?;
    if interval != 0 {
        return Err(Error::UnsupportedFeature("restart intervals"));
    }
    state.restart_interval = interval;
    Ok(())
}

fn decode_scan(br: &mut BitReader, state: &mut DecoderState) -> Result<()> {
    let frame = state.frame.as_ref().ok_or(Error::MissingFrameHeader)?;
    let length = read_length(br, ScanHeader::MARKER_NAME)?;
    let header = ScanHeader::read(br, length)?;
    let scan = ScanDecoder::new(
        header,
        frame,
        &state.huffman_tables,
        &state.quant_tables,
        &mut state.zigzag,
    )?
    .decode(br)?;
    state.scans.push(scan);
    Ok(())
}

fn read_segment_payload<'a>(
    br: &mut BitReader<'a>,
    marker: &'static str,
) -> Result<&'a [u8]> {
    let length = read_length(br, marker)?;
    let payload = br
        .peek(length)
        .ok_or(Error::TruncatedStream(br.byte_offset() + br.remaining_bytes()))?;
    br.skip_bytes(length)?;
    Ok(payload)
}

fn read_app_segment(br: &mut BitReader, state: &mut DecoderState, index: u8) -> Result<()> {
    let data = read_segment_payload(br, "APPn")?;
    debug!(index, length = data.len(), "skipped application segment");
    state.app_segments.push(AppSegment {
        index,
        data: data.to_vec(),
    });
    Ok(())
}

fn read_comment(br: &mut BitReader, state: &mut DecoderState) -> Result<()> {
    let data = read_segment_payload(br, "COM")?;
    state.comment.extend(data.iter().map(|&b| b as char));
    trace!(comment = %state.comment, "comment");
    Ok(())
}
