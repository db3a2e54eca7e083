// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use jpeg_coeffs::decode::{DecodeOptions, Decoder};
use jpeg_coeffs::entropy_coding::huffman::TableClass;
use jpeg_coeffs::error::Error;
use jpeg_coeffs::headers::Marker;
use test_log::test;

const SOI: [u8; 2] = [0xff, 0xd8];
const EOI: [u8; 2] = [0xff, 0xd9];

fn segment(code: u8, payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0xff, code];
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// DQT for an all-ones 8x8 table, plus DC table 0 ("0" -> 0, "1" -> 3) and
/// AC table 0 ("0" -> EOB, "1" -> run 0 size 1).
fn tables() -> Vec<u8> {
    let mut out = Vec::new();
    let mut dqt = vec![0x00];
    dqt.extend_from_slice(&[1; 64]);
    out.extend(segment(0xdb, &dqt));
    for (class, values) in [(0x00, [0x00, 0x03]), (0x10, [0x00, 0x01])] {
        let mut dht = vec![class, 2];
        dht.extend_from_slice(&[0; 15]);
        dht.extend_from_slice(&values);
        out.extend(segment(0xc4, &dht));
    }
    out
}

fn sof0(height: u16, width: u16, components: &[(u8, u8)]) -> Vec<u8> {
    let mut payload = vec![8];
    payload.extend_from_slice(&height.to_be_bytes());
    payload.extend_from_slice(&width.to_be_bytes());
    payload.push(components.len() as u8);
    for &(id, sampling) in components {
        payload.extend_from_slice(&[id, sampling, 0]);
    }
    segment(0xc0, &payload)
}

fn sos(ids: &[u8]) -> Vec<u8> {
    let mut payload = vec![ids.len() as u8];
    for &id in ids {
        payload.extend_from_slice(&[id, 0x00]);
    }
    payload.extend_from_slice(&[0, 63, 0]);
    segment(0xda, &payload)
}

fn jpeg(frame: Vec<u8>, scan: Vec<u8>, entropy_coded: &[u8]) -> Vec<u8> {
    let mut out = SOI.to_vec();
    out.extend(tables());
    out.extend(frame);
    out.extend(scan);
    out.extend_from_slice(entropy_coded);
    out.extend_from_slice(&EOI);
    out
}

#[test]
fn quantization_table_only() {
    let mut data = SOI.to_vec();
    data.extend_from_slice(&[0xff, 0xdb, 0x00, 0x43, 0x00]);
    data.extend_from_slice(&[1; 64]);
    data.extend_from_slice(&EOI);
    let decoded = jpeg_coeffs::decode(&data, DecodeOptions::new()).unwrap();
    let table = decoded.quant_tables.get(0).unwrap();
    assert_eq!(table.dim(), 8);
    assert!(table.matrix.as_slice().iter().all(|&v| v == 1));
    assert!(decoded.frame.is_none());
    assert!(decoded.scans.is_empty());
    assert!(decoded.comment.is_empty());
}

#[test]
fn extended_sequential_is_unsupported() {
    let data = [0xff, 0xd8, 0xff, 0xc1, 0x00, 0x0b];
    let mut decoder = Decoder::new(&data, DecodeOptions::new());
    match decoder.decode() {
        Err(Error::UnsupportedFeature(feature)) => assert_eq!(feature, "extended sequential DCT"),
        other => panic!("unexpected result {other:?}"),
    }
    assert_eq!(decoder.position(), 4);
    assert_eq!(decoder.current_marker(), Some(Marker::Sof(1)));
}

#[test]
fn single_block() {
    // "1" DC category 3, "101" = 5, "1" AC 0/1, "1" = +1, "0" EOB, "1" padding.
    let data = jpeg(sof0(8, 8, &[(1, 0x11)]), sos(&[1]), &[0b1101_1101]);
    let decoded = jpeg_coeffs::decode(&data, DecodeOptions::new()).unwrap();
    let frame = decoded.frame.as_ref().unwrap();
    assert_eq!((frame.width, frame.height), (8, 8));
    assert!(decoded.huffman_tables.get(0, TableClass::Ac).is_ok());
    assert_eq!(decoded.scans.len(), 1);
    let blocks = &decoded.scans[0].blocks;
    assert_eq!(blocks.len(), 1);
    let matrix = &blocks[0].matrix;
    assert_eq!(matrix[(0, 0)], 5);
    assert_eq!(matrix[(0, 1)], 1);
    assert_eq!(matrix.as_slice().iter().filter(|&&v| v != 0).count(), 2);
}

#[test]
fn dc_is_predicted_from_previous_block() {
    // Block 1: "1" + "101" (5), "0" EOB. Block 2: "1" + "011" (-4), "0" EOB.
    // 11010 10110 111111 -> 0xd5 0xbf
    let data = jpeg(sof0(8, 16, &[(1, 0x11)]), sos(&[1]), &[0xd5, 0xbf]);
    let decoded = jpeg_coeffs::decode(&data, DecodeOptions::new()).unwrap();
    let dcs: Vec<i32> = decoded.scans[0]
        .blocks
        .iter()
        .map(|b| b.matrix[(0, 0)])
        .collect();
    assert_eq!(dcs, [5, 1]);
}

#[test]
fn stuffed_zero_is_skipped() {
    // 11111111 -> DC "1" + "111" (7), AC "1" + "1", AC "1" + "1";
    // then 0111 1111 -> "0" EOB and padding.
    let data = jpeg(sof0(8, 8, &[(1, 0x11)]), sos(&[1]), &[0xff, 0x00, 0x7f]);
    let decoded = jpeg_coeffs::decode(&data, DecodeOptions::new()).unwrap();
    let matrix = &decoded.scans[0].blocks[0].matrix;
    assert_eq!(matrix[(0, 0)], 7);
    assert_eq!(matrix[(0, 1)], 1);
    assert_eq!(matrix[(1, 0)], 1);
}

#[test]
fn interleaved_420_mcu() {
    // Six blocks with DC "0" and AC "0" each: twelve zero bits.
    let frame = sof0(16, 16, &[(1, 0x22), (2, 0x11), (3, 0x11)]);
    let data = jpeg(frame, sos(&[1, 2, 3]), &[0x00, 0x0f]);
    let decoded = jpeg_coeffs::decode(&data, DecodeOptions::new()).unwrap();
    let scan = &decoded.scans[0];
    assert_eq!(scan.num_mcus, 1);
    let ids: Vec<u8> = scan.blocks.iter().map(|b| b.component_id).collect();
    assert_eq!(ids, [1, 1, 1, 1, 2, 3]);
}

#[test]
fn unknown_height_runs_to_marker() {
    // Three blocks, DC "1" + "001" (-6) then EOB "0": 10010 10010 10010 1
    let data = jpeg(sof0(0, 8, &[(1, 0x11)]), sos(&[1]), &[0x94, 0xa5]);
    let decoded = jpeg_coeffs::decode(&data, DecodeOptions::new()).unwrap();
    let dcs: Vec<i32> = decoded.scans[0]
        .blocks
        .iter()
        .map(|b| b.matrix[(0, 0)])
        .collect();
    assert_eq!(dcs, [-6, -12, -18]);
}

#[test]
fn truncated_scan() {
    // Sixteen blocks, but data for four.
    let mut data = jpeg(sof0(32, 32, &[(1, 0x11)]), sos(&[1]), &[0x00]);
    data.truncate(data.len() - 2);
    let mut decoder = Decoder::new(&data, DecodeOptions::new());
    assert!(matches!(decoder.decode(), Err(Error::TruncatedStream(_))));
    assert_eq!(decoder.current_marker(), Some(Marker::Sos));
}
