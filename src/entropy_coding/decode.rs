// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use crate::bit_reader::BitReader;
use crate::entropy_coding::huffman::{HuffmanTable, HUFFMAN_MAX_BITS};
use crate::error::{Error, Result};
use crate::util::tracing_wrappers::*;

/// Largest magnitude category a coefficient can use.
pub const MAX_MAGNITUDE_CATEGORY: u8 = HUFFMAN_MAX_BITS as u8 - 1;

/// Turns the `category` bits that follow a Huffman symbol into a signed value.
///
/// A leading 0 bit marks a negative value: `bits - (2^category - 1)`.
/// ```
/// # use jpeg_coeffs::entropy_coding::decode::extend;
/// assert_eq!(extend(0b011, 3), -4);
/// assert_eq!(extend(0b101, 3), 5);
/// assert_eq!(extend(0, 0), 0);
/// ```
pub fn extend(bits: u16, category: u8) -> i32 {
    if category == 0 {
        return 0;
    }
    let value = bits as i32;
    if value < 1 << (category - 1) {
        value - ((1 << category) - 1)
    } else {
        value
    }
}

/// Reads entropy-coded data: a [`BitReader`] that hides stuffed zero bytes
/// and refuses to read into a marker.
#[derive(Debug)]
pub struct EntropyReader<'r, 'a> {
    br: &'r mut BitReader<'a>,
}

impl<'r, 'a> EntropyReader<'r, 'a> {
    pub fn new(br: &'r mut BitReader<'a>) -> Self {
        EntropyReader { br }
    }

    pub fn read_bit(&mut self) -> Result<u8> {
        if self.br.is_byte_aligned() {
            if let Some(&[0xff, marker]) = self.br.peek(2) {
                if marker != 0 {
                    return Err(Error::PrematureMarker {
                        marker,
                        offset: self.br.byte_offset(),
                    });
                }
            }
        }
        let bit = self
            .br
            .read_bit()
            .ok_or(Error::TruncatedStream(self.br.byte_offset()))?;
        if self.br.is_byte_aligned() && self.br.previous_byte() == Some(0xff) {
            // The 0xff just consumed was data, drop the zero stuffed after it.
            self.br.skip_bytes(1)?;
        }
        Ok(bit)
    }

    pub fn read_bits(&mut self, num: u8) -> Result<u16> {
        let mut value = 0u16;
        for _ in 0..num {
            value = (value << 1) | self.read_bit()? as u16;
        }
        Ok(value)
    }

    pub fn decode_symbol(&mut self, table: &HuffmanTable) -> Result<u8> {
        table.decode(|| self.read_bit())
    }

    /// Reads a magnitude field of `category` bits and sign-extends it.
    pub fn read_magnitude(&mut self, category: u8) -> Result<i32> {
        if category > MAX_MAGNITUDE_CATEGORY {
            return Err(Error::InvalidMagnitudeCategory(category));
        }
        let bits = self.read_bits(category)?;
        Ok(extend(bits, category))
    }

    /// Returns the code of the marker that follows, if the remaining bits of
    /// the current byte are padding (all ones) and a marker comes next.
    pub fn next_marker(&self) -> Option<u8> {
        let skip = match self.br.unread_bits_in_byte() {
            None => 0,
            Some((bits, count)) => {
                if bits as u16 != (1u16 << count) - 1 {
                    return None;
                }
                // A padding byte that is all ones is itself stuffed.
                if self.br.peek(1) == Some(&[0xff][..]) {
                    2
                } else {
                    1
                }
            }
        };
        match self.br.peek(skip + 2).map(|bytes| &bytes[skip..]) {
            Some(&[0xff, marker]) if marker != 0 => Some(marker),
            _ => None,
        }
    }

    /// Drops padding bits so the underlying reader sits on the next marker.
    pub fn finish(self) -> Result<()> {
        if let Some((bits, count)) = self.br.unread_bits_in_byte() {
            if bits as u16 != (1u16 << count) - 1 {
                debug!(bits, count, "non-one padding bits at end of scan");
            }
            let current = self.br.peek(1);
            self.br.skip_to_byte_boundary();
            if current == Some(&[0xff][..]) && self.br.peek(1) == Some(&[0x00][..]) {
                self.br.skip_bytes(1)?;
            }
        }
        Ok(())
    }

    pub fn byte_offset(&self) -> usize {
        self.br.byte_offset()
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn sign_magnitude() {
        assert_eq!(extend(0b011, 3), 3 - 7);
        assert_eq!(extend(0b101, 3), 5);
        assert_eq!(extend(0b0, 1), -1);
        assert_eq!(extend(0b1, 1), 1);
        assert_eq!(extend(0, 11), -2047);
        assert_eq!(extend(2047, 11), 2047);
    }

    #[test]
    fn extend_stays_in_category() {
        arbtest::arbtest(|u| {
            let category = u.int_in_range(1..=MAX_MAGNITUDE_CATEGORY)?;
            let bits = u.int_in_range(0..=((1u32 << category) - 1))? as u16;
            let value = extend(bits, category).unsigned_abs();
            assert!(value >= 1 << (category - 1));
            assert!(value < 1 << category);
            assert_eq!(extend(bits, category) > 0, bits >> (category - 1) == 1);
            Ok(())
        });
    }

    #[test]
    fn stuffed_bytes_are_data() {
        let data = [0xff, 0x00, 0b1010_0000, 0xff, 0xd9];
        let mut br = BitReader::new(&data);
        let mut reader = EntropyReader::new(&mut br);
        assert_eq!(reader.read_bits(8).unwrap(), 0xff);
        assert_eq!(reader.byte_offset(), 2);
        assert_eq!(reader.read_bits(3).unwrap(), 0b101);
        assert_eq!(reader.next_marker(), None);
        assert_eq!(reader.read_bits(5).unwrap(), 0);
        assert_eq!(reader.next_marker(), Some(0xd9));
        assert!(matches!(
            reader.read_bit(),
            Err(Error::PrematureMarker {
                marker: 0xd9,
                offset: 3
            })
        ));
    }

    #[test]
    fn padding_before_marker() {
        let data = [0b0101_1111, 0xff, 0xd9];
        let mut br = BitReader::new(&data);
        let mut reader = EntropyReader::new(&mut br);
        assert_eq!(reader.read_bits(2).unwrap(), 0b01);
        assert_eq!(reader.next_marker(), None);
        assert_eq!(reader.read_bit().unwrap(), 0);
        assert_eq!(reader.next_marker(), Some(0xd9));
        reader.finish().unwrap();
        assert_eq!(br.byte_offset(), 1);
    }

    #[test]
    fn all_ones_padding_byte_is_stuffed() {
        let data = [0xff, 0x00, 0xff, 0xd9];
        let mut br = BitReader::new(&data);
        let mut reader = EntropyReader::new(&mut br);
        reader.read_bits(2).unwrap();
        assert_eq!(reader.next_marker(), Some(0xd9));
        reader.finish().unwrap();
        assert_eq!(br.byte_offset(), 2);
    }

    #[test]
    fn decodes_symbols_and_magnitudes() {
        let mut counts = [0u8; HUFFMAN_MAX_BITS];
        counts[1] = 2;
        let table = HuffmanTable::build(&counts, &[3, 0]).unwrap();
        // "00" -> category 3, then "011" -> -4, then "01" -> category 0.
        let data = [0b0001_1011, 0xff, 0xd9];
        let mut br = BitReader::new(&data);
        let mut reader = EntropyReader::new(&mut br);
        let category = reader.decode_symbol(&table).unwrap();
        assert_eq!(category, 3);
        assert_eq!(reader.read_magnitude(category).unwrap(), -4);
        let category = reader.decode_symbol(&table).unwrap();
        assert_eq!(reader.read_magnitude(category).unwrap(), 0);
        assert!(matches!(
            reader.read_magnitude(16),
            Err(Error::InvalidMagnitudeCategory(16))
        ));
    }

    #[test]
    fn truncated_data() {
        let data = [0x80];
        let mut br = BitReader::new(&data);
        let mut reader = EntropyReader::new(&mut br);
        assert_eq!(reader.read_bits(8).unwrap(), 0x80);
        assert!(matches!(reader.read_bit(), Err(Error::TruncatedStream(1))));
    }
}
