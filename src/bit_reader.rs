// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt::Debug;

use crate::error::{Error, Result};
use byteorder::{BigEndian, ByteOrder};

/// Reads bits and bytes, most significant bit first, from a sequence of bytes.
///
/// Reading past the end of the data does not fail: the reader returns `None`,
/// stays where it is and remembers that it ran out of data (see
/// [`BitReader::is_exhausted`]). The `read_u8`/`read_u16`/`read_bits` helpers
/// turn that condition into [`Error::TruncatedStream`].
#[derive(Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_index: usize,
    // Next bit to read within `data[byte_index]`, 7 is the most significant.
    bit_index: u8,
    exhausted: bool,
}

impl Debug for BitReader<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "BitReader{{ data: [{} bytes], byte_index: {}, bit_index: {}, exhausted: {} }}",
            self.data.len(),
            self.byte_index,
            self.bit_index,
            self.exhausted
        )
    }
}

impl<'a> BitReader<'a> {
    /// Constructs a BitReader for a given range of data.
    pub fn new(data: &'a [u8]) -> BitReader<'a> {
        BitReader {
            data,
            byte_index: 0,
            bit_index: 7,
            exhausted: false,
        }
    }

    /// Reads the next bit.
    /// ```
    /// # use jpeg_coeffs::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0b1000_0000]);
    /// assert_eq!(br.read_bit(), Some(1));
    /// assert_eq!(br.read_bit(), Some(0));
    /// ```
    pub fn read_bit(&mut self) -> Option<u8> {
        let Some(&byte) = self.data.get(self.byte_index) else {
            self.exhausted = true;
            return None;
        };
        let bit = (byte >> self.bit_index) & 1;
        if self.bit_index == 0 {
            self.bit_index = 7;
            self.byte_index += 1;
        } else {
            self.bit_index -= 1;
        }
        self.exhausted = false;
        Some(bit)
    }

    /// Reads the next full byte, starting at the current byte. Any bits of the
    /// current byte that were already read are dropped.
    /// ```
    /// # use jpeg_coeffs::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0xff, 0xd8]);
    /// assert_eq!(br.read_byte(), Some(0xff));
    /// assert_eq!(br.read_byte(), Some(0xd8));
    /// assert_eq!(br.read_byte(), None);
    /// assert!(br.is_exhausted());
    /// ```
    pub fn read_byte(&mut self) -> Option<u8> {
        let Some(&byte) = self.data.get(self.byte_index) else {
            self.exhausted = true;
            return None;
        };
        self.byte_index += 1;
        self.bit_index = 7;
        self.exhausted = false;
        Some(byte)
    }

    /// Reads one byte, failing if the data ends.
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_byte()
            .ok_or(Error::TruncatedStream(self.byte_index))
    }

    /// Reads a big-endian 16-bit value, failing if the data ends.
    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self
            .peek(2)
            .ok_or(Error::TruncatedStream(self.data.len()))?;
        let value = BigEndian::read_u16(bytes);
        self.skip_bytes(2)?;
        Ok(value)
    }

    /// Reads `num` bits, most significant first, failing if the data ends.
    /// ```
    /// # use jpeg_coeffs::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0b1011_0001]);
    /// assert_eq!(br.read_bits(3)?, 0b101);
    /// assert_eq!(br.read_bits(5)?, 0b10001);
    /// assert!(br.read_bits(1).is_err());
    /// # Ok::<(), jpeg_coeffs::error::Error>(())
    /// ```
    pub fn read_bits(&mut self, num: usize) -> Result<u16> {
        debug_assert!(num <= 16);
        let mut value = 0u16;
        for _ in 0..num {
            let bit = self
                .read_bit()
                .ok_or(Error::TruncatedStream(self.byte_index))?;
            value = (value << 1) | bit as u16;
        }
        Ok(value)
    }

    /// Returns the next `num` bytes, starting at the current byte, without
    /// consuming them.
    pub fn peek(&self, num: usize) -> Option<&'a [u8]> {
        let end = self.byte_index.checked_add(num)?;
        self.data.get(self.byte_index..end)
    }

    /// Skips `num` whole bytes, starting at the current byte.
    pub fn skip_bytes(&mut self, num: usize) -> Result<()> {
        if self.remaining_bytes() < num {
            self.byte_index = self.data.len();
            self.bit_index = 7;
            self.exhausted = true;
            return Err(Error::TruncatedStream(self.data.len()));
        }
        self.byte_index += num;
        self.bit_index = 7;
        Ok(())
    }

    /// Drops the unread bits of a partially read byte.
    pub fn skip_to_byte_boundary(&mut self) {
        if self.bit_index != 7 {
            self.bit_index = 7;
            self.byte_index += 1;
        }
    }

    /// Moves back by `num` bits, stopping at the start of the data.
    /// ```
    /// # use jpeg_coeffs::bit_reader::BitReader;
    /// let mut br = BitReader::new(&[0xa5, 0x0f]);
    /// br.read_bits(11)?;
    /// br.rewind_bits(8);
    /// assert_eq!(br.position(), (0, 4));
    /// br.rewind_bits(100);
    /// assert_eq!(br.position(), (0, 7));
    /// # Ok::<(), jpeg_coeffs::error::Error>(())
    /// ```
    pub fn rewind_bits(&mut self, num: usize) {
        let target = self.total_bits_read().saturating_sub(num);
        self.byte_index = target / 8;
        self.bit_index = 7 - (target % 8) as u8;
        self.clear_exhausted_if_in_bounds();
    }

    /// Moves back by `num` bytes, stopping at the start of the data. The bit
    /// position within the byte is kept.
    pub fn rewind_bytes(&mut self, num: usize) {
        self.byte_index = self.byte_index.saturating_sub(num);
        self.clear_exhausted_if_in_bounds();
    }

    fn clear_exhausted_if_in_bounds(&mut self) {
        if self.byte_index < self.data.len() {
            self.exhausted = false;
        }
    }

    /// Number of bytes not yet started.
    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.byte_index)
    }

    /// Whether a read was attempted past the end of the data since the last
    /// successful read or in-bounds rewind.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Whether the next bit read starts a new byte.
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_index == 7
    }

    /// Offset of the byte holding the next bit.
    pub fn byte_offset(&self) -> usize {
        self.byte_index
    }

    /// Returns `(byte_index, bit_index)`, with `bit_index` counting down from 7.
    pub fn position(&self) -> (usize, u8) {
        (self.byte_index, self.bit_index)
    }

    /// Number of bits consumed since the start of the data.
    pub fn total_bits_read(&self) -> usize {
        self.byte_index * 8 + (7 - self.bit_index) as usize
    }

    /// The bits of the current byte that have not been read yet, and how many
    /// there are. Returns `None` when aligned.
    pub fn unread_bits_in_byte(&self) -> Option<(u8, u8)> {
        if self.is_byte_aligned() {
            return None;
        }
        let byte = *self.data.get(self.byte_index)?;
        let count = self.bit_index + 1;
        Some((byte & ((1u16 << count) - 1) as u8, count))
    }

    /// The byte just before the current one, if any.
    pub fn previous_byte(&self) -> Option<u8> {
        self.byte_index
            .checked_sub(1)
            .and_then(|i| self.data.get(i).copied())
    }
}
