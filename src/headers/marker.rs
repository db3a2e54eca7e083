// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

/// Marker codes of ISO/IEC 10918-1 Table B.1 (the byte after the 0xff prefix).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// Start of frame, `n` in 0..=15 except 4, 8 and 12.
    ///  - SOF(0): Baseline DCT
    Sof(u8),
    /// Define Huffman table(s)
    Dht,
    /// Reserved for JPEG extensions
    Jpg,
    /// Define arithmetic coding conditioning(s)
    Dac,
    /// Restart with modulo 8 count `m`
    Rst(u8),
    /// Start of image
    Soi,
    /// End of image
    Eoi,
    /// Start of scan
    Sos,
    /// Define quantization table(s)
    Dqt,
    /// Define number of lines
    Dnl,
    /// Define restart interval
    Dri,
    /// Define hierarchical progression
    Dhp,
    /// Expand reference component(s)
    Exp,
    /// Application segment `n`, 0..=15
    App(u8),
    /// Reserved for JPEG extensions, 0..=13
    Jpgn(u8),
    /// Comment
    Com,
    /// For temporary private use in arithmetic coding
    Tem,
    /// Reserved
    Res(u8),
}

impl Marker {
    /// Maps a marker code to a marker. 0x00 (a stuffed byte) and 0xff (a fill
    /// byte) are not markers.
    pub fn from_u8(code: u8) -> Option<Marker> {
        use self::Marker::*;
        Some(match code {
            0x00 | 0xff => return None,
            0x01 => Tem,
            0x02..=0xbf => Res(code),
            0xc4 => Dht,
            0xc8 => Jpg,
            0xcc => Dac,
            0xc0..=0xcf => Sof(code - 0xc0),
            0xd0..=0xd7 => Rst(code - 0xd0),
            0xd8 => Soi,
            0xd9 => Eoi,
            0xda => Sos,
            0xdb => Dqt,
            0xdc => Dnl,
            0xdd => Dri,
            0xde => Dhp,
            0xdf => Exp,
            0xe0..=0xef => App(code - 0xe0),
            0xf0..=0xfd => Jpgn(code - 0xf0),
            0xfe => Com,
        })
    }

    pub fn code(self) -> u8 {
        use self::Marker::*;
        match self {
            Sof(n) => 0xc0 + n,
            Dht => 0xc4,
            Jpg => 0xc8,
            Dac => 0xcc,
            Rst(m) => 0xd0 + m,
            Soi => 0xd8,
            Eoi => 0xd9,
            Sos => 0xda,
            Dqt => 0xdb,
            Dnl => 0xdc,
            Dri => 0xdd,
            Dhp => 0xde,
            Exp => 0xdf,
            App(n) => 0xe0 + n,
            Jpgn(n) => 0xf0 + n,
            Com => 0xfe,
            Tem => 0x01,
            Res(code) => code,
        }
    }

    /// Whether a two-byte length field follows the marker.
    pub fn has_length(self) -> bool {
        !matches!(
            self,
            Marker::Soi | Marker::Eoi | Marker::Rst(_) | Marker::Tem
        )
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use self::Marker::*;
        match self {
            Sof(n) => write!(f, "SOF{n}"),
            Dht => write!(f, "DHT"),
            Jpg => write!(f, "JPG"),
            Dac => write!(f, "DAC"),
            Rst(m) => write!(f, "RST{m}"),
            Soi => write!(f, "SOI"),
            Eoi => write!(f, "EOI"),
            Sos => write!(f, "SOS"),
            Dqt => write!(f, "DQT"),
            Dnl => write!(f, "DNL"),
            Dri => write!(f, "DRI"),
            Dhp => write!(f, "DHP"),
            Exp => write!(f, "EXP"),
            App(n) => write!(f, "APP{n}"),
            Jpgn(n) => write!(f, "JPG{n}"),
            Com => write!(f, "COM"),
            Tem => write!(f, "TEM"),
            Res(code) => write!(f, "RES({code:#04x})"),
        }
    }
}

#[cfg(test)]
mod test {
    use test_log::test;

    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=255u8 {
            match Marker::from_u8(code) {
                Some(marker) => assert_eq!(marker.code(), code),
                None => assert!(code == 0x00 || code == 0xff),
            }
        }
    }

    #[test]
    fn frame_markers() {
        assert_eq!(Marker::from_u8(0xc0), Some(Marker::Sof(0)));
        assert_eq!(Marker::from_u8(0xc2), Some(Marker::Sof(2)));
        assert_eq!(Marker::from_u8(0xc4), Some(Marker::Dht));
        assert_eq!(Marker::from_u8(0xcf), Some(Marker::Sof(15)));
        assert_eq!(Marker::from_u8(0xd3), Some(Marker::Rst(3)));
        assert_eq!(Marker::Sof(1).to_string(), "SOF1");
        assert!(!Marker::Rst(0).has_length());
        assert!(Marker::App(1).has_length());
    }
}
