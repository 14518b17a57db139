//! EBCDIC code page support
//!
//! Implements the CP037 (EBCDIC US/Canada) code page, the page mainframe
//! hosts use by default for 3270 sessions. The forward table is the full
//! 256-entry IBM mapping; the reverse direction is derived from it once, so
//! the two can never disagree.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::traits::TextCodec;
use crate::error::{ConfigError, ConfigResult};

/// Code page identifier for EBCDIC US/Canada
pub const CP037: u16 = 37;

/// EBCDIC space, also the byte written for unmappable characters
pub const EBCDIC_SPACE: u8 = 0x40;

/// CP037 to Unicode, indexed by EBCDIC byte (16 entries per row)
#[rustfmt::skip]
const EBCDIC_CP037_TO_UNICODE: [char; 256] = [
    // 0x00
    '\x00', '\x01', '\x02', '\x03', '\u{9C}', '\t', '\u{86}', '\x7F', '\u{97}', '\u{8D}', '\u{8E}', '\x0B', '\x0C', '\r', '\x0E', '\x0F',
    // 0x10
    '\x10', '\x11', '\x12', '\x13', '\u{9D}', '\u{85}', '\x08', '\u{87}', '\x18', '\x19', '\u{92}', '\u{8F}', '\x1C', '\x1D', '\x1E', '\x1F',
    // 0x20
    '\u{80}', '\u{81}', '\u{82}', '\u{83}', '\u{84}', '\n', '\x17', '\x1B', '\u{88}', '\u{89}', '\u{8A}', '\u{8B}', '\u{8C}', '\x05', '\x06', '\x07',
    // 0x30
    '\u{90}', '\u{91}', '\x16', '\u{93}', '\u{94}', '\u{95}', '\u{96}', '\x04', '\u{98}', '\u{99}', '\u{9A}', '\u{9B}', '\x14', '\x15', '\u{9E}', '\x1A',
    // 0x40
    ' ', '\u{A0}', '\u{E2}', '\u{E4}', '\u{E0}', '\u{E1}', '\u{E3}', '\u{E5}', '\u{E7}', '\u{F1}', '\u{A2}', '.', '<', '(', '+', '|',
    // 0x50
    '&', '\u{E9}', '\u{EA}', '\u{EB}', '\u{E8}', '\u{ED}', '\u{EE}', '\u{EF}', '\u{EC}', '\u{DF}', '!', '$', '*', ')', ';', '\u{AC}',
    // 0x60
    '-', '/', '\u{C2}', '\u{C4}', '\u{C0}', '\u{C1}', '\u{C3}', '\u{C5}', '\u{C7}', '\u{D1}', '\u{A6}', ',', '%', '_', '>', '?',
    // 0x70
    '\u{F8}', '\u{C9}', '\u{CA}', '\u{CB}', '\u{C8}', '\u{CD}', '\u{CE}', '\u{CF}', '\u{CC}', '`', ':', '#', '@', '\'', '=', '"',
    // 0x80
    '\u{D8}', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', '\u{AB}', '\u{BB}', '\u{F0}', '\u{FD}', '\u{FE}', '\u{B1}',
    // 0x90
    '\u{B0}', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', '\u{AA}', '\u{BA}', '\u{E6}', '\u{B8}', '\u{C6}', '\u{A4}',
    // 0xA0
    '\u{B5}', '~', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', '\u{A1}', '\u{BF}', '\u{D0}', '\u{DD}', '\u{DE}', '\u{AE}',
    // 0xB0
    '^', '\u{A3}', '\u{A5}', '\u{B7}', '\u{A9}', '\u{A7}', '\u{B6}', '\u{BC}', '\u{BD}', '\u{BE}', '[', ']', '\u{AF}', '\u{A8}', '\u{B4}', '\u{D7}',
    // 0xC0
    '{', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', '\u{AD}', '\u{F4}', '\u{F6}', '\u{F2}', '\u{F3}', '\u{F5}',
    // 0xD0
    '}', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', '\u{B9}', '\u{FB}', '\u{FC}', '\u{F9}', '\u{FA}', '\u{FF}',
    // 0xE0
    '\\', '\u{F7}', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '\u{B2}', '\u{D4}', '\u{D6}', '\u{D2}', '\u{D3}', '\u{D5}',
    // 0xF0
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', '\u{B3}', '\u{DB}', '\u{DC}', '\u{D9}', '\u{DA}', '\u{9F}',
];

static UNICODE_TO_EBCDIC_CP037: Lazy<HashMap<char, u8>> = Lazy::new(|| {
    EBCDIC_CP037_TO_UNICODE
        .iter()
        .enumerate()
        .map(|(byte, &ch)| (ch, byte as u8))
        .collect()
});

/// The CP037 codec
#[derive(Debug, Clone, Copy, Default)]
pub struct Cp037Codec;

impl TextCodec for Cp037Codec {
    fn code_page(&self) -> u16 {
        CP037
    }

    fn decode_byte(&self, byte: u8) -> char {
        ebcdic_to_ascii(byte)
    }

    fn encode_char(&self, ch: char) -> u8 {
        ascii_to_ebcdic(ch)
    }
}

/// Look up the codec for an IBM code page identifier
pub fn codec_for_page(page: u16) -> ConfigResult<Box<dyn TextCodec>> {
    match page {
        CP037 => Ok(Box::new(Cp037Codec)),
        _ => Err(ConfigError::UnsupportedCodePage { page }),
    }
}

/// Convert an EBCDIC byte to a character
///
/// ```
/// use tn3270r::protocol_common::ebcdic::ebcdic_to_ascii;
///
/// assert_eq!(ebcdic_to_ascii(0xC1), 'A');
/// assert_eq!(ebcdic_to_ascii(0x81), 'a');
/// assert_eq!(ebcdic_to_ascii(0xF0), '0');
/// ```
pub fn ebcdic_to_ascii(byte: u8) -> char {
    EBCDIC_CP037_TO_UNICODE[byte as usize]
}

/// Convert a character to an EBCDIC byte
///
/// Characters outside CP037 become an EBCDIC space (0x40).
///
/// ```
/// use tn3270r::protocol_common::ebcdic::ascii_to_ebcdic;
///
/// assert_eq!(ascii_to_ebcdic('A'), 0xC1);
/// assert_eq!(ascii_to_ebcdic('\u{2603}'), 0x40);
/// ```
pub fn ascii_to_ebcdic(ch: char) -> u8 {
    UNICODE_TO_EBCDIC_CP037
        .get(&ch)
        .copied()
        .unwrap_or(EBCDIC_SPACE)
}

/// Convert an EBCDIC byte slice to a String
pub fn ebcdic_to_ascii_string(bytes: &[u8]) -> String {
    Cp037Codec.decode(bytes)
}

/// Convert a string to EBCDIC bytes
pub fn ascii_to_ebcdic_vec(s: &str) -> Vec<u8> {
    Cp037Codec.encode(s)
}
