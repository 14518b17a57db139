//! Trait seams shared by the 3270 components
//!
//! The screen model never hard-codes a code page: it talks to a
//! [`TextCodec`], so another single-byte EBCDIC page can be plugged in
//! without touching the decoder.

use std::fmt;

/// Single-byte code page converter between host bytes and display text
///
/// Implementations must map exactly one byte to one `char` and back, so that
/// a decoded screen of N cells is N characters long and encoded text of N
/// characters occupies N cells.
pub trait TextCodec: Send + Sync + fmt::Debug {
    /// IBM code page identifier (37 for US/Canada EBCDIC)
    fn code_page(&self) -> u16;

    /// Convert one host byte to a character
    fn decode_byte(&self, byte: u8) -> char;

    /// Convert one character to a host byte
    fn encode_char(&self, ch: char) -> u8;

    /// Convert host bytes to text, one character per byte
    fn decode(&self, bytes: &[u8]) -> String {
        bytes.iter().map(|&b| self.decode_byte(b)).collect()
    }

    /// Convert text to host bytes, one byte per character
    fn encode(&self, text: &str) -> Vec<u8> {
        text.chars().map(|ch| self.encode_char(ch)).collect()
    }
}
