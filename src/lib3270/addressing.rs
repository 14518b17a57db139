//! Buffer addressing for 3270
//!
//! A 12-bit buffer address travels as two bytes. Each byte carries six bits
//! of the address, translated through a fixed 64-symbol alphabet so that
//! every address byte is a printable EBCDIC graphic. The high six bits go
//! first.

use once_cell::sync::Lazy;

use crate::error::{ProtocolError, ProtocolResult};

/// Largest address the two-byte 12-bit form can carry
pub const MAX_ADDRESS: u16 = 0x0FFF;

/// Six-bit value to address byte
#[rustfmt::skip]
pub const ADDRESS_ALPHABET: [u8; 64] = [
    0x40, 0xC1, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0x4A, 0x4B, 0x4C, 0x4D, 0x4E, 0x4F,
    0x50, 0xD1, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0x5A, 0x5B, 0x5C, 0x5D, 0x5E, 0x5F,
    0x60, 0x61, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0x6A, 0x6B, 0x6C, 0x6D, 0x6E, 0x6F,
    0xF0, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0x7A, 0x7B, 0x7C, 0x7D, 0x7E, 0x7F,
];

/// Address byte to six-bit value; `None` for bytes outside the alphabet
static ALPHABET_INDEX: Lazy<[Option<u8>; 256]> = Lazy::new(|| {
    let mut index = [None; 256];
    for (value, &byte) in ADDRESS_ALPHABET.iter().enumerate() {
        index[byte as usize] = Some(value as u8);
    }
    index
});

/// Decode a 12-bit buffer address from two bytes
///
/// ```
/// use tn3270r::lib3270::addressing::decode_12bit_address;
///
/// assert_eq!(decode_12bit_address(0x40, 0xC5).unwrap(), 5);
/// assert!(decode_12bit_address(0x00, 0x40).is_err());
/// ```
pub fn decode_12bit_address(byte1: u8, byte2: u8) -> ProtocolResult<u16> {
    let high = decode_address_byte(byte1)? as u16;
    let low = decode_address_byte(byte2)? as u16;
    Ok((high << 6) | low)
}

/// Encode a 12-bit buffer address to two bytes
pub fn encode_12bit_address(address: u16) -> ProtocolResult<(u8, u8)> {
    if address > MAX_ADDRESS {
        return Err(ProtocolError::AddressOutOfRange {
            address: address as usize,
            limit: MAX_ADDRESS as usize + 1,
        });
    }
    let high = (address >> 6) & 0x3F;
    let low = address & 0x3F;
    Ok((ADDRESS_ALPHABET[high as usize], ADDRESS_ALPHABET[low as usize]))
}

/// Decode a single address byte (6 bits)
fn decode_address_byte(byte: u8) -> ProtocolResult<u8> {
    ALPHABET_INDEX[byte as usize].ok_or(ProtocolError::InvalidAddressByte { byte })
}
