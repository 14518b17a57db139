//! Telnet protocol codes and sequence builders
//!
//! Only the subset a TN3270 client needs: the negotiation verbs,
//! subnegotiation framing and End-Of-Record (RFC 854, RFC 885).

/// Telnet command codes (RFC 854)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelnetCommand {
    /// Interpret As Command - 255 (0xFF)
    IAC = 255,
    /// Don't - 254 (0xFE)
    DONT = 254,
    /// Do - 253 (0xFD)
    DO = 253,
    /// Won't - 252 (0xFC)
    WONT = 252,
    /// Will - 251 (0xFB)
    WILL = 251,
    /// Subnegotiation Begin - 250 (0xFA)
    SB = 250,
    /// No Operation - 241 (0xF1)
    NOP = 241,
    /// Subnegotiation End - 240 (0xF0)
    SE = 240,
    /// End Of Record - 239 (0xEF)
    EOR = 239,
}

impl TelnetCommand {
    /// Convert a byte to a TelnetCommand
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            255 => Some(TelnetCommand::IAC),
            254 => Some(TelnetCommand::DONT),
            253 => Some(TelnetCommand::DO),
            252 => Some(TelnetCommand::WONT),
            251 => Some(TelnetCommand::WILL),
            250 => Some(TelnetCommand::SB),
            241 => Some(TelnetCommand::NOP),
            240 => Some(TelnetCommand::SE),
            239 => Some(TelnetCommand::EOR),
            _ => None,
        }
    }
}

/// IAC as a plain byte, for scanning
pub const IAC: u8 = TelnetCommand::IAC as u8;

/// EOR as a plain byte, for scanning
pub const EOR: u8 = TelnetCommand::EOR as u8;

/// Record terminator appended to every outbound 3270 record
pub const IAC_EOR: [u8; 2] = [IAC, EOR];

/// Telnet options a TN3270 client negotiates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelnetOption {
    /// Binary Transmission - 0
    Binary = 0,
    /// Echo - 1
    Echo = 1,
    /// Terminal Type - 24
    TerminalType = 24,
    /// End of Record - 25
    EndOfRecord = 25,
}

impl TelnetOption {
    /// Convert a byte to a TelnetOption
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(TelnetOption::Binary),
            1 => Some(TelnetOption::Echo),
            24 => Some(TelnetOption::TerminalType),
            25 => Some(TelnetOption::EndOfRecord),
            _ => None,
        }
    }

    /// Get the option name as a string
    pub fn name(&self) -> &str {
        match self {
            TelnetOption::Binary => "Binary",
            TelnetOption::Echo => "Echo",
            TelnetOption::TerminalType => "Terminal Type",
            TelnetOption::EndOfRecord => "End of Record",
        }
    }
}

/// TERMINAL-TYPE subnegotiation verbs (RFC 1091)
pub const TTYPE_IS: u8 = 0;
pub const TTYPE_SEND: u8 = 1;

/// Build a telnet negotiation sequence
///
/// ```
/// use tn3270r::protocol_common::telnet_base::{build_negotiation, TelnetCommand};
///
/// // "IAC WILL BINARY"
/// assert_eq!(build_negotiation(TelnetCommand::WILL, 0), vec![255, 251, 0]);
/// ```
pub fn build_negotiation(command: TelnetCommand, option: u8) -> Vec<u8> {
    vec![IAC, command as u8, option]
}

/// Build a telnet subnegotiation sequence, doubling any IAC in the payload
///
/// ```
/// use tn3270r::protocol_common::telnet_base::build_subnegotiation;
///
/// // "IAC SB TERMINAL-TYPE IS IBM-3278-2 IAC SE"
/// let mut payload = vec![0];
/// payload.extend_from_slice(b"IBM-3278-2");
/// let seq = build_subnegotiation(24, &payload);
/// assert_eq!(&seq[..4], &[255, 250, 24, 0]);
/// assert_eq!(&seq[seq.len() - 2..], &[255, 240]);
/// ```
pub fn build_subnegotiation(option: u8, data: &[u8]) -> Vec<u8> {
    let mut result = vec![IAC, TelnetCommand::SB as u8, option];
    result.extend(escape_iac(data));
    result.push(IAC);
    result.push(TelnetCommand::SE as u8);
    result
}

/// Double every IAC byte so it survives as data on a binary telnet stream
pub fn escape_iac(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for &byte in data {
        out.push(byte);
        if byte == IAC {
            out.push(IAC);
        }
    }
    out
}
