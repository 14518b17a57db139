//! Telnet option negotiation for TN3270
//!
//! The host drives the handshake. This negotiator answers it until the host
//! offers `WILL BINARY`, after which the connection carries 3270 records
//! and negotiation is finished for good.
//!
//! The negotiator does no I/O. Bytes read from the transport are pushed in
//! with [`TelnetNegotiator::process_incoming_data`] and the returned replies
//! are written back by the caller, one message per element.

use log::{debug, trace, warn};

use crate::error::{TelnetError, TelnetResult};
use crate::protocol_common::telnet_base::{
    build_negotiation, build_subnegotiation, TelnetCommand, TelnetOption, IAC, TTYPE_IS,
    TTYPE_SEND,
};

/// Terminal type announced when the host asks for it
pub const DEFAULT_TERMINAL_TYPE: &str = "IBM-3278-2";

const OPT_BINARY: u8 = TelnetOption::Binary as u8;
const OPT_TTYPE: u8 = TelnetOption::TerminalType as u8;
const OPT_EOR: u8 = TelnetOption::EndOfRecord as u8;
const SE: u8 = TelnetCommand::SE as u8;

/// Host-driven TN3270 option negotiator
#[derive(Debug)]
pub struct TelnetNegotiator {
    /// Terminal type sent in the TERMINAL-TYPE IS reply
    terminal_type: String,

    /// Bytes of a command sequence not yet complete
    input_buffer: Vec<u8>,

    /// Bytes that arrived after `WILL BINARY`
    remainder: Vec<u8>,

    /// Whether binary 3270 mode has been reached
    binary_mode: bool,
}

impl TelnetNegotiator {
    pub fn new(terminal_type: impl Into<String>) -> Self {
        Self {
            terminal_type: terminal_type.into(),
            input_buffer: Vec::new(),
            remainder: Vec::new(),
            binary_mode: false,
        }
    }

    /// Whether the host has switched the session into binary 3270 mode
    pub fn is_binary(&self) -> bool {
        self.binary_mode
    }

    /// Number of bytes held back waiting for the rest of a command
    pub fn pending_len(&self) -> usize {
        self.input_buffer.len()
    }

    /// Take the bytes that followed `WILL BINARY`; they belong to the
    /// record stream
    pub fn take_remainder(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.remainder)
    }

    /// Process incoming telnet data and produce the replies, in order
    ///
    /// An incomplete command at the end of `data` is kept and finished by
    /// the next call. Data passed in after binary mode is reached goes
    /// straight to the remainder.
    pub fn process_incoming_data(&mut self, data: &[u8]) -> TelnetResult<Vec<Vec<u8>>> {
        if self.binary_mode {
            self.remainder.extend_from_slice(data);
            return Ok(Vec::new());
        }

        self.input_buffer.extend_from_slice(data);
        let mut replies = Vec::new();
        let mut pos = 0;

        while pos < self.input_buffer.len() {
            let remaining = &self.input_buffer[pos..];
            if remaining[0] != IAC {
                return Err(TelnetError::UnexpectedByte { byte: remaining[0] });
            }
            let Some(&command) = remaining.get(1) else {
                break;
            };

            match TelnetCommand::from_u8(command) {
                Some(TelnetCommand::DO) => {
                    let Some(&option) = remaining.get(2) else { break };
                    replies.push(self.handle_do(option));
                    pos += 3;
                }
                Some(TelnetCommand::WILL) => {
                    let Some(&option) = remaining.get(2) else { break };
                    pos += 3;
                    if let Some(reply) = self.handle_will(option) {
                        replies.push(reply);
                    }
                    if self.binary_mode {
                        self.remainder.extend_from_slice(&self.input_buffer[pos..]);
                        pos = self.input_buffer.len();
                        break;
                    }
                }
                Some(TelnetCommand::SB) => {
                    let Some(end) = find_subnegotiation_end(remaining) else {
                        break;
                    };
                    replies.push(self.handle_subnegotiation(&remaining[2..end])?);
                    pos += end + 2;
                }
                _ => return Err(TelnetError::UnsupportedCommand { command }),
            }
        }

        self.input_buffer.drain(..pos);
        Ok(replies)
    }

    fn handle_do(&self, option: u8) -> Vec<u8> {
        match option {
            OPT_TTYPE | OPT_EOR | OPT_BINARY => {
                debug!("Host DO {}: replying WILL", option_name(option));
                build_negotiation(TelnetCommand::WILL, option)
            }
            _ => {
                debug!("Host DO {}: replying WONT", option_name(option));
                build_negotiation(TelnetCommand::WONT, option)
            }
        }
    }

    fn handle_will(&mut self, option: u8) -> Option<Vec<u8>> {
        match option {
            OPT_EOR => {
                debug!("Host WILL End of Record: replying DO");
                Some(build_negotiation(TelnetCommand::DO, option))
            }
            OPT_BINARY => {
                debug!("Host WILL Binary: replying DO, entering 3270 mode");
                self.binary_mode = true;
                Some(build_negotiation(TelnetCommand::DO, option))
            }
            _ => {
                warn!("Ignoring host WILL {}", option_name(option));
                None
            }
        }
    }

    /// `data` is the subnegotiation body between `IAC SB` and `IAC SE`
    fn handle_subnegotiation(&self, data: &[u8]) -> TelnetResult<Vec<u8>> {
        trace!("Subnegotiation body: {:02X?}", data);
        if data != [OPT_TTYPE, TTYPE_SEND].as_slice() {
            return Err(TelnetError::UnsupportedSubnegotiation {
                option: data.first().copied().unwrap_or_default(),
                data: data.to_vec(),
            });
        }

        debug!("Host asked for terminal type: sending {}", self.terminal_type);
        let mut payload = Vec::with_capacity(self.terminal_type.len() + 1);
        payload.push(TTYPE_IS);
        payload.extend_from_slice(self.terminal_type.as_bytes());
        Ok(build_subnegotiation(OPT_TTYPE, &payload))
    }
}

impl Default for TelnetNegotiator {
    fn default() -> Self {
        Self::new(DEFAULT_TERMINAL_TYPE)
    }
}

/// Offset of the `IAC SE` closing the subnegotiation that starts `seq`
/// (`seq` begins with `IAC SB`); doubled IACs in the body are skipped
fn find_subnegotiation_end(seq: &[u8]) -> Option<usize> {
    let mut i = 2;
    while i + 1 < seq.len() {
        if seq[i] == IAC {
            if seq[i + 1] == SE {
                return Some(i);
            }
            i += 2;
        } else {
            i += 1;
        }
    }
    None
}

fn option_name(option: u8) -> String {
    TelnetOption::from_u8(option)
        .map(|o| o.name().to_string())
        .unwrap_or_else(|| format!("option {option}"))
}
