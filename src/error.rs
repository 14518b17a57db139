//! Error handling for TN3270R
//!
//! This module provides the structured error types used across the crate.
//! Every fatal condition terminates the session attempt and propagates to the
//! caller that owns the transport; nothing here is retried automatically.
//!
//! Caller-input failures (`try_set_text` on a position with no owning field,
//! or text that would run off the screen) are not errors at all: those
//! operations report them as a plain `false`.

use std::io;

use thiserror::Error;

/// Top-level error type for TN3270R operations
#[derive(Debug, Error)]
pub enum TN3270Error {
    /// Transport errors
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
    /// Telnet option negotiation errors
    #[error("Telnet error: {0}")]
    Telnet(#[from] TelnetError),
    /// 3270 data stream errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
    /// Host asked for something this client intentionally does not implement
    #[error("Unsupported operation: {0}")]
    Unsupported(#[from] UnsupportedError),
    /// Receive buffer capacity errors
    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TN3270Error {
    /// True when the receive buffer is too small for what the host sent.
    /// Callers can retry with a larger `receive_buffer_size`.
    pub fn is_buffer_overflow(&self) -> bool {
        matches!(self, TN3270Error::Buffer(BufferError::Overflow { .. }))
    }

    /// True when the host requested an operation that is deliberately not
    /// implemented, as opposed to sending a malformed stream.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, TN3270Error::Unsupported(_))
    }
}

/// Transport related errors
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Connection refused by remote host
    #[error("Connection refused to {host}:{port}")]
    ConnectionRefused { host: String, port: u16 },
    /// Connection timeout
    #[error("Connection timeout to {host}:{port} after {timeout_seconds}s")]
    Timeout { host: String, port: u16, timeout_seconds: u64 },
    /// Remote end closed the stream
    #[error("Connection closed by host")]
    ConnectionClosed,
    /// Connection lost during operation
    #[error("Connection lost: {reason}")]
    ConnectionLost { reason: String },
}

/// Telnet option negotiation errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TelnetError {
    /// A byte outside an `IAC` command sequence during negotiation
    #[error("Unexpected byte 0x{byte:02X} outside a telnet command sequence")]
    UnexpectedByte { byte: u8 },
    /// A command after `IAC` that the negotiation does not handle
    #[error("Unsupported telnet command {command} after IAC")]
    UnsupportedCommand { command: u8 },
    /// Subnegotiation other than `SB TERMINAL-TYPE SEND IAC SE`
    #[error("Unsupported subnegotiation for option {option}: {data:?}")]
    UnsupportedSubnegotiation { option: u8, data: Vec<u8> },
}

/// 3270 data stream errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Record is empty (no command byte)
    #[error("Empty 3270 record")]
    EmptyRecord,
    /// Unknown command code in the record's leading byte
    #[error("Invalid 3270 command code: 0x{code:02X}")]
    InvalidCommandCode { code: u8 },
    /// An order ran past the end of the record
    #[error("Truncated order 0x{order:02X} at offset {offset}: needs {needed} operand bytes")]
    TruncatedOrder { order: u8, offset: usize, needed: usize },
    /// Address byte not in the buffer address alphabet
    #[error("Invalid buffer address byte 0x{byte:02X}")]
    InvalidAddressByte { byte: u8 },
    /// Address outside the encodable range or the screen
    #[error("Buffer address {address} out of range (limit {limit})")]
    AddressOutOfRange { address: usize, limit: usize },
}

/// Operations the host may request that are intentionally not implemented
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnsupportedError {
    /// Read Buffer command: the client cannot send the buffer back
    #[error("Read Buffer command is not supported")]
    ReadBuffer,
}

/// Receive buffer errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Data filled the whole receive buffer without a terminator
    #[error("Receive buffer of {capacity} bytes filled without a terminator; increase receive_buffer_size")]
    Overflow { capacity: usize },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration parameter
    #[error("Invalid configuration parameter '{parameter}' = '{value}': {reason}")]
    InvalidParameter { parameter: String, value: String, reason: String },
    /// No codec for the requested code page
    #[error("Unsupported EBCDIC code page {page}")]
    UnsupportedCodePage { page: u16 },
    /// Configuration file could not be read or written
    #[error("Configuration file error '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: io::Error,
    },
    /// Configuration file is not valid JSON for this schema
    #[error("Configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

// Convert from standard IO errors
impl From<io::Error> for TN3270Error {
    fn from(err: io::Error) -> Self {
        TN3270Error::Network(NetworkError::from(err))
    }
}

impl From<io::Error> for NetworkError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => NetworkError::ConnectionRefused {
                host: "unknown".to_string(),
                port: 0,
            },
            io::ErrorKind::TimedOut => NetworkError::Timeout {
                host: "unknown".to_string(),
                port: 0,
                timeout_seconds: 0,
            },
            io::ErrorKind::UnexpectedEof => NetworkError::ConnectionClosed,
            _ => NetworkError::ConnectionLost {
                reason: format!("IO Error: {err}"),
            },
        }
    }
}

/// Result type alias for TN3270R operations
pub type TN3270Result<T> = Result<T, TN3270Error>;

/// Specialized result types for different components
pub type TelnetResult<T> = Result<T, TelnetError>;
pub type ProtocolResult<T> = Result<T, ProtocolError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
