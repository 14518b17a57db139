//! TN3270R: a TN3270 client library
//!
//! Negotiates a Telnet session with a mainframe host, decodes the 3270
//! data stream into a 24x80 screen model with fields, and encodes field
//! input back to the host.

/// PROTOCOL COMMON: EBCDIC text codec and telnet building blocks
pub mod protocol_common;

/// LIB3270: IBM 3270 protocol implementation
pub mod lib3270;

pub mod config;
pub mod error;

pub use config::SessionConfig;
pub use error::{TN3270Error, TN3270Result};
pub use lib3270::{connect, establish, AidKey, Session3270, SessionReader};
