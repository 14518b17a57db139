//! IBM 3270 protocol (TN3270)
//!
//! A TN3270 session runs in two phases. Telnet option negotiation comes
//! first and ends when the host switches to binary mode. From then on the
//! host sends 3270 records terminated by `IAC EOR`, each of which repaints
//! the 24x80 screen.
//!
//! # Architecture
//!
//! - [`addressing`] - 12-bit buffer address codec
//! - [`codes`] - command, order and AID codes
//! - [`field`] - Start Field model and the field list
//! - [`display`] - screen buffer, cursor and text (the screen model)
//! - [`protocol`] - record decoding and the inbound AID record
//! - [`telnet`] - option negotiation
//! - [`framer`] - `IAC EOR` record framing
//! - [`session`] - async session over a byte stream
//!
//! # Example Usage
//!
//! ```
//! use tn3270r::lib3270::{build_aid_record, AidKey, Display3270, ProtocolProcessor3270};
//!
//! let mut display = Display3270::new();
//! let mut processor = ProtocolProcessor3270::new();
//!
//! // Erase/Write, WCC, Start Field (unprotected), "HI", Insert Cursor
//! processor
//!     .process_record(&[0x05, 0x02, 0x1D, 0x00, 0xC8, 0xC9, 0x13], &mut display)
//!     .unwrap();
//! assert_eq!(&display.text()[1..3], "HI");
//! assert_eq!(display.cursor_address(), 3);
//!
//! assert!(display.try_set_text_by_field_index(0, "OK"));
//! let record = build_aid_record(&display, AidKey::Enter).unwrap();
//! assert_eq!(&record[record.len() - 2..], &[0xFF, 0xEF]);
//! ```

pub mod addressing;
pub mod codes;
pub mod display;
pub mod field;
pub mod framer;
pub mod protocol;
pub mod session;
pub mod telnet;

// Re-exports for easy access
pub use addressing::{decode_12bit_address, encode_12bit_address};
pub use codes::{AidKey, CommandCode, Order};
pub use display::{Display3270, ScreenSnapshot, BUFFER_SIZE, COLS, ROWS};
pub use field::{FieldList, StartField};
pub use framer::RecordFramer;
pub use protocol::{build_aid_record, ProtocolProcessor3270, RecordOutcome};
pub use session::{connect, establish, negotiate, Session3270, SessionReader};
pub use telnet::TelnetNegotiator;
