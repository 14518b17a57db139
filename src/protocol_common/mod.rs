//! Protocol building blocks shared by the 3270 layers
//!
//! - [`ebcdic`] - CP037 code page and codec lookup
//! - [`traits`] - the [`TextCodec`] seam the screen model decodes through
//! - [`telnet_base`] - Telnet command/option codes and sequence builders
//!
//! # Examples
//!
//! ```
//! use tn3270r::protocol_common::{codec_for_page, TextCodec};
//!
//! let codec = codec_for_page(37).unwrap();
//! assert_eq!(codec.decode(&[0xC8, 0xC9]), "HI");
//! assert_eq!(codec.encode("HI"), vec![0xC8, 0xC9]);
//! ```

pub mod ebcdic;
pub mod telnet_base;
pub mod traits;

// Re-export commonly used items for convenience
pub use ebcdic::{ascii_to_ebcdic, codec_for_page, ebcdic_to_ascii, Cp037Codec};
pub use telnet_base::{build_negotiation, build_subnegotiation, TelnetCommand, TelnetOption};
pub use traits::TextCodec;
