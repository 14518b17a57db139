//! 3270 record framing
//!
//! Once binary mode is on, the host sends 3270 records terminated by
//! `IAC EOR`, with any 0xFF data byte doubled. [`RecordFramer`] collects
//! bytes in whatever chunks the transport delivers and yields whole,
//! unescaped records.

use log::{trace, warn};
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{BufferError, NetworkError, TN3270Result};
use crate::protocol_common::telnet_base::{TelnetCommand, EOR, IAC};

const SE: u8 = TelnetCommand::SE as u8;

/// Accumulates raw bytes and splits them into records
///
/// Bytes of `buffer` before `scan_pos` have already been unescaped into
/// `record` and hold no terminator. Scanning resumes exactly at `scan_pos`,
/// so a terminator split across two reads is found once its second byte
/// arrives and no byte is read twice or skipped.
#[derive(Debug)]
pub struct RecordFramer {
    buffer: Vec<u8>,
    scan_pos: usize,
    record: Vec<u8>,
    capacity: usize,
    read_buf: Vec<u8>,
}

impl RecordFramer {
    /// Create a framer whose unterminated data may not reach `capacity`
    /// bytes; `capacity` is also the size of a single transport read
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            scan_pos: 0,
            record: Vec::new(),
            capacity,
            read_buf: vec![0u8; capacity],
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes received but not yet returned as a record
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Append bytes from the transport
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Take the next complete record, unescaped and without `IAC EOR`
    ///
    /// `Ok(None)` means more bytes are needed. Stray Telnet commands
    /// (such as `IAC NOP`), option verbs and whole subnegotiations between
    /// data are dropped.
    pub fn next_record(&mut self) -> Result<Option<Vec<u8>>, BufferError> {
        let mut i = self.scan_pos;
        let mut end = None;

        while i < self.buffer.len() {
            let byte = self.buffer[i];
            if byte != IAC {
                self.record.push(byte);
                i += 1;
                continue;
            }
            let Some(&command) = self.buffer.get(i + 1) else {
                break;
            };
            match command {
                IAC => {
                    self.record.push(IAC);
                    i += 2;
                }
                EOR => {
                    end = Some(i + 2);
                    break;
                }
                _ => {
                    let Some(len) = command_len(&self.buffer[i..]) else {
                        break;
                    };
                    warn!("Dropping telnet command {:02X?} inside 3270 data", &self.buffer[i..i + len]);
                    i += len;
                }
            }
        }

        let Some(end) = end else {
            self.scan_pos = i;
            if self.buffer.len() >= self.capacity {
                return Err(BufferError::Overflow {
                    capacity: self.capacity,
                });
            }
            return Ok(None);
        };

        self.buffer.drain(..end);
        self.scan_pos = 0;
        let record = std::mem::take(&mut self.record);
        trace!("Framed 3270 record of {} bytes", record.len());
        Ok(Some(record))
    }

    /// Read from `reader` until a complete record is available
    ///
    /// A zero-length read means the host closed the connection.
    pub async fn read_record<R>(&mut self, reader: &mut R) -> TN3270Result<Vec<u8>>
    where
        R: AsyncRead + Unpin,
    {
        loop {
            if let Some(record) = self.next_record()? {
                return Ok(record);
            }
            let n = reader.read(&mut self.read_buf).await?;
            if n == 0 {
                return Err(NetworkError::ConnectionClosed.into());
            }
            trace!("Read {} bytes: {:02X?}", n, &self.read_buf[..n]);
            self.buffer.extend_from_slice(&self.read_buf[..n]);
        }
    }
}

/// Length of the Telnet command sequence starting `seq` (other than
/// `IAC IAC` / `IAC EOR`), or `None` if it is not complete yet
///
/// A subnegotiation runs through its closing `IAC SE`.
fn command_len(seq: &[u8]) -> Option<usize> {
    let len = match TelnetCommand::from_u8(seq[1]) {
        Some(TelnetCommand::DO | TelnetCommand::DONT | TelnetCommand::WILL | TelnetCommand::WONT) => 3,
        Some(TelnetCommand::SB) => {
            let mut j = 2;
            loop {
                match (seq.get(j), seq.get(j + 1)) {
                    (Some(&IAC), Some(&SE)) => break j + 2,
                    (Some(&IAC), Some(_)) => j += 2,
                    (Some(&byte), _) if byte != IAC => j += 1,
                    _ => return None,
                }
            }
        }
        _ => 2,
    };
    (len <= seq.len()).then_some(len)
}
