//! TN3270 Display Buffer Management
//!
//! Owns the 24x80 screen buffer, the cursor position and the field list,
//! and keeps a decoded copy of the buffer as display text.

use std::fmt;
use std::sync::Arc;

use super::field::{FieldList, StartField};
use crate::protocol_common::ebcdic::Cp037Codec;
use crate::protocol_common::traits::TextCodec;

/// Screen rows (Model 2)
pub const ROWS: usize = 24;

/// Screen columns (Model 2)
pub const COLS: usize = 80;

/// Number of cells in the screen buffer
pub const BUFFER_SIZE: usize = ROWS * COLS;

/// Convert buffer index to (row, col) coordinates
pub fn index_to_coords(index: usize) -> (usize, usize) {
    (index / COLS, index % COLS)
}

/// Convert (row, col) coordinates to buffer index
pub fn coords_to_index(row: usize, col: usize) -> usize {
    row * COLS + col
}

/// Point-in-time copy of what the screen model publishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenSnapshot {
    /// Decoded text, one character per cell, no line breaks
    pub text: String,
    /// Cursor buffer index
    pub cursor_address: usize,
    /// Fields in ascending index order
    pub fields: Vec<StartField>,
}

/// 3270 screen model
#[derive(Debug, Clone)]
pub struct Display3270 {
    /// Raw host bytes, one per cell
    buffer: Vec<u8>,

    /// Cursor position set by the last Insert Cursor order
    cursor_address: usize,

    /// Fields of the current screen
    fields: FieldList,

    /// Decoded copy of `buffer`
    text: String,

    codec: Arc<dyn TextCodec>,
}

impl Display3270 {
    /// Create a blank display decoding through CP037
    pub fn new() -> Self {
        Self::with_codec(Arc::new(Cp037Codec))
    }

    /// Create a blank display decoding through the given codec
    pub fn with_codec(codec: Arc<dyn TextCodec>) -> Self {
        let buffer = vec![0u8; BUFFER_SIZE];
        let text = codec.decode(&buffer);
        Self {
            buffer,
            cursor_address: 0,
            fields: FieldList::new(),
            text,
            codec,
        }
    }

    /// Codec used for text conversion
    pub fn codec(&self) -> &Arc<dyn TextCodec> {
        &self.codec
    }

    /// Raw screen buffer
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Read a byte from a specific buffer index
    pub fn read_char_at(&self, index: usize) -> Option<u8> {
        self.buffer.get(index).copied()
    }

    /// Get current cursor position
    pub fn cursor_address(&self) -> usize {
        self.cursor_address
    }

    /// Fields of the current screen
    pub fn fields(&self) -> &FieldList {
        &self.fields
    }

    /// Decoded display text: `BUFFER_SIZE` characters, no line breaks
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get a specific row of the display text
    pub fn row(&self, row: usize) -> Option<String> {
        if row >= ROWS {
            return None;
        }
        Some(self.text.chars().skip(row * COLS).take(COLS).collect())
    }

    /// Copy out text, cursor and fields
    pub fn snapshot(&self) -> ScreenSnapshot {
        ScreenSnapshot {
            text: self.text.clone(),
            cursor_address: self.cursor_address,
            fields: self.fields.fields().to_vec(),
        }
    }

    /// Replace buffer, fields and cursor with a freshly decoded record
    pub(crate) fn commit(&mut self, buffer: Vec<u8>, fields: FieldList, cursor_address: usize) {
        debug_assert_eq!(buffer.len(), BUFFER_SIZE);
        self.buffer = buffer;
        self.fields = fields;
        self.cursor_address = cursor_address;
        self.refresh_text();
    }

    fn refresh_text(&mut self) {
        self.text = self.codec.decode(&self.buffer);
    }

    /// Write text into the field owning `index`
    ///
    /// The owning field is the one with the greatest start index at or
    /// before `index`. The text lands one cell after `index`, i.e. `index`
    /// is treated as a start-field position. Returns `false`, changing
    /// nothing, when no field owns the position or the text would run past
    /// the last cell. On success the owning field's MDT is set.
    pub fn try_set_text(&mut self, index: usize, text: &str) -> bool {
        if index >= BUFFER_SIZE {
            return false;
        }
        let Some(pos) = self.fields.owner_position(index) else {
            return false;
        };
        let bytes = self.codec.encode(text);
        let start = index + 1;
        if start + bytes.len() > BUFFER_SIZE {
            return false;
        }

        if let Some(field) = self.fields.get_mut(pos) {
            field.set_modified(true);
        }
        self.buffer[start..start + bytes.len()].copy_from_slice(&bytes);
        self.refresh_text();
        true
    }

    /// Write text into the `ordinal`-th editable field (0-based)
    pub fn try_set_text_by_field_index(&mut self, ordinal: usize, text: &str) -> bool {
        match self.fields.editable(ordinal).map(StartField::index) {
            Some(index) => self.try_set_text(index, text),
            None => false,
        }
    }
}

impl Default for Display3270 {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Display3270 {
    /// Rows of 80 columns; nulls and other control characters shown as spaces
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ch) in self.text.chars().enumerate() {
            if i > 0 && i % COLS == 0 {
                writeln!(f)?;
            }
            write!(f, "{}", if ch.is_control() { ' ' } else { ch })?;
        }
        Ok(())
    }
}
