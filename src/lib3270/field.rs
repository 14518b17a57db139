//! Field attribute and management logic for 3270
//!
//! A field begins at the cell where the host placed a Start Field order.
//! That cell holds the attribute, and the field's data runs from the next
//! cell up to (not including) the next field's start cell, or the end of the
//! screen.

use std::fmt;
use std::ops::Range;

use super::codes::*;

/// One Start Field position on the screen
///
/// Editability is fixed when the field is created. The Modified Data Tag
/// starts from the attribute byte and afterwards only changes when the
/// caller writes into the field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartField {
    index: usize,
    attribute: u8,
    modified_data_tag: bool,
    can_edit: bool,
}

impl StartField {
    /// Create a field from its buffer index and attribute byte
    pub fn new(index: usize, attribute: u8) -> Self {
        Self {
            index,
            attribute,
            modified_data_tag: (attribute & ATTR_MDT) == ATTR_MDT,
            can_edit: (attribute & ATTR_PROTECTED) != ATTR_PROTECTED,
        }
    }

    /// Buffer index of the attribute cell
    pub fn index(&self) -> usize {
        self.index
    }

    /// First buffer index of the field's data
    pub fn data_start(&self) -> usize {
        self.index + 1
    }

    /// Attribute byte exactly as the host sent it
    pub fn attribute(&self) -> u8 {
        self.attribute
    }

    /// Whether the field is unprotected
    pub fn can_edit(&self) -> bool {
        self.can_edit
    }

    /// Check if Modified Data Tag (MDT) is set
    pub fn is_modified(&self) -> bool {
        self.modified_data_tag
    }

    /// Set the Modified Data Tag (MDT)
    pub fn set_modified(&mut self, modified: bool) {
        self.modified_data_tag = modified;
    }

    /// Check if field is numeric-only
    pub fn is_numeric(&self) -> bool {
        (self.attribute & ATTR_NUMERIC) != 0
    }

    /// Check if field is non-display (password style)
    pub fn is_hidden(&self) -> bool {
        (self.attribute & ATTR_DISPLAY) == ATTR_DISPLAY
    }
}

impl fmt::Display for StartField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index: {}, Attribute: 0x{:02X}", self.index, self.attribute)
    }
}

/// Fields of the current screen, in ascending index order
///
/// Rebuilt from nothing by every Write-class record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldList {
    fields: Vec<StartField>,
}

impl FieldList {
    /// Create an empty field list
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field at a buffer index
    ///
    /// A second Start Field on an index already holding a field replaces it,
    /// so indices stay unique. Out-of-order indices are inserted in place.
    pub fn add_field(&mut self, field: StartField) {
        match self.fields.binary_search_by_key(&field.index, StartField::index) {
            Ok(pos) => self.fields[pos] = field,
            Err(pos) => self.fields.insert(pos, field),
        }
    }

    /// Get all fields
    pub fn fields(&self) -> &[StartField] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position in the list of the field owning a buffer index: the field
    /// with the greatest start index at or before it
    pub fn owner_position(&self, index: usize) -> Option<usize> {
        match self.fields.binary_search_by_key(&index, StartField::index) {
            Ok(pos) => Some(pos),
            Err(0) => None,
            Err(pos) => Some(pos - 1),
        }
    }

    /// Find the field owning a buffer index
    pub fn find_field_at(&self, index: usize) -> Option<&StartField> {
        self.owner_position(index).map(|pos| &self.fields[pos])
    }

    /// The `ordinal`-th editable field (0-based, ascending index order)
    pub fn editable(&self, ordinal: usize) -> Option<&StartField> {
        self.fields.iter().filter(|f| f.can_edit()).nth(ordinal)
    }

    /// Get all modified fields (MDT set), ascending
    pub fn modified_fields(&self) -> impl Iterator<Item = &StartField> {
        self.fields.iter().filter(|f| f.is_modified())
    }

    /// Data cells of the field at list position `pos`
    pub fn data_range(&self, pos: usize, buffer_size: usize) -> Range<usize> {
        let start = self.fields[pos].data_start().min(buffer_size);
        let end = self
            .fields
            .get(pos + 1)
            .map_or(buffer_size, StartField::index)
            .max(start);
        start..end
    }

    pub(crate) fn get_mut(&mut self, pos: usize) -> Option<&mut StartField> {
        self.fields.get_mut(pos)
    }
}
