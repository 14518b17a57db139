//! 3270 Protocol Implementation
//!
//! Decodes host records (command byte, WCC, order stream) into the screen
//! model, and builds the inbound AID record the client sends back.

use log::{debug, trace, warn};

use super::addressing::{decode_12bit_address, encode_12bit_address};
use super::codes::*;
use super::display::{Display3270, BUFFER_SIZE};
use super::field::{FieldList, StartField};
use crate::error::{ProtocolError, ProtocolResult, TN3270Result, UnsupportedError};
use crate::protocol_common::telnet_base::{escape_iac, IAC_EOR};

/// What decoding one record did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    /// Command selected by the leading byte
    pub command: CommandCode,

    /// Write Control Character, when the record carried one
    pub wcc: Option<u8>,

    /// Number of order bytes consumed without interpretation
    pub ignored_orders: usize,
}

/// 3270 Protocol Processor
///
/// Dispatches host records on their command byte and runs the order stream
/// of Write-class commands against a [`Display3270`].
#[derive(Debug, Default)]
pub struct ProtocolProcessor3270 {
    records_processed: u64,
}

impl ProtocolProcessor3270 {
    /// Create a new protocol processor
    pub fn new() -> Self {
        Self::default()
    }

    /// Records successfully decoded so far
    pub fn records_processed(&self) -> u64 {
        self.records_processed
    }

    /// Process one complete host record
    ///
    /// `record` starts with the command byte and excludes the trailing
    /// `IAC EOR`. The display is only touched when the whole record decodes;
    /// on error it keeps the previous screen.
    pub fn process_record(
        &mut self,
        record: &[u8],
        display: &mut Display3270,
    ) -> TN3270Result<RecordOutcome> {
        let (&code, rest) = record.split_first().ok_or(ProtocolError::EmptyRecord)?;
        let command = CommandCode::from_u8(code).ok_or(ProtocolError::InvalidCommandCode { code })?;

        if command == CommandCode::ReadBuffer {
            return Err(UnsupportedError::ReadBuffer.into());
        }

        let (wcc, orders) = match rest.split_first() {
            Some((&wcc, orders)) => (Some(wcc), orders),
            None => (None, rest),
        };
        trace!("3270 record {:?}, wcc {:?}: {:02X?}", command, wcc, orders);

        let mut image = ScreenImage::blank(display.cursor_address());
        // orders begin after the command byte and the WCC
        let mut parser = DataStreamParser::new(orders, 2);
        let ignored_orders = parser.parse(&mut image)?;

        display.commit(image.buffer, image.fields, image.cursor_address);
        self.records_processed += 1;
        debug!(
            "Processed {:?}: {} bytes, {} fields, cursor {}",
            command,
            record.len(),
            display.fields().len(),
            display.cursor_address()
        );

        Ok(RecordOutcome {
            command,
            wcc,
            ignored_orders,
        })
    }
}

/// Screen state being rebuilt by one Write-class record
struct ScreenImage {
    buffer: Vec<u8>,
    fields: FieldList,
    cursor_address: usize,
    index: usize,
}

impl ScreenImage {
    /// All-zero buffer, no fields; the cursor carries over
    fn blank(cursor_address: usize) -> Self {
        Self {
            buffer: vec![0u8; BUFFER_SIZE],
            fields: FieldList::new(),
            cursor_address,
            index: 0,
        }
    }

    fn put(&mut self, byte: u8) {
        self.buffer[self.index] = byte;
        self.index = (self.index + 1) % BUFFER_SIZE;
    }
}

/// Order-stream parser
struct DataStreamParser<'a> {
    data: &'a [u8],
    pos: usize,
    /// Offset of `data` within the full record, for diagnostics
    base: usize,
}

impl<'a> DataStreamParser<'a> {
    fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    /// Run the whole order stream, returning how many orders were skipped
    fn parse(&mut self, image: &mut ScreenImage) -> ProtocolResult<usize> {
        let mut ignored = 0;

        while let Some(&byte) = self.data.get(self.pos) {
            let offset = self.base + self.pos;
            self.pos += 1;

            let Some(order) = Order::from_u8(byte) else {
                image.put(byte);
                continue;
            };
            let operands = self.operands(order, offset)?;

            match order {
                Order::InsertCursor => image.cursor_address = image.index,
                Order::ProgramTab => {}
                Order::SetBufferAddress => {
                    image.index = screen_address(operands[0], operands[1])?;
                }
                Order::StartField => {
                    let attribute = operands[0];
                    image.fields.add_field(StartField::new(image.index, attribute));
                    image.put(FIELD_PLACEHOLDER);
                }
                Order::RepeatToAddress => {
                    let mut end = decode_12bit_address(operands[0], operands[1])? as usize;
                    if end == 0 {
                        end = BUFFER_SIZE - 1;
                    }
                    let end = check_range(end)?;
                    let fill = operands[2];
                    if image.index <= end {
                        image.buffer[image.index..=end].fill(fill);
                    }
                    image.index = end;
                }
                Order::EraseUnprotectedToAddress => {
                    let end = screen_address(operands[0], operands[1])?;
                    if image.index <= end {
                        image.buffer[image.index..=end].fill(FIELD_PLACEHOLDER);
                    }
                    image.index = (end + 1) % BUFFER_SIZE;
                }
                Order::Unknown(code) => {
                    warn!("Ignoring unsupported 3270 order 0x{:02X} at record offset {}", code, offset);
                    ignored += 1;
                }
            }
        }

        Ok(ignored)
    }

    /// Take the operand bytes of `order`
    fn operands(&mut self, order: Order, offset: usize) -> ProtocolResult<&'a [u8]> {
        let needed = order.operand_len();
        let operands = self
            .data
            .get(self.pos..self.pos + needed)
            .ok_or(ProtocolError::TruncatedOrder {
                order: order.to_u8(),
                offset,
                needed,
            })?;
        self.pos += needed;
        Ok(operands)
    }
}

/// Decode an address that must land on the screen
fn screen_address(byte1: u8, byte2: u8) -> ProtocolResult<usize> {
    check_range(decode_12bit_address(byte1, byte2)? as usize)
}

fn check_range(address: usize) -> ProtocolResult<usize> {
    if address < BUFFER_SIZE {
        Ok(address)
    } else {
        Err(ProtocolError::AddressOutOfRange {
            address,
            limit: BUFFER_SIZE,
        })
    }
}

/// Build the inbound record for an attention key
///
/// Layout: AID byte, cursor address, then one `SBA <data start>` block per
/// field with MDT set (ascending), each followed by the field's non-null
/// data bytes. IAC bytes are doubled and `IAC EOR` terminates the record.
pub fn build_aid_record(display: &Display3270, aid: AidKey) -> ProtocolResult<Vec<u8>> {
    let buffer = display.buffer();
    let fields = display.fields();

    let mut body = Vec::with_capacity(64);
    body.push(aid.to_u8());
    let (b1, b2) = encode_12bit_address(display.cursor_address() as u16)?;
    body.extend_from_slice(&[b1, b2]);

    for (pos, field) in fields.fields().iter().enumerate() {
        if !field.is_modified() {
            continue;
        }
        let (b1, b2) = encode_12bit_address(field.data_start() as u16)?;
        body.extend_from_slice(&[ORDER_SBA, b1, b2]);
        body.extend(
            buffer[fields.data_range(pos, BUFFER_SIZE)]
                .iter()
                .copied()
                .filter(|&b| b != 0),
        );
    }

    let mut record = escape_iac(&body);
    record.extend_from_slice(&IAC_EOR);
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TN3270Error;

    fn addr(address: u16) -> [u8; 2] {
        let (b1, b2) = encode_12bit_address(address).unwrap();
        [b1, b2]
    }

    fn run(record: &[u8]) -> (Display3270, TN3270Result<RecordOutcome>) {
        let mut display = Display3270::new();
        let mut processor = ProtocolProcessor3270::new();
        let result = processor.process_record(record, &mut display);
        (display, result)
    }

    #[test]
    fn test_erase_write_example_record() {
        let mut record = vec![CMD_ERASE_WRITE, WCC_RESTORE, ORDER_SF, 0x00, ORDER_SBA];
        record.extend_from_slice(&addr(5));
        record.extend_from_slice(&[0xC8, 0xC9, ORDER_IC]);

        let (display, result) = run(&record);
        let outcome = result.unwrap();
        assert_eq!(outcome.command, CommandCode::EraseWrite);
        assert_eq!(outcome.wcc, Some(WCC_RESTORE));

        let fields = display.fields().fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].index(), 0);
        assert!(fields[0].can_edit());
        assert!(!fields[0].is_modified());
        assert_eq!(display.read_char_at(0), Some(FIELD_PLACEHOLDER));
        assert_eq!(&display.buffer()[5..7], &[0xC8, 0xC9]);
        assert_eq!(display.cursor_address(), 7);
        assert_eq!(&display.text()[5..7], "HI");
    }

    #[test]
    fn test_insert_cursor_before_literals() {
        let mut record = vec![CMD_WRITE, 0x00, ORDER_SBA];
        record.extend_from_slice(&addr(5));
        record.extend_from_slice(&[ORDER_IC, 0xC8, 0xC9]);

        let (display, result) = run(&record);
        result.unwrap();
        assert_eq!(display.cursor_address(), 5);
    }

    #[test]
    fn test_write_resets_buffer_and_fields() {
        let mut display = Display3270::new();
        let mut processor = ProtocolProcessor3270::new();
        processor
            .process_record(&[CMD_ERASE_WRITE, 0x00, ORDER_SF, 0x00, 0xC1, ORDER_IC], &mut display)
            .unwrap();
        assert_eq!(display.fields().len(), 1);
        assert_eq!(display.cursor_address(), 2);

        processor.process_record(&[CMD_WRITE, 0x00, 0xC2], &mut display).unwrap();
        assert!(display.fields().is_empty());
        assert_eq!(display.read_char_at(0), Some(0xC2));
        assert_eq!(display.read_char_at(1), Some(0x00));
        // no IC in the second record
        assert_eq!(display.cursor_address(), 2);
        assert_eq!(processor.records_processed(), 2);
    }

    #[test]
    fn test_repeat_to_address_zero_fills_to_end() {
        let mut record = vec![CMD_ERASE_WRITE, 0x00, ORDER_SBA];
        record.extend_from_slice(&addr(1900));
        record.push(ORDER_RA);
        record.extend_from_slice(&addr(0));
        record.push(0xC1);

        let (display, result) = run(&record);
        result.unwrap();
        assert_eq!(display.read_char_at(1899), Some(0x00));
        assert!(display.buffer()[1900..].iter().all(|&b| b == 0xC1));
    }

    #[test]
    fn test_repeat_to_address_leaves_index_on_end() {
        let mut record = vec![CMD_ERASE_WRITE, 0x00, ORDER_RA];
        record.extend_from_slice(&addr(3));
        record.extend_from_slice(&[0xC1, 0xC2]);

        let (display, result) = run(&record);
        result.unwrap();
        assert_eq!(&display.buffer()[0..5], &[0xC1, 0xC1, 0xC1, 0xC2, 0x00]);
    }

    #[test]
    fn test_erase_unprotected_leaves_index_past_end() {
        let mut record = vec![CMD_ERASE_WRITE, 0x00, ORDER_EUA];
        record.extend_from_slice(&addr(3));
        record.push(0xC2);

        let (display, result) = run(&record);
        result.unwrap();
        assert_eq!(&display.buffer()[0..5], &[0x40, 0x40, 0x40, 0x40, 0xC2]);
    }

    #[test]
    fn test_erase_unprotected_to_last_cell_wraps() {
        let mut record = vec![CMD_ERASE_WRITE, 0x00, ORDER_SBA];
        record.extend_from_slice(&addr(1918));
        record.push(ORDER_EUA);
        record.extend_from_slice(&addr(1919));
        record.push(0xC3);

        let (display, result) = run(&record);
        result.unwrap();
        assert_eq!(display.read_char_at(0), Some(0xC3));
        assert_eq!(display.read_char_at(1919), Some(0x40));
    }

    #[test]
    fn test_literal_at_last_cell_wraps() {
        let mut record = vec![CMD_ERASE_WRITE, 0x00, ORDER_SBA];
        record.extend_from_slice(&addr(1919));
        record.extend_from_slice(&[0xC1, 0xC2]);

        let (display, result) = run(&record);
        result.unwrap();
        assert_eq!(display.read_char_at(1919), Some(0xC1));
        assert_eq!(display.read_char_at(0), Some(0xC2));
    }

    #[test]
    fn test_unknown_order_is_consumed_alone() {
        let record = [CMD_ERASE_WRITE, 0x00, ORDER_SFE, 0xC1];
        let (display, result) = run(&record);
        assert_eq!(result.unwrap().ignored_orders, 1);
        assert_eq!(display.read_char_at(0), Some(0xC1));
    }

    #[test]
    fn test_read_buffer_is_unsupported() {
        let (_, result) = run(&[CMD_READ_BUFFER]);
        let err = result.unwrap_err();
        assert!(err.is_unsupported());
        assert!(matches!(err, TN3270Error::Unsupported(UnsupportedError::ReadBuffer)));
    }

    #[test]
    fn test_invalid_command_and_empty_record() {
        let (_, result) = run(&[0x42, 0x00]);
        assert!(matches!(
            result,
            Err(TN3270Error::Protocol(ProtocolError::InvalidCommandCode { code: 0x42 }))
        ));

        let (_, result) = run(&[]);
        assert!(matches!(result, Err(TN3270Error::Protocol(ProtocolError::EmptyRecord))));
    }

    #[test]
    fn test_address_errors_fail_the_record() {
        let (display, result) = run(&[CMD_ERASE_WRITE, 0x00, 0xC1, ORDER_SBA, 0x40, 0x00]);
        assert!(matches!(
            result,
            Err(TN3270Error::Protocol(ProtocolError::InvalidAddressByte { byte: 0x00 }))
        ));
        // the screen is untouched
        assert_eq!(display.read_char_at(0), Some(0x00));

        let mut record = vec![CMD_ERASE_WRITE, 0x00, ORDER_SBA];
        record.extend_from_slice(&addr(1920));
        let (_, result) = run(&record);
        assert!(matches!(
            result,
            Err(TN3270Error::Protocol(ProtocolError::AddressOutOfRange { address: 1920, .. }))
        ));
    }

    #[test]
    fn test_truncated_order() {
        let (_, result) = run(&[CMD_WRITE, 0x00, ORDER_SBA, 0x40]);
        assert!(matches!(
            result,
            Err(TN3270Error::Protocol(ProtocolError::TruncatedOrder {
                order: ORDER_SBA,
                offset: 2,
                needed: 2
            }))
        ));
    }

    #[test]
    fn test_aid_record_with_modified_fields() {
        let mut display = Display3270::new();
        let mut processor = ProtocolProcessor3270::new();
        let mut record = vec![CMD_ERASE_WRITE, 0x00, ORDER_SF, ATTR_PROTECTED, ORDER_SBA];
        record.extend_from_slice(&addr(10));
        record.extend_from_slice(&[ORDER_SF, 0x00, ORDER_SBA]);
        record.extend_from_slice(&addr(20));
        record.extend_from_slice(&[ORDER_SF, 0x00, ORDER_SBA]);
        record.extend_from_slice(&addr(11));
        record.push(ORDER_IC);
        processor.process_record(&record, &mut display).unwrap();

        assert!(display.try_set_text(20, "AB"));
        assert!(display.try_set_text(10, "Z"));

        let out = build_aid_record(&display, AidKey::Enter).unwrap();
        let mut expected = vec![AID_ENTER];
        expected.extend_from_slice(&addr(11));
        expected.push(ORDER_SBA);
        expected.extend_from_slice(&addr(11));
        expected.push(0xE9);
        expected.push(ORDER_SBA);
        expected.extend_from_slice(&addr(21));
        expected.extend_from_slice(&[0xC1, 0xC2]);
        expected.extend_from_slice(&IAC_EOR);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_aid_record_without_modified_fields() {
        let display = Display3270::new();
        let out = build_aid_record(&display, AidKey::PF(3)).unwrap();
        assert_eq!(out, vec![0xF3, 0x40, 0x40, 0xFF, 0xEF]);
    }

    #[test]
    fn test_aid_record_escapes_iac() {
        let mut display = Display3270::new();
        let mut processor = ProtocolProcessor3270::new();
        processor
            .process_record(&[CMD_ERASE_WRITE, 0x00, ORDER_SF, ATTR_MDT, 0xFF], &mut display)
            .unwrap();

        let out = build_aid_record(&display, AidKey::Enter).unwrap();
        assert_eq!(
            out,
            vec![AID_ENTER, 0x40, 0x40, ORDER_SBA, 0x40, 0xC1, 0xFF, 0xFF, 0xFF, 0xEF]
        );
    }
}
