//! TN3270 session tests against an in-memory host
//!
//! The host side of a `tokio::io::duplex` pipe plays the mainframe: it
//! drives negotiation, sends records and reads what the client sends back.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, DuplexStream, ReadBuf, ReadHalf};

use tn3270r::error::{NetworkError, ProtocolError};
use tn3270r::lib3270::codes::*;
use tn3270r::lib3270::{encode_12bit_address, establish, RecordFramer, Session3270, SessionReader};
use tn3270r::protocol_common::telnet_base::escape_iac;
use tn3270r::{SessionConfig, TN3270Error};

const IAC: u8 = 0xFF;
const EOR: u8 = 0xEF;

/// DO TTYPE, DO EOR, DO BINARY, SB TTYPE SEND IAC SE, WILL EOR, WILL BINARY
const HANDSHAKE: [u8; 21] = [
    IAC, 0xFD, 24, IAC, 0xFD, 25, IAC, 0xFD, 0, IAC, 0xFA, 24, 1, IAC, 0xF0, IAC, 0xFB, 25, IAC,
    0xFB, 0,
];

/// Byte count of the client's replies to `HANDSHAKE`
const HANDSHAKE_REPLY_LEN: usize = 3 + 3 + 3 + 16 + 3 + 3;

fn config() -> SessionConfig {
    let mut config = SessionConfig::new("in-memory", 23);
    config.wait_poll_interval_ms = 5;
    config
}

fn addr(address: u16) -> [u8; 2] {
    let (b1, b2) = encode_12bit_address(address).unwrap();
    [b1, b2]
}

fn ebcdic(text: &str) -> Vec<u8> {
    tn3270r::protocol_common::ebcdic::ascii_to_ebcdic_vec(text)
}

fn frame(record: &[u8]) -> Vec<u8> {
    let mut out = escape_iac(record);
    out.extend_from_slice(&[IAC, EOR]);
    out
}

async fn negotiated() -> (Session3270, SessionReader<ReadHalf<DuplexStream>>, DuplexStream) {
    let (mut host, client) = tokio::io::duplex(64 * 1024);
    host.write_all(&HANDSHAKE).await.unwrap();
    let (session, reader) = establish(client, &config()).await.unwrap();

    let mut replies = vec![0u8; HANDSHAKE_REPLY_LEN];
    host.read_exact(&mut replies).await.unwrap();
    (session, reader, host)
}

/// `[EraseWrite][WCC][SF 0x00][SBA 5]"HI"[IC]`
fn example_record() -> Vec<u8> {
    let mut record = vec![CMD_ERASE_WRITE, WCC_RESTORE, ORDER_SF, 0x00, ORDER_SBA];
    record.extend_from_slice(&addr(5));
    record.extend(ebcdic("HI"));
    record.push(ORDER_IC);
    record
}

/// Protected label at 0, input at 10, protected label at 40, input at 50;
/// cursor in the first input field
fn form_record() -> Vec<u8> {
    let mut record = vec![CMD_ERASE_WRITE, WCC_RESTORE, ORDER_SF, ATTR_PROTECTED];
    record.extend(ebcdic("NAME"));
    for (start, attribute) in [(10u16, 0x00), (40, ATTR_PROTECTED), (50, 0x00)] {
        record.push(ORDER_SBA);
        record.extend_from_slice(&addr(start));
        record.extend_from_slice(&[ORDER_SF, attribute]);
    }
    record.push(ORDER_SBA);
    record.extend_from_slice(&addr(11));
    record.push(ORDER_IC);
    record
}

#[tokio::test]
async fn test_example_record_updates_screen() {
    let (session, mut reader, mut host) = negotiated().await;
    host.write_all(&frame(&example_record())).await.unwrap();

    let outcome = reader.read_next_record().await.unwrap();
    assert_eq!(outcome.command, CommandCode::EraseWrite);
    assert_eq!(outcome.wcc, Some(WCC_RESTORE));

    let snapshot = session.snapshot().await;
    assert_eq!(snapshot.fields.len(), 1);
    assert_eq!(snapshot.fields[0].index(), 0);
    assert!(snapshot.fields[0].can_edit());
    assert!(!snapshot.fields[0].is_modified());
    // Insert Cursor follows "HI", so the cursor sits after it
    assert_eq!(snapshot.cursor_address, 7);
    assert_eq!(snapshot.text.chars().count(), 1920);
    assert_eq!(&snapshot.text[5..7], "HI");

    assert!(session.text().contains("HI"));
    assert!(session.wait_for_text("HI", Duration::from_millis(100)).await);
}

#[tokio::test]
async fn test_record_in_same_read_as_negotiation() {
    let (mut host, client) = tokio::io::duplex(64 * 1024);
    let mut data = HANDSHAKE.to_vec();
    data.extend(frame(&example_record()));
    host.write_all(&data).await.unwrap();

    let (session, mut reader) = establish(client, &config()).await.unwrap();
    reader.read_next_record().await.unwrap();
    assert_eq!(&session.text()[5..7], "HI");
}

#[tokio::test]
async fn test_fill_fields_and_send_enter() {
    let (session, mut reader, mut host) = negotiated().await;
    host.write_all(&frame(&form_record())).await.unwrap();
    reader.read_next_record().await.unwrap();

    assert!(session.try_set_text_by_field_index(1, "B").await);
    assert!(session.try_set_text_by_field_index(0, "AB").await);
    assert!(!session.try_set_text_by_field_index(2, "X").await);
    session.send(AidKey::Enter).await.unwrap();

    let mut expected = vec![AID_ENTER];
    expected.extend_from_slice(&addr(11));
    expected.push(ORDER_SBA);
    expected.extend_from_slice(&addr(11));
    expected.extend(ebcdic("AB"));
    expected.push(ORDER_SBA);
    expected.extend_from_slice(&addr(51));
    expected.extend(ebcdic("B"));
    expected.extend_from_slice(&[IAC, EOR]);

    let mut sent = vec![0u8; expected.len()];
    host.read_exact(&mut sent).await.unwrap();
    assert_eq!(sent, expected);
}

#[tokio::test]
async fn test_mdt_survives_next_record_fields_do_not() {
    let (session, mut reader, mut host) = negotiated().await;
    host.write_all(&frame(&form_record())).await.unwrap();
    reader.read_next_record().await.unwrap();
    assert!(session.try_set_text(10, "X").await);

    // A new screen replaces the field list
    host.write_all(&frame(&[CMD_WRITE, 0x00, 0xC1])).await.unwrap();
    reader.read_next_record().await.unwrap();
    let snapshot = session.snapshot().await;
    assert!(snapshot.fields.is_empty());
    assert_eq!(snapshot.cursor_address, 11);
    assert!(!session.try_set_text(10, "X").await);
}

#[tokio::test]
async fn test_wait_for_text_sees_later_record() {
    let (session, reader, mut host) = negotiated().await;
    let task = reader.spawn();

    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        let mut record = vec![CMD_ERASE_WRITE, 0x00];
        record.extend(ebcdic("READY"));
        host.write_all(&frame(&record)).await.unwrap();
        host
    });

    assert!(session.wait_for_text("READY", Duration::from_secs(5)).await);
    assert!(!session.wait_for_text("LOGON", Duration::from_millis(20)).await);

    let host = writer.await.unwrap();
    drop(host);
    let result = task.await.unwrap();
    assert!(matches!(
        result,
        Err(TN3270Error::Network(NetworkError::ConnectionClosed))
    ));
}

#[tokio::test]
async fn test_read_buffer_is_reported_as_unsupported() {
    let (_session, mut reader, mut host) = negotiated().await;
    host.write_all(&frame(&[CMD_READ_BUFFER])).await.unwrap();

    let err = reader.read_next_record().await.unwrap_err();
    assert!(err.is_unsupported());
    assert!(!err.is_buffer_overflow());
}

#[tokio::test]
async fn test_bad_address_fails_record_and_keeps_screen() {
    let (session, mut reader, mut host) = negotiated().await;
    host.write_all(&frame(&example_record())).await.unwrap();
    reader.read_next_record().await.unwrap();

    host.write_all(&frame(&[CMD_ERASE_WRITE, 0x00, ORDER_SBA, 0x40, 0x01]))
        .await
        .unwrap();
    let err = reader.read_next_record().await.unwrap_err();
    assert!(matches!(
        err,
        TN3270Error::Protocol(ProtocolError::InvalidAddressByte { byte: 0x01 })
    ));
    assert_eq!(&session.snapshot().await.text[5..7], "HI");
}

#[tokio::test]
async fn test_sends_interleaved_with_records_stay_whole() {
    let (session, reader, mut host) = negotiated().await;
    let task = reader.spawn();

    let mut records = Vec::new();
    for i in 0..50u16 {
        let mut record = vec![CMD_ERASE_WRITE, 0x00, ORDER_SBA];
        record.extend_from_slice(&addr(i * 10));
        record.push(ORDER_IC);
        records.extend(frame(&record));
    }

    let sender = {
        let session = session.clone();
        tokio::spawn(async move {
            for _ in 0..20 {
                session.send(AidKey::PF(3)).await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };
    host.write_all(&records).await.unwrap();
    sender.await.unwrap();

    let mut sent = vec![0u8; 20 * 5];
    host.read_exact(&mut sent).await.unwrap();
    for record in sent.chunks(5) {
        assert_eq!(record[0], 0xF3);
        let cursor = tn3270r::lib3270::decode_12bit_address(record[1], record[2]).unwrap();
        assert_eq!(cursor % 10, 0);
        assert_eq!(&record[3..], &[IAC, EOR]);
    }

    drop(host);
    assert!(task.await.unwrap().is_err());
}

/// Transport that hands out pre-cut chunks, one per read
struct ChunkedReader {
    chunks: VecDeque<Vec<u8>>,
}

impl AsyncRead for ChunkedReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if let Some(chunk) = self.chunks.pop_front() {
            buf.put_slice(&chunk);
        }
        Poll::Ready(Ok(()))
    }
}

#[tokio::test]
async fn test_record_across_three_partial_reads() {
    let mut reader = ChunkedReader {
        chunks: VecDeque::from(vec![
            vec![CMD_WRITE, 0x00, 0xC1],
            vec![0xC2, 0xC3, IAC],
            vec![EOR, CMD_WRITE],
        ]),
    };
    let mut framer = RecordFramer::new(5000);

    let record = framer.read_record(&mut reader).await.unwrap();
    assert_eq!(record, vec![CMD_WRITE, 0x00, 0xC1, 0xC2, 0xC3]);
    assert_eq!(framer.buffered_len(), 1);

    // Transport exhausted: a zero-length read ends the session
    let err = framer.read_record(&mut reader).await.unwrap_err();
    assert!(matches!(
        err,
        TN3270Error::Network(NetworkError::ConnectionClosed)
    ));
}
