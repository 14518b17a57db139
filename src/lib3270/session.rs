//! TN3270 session
//!
//! A session is negotiated once and then split in two:
//!
//! - [`SessionReader`] owns the read half of the transport and runs the
//!   record loop: frame, decode, publish.
//! - [`Session3270`] is a cloneable handle for everything the caller does:
//!   filling fields, sending an AID, reading or waiting for screen text.
//!
//! Screen state sits behind one async mutex. The reader holds it for the
//! whole decode of a record, and the handle takes it for every read or
//! write, so callers only ever see the screen between records.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::time::Instant;
use uuid::Uuid;

use super::codes::AidKey;
use super::display::{Display3270, ScreenSnapshot};
use super::framer::RecordFramer;
use super::protocol::{build_aid_record, ProtocolProcessor3270, RecordOutcome};
use super::telnet::TelnetNegotiator;
use crate::config::SessionConfig;
use crate::error::{BufferError, NetworkError, TN3270Result};
use crate::protocol_common::ebcdic::codec_for_page;
use crate::protocol_common::traits::TextCodec;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// State shared by the handle and the reader
struct SessionShared {
    id: Uuid,
    display: Mutex<Display3270>,
    writer: Mutex<BoxedWriter>,
    text_tx: watch::Sender<String>,
    poll_interval: Duration,
}

/// Caller-side handle to a negotiated session
#[derive(Clone)]
pub struct Session3270 {
    shared: Arc<SessionShared>,
}

/// Read side of a session; drives the record loop
pub struct SessionReader<R> {
    reader: R,
    framer: RecordFramer,
    processor: ProtocolProcessor3270,
    shared: Arc<SessionShared>,
}

/// Connect to the configured host and negotiate binary 3270 mode
pub async fn connect(
    config: &SessionConfig,
) -> TN3270Result<(Session3270, SessionReader<ReadHalf<TcpStream>>)> {
    config.validate()?;
    let host = config.host.clone();
    let port = config.port;

    info!("Connecting to {}:{}", host, port);
    let attempt =
        tokio::time::timeout(config.connect_timeout(), TcpStream::connect((host.as_str(), port)))
            .await;
    let stream = match attempt {
        Err(_) => {
            return Err(NetworkError::Timeout {
                host,
                port,
                timeout_seconds: config.connect_timeout_secs,
            }
            .into())
        }
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::ConnectionRefused => {
            return Err(NetworkError::ConnectionRefused { host, port }.into())
        }
        Ok(Err(e)) => return Err(e.into()),
        Ok(Ok(stream)) => stream,
    };
    stream.set_nodelay(true)?;

    establish(stream, config).await
}

/// Negotiate over an already-connected transport and build the session
///
/// Works over any duplex byte stream, which is how the tests drive a
/// session against an in-memory host.
pub async fn establish<S>(
    stream: S,
    config: &SessionConfig,
) -> TN3270Result<(Session3270, SessionReader<ReadHalf<S>>)>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let codec: Arc<dyn TextCodec> = Arc::from(codec_for_page(config.code_page)?);
    let (mut reader, mut writer) = tokio::io::split(stream);
    let id = Uuid::new_v4();

    let leftover = negotiate(&mut reader, &mut writer, config).await?;
    info!("[{}] Negotiated binary 3270 mode as {}", id, config.terminal_type);

    let display = Display3270::with_codec(codec);
    let (text_tx, _) = watch::channel(display.text().to_string());
    let shared = Arc::new(SessionShared {
        id,
        display: Mutex::new(display),
        writer: Mutex::new(Box::new(writer)),
        text_tx,
        poll_interval: config.poll_interval(),
    });

    let mut framer = RecordFramer::new(config.receive_buffer_size);
    framer.push(&leftover);

    let session = Session3270 {
        shared: Arc::clone(&shared),
    };
    let reader = SessionReader {
        reader,
        framer,
        processor: ProtocolProcessor3270::new(),
        shared,
    };
    Ok((session, reader))
}

/// Answer the host's option negotiation until it offers `WILL BINARY`
///
/// Returns whatever followed the `WILL BINARY` in the last read; those bytes
/// are the start of the record stream.
pub async fn negotiate<R, W>(
    reader: &mut R,
    writer: &mut W,
    config: &SessionConfig,
) -> TN3270Result<Vec<u8>>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let capacity = config.receive_buffer_size;
    let mut negotiator = TelnetNegotiator::new(config.terminal_type.clone());
    let mut buf = vec![0u8; capacity];

    while !negotiator.is_binary() {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            return Err(NetworkError::ConnectionClosed.into());
        }
        if n >= capacity {
            return Err(BufferError::Overflow { capacity }.into());
        }

        for reply in negotiator.process_incoming_data(&buf[..n])? {
            debug!("Negotiation reply: {:02X?}", reply);
            writer.write_all(&reply).await?;
        }
        writer.flush().await?;

        // An unterminated subnegotiation must not grow across reads
        if negotiator.pending_len() >= capacity {
            return Err(BufferError::Overflow { capacity }.into());
        }
    }

    Ok(negotiator.take_remainder())
}

impl<R> SessionReader<R>
where
    R: AsyncRead + Unpin,
{
    pub fn session_id(&self) -> Uuid {
        self.shared.id
    }

    /// Read, decode and publish the next host record
    pub async fn read_next_record(&mut self) -> TN3270Result<RecordOutcome> {
        loop {
            let record = self.framer.read_record(&mut self.reader).await?;
            if record.is_empty() {
                debug!("[{}] Skipping empty record", self.shared.id);
                continue;
            }

            let mut display = self.shared.display.lock().await;
            let outcome = self.processor.process_record(&record, &mut display)?;
            self.shared.text_tx.send_replace(display.text().to_string());
            return Ok(outcome);
        }
    }

    /// Run the record loop until the connection ends or a record is fatal
    pub async fn run(mut self) -> TN3270Result<()> {
        loop {
            if let Err(e) = self.read_next_record().await {
                error!("[{}] Session terminated: {}", self.shared.id, e);
                return Err(e);
            }
        }
    }
}

impl<R> SessionReader<R>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    /// Run the record loop on its own task
    pub fn spawn(self) -> tokio::task::JoinHandle<TN3270Result<()>> {
        tokio::spawn(self.run())
    }
}

impl Session3270 {
    /// Identifier used in this session's log lines
    pub fn id(&self) -> Uuid {
        self.shared.id
    }

    /// Write text into the field owning a buffer index
    pub async fn try_set_text(&self, index: usize, text: &str) -> bool {
        self.shared.display.lock().await.try_set_text(index, text)
    }

    /// Write text into the `ordinal`-th editable field
    pub async fn try_set_text_by_field_index(&self, ordinal: usize, text: &str) -> bool {
        self.shared
            .display
            .lock()
            .await
            .try_set_text_by_field_index(ordinal, text)
    }

    /// Send an attention key with the cursor and all modified fields
    pub async fn send(&self, aid: AidKey) -> TN3270Result<()> {
        let record = {
            let display = self.shared.display.lock().await;
            build_aid_record(&display, aid)?
        };
        debug!("[{}] Sending {:?}: {} bytes", self.shared.id, aid, record.len());

        let mut writer = self.shared.writer.lock().await;
        writer.write_all(&record).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Decoded screen text as of the last record
    pub fn text(&self) -> String {
        self.shared.text_tx.borrow().clone()
    }

    /// Receiver notified after every decoded record
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.shared.text_tx.subscribe()
    }

    /// Text, cursor and fields
    pub async fn snapshot(&self) -> ScreenSnapshot {
        self.shared.display.lock().await.snapshot()
    }

    /// Screen as 24 lines of 80 columns
    pub async fn screen(&self) -> String {
        self.shared.display.lock().await.to_string()
    }

    /// Wait until the screen text contains `text`
    ///
    /// Checks on the configured poll interval and gives up with `false`
    /// once `timeout` has passed.
    pub async fn wait_for_text(&self, text: &str, timeout: Duration) -> bool {
        // A timeout too large to represent never expires
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if self.shared.text_tx.borrow().contains(text) {
                return true;
            }
            let mut pause = self.shared.poll_interval;
            if let Some(deadline) = deadline {
                let now = Instant::now();
                if now >= deadline {
                    return false;
                }
                pause = pause.min(deadline - now);
            }
            tokio::time::sleep(pause).await;
        }
    }

    /// Shut down the write half of the transport
    pub async fn close(&self) -> TN3270Result<()> {
        info!("[{}] Closing session", self.shared.id);
        self.shared.writer.lock().await.shutdown().await?;
        Ok(())
    }
}

impl std::fmt::Debug for Session3270 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session3270").field("id", &self.shared.id).finish()
    }
}
