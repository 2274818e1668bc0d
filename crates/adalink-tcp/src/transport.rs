//! ADATCP wire session.
//!
//! Manages the session lifecycle against a nucleus:
//! 1. connect → 112-byte handshake frame exchanged, session token and
//!    platform markers retained
//! 2. send_data / receive_data → strictly synchronous request/reply
//! 3. disconnect → teardown frame, socket closed unconditionally
//!
//! Frames are received in two phases: an exact 64-byte header read
//! (outer session header plus inner data header), then an exact read of
//! the declared remainder. A reply whose declared length stops at the
//! headers carries no payload and surfaces the outer header's error code.

use std::time::Duration;

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, ToSocketAddrs};

use adalink_types::Endian;

use crate::frame::{
    hex_dump, AdaTcpDataHeader, AdaTcpHeader, BufferType, ConnectPayload, CONNECT_PAYLOAD_LEN,
    DATA_HEADER_LEN, TCP_HEADER_LEN,
};
use crate::{AdaTcpError, AdaTcpResult};

const HEADER_READ_LEN: usize = TCP_HEADER_LEN + DATA_HEADER_LEN;
const DISCONNECT_PAYLOAD_LEN: usize = 8;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No socket.
    Disconnected,
    /// Handshake in flight.
    Connecting,
    /// Handshake completed, calls may be issued.
    Connected,
    /// Teardown in flight.
    Disconnecting,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Disconnected => write!(f, "Disconnected"),
            SessionState::Connecting => write!(f, "Connecting"),
            SessionState::Connected => write!(f, "Connected"),
            SessionState::Disconnecting => write!(f, "Disconnecting"),
        }
    }
}

/// Connect parameters announced during the handshake.
#[derive(Debug, Clone)]
pub struct ConnectOptions {
    /// User id, space-padded to 8 bytes.
    pub user: [u8; 8],
    /// Node id, space-padded to 8 bytes.
    pub node: [u8; 8],
    /// Client process id.
    pub pid: u32,
    /// Connect timestamp in microseconds.
    pub timestamp: u64,
    /// Per-operation socket timeout.
    pub timeout: Duration,
}

impl ConnectOptions {
    /// Options for `user` on `node` with process id `pid`; ids longer
    /// than 8 bytes are truncated, shorter ones space-padded.
    pub fn new(user: &str, node: &str, pid: u32) -> Self {
        Self {
            user: pad8(user),
            node: pad8(node),
            pid,
            timestamp: 0,
            timeout: Duration::from_secs(60),
        }
    }

    /// Replace the socket timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the connect timestamp.
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

fn pad8(text: &str) -> [u8; 8] {
    let mut out = [b' '; 8];
    let raw = text.as_bytes();
    let take = raw.len().min(8);
    out[..take].copy_from_slice(&raw[..take]);
    out
}

/// One wire session against a nucleus.
///
/// Calls take `&mut self`: a session carries at most one outstanding
/// request, replies are matched by arrival order.
pub struct AdaTcpSession {
    stream: TcpStream,
    state: SessionState,
    timeout: Duration,
    endian: Endian,
    peer_endian: Endian,
    peer_charset: u8,
    peer_float_kind: u8,
    identification: [u8; 16],
    database_name: String,
    database_version: String,
    database_id: u32,
}

impl AdaTcpSession {
    /// Dial `addr` and run the connect handshake.
    pub async fn connect(addr: impl ToSocketAddrs, options: ConnectOptions) -> AdaTcpResult<Self> {
        let timeout = options.timeout;
        let stream = io_deadline(timeout, TcpStream::connect(addr)).await??;
        stream.set_nodelay(true)?;

        let mut session = Self {
            stream,
            state: SessionState::Connecting,
            timeout,
            endian: Endian::native(),
            peer_endian: Endian::native(),
            peer_charset: 0,
            peer_float_kind: 0,
            identification: [0u8; 16],
            database_name: String::new(),
            database_version: String::new(),
            database_id: 0,
        };
        session.handshake(&options).await?;
        session.state = SessionState::Connected;
        Ok(session)
    }

    async fn handshake(&mut self, options: &ConnectOptions) -> AdaTcpResult<()> {
        let payload =
            ConnectPayload::client(options.user, options.node, options.pid, options.timestamp);
        let header = AdaTcpHeader::new(
            BufferType::ConnectRequest,
            (TCP_HEADER_LEN + CONNECT_PAYLOAD_LEN) as u32,
            self.identification,
        );
        let mut frame = BytesMut::with_capacity(TCP_HEADER_LEN + CONNECT_PAYLOAD_LEN);
        header.write_to(&mut frame);
        payload.write_to(&mut frame);
        self.write_frame(&frame).await?;

        let mut reply = [0u8; TCP_HEADER_LEN + CONNECT_PAYLOAD_LEN];
        self.read_frame(&mut reply).await?;
        let reply_header = AdaTcpHeader::parse(&reply[..TCP_HEADER_LEN])?;
        if reply_header.buffer_type == BufferType::ConnectError || reply_header.error_code != 0 {
            return Err(AdaTcpError::Nucleus {
                code: reply_header.error_code,
            });
        }
        let reply_payload = ConnectPayload::parse(&reply[TCP_HEADER_LEN..]);

        self.identification = reply_header.identification;
        self.peer_endian = reply_payload.endianness();
        self.peer_charset = reply_payload.charset;
        self.peer_float_kind = reply_payload.float_kind;
        self.database_name = trimmed(&reply_payload.database_name);
        self.database_version = trimmed(&reply_payload.database_version);
        self.database_id = reply_payload.database_id;
        tracing::debug!(
            database = %self.database_name,
            version = %self.database_version,
            dbid = self.database_id,
            "connect handshake completed"
        );
        Ok(())
    }

    /// Send one database call: outer header, inner data header, payload,
    /// written as a single frame.
    pub async fn send_data(&mut self, payload: &[u8], buffer_count: u32) -> AdaTcpResult<()> {
        self.ensure_connected()?;
        let total = TCP_HEADER_LEN + DATA_HEADER_LEN + payload.len();
        let header = AdaTcpHeader::new(BufferType::DataRequest, total as u32, self.identification);
        let data_header = AdaTcpDataHeader::request(payload.len(), buffer_count);

        let mut frame = BytesMut::with_capacity(total);
        header.write_to(&mut frame);
        data_header.write_to(&mut frame, self.endian);
        frame.put_slice(payload);
        self.write_frame(&frame).await
    }

    /// Receive one reply into `out`, returning the inner header's buffer
    /// count.
    ///
    /// The 64 header bytes are read exactly; a short read is fatal. A
    /// declared length equal to the header read is a header-only reply
    /// and surfaces the outer header's error code; a shorter declared
    /// length is framing corruption. Otherwise the remainder is read
    /// exactly, never assuming one read delivers a frame.
    pub async fn receive_data(&mut self, out: &mut BytesMut) -> AdaTcpResult<u32> {
        self.ensure_connected()?;
        let mut head = [0u8; HEADER_READ_LEN];
        self.read_frame(&mut head).await?;

        let header = self.fatal_on_framing(AdaTcpHeader::parse(&head[..TCP_HEADER_LEN]))?;
        let length = header.length as usize;
        if length == HEADER_READ_LEN {
            tracing::debug!(code = header.error_code, "header-only reply");
            return Err(AdaTcpError::Nucleus {
                code: header.error_code,
            });
        }
        if length < HEADER_READ_LEN {
            self.state = SessionState::Disconnected;
            return Err(AdaTcpError::InvalidFrameLength {
                length: header.length,
            });
        }
        let data_header =
            self.fatal_on_framing(AdaTcpDataHeader::parse(&head[TCP_HEADER_LEN..], self.endian))?;

        out.clear();
        out.resize(length - HEADER_READ_LEN, 0);
        self.read_frame(out).await?;
        tracing::trace!(
            buffers = data_header.buffer_count,
            "received\n{}",
            hex_dump(out)
        );
        Ok(data_header.buffer_count)
    }

    /// Send the teardown frame and close the socket. The socket is closed
    /// even when the exchange fails.
    pub async fn disconnect(mut self) -> AdaTcpResult<()> {
        self.state = SessionState::Disconnecting;
        let total = TCP_HEADER_LEN + DISCONNECT_PAYLOAD_LEN;
        let header =
            AdaTcpHeader::new(BufferType::DisconnectRequest, total as u32, self.identification);
        let mut frame = BytesMut::with_capacity(total);
        header.write_to(&mut frame);
        frame.put_bytes(0, DISCONNECT_PAYLOAD_LEN);

        let result = async {
            self.write_frame(&frame).await?;
            let mut reply = [0u8; TCP_HEADER_LEN + DISCONNECT_PAYLOAD_LEN];
            self.read_frame(&mut reply).await?;
            let reply_header = AdaTcpHeader::parse(&reply[..TCP_HEADER_LEN])?;
            if reply_header.error_code != 0 {
                return Err(AdaTcpError::Nucleus {
                    code: reply_header.error_code,
                });
            }
            Ok(())
        }
        .await;
        // Dropping the session closes the socket regardless of the
        // teardown outcome.
        tracing::debug!("session disconnected");
        result
    }

    /// Lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Byte order of this session's data headers and buffers.
    pub fn endianness(&self) -> Endian {
        self.endian
    }

    /// Byte order the peer announced during connect; payloads the peer
    /// produces in its own order are interpreted with this.
    pub fn peer_endianness(&self) -> Endian {
        self.peer_endian
    }

    /// Charset marker the peer announced during connect.
    pub fn peer_charset(&self) -> u8 {
        self.peer_charset
    }

    /// Float marker the peer announced during connect.
    pub fn peer_float_kind(&self) -> u8 {
        self.peer_float_kind
    }

    /// Session token assigned by the nucleus.
    pub fn identification(&self) -> &[u8; 16] {
        &self.identification
    }

    /// Database name reported during connect.
    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    /// Database version reported during connect.
    pub fn database_version(&self) -> &str {
        &self.database_version
    }

    /// Database id reported during connect.
    pub fn database_id(&self) -> u32 {
        self.database_id
    }

    /// Framing corruption leaves no resumable stream position; the
    /// session is torn down before the error propagates.
    fn fatal_on_framing<T>(&mut self, result: AdaTcpResult<T>) -> AdaTcpResult<T> {
        if result.is_err() {
            self.state = SessionState::Disconnected;
        }
        result
    }

    fn ensure_connected(&self) -> AdaTcpResult<()> {
        if self.state != SessionState::Connected {
            return Err(AdaTcpError::Io(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                format!("session is {}", self.state),
            )));
        }
        Ok(())
    }

    async fn write_frame(&mut self, frame: &[u8]) -> AdaTcpResult<()> {
        tracing::trace!("sending\n{}", hex_dump(frame));
        match io_deadline(self.timeout, self.stream.write_all(frame)).await {
            Ok(result) => Ok(result?),
            Err(timeout) => {
                self.state = SessionState::Disconnected;
                Err(timeout)
            }
        }
    }

    async fn read_frame(&mut self, buf: &mut [u8]) -> AdaTcpResult<()> {
        match io_deadline(self.timeout, self.stream.read_exact(buf)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                self.state = SessionState::Disconnected;
                Err(AdaTcpError::HeaderNotReceived)
            }
            Ok(Err(err)) => {
                self.state = SessionState::Disconnected;
                Err(err.into())
            }
            Err(timeout) => {
                self.state = SessionState::Disconnected;
                Err(timeout)
            }
        }
    }
}

async fn io_deadline<F>(timeout: Duration, fut: F) -> AdaTcpResult<F::Output>
where
    F: std::future::Future,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| AdaTcpError::Timeout)
}

fn trimmed(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches(['\0', ' '])
        .to_string()
}

// ── Tests ──────────────────────────────────────────────────────────
