//! ADATCP frame headers and the connect payload.
//!
//! Every frame starts with a 40-byte session header that is always
//! big-endian, regardless of the client platform. Data frames nest a
//! 24-byte inner header serialized in the client's native order; the peer
//! learns that order from the endianness marker exchanged during connect
//! and mirrors it on replies. The connect payload itself is big-endian
//! because at handshake time no order has been negotiated yet.

use bytes::{BufMut, BytesMut};

use adalink_types::{BufferCursor, Endian};

use crate::{AdaTcpError, AdaTcpResult};

/// Size of the outer session header.
pub const TCP_HEADER_LEN: usize = 40;
/// Size of the inner data header.
pub const DATA_HEADER_LEN: usize = 24;
/// Size of the connect/connect-reply payload.
pub const CONNECT_PAYLOAD_LEN: usize = 72;

const TCP_EYECATCHER: &[u8; 6] = b"ADATCP";
const TCP_VERSION: &[u8; 2] = b"01";
const DATA_EYECATCHER: &[u8; 4] = b"DATA";
const DATA_VERSION: &[u8; 4] = b"0001";

/// Data header discriminator for a client request.
pub const DATA_REQUEST: u32 = 1;
/// Data header discriminator for a nucleus reply.
pub const DATA_REPLY: u32 = 2;

/// Endianness marker for big-endian clients.
pub const ENDIAN_BIG: u8 = 1;
/// Endianness marker for little-endian clients.
pub const ENDIAN_LITTLE: u8 = 2;
/// Charset marker for 8-bit ASCII clients.
pub const CHARSET_ASCII8: u8 = 1;
/// Float marker for IEEE clients.
pub const FLOAT_IEEE: u8 = 1;

// ── BufferType ─────────────────────────────────────────────────────

/// Discriminator of an ADATCP frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BufferType {
    /// Client handshake request.
    ConnectRequest = 1,
    /// Nucleus handshake reply.
    ConnectReply = 2,
    /// Handshake rejection.
    ConnectError = 3,
    /// Client teardown request.
    DisconnectRequest = 4,
    /// Nucleus teardown reply.
    DisconnectReply = 5,
    /// Teardown rejection.
    DisconnectError = 6,
    /// Database call request.
    DataRequest = 7,
    /// Database call reply.
    DataReply = 8,
    /// Database call rejection.
    DataError = 9,
}

impl BufferType {
    /// Decode a wire discriminator.
    pub fn from_u32(code: u32) -> AdaTcpResult<Self> {
        Ok(match code {
            1 => Self::ConnectRequest,
            2 => Self::ConnectReply,
            3 => Self::ConnectError,
            4 => Self::DisconnectRequest,
            5 => Self::DisconnectReply,
            6 => Self::DisconnectError,
            7 => Self::DataRequest,
            8 => Self::DataReply,
            9 => Self::DataError,
            code => return Err(AdaTcpError::InvalidBufferType { code }),
        })
    }
}

// ── AdaTcpHeader ───────────────────────────────────────────────────

/// The 40-byte outer session header, always big-endian.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaTcpHeader {
    /// Frame discriminator.
    pub buffer_type: BufferType,
    /// Total frame length including this header.
    pub length: u32,
    /// Session identification token assigned by the nucleus.
    pub identification: [u8; 16],
    /// Peer error code, zero when clean.
    pub error_code: u32,
}

impl AdaTcpHeader {
    /// Header for a new frame of `buffer_type` and total `length`.
    pub fn new(buffer_type: BufferType, length: u32, identification: [u8; 16]) -> Self {
        Self {
            buffer_type,
            length,
            identification,
            error_code: 0,
        }
    }

    /// Append the serialized header to `out`.
    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_slice(TCP_EYECATCHER);
        out.put_slice(TCP_VERSION);
        out.put_u32(self.length);
        out.put_u32(self.buffer_type as u32);
        out.put_slice(&self.identification);
        out.put_u32(self.error_code);
        out.put_u32(0);
    }

    /// Parse a header from the first [`TCP_HEADER_LEN`] bytes of `buf`.
    pub fn parse(buf: &[u8]) -> AdaTcpResult<Self> {
        let mut cursor = BufferCursor::new(buf, Endian::Big);
        if cursor.get_bytes(6) != TCP_EYECATCHER {
            return Err(AdaTcpError::InvalidEyecatcher);
        }
        // Version bytes are carried but not enforced.
        let _version = cursor.get_bytes(2);
        let length = cursor.get_u32();
        let buffer_type = BufferType::from_u32(cursor.get_u32())?;
        let mut identification = [0u8; 16];
        identification.copy_from_slice(&cursor.get_bytes(16));
        let error_code = cursor.get_u32();
        Ok(Self {
            buffer_type,
            length,
            identification,
            error_code,
        })
    }
}

// ── AdaTcpDataHeader ───────────────────────────────────────────────

/// The 24-byte inner data header, serialized in the client's native
/// order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdaTcpDataHeader {
    /// Inner length: this header plus the payload.
    pub length: u32,
    /// [`DATA_REQUEST`] or [`DATA_REPLY`].
    pub data_type: u32,
    /// Number of Adabas buffers in the payload.
    pub buffer_count: u32,
    /// Peer error code, zero when clean.
    pub error_code: u32,
}

impl AdaTcpDataHeader {
    /// Header for a request carrying `payload_len` bytes in
    /// `buffer_count` buffers.
    pub fn request(payload_len: usize, buffer_count: u32) -> Self {
        Self {
            length: (DATA_HEADER_LEN + payload_len) as u32,
            data_type: DATA_REQUEST,
            buffer_count,
            error_code: 0,
        }
    }

    /// Append the serialized header to `out` in `endian` order.
    pub fn write_to(&self, out: &mut BytesMut, endian: Endian) {
        out.put_slice(DATA_EYECATCHER);
        out.put_slice(DATA_VERSION);
        endian.put_u32(out, self.length);
        endian.put_u32(out, self.data_type);
        endian.put_u32(out, self.buffer_count);
        endian.put_u32(out, self.error_code);
    }

    /// Parse a header from the first [`DATA_HEADER_LEN`] bytes of `buf`.
    pub fn parse(buf: &[u8], endian: Endian) -> AdaTcpResult<Self> {
        let mut cursor = BufferCursor::new(buf, endian);
        if cursor.get_bytes(4) != DATA_EYECATCHER {
            return Err(AdaTcpError::InvalidEyecatcher);
        }
        let _version = cursor.get_bytes(4);
        Ok(Self {
            length: cursor.get_u32(),
            data_type: cursor.get_u32(),
            buffer_count: cursor.get_u32(),
            error_code: cursor.get_u32(),
        })
    }
}

// ── ConnectPayload ─────────────────────────────────────────────────

/// The 72-byte connect payload, always big-endian.
///
/// Sent by the client with its platform markers; the nucleus echoes it
/// back with the database identity filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectPayload {
    /// Database version, space-padded.
    pub database_version: [u8; 16],
    /// Database name, space-padded.
    pub database_name: [u8; 16],
    /// User id, space-padded.
    pub user: [u8; 8],
    /// Node id, space-padded.
    pub node: [u8; 8],
    /// Client process id.
    pub pid: u32,
    /// Database id.
    pub database_id: u32,
    /// Connect timestamp in microseconds.
    pub timestamp: u64,
    /// [`ENDIAN_BIG`] or [`ENDIAN_LITTLE`].
    pub endian_marker: u8,
    /// Charset marker, [`CHARSET_ASCII8`] for this client.
    pub charset: u8,
    /// Float marker, [`FLOAT_IEEE`] for this client.
    pub float_kind: u8,
}

impl ConnectPayload {
    /// Payload announcing this client's platform.
    pub fn client(user: [u8; 8], node: [u8; 8], pid: u32, timestamp: u64) -> Self {
        let endian_marker = match Endian::native() {
            Endian::Big => ENDIAN_BIG,
            Endian::Little => ENDIAN_LITTLE,
        };
        Self {
            database_version: [b' '; 16],
            database_name: [b' '; 16],
            user,
            node,
            pid,
            database_id: 0,
            timestamp,
            endian_marker,
            charset: CHARSET_ASCII8,
            float_kind: FLOAT_IEEE,
        }
    }

    /// The byte order announced by this payload.
    pub fn endianness(&self) -> Endian {
        if self.endian_marker == ENDIAN_BIG {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    /// Append the serialized payload to `out`.
    pub fn write_to(&self, out: &mut BytesMut) {
        out.put_slice(&self.database_version);
        out.put_slice(&self.database_name);
        out.put_slice(&self.user);
        out.put_slice(&self.node);
        out.put_u32(self.pid);
        out.put_u32(self.database_id);
        out.put_u64(self.timestamp);
        out.put_u8(self.endian_marker);
        out.put_u8(self.charset);
        out.put_u8(self.float_kind);
        out.put_bytes(0, 5);
    }

    /// Parse a payload from the first [`CONNECT_PAYLOAD_LEN`] bytes of
    /// `buf`.
    pub fn parse(buf: &[u8]) -> Self {
        let mut cursor = BufferCursor::new(buf, Endian::Big);
        let mut database_version = [0u8; 16];
        database_version.copy_from_slice(&cursor.get_bytes(16));
        let mut database_name = [0u8; 16];
        database_name.copy_from_slice(&cursor.get_bytes(16));
        let mut user = [0u8; 8];
        user.copy_from_slice(&cursor.get_bytes(8));
        let mut node = [0u8; 8];
        node.copy_from_slice(&cursor.get_bytes(8));
        Self {
            database_version,
            database_name,
            user,
            node,
            pid: cursor.get_u32(),
            database_id: cursor.get_u32(),
            timestamp: cursor.get_u64(),
            endian_marker: cursor.get_u8(),
            charset: cursor.get_u8(),
            float_kind: cursor.get_u8(),
        }
    }
}

// ── Hex dump ───────────────────────────────────────────────────────

/// Render a frame as an offset/hex/ASCII dump for trace logging.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 4);
    for (line, chunk) in bytes.chunks(16).enumerate() {
        out.push_str(&format!("{:06x}  ", line * 16));
        for i in 0..16 {
            match chunk.get(i) {
                Some(b) => out.push_str(&format!("{:02x} ", b)),
                None => out.push_str("   "),
            }
        }
        out.push(' ');
        for &b in chunk {
            out.push(if (0x20..0x7F).contains(&b) {
                b as char
            } else {
                '.'
            });
        }
        out.push('\n');
    }
    out
}

// ── Tests ──────────────────────────────────────────────────────────
