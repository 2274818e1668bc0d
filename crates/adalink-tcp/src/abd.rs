//! Adabas Buffer Descriptors and growable call buffers.
//!
//! Every buffer travelling with a database call is described by a 48-byte
//! ABD header carrying its kind, allocated size, and the bytes-to-send /
//! bytes-received counts. [`AdaBuffer`] pairs an ABD with a growable
//! backing store and a write cursor; writes grow the store silently and
//! keep the send count at the cursor, so callers never see a capacity
//! error.

use bytes::{BufMut, BytesMut};

use adalink_types::{BufferCursor, Endian};

use crate::{AdaTcpError, AdaTcpResult};

/// Size of a serialized buffer descriptor.
pub const ABD_LEN: usize = 48;

const ABD_EYECATCHER: u8 = b'G';
const ABD_VERSION: u8 = b'2';
const LOC_INDIRECT: u8 = b'I';

// ── BufferKind ─────────────────────────────────────────────────────

/// The kind of an Adabas call buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKind {
    /// Format buffer.
    Format,
    /// Record buffer.
    Record,
    /// Search buffer.
    Search,
    /// Value buffer.
    Value,
    /// ISN buffer.
    Isn,
    /// Performance buffer.
    Performance,
    /// Multifetch buffer.
    Multifetch,
    /// User info buffer.
    UserInfo,
    /// Reserved internal I/O buffer.
    Io,
    /// Reserved CLEX info buffer.
    ClexInfo,
    /// Reserved security buffer.
    Security,
}

impl BufferKind {
    /// The id character carried in the ABD.
    pub fn code(self) -> u8 {
        match self {
            Self::Format => b'F',
            Self::Record => b'R',
            Self::Search => b'S',
            Self::Value => b'V',
            Self::Isn => b'I',
            Self::Performance => b'P',
            Self::Multifetch => b'M',
            Self::UserInfo => b'U',
            Self::Io => b'O',
            Self::ClexInfo => b'X',
            Self::Security => b'Z',
        }
    }

    /// Decode an ABD id character.
    pub fn from_code(code: u8) -> AdaTcpResult<Self> {
        Ok(match code {
            b'F' => Self::Format,
            b'R' => Self::Record,
            b'S' => Self::Search,
            b'V' => Self::Value,
            b'I' => Self::Isn,
            b'P' => Self::Performance,
            b'M' => Self::Multifetch,
            b'U' => Self::UserInfo,
            b'O' => Self::Io,
            b'X' => Self::ClexInfo,
            b'Z' => Self::Security,
            code => return Err(AdaTcpError::InvalidBufferKind { code }),
        })
    }
}

// ── Abd ────────────────────────────────────────────────────────────

/// The 48-byte buffer descriptor header.
///
/// Serialized in the session's byte order. The address slot at offset 40
/// is only meaningful for locally attached callers and is transmitted as
/// zero; buffers are always indirectly addressed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abd {
    /// Buffer kind.
    pub kind: BufferKind,
    /// Allocated size of the backing store.
    pub size: u64,
    /// Bytes to send with the call.
    pub send: u64,
    /// Bytes the nucleus wrote back.
    pub received: u64,
}

impl Abd {
    /// A zeroed descriptor of `kind`.
    pub fn new(kind: BufferKind) -> Self {
        Self {
            kind,
            size: 0,
            send: 0,
            received: 0,
        }
    }

    /// Append the serialized descriptor to `out` in `endian` order.
    pub fn write_to(&self, out: &mut BytesMut, endian: Endian) {
        endian.put_u16(out, ABD_LEN as u16);
        out.put_u8(ABD_EYECATCHER);
        out.put_u8(ABD_VERSION);
        out.put_u8(self.kind.code());
        out.put_u8(0);
        out.put_u8(LOC_INDIRECT);
        out.put_bytes(0, 9);
        endian.put_u64(out, self.size);
        endian.put_u64(out, self.send);
        endian.put_u64(out, self.received);
        endian.put_u64(out, 0);
    }

    /// Parse a descriptor from the first [`ABD_LEN`] bytes of `buf`.
    pub fn parse(buf: &[u8], endian: Endian) -> AdaTcpResult<Self> {
        let mut cursor = BufferCursor::new(buf, endian);
        let len = cursor.get_u16();
        if len as usize != ABD_LEN {
            return Err(AdaTcpError::InvalidAbd {
                reason: format!("descriptor length {} instead of {}", len, ABD_LEN),
            });
        }
        if cursor.get_u8() != ABD_EYECATCHER || cursor.get_u8() != ABD_VERSION {
            return Err(AdaTcpError::InvalidAbd {
                reason: "eyecatcher mismatch".to_string(),
            });
        }
        let kind = BufferKind::from_code(cursor.get_u8())?;
        cursor.seek(16);
        let size = cursor.get_u64();
        let send = cursor.get_u64();
        let received = cursor.get_u64();
        Ok(Self {
            kind,
            size,
            send,
            received,
        })
    }
}

// ── AdaBuffer ──────────────────────────────────────────────────────

/// A call buffer: descriptor, backing store, and write cursor.
#[derive(Debug, Clone)]
pub struct AdaBuffer {
    abd: Abd,
    data: Vec<u8>,
    offset: usize,
}

impl AdaBuffer {
    /// An empty buffer of `kind`.
    pub fn new(kind: BufferKind) -> Self {
        Self {
            abd: Abd::new(kind),
            data: Vec::new(),
            offset: 0,
        }
    }

    /// A buffer of `kind` with `size` bytes allocated up front.
    pub fn with_size(kind: BufferKind, size: usize) -> Self {
        let mut buffer = Self::new(kind);
        buffer.allocate(size);
        buffer
    }

    /// The current descriptor.
    pub fn abd(&self) -> &Abd {
        &self.abd
    }

    /// The write cursor.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// The backing store.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Reserve an exact-size backing store, resetting cursor and counts.
    /// A store already at `size` is kept.
    pub fn allocate(&mut self, size: usize) {
        if self.data.len() != size {
            self.data = vec![0u8; size];
        }
        self.abd.size = size as u64;
        self.abd.send = 0;
        self.abd.received = 0;
        self.offset = 0;
    }

    /// Grow the backing store to at least `size` bytes. Never truncates.
    pub fn grow(&mut self, size: usize) {
        if size > self.data.len() {
            self.data.resize(size, 0);
        }
        self.abd.size = self.data.len() as u64;
    }

    /// Copy `raw` at the cursor, growing as needed; the send count tracks
    /// the cursor after the write.
    pub fn write_binary(&mut self, raw: &[u8]) {
        let end = self.offset + raw.len();
        self.grow(end);
        self.data[self.offset..end].copy_from_slice(raw);
        self.offset = end;
        self.abd.send = self.offset as u64;
    }

    /// Copy a string at the cursor; see [`write_binary`](Self::write_binary).
    pub fn write_string(&mut self, text: &str) {
        self.write_binary(text.as_bytes());
    }

    /// Move the cursor, clamped to the allocated size.
    pub fn seek(&mut self, pos: usize) {
        self.offset = pos.min(self.data.len());
    }

    /// Read `len` bytes at `start`; out-of-range requests yield an empty
    /// slice.
    pub fn read(&self, start: usize, len: usize) -> &[u8] {
        match start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
        {
            Some(slice) => slice,
            None => &[],
        }
    }

    /// Record how many bytes the nucleus wrote back.
    pub fn set_received(&mut self, received: u64) {
        self.abd.received = received;
    }

    /// Drop the backing store and zero all counts.
    pub fn clear(&mut self) {
        self.data.clear();
        self.offset = 0;
        self.abd.size = 0;
        self.abd.send = 0;
        self.abd.received = 0;
    }

    /// Serialize descriptor plus the bytes-to-send for the wire.
    pub fn write_wire(&self, out: &mut BytesMut, endian: Endian) {
        self.abd.write_to(out, endian);
        out.put_slice(&self.data[..self.abd.send as usize]);
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abd_round_trip() {
        let abd = Abd {
            kind: BufferKind::Record,
            size: 4096,
            send: 100,
            received: 60,
        };
        for endian in [Endian::Big, Endian::Little] {
            let mut out = BytesMut::new();
            abd.write_to(&mut out, endian);
            assert_eq!(out.len(), ABD_LEN);
            assert_eq!(Abd::parse(&out, endian).unwrap(), abd);
        }
    }

    #[test]
    fn abd_layout_is_fixed() {
        let mut out = BytesMut::new();
        Abd::new(BufferKind::Format).write_to(&mut out, Endian::Big);
        assert_eq!(u16::from_be_bytes(out[..2].try_into().unwrap()), 48);
        assert_eq!(out[2], b'G');
        assert_eq!(out[3], b'2');
        assert_eq!(out[4], b'F');
        assert_eq!(out[6], b'I');
    }

    #[test]
    fn abd_rejects_bad_length() {
        let mut out = BytesMut::new();
        Abd::new(BufferKind::Isn).write_to(&mut out, Endian::Big);
        out[0] = 0;
        out[1] = 40;
        assert!(matches!(
            Abd::parse(&out, Endian::Big),
            Err(AdaTcpError::InvalidAbd { .. })
        ));
    }

    #[test]
    fn abd_rejects_unknown_kind() {
        let mut out = BytesMut::new();
        Abd::new(BufferKind::Isn).write_to(&mut out, Endian::Big);
        out[4] = b'q';
        assert!(matches!(
            Abd::parse(&out, Endian::Big),
            Err(AdaTcpError::InvalidBufferKind { code: b'q' })
        ));
    }

    #[test]
    fn writes_grow_and_track_send() {
        let mut buffer = AdaBuffer::new(BufferKind::Value);
        for n in [0usize, 1, 16, 100, 4096] {
            buffer.clear();
            buffer.write_binary(&vec![0xAB; n]);
            assert!(buffer.abd().size >= n as u64);
            assert_eq!(buffer.abd().send, n as u64);
            assert_eq!(buffer.position(), n);
        }
    }

    #[test]
    fn grow_never_truncates() {
        let mut buffer = AdaBuffer::with_size(BufferKind::Record, 64);
        buffer.grow(16);
        assert_eq!(buffer.abd().size, 64);
        buffer.grow(128);
        assert_eq!(buffer.abd().size, 128);
    }

    #[test]
    fn sequential_writes_append() {
        let mut buffer = AdaBuffer::new(BufferKind::Format);
        buffer.write_string("AA,4,B");
        buffer.write_string(".");
        assert_eq!(buffer.read(0, 7), b"AA,4,B.");
        assert_eq!(buffer.abd().send, 7);
    }

    #[test]
    fn out_of_range_read_is_empty() {
        let buffer = AdaBuffer::with_size(BufferKind::Isn, 8);
        assert_eq!(buffer.read(6, 4), &[] as &[u8]);
        assert_eq!(buffer.read(100, 1), &[] as &[u8]);
        assert_eq!(buffer.read(0, 8).len(), 8);
    }

    #[test]
    fn seek_clamps_to_allocation() {
        let mut buffer = AdaBuffer::with_size(BufferKind::Record, 8);
        buffer.seek(100);
        assert_eq!(buffer.position(), 8);
        buffer.seek(2);
        buffer.write_binary(b"xy");
        assert_eq!(buffer.read(2, 2), b"xy");
    }

    #[test]
    fn wire_form_carries_send_bytes_only() {
        let mut buffer = AdaBuffer::with_size(BufferKind::Record, 32);
        buffer.write_binary(b"abc");
        let mut out = BytesMut::new();
        buffer.write_wire(&mut out, Endian::Big);
        assert_eq!(out.len(), ABD_LEN + 3);
        assert_eq!(&out[ABD_LEN..], b"abc");
    }
}
