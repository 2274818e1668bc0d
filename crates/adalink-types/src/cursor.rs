//! Endian-aware buffer cursor.
//!
//! Record buffers coming back from the nucleus are parsed with a cursor
//! that honors the session byte order and never faults: reads past the end
//! of the buffer yield zero/empty values, matching the permissive
//! buffer-reuse contract of repeated request/reply cycles.

use bytes::{BufMut, BytesMut};

// ── Endian ─────────────────────────────────────────────────────────

/// Byte order used for multi-byte wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    /// Big-endian (network order).
    Big,
    /// Little-endian.
    Little,
}

impl Endian {
    /// The byte order of the client system.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::Big
        } else {
            Self::Little
        }
    }

    /// Append a `u16` in this order.
    pub fn put_u16(self, out: &mut BytesMut, v: u16) {
        match self {
            Self::Big => out.put_u16(v),
            Self::Little => out.put_u16_le(v),
        }
    }

    /// Append a `u32` in this order.
    pub fn put_u32(self, out: &mut BytesMut, v: u32) {
        match self {
            Self::Big => out.put_u32(v),
            Self::Little => out.put_u32_le(v),
        }
    }

    /// Append a `u64` in this order.
    pub fn put_u64(self, out: &mut BytesMut, v: u64) {
        match self {
            Self::Big => out.put_u64(v),
            Self::Little => out.put_u64_le(v),
        }
    }

    /// Append an `i16` in this order.
    pub fn put_i16(self, out: &mut BytesMut, v: i16) {
        self.put_u16(out, v as u16);
    }

    /// Append an `i32` in this order.
    pub fn put_i32(self, out: &mut BytesMut, v: i32) {
        self.put_u32(out, v as u32);
    }

    /// Append an `i64` in this order.
    pub fn put_i64(self, out: &mut BytesMut, v: i64) {
        self.put_u64(out, v as u64);
    }

    /// Append an `f32` in this order.
    pub fn put_f32(self, out: &mut BytesMut, v: f32) {
        self.put_u32(out, v.to_bits());
    }

    /// Append an `f64` in this order.
    pub fn put_f64(self, out: &mut BytesMut, v: f64) {
        self.put_u64(out, v.to_bits());
    }
}

// ── BufferCursor ───────────────────────────────────────────────────

/// Permissive reader over a received buffer.
#[derive(Debug)]
pub struct BufferCursor<'a> {
    data: &'a [u8],
    offset: usize,
    endian: Endian,
}

impl<'a> BufferCursor<'a> {
    /// Create a cursor over `data` reading in `endian` order.
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            data,
            offset: 0,
            endian,
        }
    }

    /// Byte order of this cursor.
    pub fn endian(&self) -> Endian {
        self.endian
    }

    /// Current read offset.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    /// Move the cursor, clamped to the buffer bounds.
    pub fn seek(&mut self, pos: usize) {
        self.offset = pos.min(self.data.len());
    }

    /// Read up to `n` bytes, zero-filled when the buffer is short.
    pub fn get_bytes(&mut self, n: usize) -> Vec<u8> {
        let mut out = vec![0u8; n];
        let avail = self.remaining().min(n);
        out[..avail].copy_from_slice(&self.data[self.offset..self.offset + avail]);
        self.offset += avail;
        out
    }

    /// Read `n` bytes as a string, trimming trailing spaces and NULs.
    /// Invalid UTF-8 is replaced.
    pub fn get_string(&mut self, n: usize) -> String {
        let raw = self.get_bytes(n);
        String::from_utf8_lossy(&raw)
            .trim_end_matches(['\0', ' '])
            .to_string()
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut raw = [0u8; N];
        let avail = self.remaining().min(N);
        raw[..avail].copy_from_slice(&self.data[self.offset..self.offset + avail]);
        self.offset += avail;
        raw
    }

    /// Read a `u8`, zero at end of buffer.
    pub fn get_u8(&mut self) -> u8 {
        self.take::<1>()[0]
    }

    /// Read an `i8`, zero at end of buffer.
    pub fn get_i8(&mut self) -> i8 {
        self.get_u8() as i8
    }

    /// Read a `u16`, zero at end of buffer.
    pub fn get_u16(&mut self) -> u16 {
        let raw = self.take::<2>();
        match self.endian {
            Endian::Big => u16::from_be_bytes(raw),
            Endian::Little => u16::from_le_bytes(raw),
        }
    }

    /// Read an `i16`, zero at end of buffer.
    pub fn get_i16(&mut self) -> i16 {
        self.get_u16() as i16
    }

    /// Read a `u32`, zero at end of buffer.
    pub fn get_u32(&mut self) -> u32 {
        let raw = self.take::<4>();
        match self.endian {
            Endian::Big => u32::from_be_bytes(raw),
            Endian::Little => u32::from_le_bytes(raw),
        }
    }

    /// Read an `i32`, zero at end of buffer.
    pub fn get_i32(&mut self) -> i32 {
        self.get_u32() as i32
    }

    /// Read a `u64`, zero at end of buffer.
    pub fn get_u64(&mut self) -> u64 {
        let raw = self.take::<8>();
        match self.endian {
            Endian::Big => u64::from_be_bytes(raw),
            Endian::Little => u64::from_le_bytes(raw),
        }
    }

    /// Read an `i64`, zero at end of buffer.
    pub fn get_i64(&mut self) -> i64 {
        self.get_u64() as i64
    }

    /// Read an `f32`, zero at end of buffer.
    pub fn get_f32(&mut self) -> f32 {
        f32::from_bits(self.get_u32())
    }

    /// Read an `f64`, zero at end of buffer.
    pub fn get_f64(&mut self) -> f64 {
        f64::from_bits(self.get_u64())
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_honor_endianness() {
        let data = [0x01, 0x02, 0x03, 0x04];
        let mut big = BufferCursor::new(&data, Endian::Big);
        assert_eq!(big.get_u32(), 0x0102_0304);
        let mut little = BufferCursor::new(&data, Endian::Little);
        assert_eq!(little.get_u32(), 0x0403_0201);
    }

    #[test]
    fn read_past_end_yields_zero() {
        let data = [0xFFu8; 2];
        let mut c = BufferCursor::new(&data, Endian::Big);
        assert_eq!(c.get_u16(), 0xFFFF);
        assert_eq!(c.get_u32(), 0);
        assert_eq!(c.get_u64(), 0);
        assert_eq!(c.get_string(4), "");
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn short_read_zero_fills_tail() {
        let data = [0x12, 0x34];
        let mut c = BufferCursor::new(&data, Endian::Big);
        // Only two bytes available for a four-byte read.
        assert_eq!(c.get_u32(), 0x1234_0000);
    }

    #[test]
    fn string_trims_padding() {
        let data = *b"tester  \0\0";
        let mut c = BufferCursor::new(&data, Endian::Big);
        assert_eq!(c.get_string(10), "tester");
    }

    #[test]
    fn seek_clamps() {
        let data = [0u8; 4];
        let mut c = BufferCursor::new(&data, Endian::Big);
        c.seek(100);
        assert_eq!(c.offset(), 4);
        c.seek(1);
        assert_eq!(c.offset(), 1);
    }

    #[test]
    fn endian_writes_round_trip() {
        let mut out = BytesMut::new();
        Endian::Little.put_u32(&mut out, 0xAABBCCDD);
        Endian::Big.put_u32(&mut out, 0xAABBCCDD);
        assert_eq!(&out[..4], &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(&out[4..], &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn native_is_consistent() {
        let mut out = BytesMut::new();
        Endian::native().put_u16(&mut out, 1);
        let mut c = BufferCursor::new(&out, Endian::native());
        assert_eq!(c.get_u16(), 1);
    }
}
