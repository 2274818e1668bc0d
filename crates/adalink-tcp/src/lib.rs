#![forbid(unsafe_code)]
//! ADATCP wire transport for Adabas nucleus sessions.
//!
//! This crate provides:
//!
//! - **Framing** — the 40-byte ADATCP session header, the 24-byte inner
//!   data header, and the 72-byte connect payload
//! - **Transport** — tokio-based request/reply session with handshake,
//!   two-phase frame receive, and timeout teardown
//! - **Buffer Descriptors** — the 48-byte ABD header and growable
//!   request/reply buffers
//! - **Records** — result records with flattened name lookup over a
//!   shared field type tree
//! - **Layout Cache** — read-mostly cache of parsed type trees

pub mod abd;
pub mod cache;
pub mod frame;
pub mod record;
pub mod transport;

use adalink_types::AdaTypeError;

// ── Re-exports ─────────────────────────────────────────────────────

pub use abd::{Abd, AdaBuffer, BufferKind, ABD_LEN};
pub use cache::LayoutCache;
pub use frame::{
    AdaTcpDataHeader, AdaTcpHeader, BufferType, ConnectPayload, CONNECT_PAYLOAD_LEN,
    DATA_HEADER_LEN, TCP_HEADER_LEN,
};
pub use record::Record;
pub use transport::{AdaTcpSession, ConnectOptions, SessionState};

// ── Error ──────────────────────────────────────────────────────────

/// Errors produced by the wire transport.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AdaTcpError {
    /// Socket-level failure.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed before delivering a complete frame header.
    #[error("header not received")]
    HeaderNotReceived,

    /// A frame did not start with the expected eyecatcher.
    #[error("invalid eyecatcher in frame header")]
    InvalidEyecatcher,

    /// The declared frame length is inconsistent with the header size.
    #[error("invalid frame length {length}")]
    InvalidFrameLength {
        /// The declared total length.
        length: u32,
    },

    /// The nucleus reported a protocol-level error.
    #[error("nucleus reported error code {code}")]
    Nucleus {
        /// The peer's numeric error code, uninterpreted.
        code: u32,
    },

    /// A socket operation did not finish within the session timeout.
    #[error("request timed out")]
    Timeout,

    /// An unknown buffer type discriminator in a session header.
    #[error("unknown buffer type {code}")]
    InvalidBufferType {
        /// The offending discriminator.
        code: u32,
    },

    /// An unknown buffer kind character in an ABD.
    #[error("unknown buffer kind 0x{code:02X}")]
    InvalidBufferKind {
        /// The offending id byte.
        code: u8,
    },

    /// A buffer descriptor failed structural validation.
    #[error("invalid buffer descriptor: {reason}")]
    InvalidAbd {
        /// What was malformed.
        reason: String,
    },

    /// A type-system or codec failure.
    #[error(transparent)]
    Type(#[from] AdaTypeError),
}

/// Result type for transport operations.
pub type AdaTcpResult<T> = Result<T, AdaTcpError>;
