#![forbid(unsafe_code)]
//! Adabas field type system and record codec.
//!
//! This crate provides:
//!
//! - **Field Kinds & Flags** — the ~38 Adabas field kinds, option bits,
//!   occurrence ranges, and the PE/MU/ghost flag set
//! - **Type Tree** — arena-indexed field definition tree with flag
//!   propagation and a tree-wide name map
//! - **Value Tree & Codec** — per-kind runtime values with bidirectional
//!   wire encoding (fixed integers, packed/zoned decimal, strings,
//!   repeating groups)
//! - **Buffer Cursor** — endian-aware, permissive reader for record buffers
//! - **Traversal Engine** — visitor-driven depth-first walk with
//!   skip-subtree and stop signals

pub mod cursor;
pub mod decimal;
pub mod field;
pub mod traverse;
pub mod tree;
pub mod value;

// ── Re-exports ─────────────────────────────────────────────────────

pub use cursor::{BufferCursor, Endian};
pub use decimal::{pack_decimal, unpack_packed, unzone_decimal, zone_decimal};
pub use field::{FieldFlag, FieldKind, FieldOption, OccRange, LAST_ENTRY};
pub use traverse::{traverse, Flow, Visitor};
pub use tree::{FieldNode, NodeId, TypeTree};
pub use value::{Native, Value, ValueData};

// ── Error ──────────────────────────────────────────────────────────

/// Errors produced by the type system and record codec.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum AdaTypeError {
    /// A native input cannot be represented in the field's wire kind.
    #[error("cannot convert value for field '{name}': {reason}")]
    Conversion {
        /// The field name.
        name: String,
        /// Why the conversion failed.
        reason: String,
    },

    /// A numeric accessor was called on a kind with no numeric
    /// interpretation.
    #[error("field '{name}' has no numeric interpretation")]
    NotNumeric {
        /// The field name.
        name: String,
    },

    /// Duplicate field name in the type tree.
    #[error("duplicate field '{name}' in type tree")]
    DuplicateField {
        /// The duplicate field name.
        name: String,
    },

    /// Field not found in the type tree.
    #[error("field '{name}' not found")]
    FieldNotFound {
        /// The missing field name.
        name: String,
    },

    /// A scalar node was used where a structure is required.
    #[error("field '{name}' is not a structure")]
    NotStructure {
        /// The field name.
        name: String,
    },

    /// A decimal byte contained a nibble outside 0-9.
    #[error("invalid decimal digit nibble in byte 0x{byte:02X}")]
    InvalidDigit {
        /// The offending byte.
        byte: u8,
    },

    /// A decimal value needs more digits than the field provides.
    #[error("value requires {digits} digits but field holds {capacity}")]
    DigitOverflow {
        /// Digits required by the value.
        digits: usize,
        /// Digits available in the field.
        capacity: usize,
    },
}

/// Result type for type-system operations.
pub type AdaTypeResult<T> = Result<T, AdaTypeError>;
