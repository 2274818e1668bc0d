//! Field kinds, option bits, flag bits, and occurrence ranges.
//!
//! Mirrors the Adabas field definition vocabulary: every field in a record
//! layout carries a kind (scalar or structural), a set of FDT options
//! (DE, UQ, NU, ...) and a set of internal flags that steer buffer sizing
//! and traversal (PE membership, MU membership, ghost fields, second-call).

// ── FieldKind ──────────────────────────────────────────────────────

/// The kind of an Adabas field.
///
/// Scalar kinds carry a byte length; structural kinds (`Group`,
/// `PeriodGroup`, `Multiplefield`, `Structure`) carry child fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Undefined placeholder kind.
    Undefined,
    /// Unsigned 1-byte integer.
    UByte,
    /// Signed 1-byte integer.
    Byte,
    /// Unsigned 2-byte integer.
    UInt2,
    /// Signed 2-byte integer.
    Int2,
    /// Unsigned 4-byte integer.
    UInt4,
    /// Signed 4-byte integer.
    Int4,
    /// Unsigned 8-byte integer.
    UInt8,
    /// Signed 8-byte integer.
    Int8,
    /// Packed decimal (two digits per byte, trailing sign nibble).
    Packed,
    /// Unpacked (zoned) decimal, one digit per byte.
    Unpacked,
    /// IEEE double precision float.
    Double,
    /// IEEE single precision float.
    Float,
    /// Filler bytes between fields.
    Filler,
    /// Fixed-length character string.
    String,
    /// Fixed-length raw byte array.
    ByteArray,
    /// Single character.
    Character,
    /// Length definition field.
    Length,
    /// Fixed-length Unicode string.
    Unicode,
    /// Large-alpha Unicode string (length-prefixed).
    LAUnicode,
    /// Unicode large object (length-prefixed).
    LBUnicode,
    /// Large-alpha string (length-prefixed).
    LAString,
    /// String large object (length-prefixed).
    LBString,
    /// Field length definition.
    FieldLength,
    /// Period group (repeating group of fields, 1..N occurrences).
    PeriodGroup,
    /// Multiple-value field (1..N scalar occurrences).
    Multiplefield,
    /// Generic structure node.
    Structure,
    /// Plain (non-repeating) group.
    Group,
    /// Packed decimal array.
    PackedArray,
    /// Phonetic descriptor.
    Phonetic,
    /// Super descriptor.
    SuperDesc,
    /// Literal data sent to the database.
    Literal,
    /// Occurrence count field for MU/PE fields.
    FieldCount,
    /// Hyper descriptor.
    HyperDesc,
    /// Referential integrity descriptor.
    Referential,
    /// Collation descriptor.
    Collation,
    /// Function applied to a result list.
    Function,
}

impl FieldKind {
    /// Return the FDT format character used to render this kind.
    pub fn format_character(&self) -> char {
        match self {
            Self::Character | Self::String | Self::LAString | Self::LBString => 'A',
            Self::Unicode | Self::LAUnicode | Self::LBUnicode => 'W',
            Self::UByte | Self::UInt2 | Self::UInt4 | Self::UInt8 | Self::ByteArray => 'B',
            Self::Packed | Self::PackedArray => 'P',
            Self::Unpacked => 'U',
            Self::Byte | Self::Int2 | Self::Int4 | Self::Int8 => 'F',
            Self::Float | Self::Double => 'G',
            _ => ' ',
        }
    }

    /// Whether this kind holds child fields.
    pub fn is_structure(&self) -> bool {
        matches!(
            self,
            Self::Structure | Self::Group | Self::PeriodGroup | Self::Multiplefield
        )
    }

    /// Whether this kind repeats with a live occurrence count.
    pub fn is_repeating(&self) -> bool {
        matches!(self, Self::PeriodGroup | Self::Multiplefield)
    }

    /// Whether this kind is a special descriptor (no record data).
    pub fn is_special_descriptor(&self) -> bool {
        matches!(
            self,
            Self::Collation | Self::Phonetic | Self::SuperDesc | Self::HyperDesc | Self::Referential
        )
    }

    /// Whether the wire encoding is length-prefixed instead of fixed-width.
    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            Self::LAString | Self::LBString | Self::LAUnicode | Self::LBUnicode
        )
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ── FieldOption ────────────────────────────────────────────────────

/// FDT options that can be applied to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldOption {
    /// UQ — unique descriptor.
    Unique,
    /// NU — null suppression.
    NullSuppression,
    /// FI — fixed storage.
    FixedStorage,
    /// DE — descriptor (indexed).
    Descriptor,
    /// NC — no character compression.
    NoCharCompression,
    /// NN — not-null constraint.
    NotNull,
    /// HF — high-order-first binary.
    HighOrderFirst,
    /// NV — null value.
    NullValue,
    /// NB — no blank compression.
    NoBlankCompression,
    /// HE — high-order exit.
    HighOrderExit,
    /// PE — periodic group.
    PeriodicGroup,
    /// MU — multiple-value field.
    MultipleValue,
    /// LA — large alpha.
    LongAlpha,
    /// LB — large object.
    LargeObject,
}

impl FieldOption {
    /// Bit position of this option in the option set.
    pub fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

// ── FieldFlag ──────────────────────────────────────────────────────

/// Internal flags steering buffer sizing and traversal.
///
/// Unlike [`FieldOption`], flags are not part of the FDT; they are derived
/// while the tree is assembled and propagate between parents and children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldFlag {
    /// Field belongs to a period group.
    Pe,
    /// Subtree contains multiple-value fields.
    Mu,
    /// Ghost member of a multiple-value field; the container carries the
    /// data and the ghost is excluded from flattened lookups.
    MuGhost,
    /// Marked for removal from the tree.
    ToBeRemoved,
    /// Field needs a follow-up call to resolve per-occurrence counts
    /// (MU nested inside PE).
    SecondCall,
}

impl FieldFlag {
    /// Bit of this flag in the flag set.
    pub fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

// ── OccRange ───────────────────────────────────────────────────────

/// Sentinel for an unbounded upper occurrence ("last entry").
pub const LAST_ENTRY: i32 = -2;

/// An occurrence range for repeating fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccRange {
    /// First occurrence (1-based).
    pub from: i32,
    /// Last occurrence, or [`LAST_ENTRY`] for unbounded.
    pub to: i32,
}

impl OccRange {
    /// Range covering all occurrences 1..N.
    pub fn unbounded() -> Self {
        Self {
            from: 1,
            to: LAST_ENTRY,
        }
    }

    /// Empty range (field does not repeat).
    pub fn empty() -> Self {
        Self { from: 0, to: 0 }
    }

    /// Whether the range is empty.
    pub fn is_empty(&self) -> bool {
        self.from == 0 && self.to == 0
    }

    /// Render the range the way a format buffer spells it.
    pub fn format_buffer(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        match self.to {
            LAST_ENTRY => format!("{}-N", self.from),
            to if to == self.from => format!("{}", self.from),
            to => format!("{}-{}", self.from, to),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────
