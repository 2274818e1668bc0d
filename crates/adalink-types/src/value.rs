//! Runtime value tree and wire codec.
//!
//! For each [`FieldNode`](crate::tree::FieldNode) a [`Value`] holds the
//! current record data. Scalar kinds implement the four codec operations
//! with one contract: `set_value` converts a native input (failing with a
//! conversion error when the input cannot be represented), `store_buffer`
//! encodes into the wire format, `parse_buffer` is its inverse and yields
//! a zero value at end-of-buffer, and the numeric accessors fail for kinds
//! with no numeric interpretation so callers can tell "not numeric" from
//! zero.
//!
//! Structural values hold one child list per occurrence; period groups and
//! multiple-value fields encode a 4-byte occurrence count ahead of the
//! repeated data.

use bytes::{BufMut, BytesMut};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;

use crate::cursor::{BufferCursor, Endian};
use crate::decimal::{pack_decimal, unpack_packed, unzone_decimal, zone_decimal};
use crate::field::FieldKind;
use crate::tree::{NodeId, TypeTree};
use crate::{AdaTypeError, AdaTypeResult};

// ── Native ─────────────────────────────────────────────────────────

/// A native input handed to [`Value::set_value`].
#[derive(Debug, Clone, PartialEq)]
pub enum Native {
    /// Signed integer of any width.
    Int(i64),
    /// Unsigned integer of any width.
    UInt(u64),
    /// Floating point.
    Float(f64),
    /// Character data.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Decimal value.
    Decimal(Decimal),
}

impl From<i32> for Native {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Native {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Native {
    fn from(v: u32) -> Self {
        Self::UInt(u64::from(v))
    }
}

impl From<u64> for Native {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}

impl From<f64> for Native {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Native {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Native {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Vec<u8>> for Native {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Decimal> for Native {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

// ── ValueData ──────────────────────────────────────────────────────

/// The decoded representation of one value node.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueData {
    /// Unsigned 1-byte integer.
    U8(u8),
    /// Signed 1-byte integer.
    I8(i8),
    /// Unsigned 2-byte integer.
    U16(u16),
    /// Signed 2-byte integer.
    I16(i16),
    /// Unsigned 4-byte integer.
    U32(u32),
    /// Signed 4-byte integer.
    I32(i32),
    /// Unsigned 8-byte integer.
    U64(u64),
    /// Signed 8-byte integer.
    I64(i64),
    /// Single precision float.
    F32(f32),
    /// Double precision float.
    F64(f64),
    /// Packed decimal.
    Packed(Decimal),
    /// Zoned decimal.
    Unpacked(Decimal),
    /// Character string.
    Text(String),
    /// Unicode string.
    Unicode(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Child values, one list per occurrence. Plain groups hold exactly
    /// one occurrence; repeating kinds hold the live occurrence count.
    Structure(Vec<Vec<Value>>),
}

// ── Value ──────────────────────────────────────────────────────────

/// One node of a record's value tree.
///
/// A value tree is exclusively owned by the record that created it; the
/// type tree it references is shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    /// The describing type node.
    pub node: NodeId,
    /// The current data.
    pub data: ValueData,
}

impl Value {
    /// Build a zero value for `node`, recursively for structures.
    pub fn from_type(tree: &TypeTree, node: NodeId) -> Self {
        let field = tree.node(node);
        let data = if field.is_structure() {
            if field.kind.is_repeating() {
                ValueData::Structure(Vec::new())
            } else {
                let children = field
                    .children
                    .iter()
                    .map(|&c| Value::from_type(tree, c))
                    .collect();
                ValueData::Structure(vec![children])
            }
        } else {
            Self::zero_data(field.kind)
        };
        Self { node, data }
    }

    fn zero_data(kind: FieldKind) -> ValueData {
        match kind {
            FieldKind::UByte => ValueData::U8(0),
            FieldKind::Byte => ValueData::I8(0),
            FieldKind::UInt2 => ValueData::U16(0),
            FieldKind::Int2 => ValueData::I16(0),
            FieldKind::UInt4 | FieldKind::Length | FieldKind::FieldLength | FieldKind::FieldCount => {
                ValueData::U32(0)
            }
            FieldKind::Int4 => ValueData::I32(0),
            FieldKind::UInt8 => ValueData::U64(0),
            FieldKind::Int8 => ValueData::I64(0),
            FieldKind::Float => ValueData::F32(0.0),
            FieldKind::Double => ValueData::F64(0.0),
            FieldKind::Packed | FieldKind::PackedArray => ValueData::Packed(Decimal::ZERO),
            FieldKind::Unpacked => ValueData::Unpacked(Decimal::ZERO),
            FieldKind::String | FieldKind::Character | FieldKind::LAString | FieldKind::LBString => {
                ValueData::Text(String::new())
            }
            FieldKind::Unicode | FieldKind::LAUnicode | FieldKind::LBUnicode => {
                ValueData::Unicode(String::new())
            }
            _ => ValueData::Bytes(Vec::new()),
        }
    }

    /// Number of occurrences (structures) or 1 (scalars).
    pub fn occurrence_count(&self) -> usize {
        match &self.data {
            ValueData::Structure(occ) => occ.len(),
            _ => 1,
        }
    }

    /// Child values of one occurrence.
    pub fn occurrence(&self, index: usize) -> Option<&[Value]> {
        match &self.data {
            ValueData::Structure(occ) => occ.get(index).map(Vec::as_slice),
            _ => None,
        }
    }

    /// Append a fresh occurrence to a structural value and return it.
    pub fn add_occurrence<'a>(
        &'a mut self,
        tree: &TypeTree,
    ) -> AdaTypeResult<&'a mut Vec<Value>> {
        let field = tree.node(self.node);
        let children: Vec<Value> = field
            .children
            .iter()
            .map(|&c| Value::from_type(tree, c))
            .collect();
        match &mut self.data {
            ValueData::Structure(occ) => {
                occ.push(children);
                let last = occ.len() - 1;
                Ok(&mut occ[last])
            }
            _ => Err(AdaTypeError::NotStructure {
                name: field.name.clone(),
            }),
        }
    }

    // ── set_value ──────────────────────────────────────────────────

    /// Convert a native input into this kind's representation.
    ///
    /// Fails with a conversion error when the input cannot be
    /// represented: a string assigned to a binary kind, a value exceeding
    /// the declared byte length, a non-digit string for a decimal kind.
    pub fn set_value(&mut self, tree: &TypeTree, input: impl Into<Native>) -> AdaTypeResult<()> {
        let input = input.into();
        let field = tree.node(self.node);
        let name = &field.name;
        self.data = match &self.data {
            ValueData::U8(_) => ValueData::U8(narrow_unsigned(name, &input, u64::from(u8::MAX))? as u8),
            ValueData::U16(_) => {
                ValueData::U16(narrow_unsigned(name, &input, u64::from(u16::MAX))? as u16)
            }
            ValueData::U32(_) => {
                ValueData::U32(narrow_unsigned(name, &input, u64::from(u32::MAX))? as u32)
            }
            ValueData::U64(_) => ValueData::U64(narrow_unsigned(name, &input, u64::MAX)?),
            ValueData::I8(_) => ValueData::I8(
                narrow_signed(name, &input, i64::from(i8::MIN), i64::from(i8::MAX))? as i8,
            ),
            ValueData::I16(_) => ValueData::I16(
                narrow_signed(name, &input, i64::from(i16::MIN), i64::from(i16::MAX))? as i16,
            ),
            ValueData::I32(_) => ValueData::I32(
                narrow_signed(name, &input, i64::from(i32::MIN), i64::from(i32::MAX))? as i32,
            ),
            ValueData::I64(_) => ValueData::I64(narrow_signed(name, &input, i64::MIN, i64::MAX)?),
            ValueData::F32(_) => ValueData::F32(to_f64(name, &input)? as f32),
            ValueData::F64(_) => ValueData::F64(to_f64(name, &input)?),
            ValueData::Packed(_) => {
                let d = to_decimal(name, &input)?;
                if field.length > 0 {
                    pack_decimal(&d, field.length as usize, field.fraction)?;
                }
                ValueData::Packed(d)
            }
            ValueData::Unpacked(_) => {
                let d = to_decimal(name, &input)?;
                if field.length > 0 {
                    zone_decimal(&d, field.length as usize, field.fraction)?;
                }
                ValueData::Unpacked(d)
            }
            ValueData::Text(_) => ValueData::Text(to_text(name, input, field)?),
            ValueData::Unicode(_) => ValueData::Unicode(to_text(name, input, field)?),
            ValueData::Bytes(_) => match input {
                Native::Bytes(b) => {
                    if field.length > 0 && b.len() > field.length as usize {
                        return Err(AdaTypeError::Conversion {
                            name: name.clone(),
                            reason: format!(
                                "{} bytes exceed declared length {}",
                                b.len(),
                                field.length
                            ),
                        });
                    }
                    ValueData::Bytes(b)
                }
                other => {
                    return Err(AdaTypeError::Conversion {
                        name: name.clone(),
                        reason: format!("binary field cannot take {:?}", other),
                    })
                }
            },
            ValueData::Structure(_) => {
                return Err(AdaTypeError::Conversion {
                    name: name.clone(),
                    reason: "structure fields hold child values, not scalars".to_string(),
                })
            }
        };
        Ok(())
    }

    // ── store_buffer ───────────────────────────────────────────────

    /// Encode this value at the end of `out`, advancing by exactly the
    /// field byte length (fixed kinds) or a length-prefixed amount
    /// (variable kinds). Structures delegate occurrence by occurrence,
    /// repeating kinds writing their occurrence count first.
    pub fn store_buffer(
        &self,
        tree: &TypeTree,
        out: &mut BytesMut,
        endian: Endian,
    ) -> AdaTypeResult<()> {
        let field = tree.node(self.node);
        match &self.data {
            ValueData::U8(v) => out.put_u8(*v),
            ValueData::I8(v) => out.put_i8(*v),
            ValueData::U16(v) => endian.put_u16(out, *v),
            ValueData::I16(v) => endian.put_i16(out, *v),
            ValueData::U32(v) => endian.put_u32(out, *v),
            ValueData::I32(v) => endian.put_i32(out, *v),
            ValueData::U64(v) => endian.put_u64(out, *v),
            ValueData::I64(v) => endian.put_i64(out, *v),
            ValueData::F32(v) => endian.put_f32(out, *v),
            ValueData::F64(v) => endian.put_f64(out, *v),
            ValueData::Packed(d) => {
                out.put_slice(&pack_decimal(d, field.length as usize, field.fraction)?)
            }
            ValueData::Unpacked(d) => {
                out.put_slice(&zone_decimal(d, field.length as usize, field.fraction)?)
            }
            ValueData::Text(s) | ValueData::Unicode(s) => {
                store_chars(s, field.length as usize, field.kind.is_variable(), out, endian)
            }
            ValueData::Bytes(b) => {
                if field.length > 0 {
                    let len = field.length as usize;
                    let take = b.len().min(len);
                    out.put_slice(&b[..take]);
                    out.put_bytes(0, len - take);
                } else {
                    out.put_slice(b);
                }
            }
            ValueData::Structure(occurrences) => {
                if field.kind.is_repeating() {
                    endian.put_u32(out, occurrences.len() as u32);
                }
                for occurrence in occurrences {
                    for child in occurrence {
                        child.store_buffer(tree, out, endian)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ── parse_buffer ───────────────────────────────────────────────

    /// Decode this value from the cursor; the inverse of
    /// [`store_buffer`](Self::store_buffer). A cursor at end-of-buffer
    /// yields a zero value instead of faulting.
    pub fn parse_buffer(
        &mut self,
        tree: &TypeTree,
        cursor: &mut BufferCursor<'_>,
    ) -> AdaTypeResult<()> {
        let field = tree.node(self.node);
        let len = field.length as usize;
        self.data = match &self.data {
            ValueData::U8(_) => ValueData::U8(cursor.get_u8()),
            ValueData::I8(_) => ValueData::I8(cursor.get_i8()),
            ValueData::U16(_) => ValueData::U16(cursor.get_u16()),
            ValueData::I16(_) => ValueData::I16(cursor.get_i16()),
            ValueData::U32(_) => ValueData::U32(cursor.get_u32()),
            ValueData::I32(_) => ValueData::I32(cursor.get_i32()),
            ValueData::U64(_) => ValueData::U64(cursor.get_u64()),
            ValueData::I64(_) => ValueData::I64(cursor.get_i64()),
            ValueData::F32(_) => ValueData::F32(cursor.get_f32()),
            ValueData::F64(_) => ValueData::F64(cursor.get_f64()),
            ValueData::Packed(_) => {
                if cursor.remaining() < len {
                    cursor.seek(usize::MAX);
                    ValueData::Packed(Decimal::ZERO)
                } else {
                    ValueData::Packed(unpack_packed(&cursor.get_bytes(len), field.fraction)?)
                }
            }
            ValueData::Unpacked(_) => {
                if cursor.remaining() < len {
                    cursor.seek(usize::MAX);
                    ValueData::Unpacked(Decimal::ZERO)
                } else {
                    ValueData::Unpacked(unzone_decimal(&cursor.get_bytes(len), field.fraction)?)
                }
            }
            ValueData::Text(_) => ValueData::Text(parse_chars(cursor, len, field.kind)),
            ValueData::Unicode(_) => ValueData::Unicode(parse_chars(cursor, len, field.kind)),
            ValueData::Bytes(_) => ValueData::Bytes(cursor.get_bytes(len)),
            ValueData::Structure(_) => {
                let mut occurrences = Vec::new();
                if field.kind.is_repeating() {
                    let count = cursor.get_u32() as usize;
                    for _ in 0..count {
                        let mut children: Vec<Value> = field
                            .children
                            .iter()
                            .map(|&c| Value::from_type(tree, c))
                            .collect();
                        for child in &mut children {
                            child.parse_buffer(tree, cursor)?;
                        }
                        occurrences.push(children);
                    }
                } else {
                    let mut children: Vec<Value> = field
                        .children
                        .iter()
                        .map(|&c| Value::from_type(tree, c))
                        .collect();
                    for child in &mut children {
                        child.parse_buffer(tree, cursor)?;
                    }
                    occurrences.push(children);
                }
                ValueData::Structure(occurrences)
            }
        };
        Ok(())
    }

    // ── Numeric accessors ──────────────────────────────────────────

    /// The value as a signed 64-bit integer.
    pub fn as_i64(&self, tree: &TypeTree) -> AdaTypeResult<i64> {
        let name = &tree.node(self.node).name;
        match &self.data {
            ValueData::U8(v) => Ok(i64::from(*v)),
            ValueData::I8(v) => Ok(i64::from(*v)),
            ValueData::U16(v) => Ok(i64::from(*v)),
            ValueData::I16(v) => Ok(i64::from(*v)),
            ValueData::U32(v) => Ok(i64::from(*v)),
            ValueData::I32(v) => Ok(i64::from(*v)),
            ValueData::U64(v) => i64::try_from(*v).map_err(|_| overflow(name, "i64")),
            ValueData::I64(v) => Ok(*v),
            ValueData::F32(v) => Ok(*v as i64),
            ValueData::F64(v) => Ok(*v as i64),
            ValueData::Packed(d) | ValueData::Unpacked(d) => {
                d.trunc().to_i64().ok_or_else(|| overflow(name, "i64"))
            }
            _ => Err(AdaTypeError::NotNumeric { name: name.clone() }),
        }
    }

    /// The value as an unsigned 64-bit integer.
    pub fn as_u64(&self, tree: &TypeTree) -> AdaTypeResult<u64> {
        let name = &tree.node(self.node).name;
        match &self.data {
            ValueData::U64(v) => Ok(*v),
            ValueData::Packed(d) | ValueData::Unpacked(d) => {
                d.trunc().to_u64().ok_or_else(|| overflow(name, "u64"))
            }
            ValueData::Text(_) | ValueData::Unicode(_) | ValueData::Bytes(_)
            | ValueData::Structure(_) => Err(AdaTypeError::NotNumeric { name: name.clone() }),
            _ => {
                let v = self.as_i64(tree)?;
                u64::try_from(v).map_err(|_| overflow(name, "u64"))
            }
        }
    }

    /// The value as a signed 32-bit integer.
    pub fn as_i32(&self, tree: &TypeTree) -> AdaTypeResult<i32> {
        let name = &tree.node(self.node).name;
        let v = self.as_i64(tree)?;
        i32::try_from(v).map_err(|_| overflow(name, "i32"))
    }

    /// The value as an unsigned 32-bit integer.
    pub fn as_u32(&self, tree: &TypeTree) -> AdaTypeResult<u32> {
        let name = &tree.node(self.node).name;
        let v = self.as_u64(tree)?;
        u32::try_from(v).map_err(|_| overflow(name, "u32"))
    }

    /// The value as a double precision float.
    pub fn as_f64(&self, tree: &TypeTree) -> AdaTypeResult<f64> {
        let name = &tree.node(self.node).name;
        match &self.data {
            ValueData::F32(v) => Ok(f64::from(*v)),
            ValueData::F64(v) => Ok(*v),
            ValueData::Packed(d) | ValueData::Unpacked(d) => {
                d.to_f64().ok_or_else(|| overflow(name, "f64"))
            }
            ValueData::Text(_) | ValueData::Unicode(_) | ValueData::Bytes(_)
            | ValueData::Structure(_) => Err(AdaTypeError::NotNumeric { name: name.clone() }),
            _ => Ok(self.as_i64(tree)? as f64),
        }
    }

    /// The value as text, for kinds holding character data.
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            ValueData::Text(s) | ValueData::Unicode(s) => Some(s),
            _ => None,
        }
    }
}

// ── Conversion helpers ─────────────────────────────────────────────

fn overflow(name: &str, target: &str) -> AdaTypeError {
    AdaTypeError::Conversion {
        name: name.to_string(),
        reason: format!("value does not fit into {}", target),
    }
}

fn conversion(name: &str, reason: impl Into<String>) -> AdaTypeError {
    AdaTypeError::Conversion {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn to_i64_lossless(name: &str, input: &Native) -> AdaTypeResult<i64> {
    match input {
        Native::Int(v) => Ok(*v),
        Native::UInt(v) => i64::try_from(*v).map_err(|_| overflow(name, "i64")),
        Native::Float(f) => {
            if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                Ok(*f as i64)
            } else {
                Err(conversion(name, format!("float {} is not an integer", f)))
            }
        }
        Native::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| conversion(name, format!("'{}' is not an integer", s))),
        Native::Decimal(d) => d
            .to_i64()
            .ok_or_else(|| conversion(name, "decimal is not an integer")),
        Native::Bytes(_) => Err(conversion(name, "byte input has no integer interpretation")),
    }
}

fn narrow_signed(name: &str, input: &Native, min: i64, max: i64) -> AdaTypeResult<i64> {
    let v = to_i64_lossless(name, input)?;
    if v < min || v > max {
        return Err(conversion(
            name,
            format!("{} outside range {}..={}", v, min, max),
        ));
    }
    Ok(v)
}

fn narrow_unsigned(name: &str, input: &Native, max: u64) -> AdaTypeResult<u64> {
    let v = match input {
        Native::UInt(v) => *v,
        other => {
            let signed = to_i64_lossless(name, other)?;
            u64::try_from(signed).map_err(|_| overflow(name, "unsigned"))?
        }
    };
    if v > max {
        return Err(conversion(name, format!("{} exceeds maximum {}", v, max)));
    }
    Ok(v)
}

fn to_f64(name: &str, input: &Native) -> AdaTypeResult<f64> {
    match input {
        Native::Int(v) => Ok(*v as f64),
        Native::UInt(v) => Ok(*v as f64),
        Native::Float(f) => Ok(*f),
        Native::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| conversion(name, format!("'{}' is not a number", s))),
        Native::Decimal(d) => d.to_f64().ok_or_else(|| overflow(name, "f64")),
        Native::Bytes(_) => Err(conversion(name, "byte input has no float interpretation")),
    }
}

fn to_decimal(name: &str, input: &Native) -> AdaTypeResult<Decimal> {
    match input {
        Native::Int(v) => Ok(Decimal::from(*v)),
        Native::UInt(v) => Ok(Decimal::from(*v)),
        Native::Float(f) => {
            Decimal::from_f64(*f).ok_or_else(|| conversion(name, "float is not a valid decimal"))
        }
        Native::Text(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|_| conversion(name, format!("'{}' is not a decimal", s))),
        Native::Decimal(d) => Ok(*d),
        Native::Bytes(_) => Err(conversion(name, "byte input has no decimal interpretation")),
    }
}

fn to_text(name: &str, input: Native, field: &crate::tree::FieldNode) -> AdaTypeResult<String> {
    let s = match input {
        Native::Text(s) => s,
        Native::Bytes(b) => String::from_utf8(b)
            .map_err(|_| conversion(name, "byte input is not valid character data"))?,
        Native::Int(v) => v.to_string(),
        Native::UInt(v) => v.to_string(),
        Native::Float(f) => f.to_string(),
        Native::Decimal(d) => d.to_string(),
    };
    if field.length > 0 && !field.kind.is_variable() && s.len() > field.length as usize {
        return Err(conversion(
            name,
            format!("{} bytes exceed declared length {}", s.len(), field.length),
        ));
    }
    Ok(s)
}

fn store_chars(s: &str, len: usize, variable: bool, out: &mut BytesMut, endian: Endian) {
    let raw = s.as_bytes();
    if variable || len == 0 {
        endian.put_u32(out, raw.len() as u32);
        out.put_slice(raw);
    } else {
        let take = raw.len().min(len);
        out.put_slice(&raw[..take]);
        out.put_bytes(b' ', len - take);
    }
}

fn parse_chars(cursor: &mut BufferCursor<'_>, len: usize, kind: FieldKind) -> String {
    if kind.is_variable() || len == 0 {
        // The prefix is untrusted; the buffer bounds cap the read so a
        // corrupt length cannot drive the allocation.
        let n = (cursor.get_u32() as usize).min(cursor.remaining());
        cursor.get_string(n)
    } else {
        cursor.get_string(len)
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    fn scalar(kind: FieldKind, length: u32) -> (TypeTree, Value) {
        let mut tree = TypeTree::new();
        let id = tree.new_scalar(kind, "TF", length).unwrap();
        let value = Value::from_type(&tree, id);
        (tree, value)
    }

    fn round_trip(tree: &TypeTree, value: &Value) -> Value {
        let mut out = BytesMut::new();
        value.store_buffer(tree, &mut out, Endian::Big).unwrap();
        let mut parsed = Value::from_type(tree, value.node);
        let mut cursor = BufferCursor::new(&out, Endian::Big);
        parsed.parse_buffer(tree, &mut cursor).unwrap();
        parsed
    }

    #[test]
    fn fixed_integers_round_trip() {
        let cases: Vec<(FieldKind, u32, Native)> = vec![
            (FieldKind::UByte, 1, Native::UInt(u64::from(u8::MAX))),
            (FieldKind::Byte, 1, Native::Int(-5)),
            (FieldKind::UInt2, 2, Native::UInt(0)),
            (FieldKind::Int2, 2, Native::Int(i64::from(i16::MIN))),
            (FieldKind::UInt4, 4, Native::UInt(u64::from(u32::MAX))),
            (FieldKind::Int4, 4, Native::Int(-123_456)),
            (FieldKind::UInt8, 8, Native::UInt(u64::MAX)),
            (FieldKind::Int8, 8, Native::Int(i64::MIN)),
        ];
        for (kind, length, input) in cases {
            let (tree, mut value) = scalar(kind, length);
            value.set_value(&tree, input).unwrap();
            assert_eq!(round_trip(&tree, &value), value, "kind {:?}", kind);
        }
    }

    #[test]
    fn floats_round_trip() {
        let (tree, mut value) = scalar(FieldKind::Double, 8);
        value.set_value(&tree, 2.75f64).unwrap();
        assert_eq!(round_trip(&tree, &value), value);
        assert_eq!(value.as_f64(&tree).unwrap(), 2.75);
    }

    #[test]
    fn packed_round_trip() {
        let (tree, mut value) = scalar(FieldKind::Packed, 2);
        value.set_value(&tree, -123i64).unwrap();
        let mut out = BytesMut::new();
        value.store_buffer(&tree, &mut out, Endian::Big).unwrap();
        assert_eq!(&out[..], &[0x12, 0x3D]);
        assert_eq!(round_trip(&tree, &value), value);
        assert_eq!(value.as_i32(&tree).unwrap(), -123);
    }

    #[test]
    fn unpacked_round_trip() {
        let (tree, mut value) = scalar(FieldKind::Unpacked, 4);
        value.set_value(&tree, -907i64).unwrap();
        assert_eq!(round_trip(&tree, &value), value);
        assert_eq!(value.as_i64(&tree).unwrap(), -907);
    }

    #[test]
    fn fixed_string_round_trip() {
        let (tree, mut value) = scalar(FieldKind::String, 8);
        value.set_value(&tree, "tester").unwrap();
        let mut out = BytesMut::new();
        value.store_buffer(&tree, &mut out, Endian::Big).unwrap();
        assert_eq!(&out[..], b"tester  ");
        assert_eq!(round_trip(&tree, &value), value);

        // Empty and max-length round-trip too.
        value.set_value(&tree, "").unwrap();
        assert_eq!(round_trip(&tree, &value), value);
        value.set_value(&tree, "12345678").unwrap();
        assert_eq!(round_trip(&tree, &value), value);
    }

    #[test]
    fn variable_string_is_length_prefixed() {
        let (tree, mut value) = scalar(FieldKind::LAString, 0);
        value.set_value(&tree, "a longer alpha value").unwrap();
        let mut out = BytesMut::new();
        value.store_buffer(&tree, &mut out, Endian::Big).unwrap();
        assert_eq!(u32::from_be_bytes(out[..4].try_into().unwrap()), 20);
        assert_eq!(round_trip(&tree, &value), value);
    }

    #[test]
    fn corrupt_length_prefix_is_clamped() {
        let (tree, mut value) = scalar(FieldKind::LAString, 0);
        // Prefix claims 4 GiB; only two bytes follow.
        let raw = [0xFF, 0xFF, 0xFF, 0xFF, b'h', b'i'];
        let mut cursor = BufferCursor::new(&raw, Endian::Big);
        value.parse_buffer(&tree, &mut cursor).unwrap();
        assert_eq!(value.data, ValueData::Text("hi".to_string()));
        assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn byte_array_zero_pads() {
        let (tree, mut value) = scalar(FieldKind::ByteArray, 4);
        value.set_value(&tree, vec![0xDE, 0xAD]).unwrap();
        let mut out = BytesMut::new();
        value.store_buffer(&tree, &mut out, Endian::Big).unwrap();
        assert_eq!(&out[..], &[0xDE, 0xAD, 0x00, 0x00]);
    }

    #[test]
    fn string_into_binary_kind_fails() {
        let (tree, mut value) = scalar(FieldKind::ByteArray, 4);
        let res = value.set_value(&tree, "text");
        assert!(matches!(res, Err(AdaTypeError::Conversion { .. })));
    }

    #[test]
    fn overlong_input_fails() {
        let (tree, mut value) = scalar(FieldKind::String, 4);
        assert!(value.set_value(&tree, "too long").is_err());

        let (tree, mut value) = scalar(FieldKind::UByte, 1);
        assert!(value.set_value(&tree, 256u32).is_err());

        let (tree, mut value) = scalar(FieldKind::Packed, 2);
        assert!(value.set_value(&tree, 1000i64).is_err());
    }

    #[test]
    fn text_has_no_numeric_interpretation() {
        let (tree, mut value) = scalar(FieldKind::String, 8);
        value.set_value(&tree, "17").unwrap();
        assert!(matches!(
            value.as_i64(&tree),
            Err(AdaTypeError::NotNumeric { .. })
        ));
        assert!(matches!(
            value.as_f64(&tree),
            Err(AdaTypeError::NotNumeric { .. })
        ));
    }

    #[test]
    fn accessor_overflow_is_conversion() {
        let (tree, mut value) = scalar(FieldKind::Int8, 8);
        value.set_value(&tree, i64::from(i32::MAX) + 1).unwrap();
        assert!(matches!(
            value.as_i32(&tree),
            Err(AdaTypeError::Conversion { .. })
        ));
        value.set_value(&tree, -1i64).unwrap();
        assert!(value.as_u64(&tree).is_err());
    }

    #[test]
    fn parse_at_end_of_buffer_yields_zero() {
        let (tree, mut value) = scalar(FieldKind::Int4, 4);
        let empty: [u8; 0] = [];
        let mut cursor = BufferCursor::new(&empty, Endian::Big);
        value.parse_buffer(&tree, &mut cursor).unwrap();
        assert_eq!(value.data, ValueData::I32(0));

        let (tree, mut value) = scalar(FieldKind::Packed, 3);
        let mut cursor = BufferCursor::new(&empty, Endian::Big);
        value.parse_buffer(&tree, &mut cursor).unwrap();
        assert_eq!(value.data, ValueData::Packed(Decimal::ZERO));
    }

    #[test]
    fn group_round_trip() {
        let mut tree = TypeTree::new();
        let grp = tree.new_structure(FieldKind::Group, "GA", 0).unwrap();
        let a = tree.new_scalar(FieldKind::UInt2, "AA", 2).unwrap();
        let b = tree.new_scalar(FieldKind::String, "AB", 4).unwrap();
        tree.add_field(grp, a).unwrap();
        tree.add_field(grp, b).unwrap();

        let mut value = Value::from_type(&tree, grp);
        match &mut value.data {
            ValueData::Structure(occ) => {
                occ[0][0].set_value(&tree, 700u32).unwrap();
                occ[0][1].set_value(&tree, "ab").unwrap();
            }
            _ => unreachable!(),
        }
        assert_eq!(round_trip(&tree, &value), value);
    }

    #[test]
    fn period_group_encodes_occurrence_count() {
        let mut tree = TypeTree::new();
        let pe = tree.new_structure(FieldKind::PeriodGroup, "PG", 0).unwrap();
        let fld = tree.new_scalar(FieldKind::UInt4, "AA", 4).unwrap();
        tree.add_field(pe, fld).unwrap();

        let mut value = Value::from_type(&tree, pe);
        for n in 1..=3u32 {
            let occurrence = value.add_occurrence(&tree).unwrap();
            occurrence[0].set_value(&tree, n * 10).unwrap();
        }

        let mut out = BytesMut::new();
        value.store_buffer(&tree, &mut out, Endian::Big).unwrap();
        // 4-byte count ahead of the repeated data.
        assert_eq!(u32::from_be_bytes(out[..4].try_into().unwrap()), 3);
        assert_eq!(out.len(), 4 + 3 * 4);

        let parsed = round_trip(&tree, &value);
        assert_eq!(parsed.occurrence_count(), 3);
        assert_eq!(parsed, value);
    }

    #[test]
    fn add_occurrence_on_scalar_fails() {
        let (tree, mut value) = scalar(FieldKind::Int4, 4);
        assert!(matches!(
            value.add_occurrence(&tree),
            Err(AdaTypeError::NotStructure { .. })
        ));
    }
}
