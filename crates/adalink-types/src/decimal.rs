//! Packed and zoned (unpacked) decimal encoding.
//!
//! Packed decimal stores two digits per byte with the sign in the final
//! low nibble (0xC positive, 0xD negative). Zoned decimal stores one ASCII
//! digit per byte with the sign overpunched into the final byte's zone
//! nibble. Both are sized by the field's byte length: a packed field of
//! `len` bytes holds `len * 2 - 1` digits, a zoned field `len` digits.

use rust_decimal::Decimal;

use crate::{AdaTypeError, AdaTypeResult};

const PACKED_POSITIVE: u8 = 0x0C;
const PACKED_NEGATIVE: u8 = 0x0D;

/// Maximum digits representable without overflowing the accumulator.
const MAX_DIGITS: usize = 28;

fn scaled_digits(value: &Decimal, fraction: u32) -> (bool, String) {
    let mut v = *value;
    v.rescale(fraction);
    let mantissa = v.mantissa();
    (mantissa < 0, mantissa.unsigned_abs().to_string())
}

/// Encode `value` into a packed-decimal field of `len` bytes with
/// `fraction` implied decimal places.
pub fn pack_decimal(value: &Decimal, len: usize, fraction: u32) -> AdaTypeResult<Vec<u8>> {
    if len == 0 {
        return Err(AdaTypeError::DigitOverflow {
            digits: 1,
            capacity: 0,
        });
    }
    let capacity = len * 2 - 1;
    let (negative, digits) = scaled_digits(value, fraction);
    if digits.len() > capacity {
        return Err(AdaTypeError::DigitOverflow {
            digits: digits.len(),
            capacity,
        });
    }

    // Right-justify with leading zero digits, then nibble-pack.
    let padded = format!("{:0>width$}", digits, width = capacity);
    let mut nibbles: Vec<u8> = padded.bytes().map(|b| b - b'0').collect();
    nibbles.push(if negative {
        PACKED_NEGATIVE
    } else {
        PACKED_POSITIVE
    });

    let mut out = Vec::with_capacity(len);
    for pair in nibbles.chunks(2) {
        out.push((pair[0] << 4) | pair[1]);
    }
    Ok(out)
}

/// Decode a packed-decimal field. Sign nibbles 0xB/0xD are negative, all
/// other valid sign nibbles (0xA/0xC/0xE/0xF) positive or unsigned.
pub fn unpack_packed(bytes: &[u8], fraction: u32) -> AdaTypeResult<Decimal> {
    if bytes.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if bytes.len() * 2 - 1 > MAX_DIGITS {
        return Err(AdaTypeError::DigitOverflow {
            digits: bytes.len() * 2 - 1,
            capacity: MAX_DIGITS,
        });
    }

    let mut value: i128 = 0;
    let last = bytes.len() - 1;
    for (i, &byte) in bytes.iter().enumerate() {
        let high = byte >> 4;
        let low = byte & 0x0F;
        if high > 9 {
            return Err(AdaTypeError::InvalidDigit { byte });
        }
        if i == last {
            value = value * 10 + i128::from(high);
            if low < 0x0A {
                return Err(AdaTypeError::InvalidDigit { byte });
            }
            if low == 0x0B || low == PACKED_NEGATIVE {
                value = -value;
            }
        } else {
            if low > 9 {
                return Err(AdaTypeError::InvalidDigit { byte });
            }
            value = value * 100 + i128::from(high) * 10 + i128::from(low);
        }
    }
    Ok(Decimal::from_i128_with_scale(value, fraction))
}

/// Encode `value` into a zoned-decimal field of `len` bytes with
/// `fraction` implied decimal places.
///
/// Digits are plain ASCII; a negative value overpunches the final byte's
/// zone nibble to 0x7.
pub fn zone_decimal(value: &Decimal, len: usize, fraction: u32) -> AdaTypeResult<Vec<u8>> {
    if len == 0 {
        return Err(AdaTypeError::DigitOverflow {
            digits: 1,
            capacity: 0,
        });
    }
    let (negative, digits) = scaled_digits(value, fraction);
    if digits.len() > len {
        return Err(AdaTypeError::DigitOverflow {
            digits: digits.len(),
            capacity: len,
        });
    }
    let padded = format!("{:0>width$}", digits, width = len);
    let mut out: Vec<u8> = padded.into_bytes();
    if negative {
        let d = out[len - 1] & 0x0F;
        out[len - 1] = 0x70 | d;
    }
    Ok(out)
}

/// Decode a zoned-decimal field. Zone nibbles 0x7 (ASCII overpunch) and
/// 0xB/0xD (EBCDIC overpunch) on the final byte mark a negative value.
pub fn unzone_decimal(bytes: &[u8], fraction: u32) -> AdaTypeResult<Decimal> {
    if bytes.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if bytes.len() > MAX_DIGITS {
        return Err(AdaTypeError::DigitOverflow {
            digits: bytes.len(),
            capacity: MAX_DIGITS,
        });
    }

    let mut value: i128 = 0;
    let last = bytes.len() - 1;
    let mut negative = false;
    for (i, &byte) in bytes.iter().enumerate() {
        let digit = byte & 0x0F;
        if digit > 9 {
            return Err(AdaTypeError::InvalidDigit { byte });
        }
        if i == last {
            let zone = byte >> 4;
            negative = matches!(zone, 0x7 | 0xB | 0xD);
        }
        value = value * 10 + i128::from(digit);
    }
    if negative {
        value = -value;
    }
    Ok(Decimal::from_i128_with_scale(value, fraction))
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn pack_negative_123_in_two_bytes() {
        let v = Decimal::from(-123);
        let packed = pack_decimal(&v, 2, 0).unwrap();
        // Nibbles 1,2,3 followed by the negative sign nibble.
        assert_eq!(packed, vec![0x12, 0x3D]);
        assert_eq!(unpack_packed(&packed, 0).unwrap(), v);
    }

    #[test]
    fn pack_positive() {
        let v = Decimal::from(12345);
        let packed = pack_decimal(&v, 3, 0).unwrap();
        assert_eq!(packed, vec![0x12, 0x34, 0x5C]);
    }

    #[test]
    fn pack_pads_leading_zeros() {
        let v = Decimal::from(7);
        let packed = pack_decimal(&v, 3, 0).unwrap();
        assert_eq!(packed, vec![0x00, 0x00, 0x7C]);
    }

    #[test]
    fn pack_zero() {
        let packed = pack_decimal(&Decimal::ZERO, 2, 0).unwrap();
        assert_eq!(packed, vec![0x00, 0x0C]);
        assert_eq!(unpack_packed(&packed, 0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn pack_overflow() {
        let v = Decimal::from(1000);
        let res = pack_decimal(&v, 2, 0);
        assert!(matches!(res, Err(AdaTypeError::DigitOverflow { .. })));
    }

    #[test]
    fn pack_with_fraction() {
        let v = Decimal::from_str("123.45").unwrap();
        let packed = pack_decimal(&v, 3, 2).unwrap();
        assert_eq!(packed, vec![0x12, 0x34, 0x5C]);
        assert_eq!(unpack_packed(&packed, 2).unwrap(), v);
    }

    #[test]
    fn unpack_alternate_sign_nibbles() {
        assert_eq!(
            unpack_packed(&[0x12, 0x3B], 0).unwrap(),
            Decimal::from(-123)
        );
        assert_eq!(unpack_packed(&[0x12, 0x3F], 0).unwrap(), Decimal::from(123));
    }

    #[test]
    fn unpack_invalid_nibble() {
        assert!(matches!(
            unpack_packed(&[0xA1, 0x2C], 0),
            Err(AdaTypeError::InvalidDigit { .. })
        ));
    }

    #[test]
    fn unpack_empty_is_zero() {
        assert_eq!(unpack_packed(&[], 0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn zone_positive() {
        let v = Decimal::from(123);
        let zoned = zone_decimal(&v, 5, 0).unwrap();
        assert_eq!(zoned, b"00123".to_vec());
        assert_eq!(unzone_decimal(&zoned, 0).unwrap(), v);
    }

    #[test]
    fn zone_negative_overpunch() {
        let v = Decimal::from(-45);
        let zoned = zone_decimal(&v, 3, 0).unwrap();
        assert_eq!(zoned, vec![0x30, 0x34, 0x75]);
        assert_eq!(unzone_decimal(&zoned, 0).unwrap(), v);
    }

    #[test]
    fn unzone_ebcdic_sign() {
        // EBCDIC D-zone on the final byte is negative too.
        assert_eq!(
            unzone_decimal(&[0x31, 0xD2], 0).unwrap(),
            Decimal::from(-12)
        );
    }

    #[test]
    fn zone_overflow() {
        let v = Decimal::from(1234);
        assert!(matches!(
            zone_decimal(&v, 3, 0),
            Err(AdaTypeError::DigitOverflow { .. })
        ));
    }

    #[test]
    fn zone_with_fraction_roundtrip() {
        let v = Decimal::from_str("-9.99").unwrap();
        let zoned = zone_decimal(&v, 4, 2).unwrap();
        assert_eq!(unzone_decimal(&zoned, 2).unwrap(), v);
    }
}
