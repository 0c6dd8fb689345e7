//! Field tag packing.
//!
//! A field tag is a single varint: `(field_number << 3) | wire_type`.
//! Field numbers are small positive integers, unique within a message
//! type; their order of appearance on the wire carries no meaning.

use crate::codec::WireType;
use crate::error::{ProtoError, Result};

/// Bits reserved for the wire type in a packed tag.
pub const WIRE_TYPE_BITS: u32 = 3;

/// Largest representable field number (tag must fit a u64 varint; in
/// practice generated schemas stay far below this).
pub const MAX_FIELD_NUMBER: u32 = u32::MAX >> WIRE_TYPE_BITS;

/// Pack a field number and wire type into a tag value.
#[inline]
pub fn pack_tag(field: u32, wire_type: WireType) -> u64 {
    (u64::from(field) << WIRE_TYPE_BITS) | wire_type as u64
}

/// Split a tag value into (field number, wire type).
///
/// # Errors
///
/// `Malformed` on field number zero or a reserved wire type.
pub fn split_tag(tag: u64) -> Result<(u32, WireType)> {
    let wire_type = WireType::from_tag_bits((tag & 0x7) as u8)?;
    let field = tag >> WIRE_TYPE_BITS;
    if field == 0 {
        return Err(ProtoError::Malformed("field number 0 is reserved".into()));
    }
    if field > u64::from(MAX_FIELD_NUMBER) {
        return Err(ProtoError::Malformed(format!(
            "field number {field} out of range"
        )));
    }
    Ok((field as u32, wire_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_split_roundtrip() {
        for field in [1u32, 2, 15, 16, 1000, MAX_FIELD_NUMBER] {
            for wt in [WireType::Varint, WireType::Fixed64, WireType::Delimited] {
                let tag = pack_tag(field, wt);
                assert_eq!(split_tag(tag).unwrap(), (field, wt));
            }
        }
    }

    #[test]
    fn test_known_tag_values() {
        // Field 1, varint: 0x08. Field 2, delimited: 0x12.
        assert_eq!(pack_tag(1, WireType::Varint), 0x08);
        assert_eq!(pack_tag(2, WireType::Delimited), 0x12);
    }

    #[test]
    fn test_field_zero_rejected() {
        assert!(split_tag(pack_tag(0, WireType::Varint)).is_err());
    }

    #[test]
    fn test_reserved_wire_type_rejected() {
        assert!(split_tag((1 << 3) | 5).is_err());
    }
}
