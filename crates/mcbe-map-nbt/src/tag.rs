//! Tag kinds and decoded tag values.

use std::collections::HashMap;
use std::fmt;

/// A compound tag: map of name -> tag.
pub type NbtCompound = HashMap<String, NbtTag>;

/// Every tag id the stream format defines.
///
/// All of them are recognised, but only [`TagKind::is_decoded`] kinds
/// produce a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    End,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List,
    Compound,
    IntArray,
    LongArray,
}

impl TagKind {
    /// Map a wire id (0-12) to its kind.
    pub fn from_id(id: u8) -> Option<Self> {
        Some(match id {
            0 => TagKind::End,
            1 => TagKind::Byte,
            2 => TagKind::Short,
            3 => TagKind::Int,
            4 => TagKind::Long,
            5 => TagKind::Float,
            6 => TagKind::Double,
            7 => TagKind::ByteArray,
            8 => TagKind::String,
            9 => TagKind::List,
            10 => TagKind::Compound,
            11 => TagKind::IntArray,
            12 => TagKind::LongArray,
            _ => return None,
        })
    }

    pub fn id(self) -> u8 {
        match self {
            TagKind::End => 0,
            TagKind::Byte => 1,
            TagKind::Short => 2,
            TagKind::Int => 3,
            TagKind::Long => 4,
            TagKind::Float => 5,
            TagKind::Double => 6,
            TagKind::ByteArray => 7,
            TagKind::String => 8,
            TagKind::List => 9,
            TagKind::Compound => 10,
            TagKind::IntArray => 11,
            TagKind::LongArray => 12,
        }
    }

    /// Whether the reader materialises a value for this kind.
    ///
    /// Block palette entries only carry bytes, shorts, ints, strings and
    /// compounds; everything else is recognised and left undecoded.
    pub fn is_decoded(self) -> bool {
        matches!(
            self,
            TagKind::Byte | TagKind::Short | TagKind::Int | TagKind::String | TagKind::Compound
        )
    }
}

/// A decoded tag value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    String(String),
    Compound(NbtCompound),
}

impl NbtTag {
    pub fn kind(&self) -> TagKind {
        match self {
            NbtTag::Byte(_) => TagKind::Byte,
            NbtTag::Short(_) => TagKind::Short,
            NbtTag::Int(_) => TagKind::Int,
            NbtTag::String(_) => TagKind::String,
            NbtTag::Compound(_) => TagKind::Compound,
        }
    }

    pub fn as_byte(&self) -> Option<i8> {
        match self {
            NbtTag::Byte(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            NbtTag::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            NbtTag::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Any integer kind widened to `i32`.
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            NbtTag::Byte(v) => Some(i32::from(*v)),
            NbtTag::Short(v) => Some(i32::from(*v)),
            NbtTag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            NbtTag::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            NbtTag::Compound(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for NbtTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtTag::Byte(v) => write!(f, "{v}b"),
            NbtTag::Short(v) => write!(f, "{v}s"),
            NbtTag::Int(v) => write!(f, "{v}"),
            NbtTag::String(v) => write!(f, "\"{v}\""),
            NbtTag::Compound(v) => write!(f, "{{{} entries}}", v.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_ids_roundtrip() {
        for id in 0..=12u8 {
            let kind = TagKind::from_id(id).unwrap();
            assert_eq!(kind.id(), id);
        }
        assert_eq!(TagKind::from_id(13), None);
        assert_eq!(TagKind::from_id(0xFF), None);
    }

    #[test]
    fn decoded_subset() {
        assert!(TagKind::Byte.is_decoded());
        assert!(TagKind::String.is_decoded());
        assert!(TagKind::Compound.is_decoded());
        assert!(!TagKind::Long.is_decoded());
        assert!(!TagKind::List.is_decoded());
        assert!(!TagKind::Double.is_decoded());
    }

    #[test]
    fn accessors() {
        assert_eq!(NbtTag::Byte(42).as_byte(), Some(42));
        assert_eq!(NbtTag::Int(42).as_byte(), None);
        assert_eq!(NbtTag::Short(-3).as_integer(), Some(-3));
        assert_eq!(NbtTag::String("hello".into()).as_string(), Some("hello"));
        assert_eq!(NbtTag::Int(5).as_string(), None);
        assert_eq!(NbtTag::Int(7).kind(), TagKind::Int);
    }
}
