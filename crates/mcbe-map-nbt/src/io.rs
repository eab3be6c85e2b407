//! Little-endian tag stream engine.
//!
//! The reader is minimal: it tracks open compounds with an
//! explicit stack instead of recursing, and only materialises the kinds a
//! block palette entry uses. Lists, arrays, longs and floating point tags are
//! recognised by id, but their payload is neither decoded nor skipped, so a
//! stream containing one desynchronises from that point on.

use bytes::{Buf, BufMut};

use crate::error::NbtError;
use crate::tag::{NbtCompound, NbtTag, TagKind};

/// Maximum compound nesting depth.
const MAX_DEPTH: usize = 512;

/// Result of reading one tag stream.
#[derive(Debug, Clone, PartialEq)]
pub struct TagStream {
    /// Top-level tags by name. A palette entry has a single root compound,
    /// normally named `""`.
    pub tags: NbtCompound,
    /// Bytes consumed, including the TAG_End closing the root compound.
    pub consumed: usize,
}

impl TagStream {
    /// The root compound: the one named `""` if present, otherwise any
    /// top-level compound.
    pub fn root(&self) -> Option<&NbtCompound> {
        self.tags
            .get("")
            .and_then(NbtTag::as_compound)
            .or_else(|| self.tags.values().find_map(NbtTag::as_compound))
    }
}

// -----------------------------------------------------------------------
// Reading
// -----------------------------------------------------------------------

/// Read one tag stream from the start of `data`.
///
/// Stops as soon as the outermost compound is closed; bytes after that are
/// left alone and `consumed` tells the caller where they begin.
pub fn read_tag_stream(data: &[u8]) -> Result<TagStream, NbtError> {
    let total = data.len();
    let mut buf = data;
    let mut tags = NbtCompound::new();
    // Open compounds, innermost last. Each one is moved into its parent when
    // its TAG_End arrives.
    let mut stack: Vec<(String, NbtCompound)> = Vec::new();

    loop {
        let offset = total - buf.remaining();
        ensure_remaining(buf, 1, total)?;
        let id = buf.get_u8();
        let kind = TagKind::from_id(id).ok_or(NbtError::UnknownTagType { id, offset })?;

        if kind == TagKind::End {
            let Some((name, compound)) = stack.pop() else {
                // TAG_End with nothing open: an empty stream.
                break;
            };
            let parent = match stack.last_mut() {
                Some((_, open)) => open,
                None => &mut tags,
            };
            parent.insert(name, NbtTag::Compound(compound));
            if stack.is_empty() {
                break;
            }
            continue;
        }

        let name = read_string(&mut buf, total)?;
        if stack.is_empty() && kind != TagKind::Compound {
            return Err(NbtError::ExpectedCompound { got: id });
        }

        // Recognised but undecoded: no value, cursor stays put.
        if !kind.is_decoded() {
            continue;
        }

        let value = match kind {
            TagKind::Compound => {
                if stack.len() >= MAX_DEPTH {
                    return Err(NbtError::NestingTooDeep { limit: MAX_DEPTH });
                }
                stack.push((name, NbtCompound::new()));
                continue;
            }
            TagKind::Byte => {
                ensure_remaining(buf, 1, total)?;
                NbtTag::Byte(buf.get_i8())
            }
            TagKind::Short => {
                ensure_remaining(buf, 2, total)?;
                NbtTag::Short(buf.get_i16_le())
            }
            TagKind::Int => {
                ensure_remaining(buf, 4, total)?;
                NbtTag::Int(buf.get_i32_le())
            }
            TagKind::String => NbtTag::String(read_string(&mut buf, total)?),
            _ => continue,
        };

        if let Some((_, open)) = stack.last_mut() {
            open.insert(name, value);
        }
    }

    Ok(TagStream {
        tags,
        consumed: total - buf.remaining(),
    })
}

fn read_string(buf: &mut &[u8], total: usize) -> Result<String, NbtError> {
    ensure_remaining(buf, 2, total)?;
    let len = buf.get_u16_le() as usize;
    ensure_remaining(buf, len, total)?;
    let data = buf.copy_to_bytes(len);
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn ensure_remaining(buf: &[u8], needed: usize, total: usize) -> Result<(), NbtError> {
    if buf.remaining() < needed {
        Err(NbtError::UnexpectedEof {
            offset: total - buf.remaining(),
            needed,
            remaining: buf.remaining(),
        })
    } else {
        Ok(())
    }
}

// -----------------------------------------------------------------------
// Writing
// -----------------------------------------------------------------------

/// Write `root` as a complete tag stream named `name`.
pub fn write_tag_stream(buf: &mut impl BufMut, name: &str, root: &NbtCompound) {
    buf.put_u8(TagKind::Compound.id());
    write_string(buf, name);
    write_compound(buf, root);
}

fn write_tag(buf: &mut impl BufMut, tag: &NbtTag) {
    match tag {
        NbtTag::Byte(v) => buf.put_i8(*v),
        NbtTag::Short(v) => buf.put_i16_le(*v),
        NbtTag::Int(v) => buf.put_i32_le(*v),
        NbtTag::String(s) => write_string(buf, s),
        NbtTag::Compound(map) => write_compound(buf, map),
    }
}

fn write_compound(buf: &mut impl BufMut, map: &NbtCompound) {
    for (name, tag) in map {
        buf.put_u8(tag.kind().id());
        write_string(buf, name);
        write_tag(buf, tag);
    }
    buf.put_u8(TagKind::End.id());
}

fn write_string(buf: &mut impl BufMut, s: &str) {
    buf.put_u16_le(s.len() as u16);
    buf.put_slice(s.as_bytes());
}
