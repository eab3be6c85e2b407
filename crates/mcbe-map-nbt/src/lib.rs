//! Minimal little-endian NBT tag reader for Bedrock block palettes.
//!
//! Palette entries inside sub-chunk records are serialized as back-to-back
//! tag streams with no length prefix, so the reader reports how many bytes
//! each entry consumed and the caller advances its own cursor.
//!
//! Ints are i32_le, string lengths are u16_le. Only byte, short, int, string
//! and compound tags are decoded.

pub mod error;
mod io;
pub mod tag;

pub use error::NbtError;
pub use io::{read_tag_stream, write_tag_stream, TagStream};
pub use tag::{NbtCompound, NbtTag, TagKind};
