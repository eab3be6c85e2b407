//! Tag stream error types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NbtError {
    #[error("unexpected end of tag stream at byte {offset}: need {needed} more bytes, have {remaining}")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("top-level tag must be TAG_Compound (10), got {got}")]
    ExpectedCompound { got: u8 },

    #[error("unknown tag type {id} at byte {offset}")]
    UnknownTagType { id: u8, offset: usize },

    #[error("nesting too deep (limit: {limit})")]
    NestingTooDeep { limit: usize },
}
