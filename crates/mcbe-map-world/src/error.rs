//! World decoding and storage errors.

use mcbe_map_nbt::NbtError;
use thiserror::Error;

/// Failure of the underlying key-value store. Fatal for a whole run.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open world store at {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("store read failed: {0}")]
    Read(String),

    #[error("store write failed: {0}")]
    Write(String),
}

/// Failure to decode one sub-chunk payload. Fatal for the chunk it belongs to.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unsupported sub-chunk version {version}")]
    UnsupportedVersion { version: u8 },

    #[error("unsupported bits per block: {bits}")]
    InvalidBitsPerBlock { bits: u8 },

    #[error("sub-chunk truncated at byte {offset}: need {needed} bytes, have {remaining}")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    #[error("negative palette length: {0}")]
    NegativePaletteLength(i32),

    #[error("palette index {index} out of range for palette of {len}")]
    PaletteIndexOutOfRange { index: u32, len: usize },

    #[error("palette entry {entry} has no name")]
    MissingBlockName { entry: usize },

    #[error("palette entry {entry}: {source}")]
    Nbt {
        entry: usize,
        #[source]
        source: NbtError,
    },
}

impl DecodeError {
    /// True for the "format not supported" family, as opposed to malformed data.
    pub fn is_unsupported_format(&self) -> bool {
        matches!(
            self,
            DecodeError::UnsupportedVersion { .. } | DecodeError::InvalidBitsPerBlock { .. }
        )
    }
}
