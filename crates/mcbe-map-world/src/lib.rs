//! Bedrock world reading: key classification, sub-chunk decoding, column
//! reduction and the chunk index.

pub mod block;
pub mod chunk;
pub mod column;
pub mod data2d;
pub mod error;
pub mod index;
pub mod key;
pub mod store;
pub mod subchunk;

pub use block::{Block, Palette, TransparentBlocks, AIR, WATER};
pub use chunk::{decode_chunk, fetch_subchunks, SubchunkPayloads};
pub use column::{ChunkColumns, Column, Columns};
pub use data2d::Data2D;
pub use error::{DecodeError, StoreError};
pub use index::{ChunkRecord, IndexStats, WorldBounds, WorldIndex};
pub use key::{ChunkKey, Dimension, RecordKind};
pub use store::{LevelDbStore, MemoryStore, WorldStore};
pub use subchunk::{decode_subchunk, SubchunkBuilder, SubchunkStats};
