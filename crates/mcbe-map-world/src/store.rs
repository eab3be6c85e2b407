//! Read access to the world's key-value store.
//!
//! Bedrock keeps chunks in a LevelDB whose blocks are zlib-compressed with
//! compressor ids that stock LevelDB does not know (2 = zlib, 4 = raw
//! deflate). [`LevelDbStore`] registers both before opening.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;
use std::rc::Rc;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;
use rusty_leveldb::compressor::NoneCompressor;
use rusty_leveldb::{Compressor, CompressorList, LdbIterator, Options, DB};
use tracing::debug;

use crate::error::StoreError;

/// Ordered key-value source a world can be read from.
pub trait WorldStore {
    /// Visit every entry once, in key order.
    fn for_each_entry(&mut self, visit: &mut dyn FnMut(&[u8], &[u8])) -> Result<(), StoreError>;

    /// Point lookup. `Ok(None)` when the key is absent.
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
}

// ─── LevelDB ────────────────────────────────────────────────────────────────

const COMPRESSOR_NONE: u8 = 0;
const COMPRESSOR_ZLIB: u8 = 2;
const COMPRESSOR_ZLIB_RAW: u8 = 4;

struct ZlibCompressor;

impl Compressor for ZlibCompressor {
    fn encode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut e = ZlibEncoder::new(Vec::new(), Compression::default());
        e.write_all(&block)?;
        Ok(e.finish()?)
    }

    fn decode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut out = Vec::new();
        ZlibDecoder::new(&block[..]).read_to_end(&mut out)?;
        Ok(out)
    }
}

struct RawZlibCompressor;

impl Compressor for RawZlibCompressor {
    fn encode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut e = DeflateEncoder::new(Vec::new(), Compression::default());
        e.write_all(&block)?;
        Ok(e.finish()?)
    }

    fn decode(&self, block: Vec<u8>) -> rusty_leveldb::Result<Vec<u8>> {
        let mut out = Vec::new();
        DeflateDecoder::new(&block[..]).read_to_end(&mut out)?;
        Ok(out)
    }
}

/// LevelDB options matching the Bedrock on-disk format.
pub fn bedrock_options(create_if_missing: bool) -> Options {
    let mut list = CompressorList::new();
    list.set_with_id(COMPRESSOR_NONE, NoneCompressor);
    list.set_with_id(COMPRESSOR_ZLIB, ZlibCompressor);
    list.set_with_id(COMPRESSOR_ZLIB_RAW, RawZlibCompressor);

    let mut opts = Options {
        create_if_missing,
        ..Options::default()
    };
    opts.compressor = COMPRESSOR_ZLIB_RAW;
    opts.compressor_list = Rc::new(list);
    opts
}

/// A world's `db/` directory opened through `rusty_leveldb`.
pub struct LevelDbStore {
    db: DB,
}

impl LevelDbStore {
    /// Open `<world_dir>/db`. The database must already exist.
    pub fn open(world_dir: &Path) -> Result<Self, StoreError> {
        Self::open_db(&world_dir.join("db"), false)
    }

    /// Open a LevelDB directory directly.
    pub fn open_db(path: &Path, create_if_missing: bool) -> Result<Self, StoreError> {
        let db = DB::open(path, bedrock_options(create_if_missing)).map_err(|e| {
            StoreError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;
        debug!("Opened LevelDB at {}", path.display());
        Ok(Self { db })
    }

    pub fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db
            .put(key, value)
            .map_err(|e| StoreError::Write(format!("put: {e}")))
    }

    /// Flush pending writes to disk.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.db
            .flush()
            .map_err(|e| StoreError::Write(format!("flush: {e}")))
    }
}

impl WorldStore for LevelDbStore {
    fn for_each_entry(&mut self, visit: &mut dyn FnMut(&[u8], &[u8])) -> Result<(), StoreError> {
        let mut iter = self
            .db
            .new_iter()
            .map_err(|e| StoreError::Read(format!("iterator: {e}")))?;
        while let Some((k, v)) = iter.next() {
            visit(&k, &v);
        }
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key).map(|v| v.to_vec()))
    }
}

// ─── In-memory ──────────────────────────────────────────────────────────────

/// Sorted in-memory store. Used for tests and for worlds assembled in code.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl WorldStore for MemoryStore {
    fn for_each_entry(&mut self, visit: &mut dyn FnMut(&[u8], &[u8])) -> Result<(), StoreError> {
        for (k, v) in &self.entries {
            visit(k, v);
        }
        Ok(())
    }

    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }
}
