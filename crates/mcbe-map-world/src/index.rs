//! One pass over the store that groups chunk records and measures the world.

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::key::{ChunkKey, RecordKind};
use crate::store::WorldStore;

/// Records belonging to one overworld chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRecord {
    pub x: i32,
    pub z: i32,
    pub version: Option<i8>,
    pub finalized_state: Option<i32>,
    pub data_2d_key: Option<Vec<u8>>,
    /// Sub-chunk keys by sub-chunk index. Missing indices were never seen.
    pub subchunk_keys: BTreeMap<i8, Vec<u8>>,
}

impl ChunkRecord {
    pub fn new(x: i32, z: i32) -> Self {
        Self {
            x,
            z,
            version: None,
            finalized_state: None,
            data_2d_key: None,
            subchunk_keys: BTreeMap::new(),
        }
    }
}

/// Chunk coordinate extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldBounds {
    pub min_x: i32,
    pub min_z: i32,
    pub max_x: i32,
    pub max_z: i32,
}

impl WorldBounds {
    pub fn at(x: i32, z: i32) -> Self {
        Self {
            min_x: x,
            min_z: z,
            max_x: x,
            max_z: z,
        }
    }

    pub fn include(&mut self, x: i32, z: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_z = self.min_z.min(z);
        self.max_z = self.max_z.max(z);
    }

    pub fn span_x(&self) -> i64 {
        self.max_x as i64 - self.min_x as i64
    }

    pub fn span_z(&self) -> i64 {
        self.max_z as i64 - self.min_z as i64
    }

    /// `round(log2(span_x))`, plus one when the world is deeper than wide.
    /// A world one chunk wide is level 0.
    pub fn zoom_level_max(&self) -> u32 {
        let span_x = self.span_x();
        let mut zoom = if span_x > 0 {
            (span_x as f64).log2().round() as u32
        } else {
            0
        };
        if span_x < self.span_z() {
            zoom += 1;
        }
        zoom
    }

    /// Tile column/row for a chunk: its coordinate shifted by `|min|`.
    pub fn map_offset(&self, x: i32, z: i32) -> (i64, i64) {
        (
            x as i64 + (self.min_x as i64).abs(),
            z as i64 + (self.min_z as i64).abs(),
        )
    }
}

/// Counters gathered while indexing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub entries: usize,
    pub chunks: usize,
    pub subchunks: usize,
    /// Nether/End records, recognised but not indexed.
    pub other_dimension_records: usize,
    /// Keys that are not chunk keys at all.
    pub non_chunk_keys: usize,
}

/// All overworld chunks of a world, their bounds, and the tile zoom level.
#[derive(Debug, Clone, Default)]
pub struct WorldIndex {
    chunks: BTreeMap<(i32, i32), ChunkRecord>,
    bounds: Option<WorldBounds>,
    zoom_level_max: u32,
    stats: IndexStats,
}

impl WorldIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the whole store once.
    pub fn build(store: &mut dyn WorldStore) -> Result<Self, StoreError> {
        info!("Finding chunks...");
        let mut index = Self::new();
        store.for_each_entry(&mut |key, value| index.observe(key, value))?;
        match index.bounds {
            Some(b) => info!(
                "World extent: x {}..={}, z {}..={}, zoom level {}",
                b.min_x, b.max_x, b.min_z, b.max_z, index.zoom_level_max
            ),
            None => warn!("No overworld chunks found"),
        }
        info!(
            "Found {} chunks, {} sub-chunks",
            index.stats.chunks, index.stats.subchunks
        );
        Ok(index)
    }

    /// Classify one store entry.
    pub fn observe(&mut self, key: &[u8], value: &[u8]) {
        self.stats.entries += 1;
        let Some(parsed) = ChunkKey::parse(key) else {
            self.stats.non_chunk_keys += 1;
            return;
        };
        if !parsed.is_overworld() {
            self.stats.other_dimension_records += 1;
            return;
        }

        let (x, z) = (parsed.chunk_x, parsed.chunk_z);
        let new_chunk = !self.chunks.contains_key(&(x, z));
        let record = self
            .chunks
            .entry((x, z))
            .or_insert_with(|| ChunkRecord::new(x, z));
        if new_chunk {
            self.stats.chunks += 1;
        }

        match (parsed.kind, parsed.subchunk_index) {
            (kind, None) if parsed.has_suffix => {
                debug!("Ignoring suffixed {kind:?} record for chunk {x},{z}")
            }
            (RecordKind::Version | RecordKind::LegacyVersion, None) => match value.first() {
                Some(&v) => record.version = Some(v as i8),
                None => warn!("Empty version record for chunk {x},{z}"),
            },
            (RecordKind::Data2D, None) => record.data_2d_key = Some(key.to_vec()),
            (RecordKind::FinalizedState, None) => match value.get(..4) {
                Some(b) => {
                    record.finalized_state = Some(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                }
                None => warn!("Short finalized state record for chunk {x},{z}"),
            },
            (RecordKind::SubChunkPrefix, Some(index)) => {
                record.subchunk_keys.insert(index, key.to_vec());
                self.stats.subchunks += 1;
            }
            (kind, _) => debug!("Ignoring record {kind:?} for chunk {x},{z}"),
        }

        // bounds always span the origin
        let bounds = self.bounds.get_or_insert(WorldBounds::at(0, 0));
        bounds.include(x, z);
        self.zoom_level_max = bounds.zoom_level_max();
    }

    pub fn chunks(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.chunks.values()
    }

    pub fn chunk(&self, x: i32, z: i32) -> Option<&ChunkRecord> {
        self.chunks.get(&(x, z))
    }

    pub fn bounds(&self) -> Option<WorldBounds> {
        self.bounds
    }

    /// Zoom level tracked during the scan.
    pub fn zoom_level_max(&self) -> u32 {
        self.zoom_level_max
    }

    pub fn stats(&self) -> IndexStats {
        self.stats
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn subchunk_count(&self) -> usize {
        self.stats.subchunks
    }
}
