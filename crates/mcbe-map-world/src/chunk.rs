//! Materialising one chunk's columns from its sub-chunk records.

use tracing::debug;

use crate::block::TransparentBlocks;
use crate::column::ChunkColumns;
use crate::error::{DecodeError, StoreError};
use crate::index::ChunkRecord;
use crate::store::WorldStore;
use crate::subchunk::decode_subchunk;

/// Sub-chunk payloads of one chunk, ascending by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubchunkPayloads {
    pub entries: Vec<(i8, Vec<u8>)>,
}

impl SubchunkPayloads {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch every sub-chunk payload the record points at.
///
/// A key listed in the index but gone from the store is skipped.
pub fn fetch_subchunks(
    store: &mut dyn WorldStore,
    record: &ChunkRecord,
) -> Result<SubchunkPayloads, StoreError> {
    let mut entries = Vec::with_capacity(record.subchunk_keys.len());
    for (&index, key) in &record.subchunk_keys {
        match store.get(key)? {
            Some(data) => entries.push((index, data)),
            None => debug!(
                "Sub-chunk {index} of chunk {},{} vanished from the store",
                record.x, record.z
            ),
        }
    }
    Ok(SubchunkPayloads { entries })
}

/// Decode all payloads of a chunk, lowest sub-chunk first.
pub fn decode_chunk<'t>(
    record: &ChunkRecord,
    payloads: &SubchunkPayloads,
    transparent: &'t TransparentBlocks,
) -> Result<ChunkColumns<'t>, DecodeError> {
    let mut columns = ChunkColumns::new(transparent);
    for (index, data) in &payloads.entries {
        let stats = decode_subchunk(data, *index, &mut columns)?;
        debug!(
            "chunk {},{} sub-chunk {index}: v{} placed {} blocks",
            record.x, record.z, stats.version, stats.blocks_placed
        );
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, AIR};
    use crate::index::WorldIndex;
    use crate::key::{chunk_key, sub_chunk_key, TAG_CHUNK_VERSION};
    use crate::store::MemoryStore;
    use crate::subchunk::SubchunkBuilder;

    fn layer(top: &str) -> Vec<Block> {
        vec![Block::new(AIR, 0), Block::new(top, 0)]
    }

    #[test]
    fn higher_subchunks_win() {
        let mut store = MemoryStore::new();
        store.insert(chunk_key(0, 0, TAG_CHUNK_VERSION), vec![40]);
        store.insert(
            sub_chunk_key(0, 0, 0),
            SubchunkBuilder::new(9, 0)
                .uniform_layer(1, &layer("minecraft:stone"), 1)
                .build(),
        );
        store.insert(
            sub_chunk_key(0, 0, 1),
            SubchunkBuilder::new(9, 1)
                .uniform_layer(1, &layer("minecraft:dirt"), 1)
                .build(),
        );
        let index = WorldIndex::build(&mut store).unwrap();
        let record = index.chunk(0, 0).unwrap();

        let payloads = fetch_subchunks(&mut store, record).unwrap();
        assert_eq!(payloads.len(), 2);
        let t = TransparentBlocks::builtin();
        let columns = decode_chunk(record, &payloads, &t).unwrap();
        let c = columns.get(4, 4).unwrap();
        assert_eq!(c.floor().unwrap().name, "minecraft:dirt");
        assert_eq!(c.base_y(), Some(31));
    }

    #[test]
    fn water_over_sand_across_subchunks() {
        let mut store = MemoryStore::new();
        let mut sand_bottom = [0u32; 4096];
        for i in 0..4096 {
            if i & 0xF < 8 {
                sand_bottom[i] = 1;
            }
        }
        store.insert(
            sub_chunk_key(0, 0, 3),
            SubchunkBuilder::new(8, 0)
                .layer(1, &layer("minecraft:sand"), &sand_bottom)
                .build(),
        );
        store.insert(
            sub_chunk_key(0, 0, 4),
            SubchunkBuilder::new(8, 0)
                .uniform_layer(1, &layer("minecraft:water"), 1)
                .build(),
        );
        let index = WorldIndex::build(&mut store).unwrap();
        let record = index.chunk(0, 0).unwrap();
        let payloads = fetch_subchunks(&mut store, record).unwrap();
        let t = TransparentBlocks::builtin();
        let columns = decode_chunk(record, &payloads, &t).unwrap();
        let c = columns.get(0, 0).unwrap();
        assert_eq!(c.floor().unwrap().name, "minecraft:sand");
        assert_eq!(c.base_y(), Some(48 + 7));
        assert_eq!(c.layers().len(), 16);
    }

    #[test]
    fn bad_subchunk_fails_the_chunk() {
        let mut record = ChunkRecord::new(0, 0);
        record.subchunk_keys.insert(0, sub_chunk_key(0, 0, 0));
        let payloads = SubchunkPayloads {
            entries: vec![(0, vec![3, 0, 0])],
        };
        let t = TransparentBlocks::builtin();
        let err = decode_chunk(&record, &payloads, &t).unwrap_err();
        assert!(err.is_unsupported_format());
    }

    #[test]
    fn missing_payload_is_skipped() {
        let mut store = MemoryStore::new();
        let mut record = ChunkRecord::new(0, 0);
        record.subchunk_keys.insert(2, sub_chunk_key(0, 0, 2));
        let payloads = fetch_subchunks(&mut store, &record).unwrap();
        assert!(payloads.is_empty());
    }
}
