//! Sub-chunk payload codec.
//!
//! ```text
//! v1: [version][layer]
//! v8: [version][storage_count][layer]*
//! v9: [version][storage_count][index:i8][layer]*
//!
//! layer: [bits_per_block << 1 | runtime][words: u32_le * word_count]
//!        [palette_len: i32_le][palette entry tag stream]*
//! ```
//!
//! Block indices are packed LSB-first. Position `i` in a layer decomposes as
//! `x = (i >> 8) & 0xF`, `z = (i >> 4) & 0xF`, `y = i & 0xF`.

use std::sync::Arc;

use bytes::{Buf, BufMut};
use mcbe_map_nbt::{read_tag_stream, write_tag_stream, NbtCompound, NbtTag};
use tracing::{debug, warn};

use crate::block::{Block, Palette};
use crate::column::ChunkColumns;
use crate::error::DecodeError;

/// Blocks per sub-chunk layer.
pub const BLOCKS_PER_LAYER: usize = 4096;

/// What one decode did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubchunkStats {
    pub version: u8,
    /// Slice index used for absolute Y. The stored index for v9.
    pub slice_index: i8,
    pub layers_decoded: usize,
    /// Non-air blocks handed to the columns.
    pub blocks_placed: usize,
    /// A runtime-id layer was met and decoding stopped there.
    pub runtime_layer_skipped: bool,
    /// A zero layer header aborted the sub-chunk.
    pub degenerate: bool,
}

/// Decode one sub-chunk payload into `columns`.
///
/// `slice_index` is the index the payload was stored under. Version 9
/// payloads carry their own index, which wins.
pub fn decode_subchunk(
    data: &[u8],
    slice_index: i8,
    columns: &mut ChunkColumns<'_>,
) -> Result<SubchunkStats, DecodeError> {
    let total = data.len();
    let mut buf = data;

    ensure(buf, 1, total)?;
    let version = buf.get_u8();
    let mut stats = SubchunkStats {
        version,
        slice_index,
        ..SubchunkStats::default()
    };

    let storages = match version {
        1 => 1,
        8 => {
            ensure(buf, 1, total)?;
            buf.get_i8().max(0) as usize
        }
        9 => {
            ensure(buf, 2, total)?;
            let storages = buf.get_i8().max(0) as usize;
            stats.slice_index = buf.get_i8();
            storages
        }
        version => return Err(DecodeError::UnsupportedVersion { version }),
    };
    let y_offset = 16 * stats.slice_index as i32;

    for storage in 0..storages {
        ensure(buf, 1, total)?;
        let header = buf.get_u8();
        if header == 0 {
            warn!("Skipping single-block sub-chunk (slice {})", stats.slice_index);
            stats.degenerate = true;
            return Ok(stats);
        }
        if header & 1 == 1 {
            // Runtime-id layers have no embedded palette, and their length
            // is unknown, so nothing after them can be located.
            warn!(
                "Runtime-id layer {storage} in slice {} is not supported, skipping rest of sub-chunk",
                stats.slice_index
            );
            stats.runtime_layer_skipped = true;
            return Ok(stats);
        }

        let bits = header >> 1;
        let layout = WordLayout::new(bits)?;
        debug!(
            "sub-chunk v{version} slice {} layer {storage}: {bits} bits/block, {} words",
            stats.slice_index, layout.word_count
        );

        let words_len = layout.word_count * 4;
        ensure(buf, words_len, total)?;
        let words = &buf[..words_len];
        buf.advance(words_len);

        let palette = read_palette(&mut buf, total)?;

        for i in 0..BLOCKS_PER_LAYER {
            let state = layout.state_at(words, i);
            let block = palette.get(state)?;
            if block.is_air() {
                continue;
            }
            let x = (i >> 8) & 0xF;
            let z = (i >> 4) & 0xF;
            let y = (i & 0xF) as i32;
            columns.insert(x, z, y + y_offset, Arc::clone(block));
            stats.blocks_placed += 1;
        }
        stats.layers_decoded += 1;
    }

    Ok(stats)
}

#[derive(Debug, Clone, Copy)]
struct WordLayout {
    bits: u32,
    blocks_per_word: usize,
    word_count: usize,
    mask: u32,
}

impl WordLayout {
    fn new(bits: u8) -> Result<Self, DecodeError> {
        if bits == 0 || bits > 32 {
            return Err(DecodeError::InvalidBitsPerBlock { bits });
        }
        let blocks_per_word = 32 / bits as usize;
        let mask = if bits == 32 {
            u32::MAX
        } else {
            (1u32 << bits) - 1
        };
        Ok(Self {
            bits: bits as u32,
            blocks_per_word,
            word_count: BLOCKS_PER_LAYER.div_ceil(blocks_per_word),
            mask,
        })
    }

    fn state_at(&self, words: &[u8], i: usize) -> u32 {
        let at = (i / self.blocks_per_word) * 4;
        let word = u32::from_le_bytes([words[at], words[at + 1], words[at + 2], words[at + 3]]);
        let shift = (i % self.blocks_per_word) as u32 * self.bits;
        (word >> shift) & self.mask
    }
}

fn read_palette(buf: &mut &[u8], total: usize) -> Result<Palette, DecodeError> {
    ensure(buf, 4, total)?;
    let len = buf.get_i32_le();
    if len < 0 {
        return Err(DecodeError::NegativePaletteLength(len));
    }
    let mut entries = Vec::with_capacity((len as usize).min(BLOCKS_PER_LAYER));
    for entry in 0..len as usize {
        let stream = read_tag_stream(*buf).map_err(|source| DecodeError::Nbt { entry, source })?;
        entries.push(Arc::new(Block::from_palette_entry(&stream, entry)?));
        buf.advance(stream.consumed);
    }
    Ok(Palette::new(entries))
}

fn ensure(buf: &[u8], needed: usize, total: usize) -> Result<(), DecodeError> {
    if buf.remaining() < needed {
        Err(DecodeError::Truncated {
            offset: total - buf.remaining(),
            needed,
            remaining: buf.remaining(),
        })
    } else {
        Ok(())
    }
}

// ─── Encoding ───────────────────────────────────────────────────────────────

/// Builds sub-chunk payloads in the layout [`decode_subchunk`] reads.
#[derive(Debug, Clone)]
pub struct SubchunkBuilder {
    version: u8,
    index: i8,
    layers: Vec<Vec<u8>>,
}

impl SubchunkBuilder {
    /// `index` is only written for version 9.
    pub fn new(version: u8, index: i8) -> Self {
        Self {
            version,
            index,
            layers: Vec::new(),
        }
    }

    /// Add a palette layer. `states` holds one palette index per position
    /// and must have [`BLOCKS_PER_LAYER`] entries.
    pub fn layer(mut self, bits: u8, palette: &[Block], states: &[u32]) -> Self {
        let blocks_per_word = 32 / bits.max(1) as usize;
        let word_count = BLOCKS_PER_LAYER.div_ceil(blocks_per_word);
        let mut out = Vec::with_capacity(1 + word_count * 4);
        out.put_u8(bits << 1);
        for w in 0..word_count {
            let mut word = 0u32;
            for slot in 0..blocks_per_word {
                let i = w * blocks_per_word + slot;
                if let Some(&state) = states.get(i) {
                    word |= state << (slot as u32 * bits as u32);
                }
            }
            out.put_u32_le(word);
        }
        out.put_i32_le(palette.len() as i32);
        for block in palette {
            write_palette_entry(&mut out, block);
        }
        self.layers.push(out);
        self
    }

    /// Add a layer where every position uses the same palette index.
    pub fn uniform_layer(self, bits: u8, palette: &[Block], state: u32) -> Self {
        self.layer(bits, palette, &[state; BLOCKS_PER_LAYER])
    }

    /// Add pre-encoded layer bytes as-is.
    pub fn raw_layer(mut self, bytes: Vec<u8>) -> Self {
        self.layers.push(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![self.version];
        match self.version {
            8 => out.push(self.layers.len() as u8),
            9 => {
                out.push(self.layers.len() as u8);
                out.push(self.index as u8);
            }
            _ => {}
        }
        for layer in &self.layers {
            out.extend_from_slice(layer);
        }
        out
    }
}

/// Write one palette entry tag stream: `{name, states[, val]}`.
pub fn write_palette_entry(buf: &mut impl BufMut, block: &Block) {
    let mut root = NbtCompound::new();
    root.insert("name".into(), NbtTag::String(block.name.clone()));
    root.insert("states".into(), NbtTag::Compound(block.states.clone()));
    if block.value != 0 {
        root.insert("val".into(), NbtTag::Short(block.value as i16));
    }
    write_tag_stream(buf, "", &root);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{TransparentBlocks, AIR};

    fn air_stone() -> Vec<Block> {
        vec![Block::new(AIR, 0), Block::new("minecraft:stone", 0)]
    }

    fn names_at(cols: &ChunkColumns<'_>, x: usize, z: usize) -> Vec<String> {
        cols.get(x, z)
            .map(|c| c.stack().map(|b| b.name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn v9_uniform_stone() {
        let data = SubchunkBuilder::new(9, 0)
            .uniform_layer(1, &air_stone(), 1)
            .build();
        // version, count, index, header, 128 words, palette
        assert_eq!(data[..4], [9, 1, 0, 2]);

        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let stats = decode_subchunk(&data, 0, &mut cols).unwrap();
        assert_eq!(stats.blocks_placed, 4096);
        assert_eq!(stats.layers_decoded, 1);
        assert_eq!(cols.len(), 256);
        for (_, _, column) in cols.iter() {
            assert_eq!(column.base_y(), Some(15));
            assert_eq!(column.stack().count(), 1);
        }
    }

    #[test]
    fn v9_index_overrides_slice() {
        let data = SubchunkBuilder::new(9, -2)
            .uniform_layer(1, &air_stone(), 1)
            .build();
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let stats = decode_subchunk(&data, 5, &mut cols).unwrap();
        assert_eq!(stats.slice_index, -2);
        assert_eq!(cols.get(0, 0).unwrap().base_y(), Some(-32 + 15));
    }

    #[test]
    fn v1_and_v8_use_caller_slice() {
        let t = TransparentBlocks::builtin();

        let v1 = SubchunkBuilder::new(1, 0)
            .uniform_layer(1, &air_stone(), 1)
            .build();
        let mut cols = ChunkColumns::new(&t);
        decode_subchunk(&v1, 4, &mut cols).unwrap();
        assert_eq!(cols.get(0, 0).unwrap().base_y(), Some(64 + 15));

        let v8 = SubchunkBuilder::new(8, 0)
            .uniform_layer(1, &air_stone(), 1)
            .build();
        let mut cols = ChunkColumns::new(&t);
        decode_subchunk(&v8, 2, &mut cols).unwrap();
        assert_eq!(cols.get(9, 9).unwrap().base_y(), Some(32 + 15));
    }

    #[test]
    fn position_decomposition() {
        // Stone only at x=1, z=2, y=3.
        let mut states = [0u32; BLOCKS_PER_LAYER];
        states[(1 << 8) | (2 << 4) | 3] = 1;
        let data = SubchunkBuilder::new(9, 0)
            .layer(4, &air_stone(), &states)
            .build();
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let stats = decode_subchunk(&data, 0, &mut cols).unwrap();
        assert_eq!(stats.blocks_placed, 1);
        assert_eq!(cols.len(), 1);
        assert_eq!(names_at(&cols, 1, 2), ["minecraft:stone"]);
        assert_eq!(cols.get(1, 2).unwrap().base_y(), Some(3));
    }

    #[test]
    fn padded_word_widths() {
        // 3, 5 and 6 bits leave padding bits in every word.
        let palette: Vec<Block> = (0..8)
            .map(|i| {
                if i == 0 {
                    Block::new(AIR, 0)
                } else {
                    Block::new(format!("minecraft:b{i}"), 0)
                }
            })
            .collect();
        let states: Vec<u32> = (0..BLOCKS_PER_LAYER).map(|i| (i % 8) as u32).collect();
        let t = TransparentBlocks::default();
        for bits in [3u8, 5, 6] {
            let data = SubchunkBuilder::new(8, 0)
                .layer(bits, &palette, &states)
                .build();
            let mut cols = ChunkColumns::new(&t);
            decode_subchunk(&data, 0, &mut cols).unwrap();
            // Each column's top y is 15, state 15 % 8 = 7.
            assert_eq!(names_at(&cols, 0, 0), ["minecraft:b7"], "bits {bits}");
        }
    }

    #[test]
    fn two_storage_layers() {
        let t = TransparentBlocks::new(["minecraft:water"]);
        let stone_floor = {
            let mut s = [0u32; BLOCKS_PER_LAYER];
            s[0] = 1;
            s
        };
        let water_above = {
            let mut s = [0u32; BLOCKS_PER_LAYER];
            s[1] = 1;
            s
        };
        let data = SubchunkBuilder::new(8, 0)
            .layer(1, &air_stone(), &stone_floor)
            .layer(1, &[Block::new(AIR, 0), Block::new("minecraft:water", 0)], &water_above)
            .build();
        let mut cols = ChunkColumns::new(&t);
        let stats = decode_subchunk(&data, 0, &mut cols).unwrap();
        assert_eq!(stats.layers_decoded, 2);
        assert_eq!(names_at(&cols, 0, 0), ["minecraft:stone", "minecraft:water"]);
    }

    #[test]
    fn decoding_is_deterministic() {
        let palette = vec![
            Block::new(AIR, 0),
            Block::new("minecraft:stone", 0),
            Block::new("minecraft:glass", 0),
            Block::new("minecraft:dirt", 0),
        ];
        let states: Vec<u32> = (0..BLOCKS_PER_LAYER)
            .map(|_| rand::random::<u32>() % 4)
            .collect();
        let data = SubchunkBuilder::new(9, 3)
            .layer(2, &palette, &states)
            .build();
        let t = TransparentBlocks::new(["minecraft:glass"]);
        let mut first = ChunkColumns::new(&t);
        let mut second = ChunkColumns::new(&t);
        decode_subchunk(&data, 3, &mut first).unwrap();
        decode_subchunk(&data, 3, &mut second).unwrap();
        assert!(first == second);
    }

    #[test]
    fn unsupported_version() {
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let err = decode_subchunk(&[3, 0, 0, 0], 0, &mut cols).unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedVersion { version: 3 });
        assert!(err.is_unsupported_format());
    }

    #[test]
    fn zero_header_aborts_quietly() {
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let data = SubchunkBuilder::new(9, 0).raw_layer(vec![0, 1, 2, 3]).build();
        let stats = decode_subchunk(&data, 0, &mut cols).unwrap();
        assert!(stats.degenerate);
        assert!(cols.is_empty());
    }

    #[test]
    fn runtime_layer_is_skipped() {
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let data = SubchunkBuilder::new(8, 0)
            .raw_layer(vec![(1 << 1) | 1, 0xFF, 0xFF])
            .uniform_layer(1, &air_stone(), 1)
            .build();
        let stats = decode_subchunk(&data, 0, &mut cols).unwrap();
        assert!(stats.runtime_layer_skipped);
        assert_eq!(stats.layers_decoded, 0);
        assert!(cols.is_empty());
    }

    #[test]
    fn palette_index_out_of_range() {
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let data = SubchunkBuilder::new(9, 0)
            .uniform_layer(2, &air_stone(), 3)
            .build();
        let err = decode_subchunk(&data, 0, &mut cols).unwrap_err();
        assert_eq!(err, DecodeError::PaletteIndexOutOfRange { index: 3, len: 2 });
    }

    #[test]
    fn truncated_words() {
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let data = SubchunkBuilder::new(9, 0)
            .raw_layer(vec![1 << 1, 0, 0, 0, 0])
            .build();
        let err = decode_subchunk(&data, 0, &mut cols).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { needed: 512, .. }));
    }

    #[test]
    fn truncated_palette_entry() {
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let mut data = SubchunkBuilder::new(9, 0)
            .uniform_layer(1, &air_stone(), 1)
            .build();
        data.truncate(data.len() - 3);
        let err = decode_subchunk(&data, 0, &mut cols).unwrap_err();
        assert!(matches!(err, DecodeError::Nbt { entry: 1, .. }));
    }

    #[test]
    fn invalid_bits_per_block() {
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let data = SubchunkBuilder::new(9, 0).raw_layer(vec![33 << 1]).build();
        let err = decode_subchunk(&data, 0, &mut cols).unwrap_err();
        assert_eq!(err, DecodeError::InvalidBitsPerBlock { bits: 33 });
    }

    #[test]
    fn negative_palette_length() {
        let t = TransparentBlocks::builtin();
        let mut cols = ChunkColumns::new(&t);
        let mut layer = vec![1 << 1];
        layer.extend_from_slice(&[0u8; 512]);
        layer.extend_from_slice(&(-1i32).to_le_bytes());
        let data = SubchunkBuilder::new(9, 0).raw_layer(layer).build();
        let err = decode_subchunk(&data, 0, &mut cols).unwrap_err();
        assert_eq!(err, DecodeError::NegativePaletteLength(-1));
    }
}
