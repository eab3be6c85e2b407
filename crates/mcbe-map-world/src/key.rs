//! Chunk record keys.
//!
//! Layout (all integers little-endian, signed):
//!
//! ```text
//! overworld:  [X:i32][Z:i32][kind:u8]([subchunk:i8] if kind = 47)          9 / 10 bytes
//! nether/end: [X:i32][Z:i32][dim:i32][kind:u8]([subchunk:i8] if kind = 47) 13 / 14 bytes
//! ```
//!
//! Global records (`Overworld`, `BiomeData`, `scoreboard`, `mobevents`, ...)
//! are plain word characters and can collide with these lengths, so a key is
//! only treated as a chunk key if it has at least one byte outside
//! `[A-Za-z0-9_]`.

// ─── Record kinds ───────────────────────────────────────────────────────────

pub const TAG_CHUNK_VERSION: u8 = 0x2C;
pub const TAG_DATA_2D: u8 = 0x2D;
pub const TAG_DATA_2D_LEGACY: u8 = 0x2E;
pub const TAG_SUB_CHUNK_PREFIX: u8 = 0x2F;
pub const TAG_BLOCK_ENTITY: u8 = 0x31;
pub const TAG_ENTITY: u8 = 0x32;
pub const TAG_PENDING_TICKS: u8 = 0x33;
pub const TAG_BIOME_STATE: u8 = 0x35;
pub const TAG_FINALIZED_STATE: u8 = 0x36;
pub const TAG_RANDOM_TICKS: u8 = 0x3A;
pub const TAG_CHECKSUMS: u8 = 0x3B;
pub const TAG_CHUNK_VERSION_LEGACY: u8 = 0x76;

/// What a chunk record holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Version,
    LegacyVersion,
    Data2D,
    LegacyData2D,
    SubChunkPrefix,
    BlockEntity,
    Entity,
    PendingTicks,
    BiomeState,
    FinalizedState,
    RandomTicks,
    Checksums,
    Other(u8),
}

impl RecordKind {
    pub fn from_u8(tag: u8) -> Self {
        match tag {
            TAG_CHUNK_VERSION => RecordKind::Version,
            TAG_CHUNK_VERSION_LEGACY => RecordKind::LegacyVersion,
            TAG_DATA_2D => RecordKind::Data2D,
            TAG_DATA_2D_LEGACY => RecordKind::LegacyData2D,
            TAG_SUB_CHUNK_PREFIX => RecordKind::SubChunkPrefix,
            TAG_BLOCK_ENTITY => RecordKind::BlockEntity,
            TAG_ENTITY => RecordKind::Entity,
            TAG_PENDING_TICKS => RecordKind::PendingTicks,
            TAG_BIOME_STATE => RecordKind::BiomeState,
            TAG_FINALIZED_STATE => RecordKind::FinalizedState,
            TAG_RANDOM_TICKS => RecordKind::RandomTicks,
            TAG_CHECKSUMS => RecordKind::Checksums,
            other => RecordKind::Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            RecordKind::Version => TAG_CHUNK_VERSION,
            RecordKind::LegacyVersion => TAG_CHUNK_VERSION_LEGACY,
            RecordKind::Data2D => TAG_DATA_2D,
            RecordKind::LegacyData2D => TAG_DATA_2D_LEGACY,
            RecordKind::SubChunkPrefix => TAG_SUB_CHUNK_PREFIX,
            RecordKind::BlockEntity => TAG_BLOCK_ENTITY,
            RecordKind::Entity => TAG_ENTITY,
            RecordKind::PendingTicks => TAG_PENDING_TICKS,
            RecordKind::BiomeState => TAG_BIOME_STATE,
            RecordKind::FinalizedState => TAG_FINALIZED_STATE,
            RecordKind::RandomTicks => TAG_RANDOM_TICKS,
            RecordKind::Checksums => TAG_CHECKSUMS,
            RecordKind::Other(tag) => tag,
        }
    }
}

/// Dimension id carried by 13/14-byte keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Overworld,
    Nether,
    End,
    Other(i32),
}

impl Dimension {
    pub fn from_id(id: i32) -> Self {
        match id {
            0 => Dimension::Overworld,
            1 => Dimension::Nether,
            2 => Dimension::End,
            other => Dimension::Other(other),
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Dimension::Overworld => 0,
            Dimension::Nether => 1,
            Dimension::End => 2,
            Dimension::Other(id) => id,
        }
    }
}

// ─── Key descriptor ─────────────────────────────────────────────────────────

/// A chunk key interpreted in place. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkKey {
    pub chunk_x: i32,
    pub chunk_z: i32,
    /// Present only for 13/14-byte keys.
    pub dimension: Option<Dimension>,
    pub kind: RecordKind,
    /// Present only for sub-chunk keys.
    pub subchunk_index: Option<i8>,
    /// 10/14-byte key: one byte follows the kind, whatever the kind is.
    pub has_suffix: bool,
}

impl ChunkKey {
    /// Interpret a raw store key. Returns `None` for anything that is not a
    /// chunk key: wrong length, or word characters only.
    pub fn parse(key: &[u8]) -> Option<Self> {
        if !is_chunk_eligible(key) {
            return None;
        }
        let (dimension, kind_at) = match key.len() {
            9 | 10 => (None, 8),
            13 | 14 => (Some(Dimension::from_id(read_i32_le(key, 8))), 12),
            _ => return None,
        };
        let kind = RecordKind::from_u8(key[kind_at]);
        let has_suffix = key.len() > kind_at + 1;
        let subchunk_index = match (key.get(kind_at + 1), kind) {
            (Some(&index), RecordKind::SubChunkPrefix) => Some(index as i8),
            _ => None,
        };
        Some(Self {
            chunk_x: read_i32_le(key, 0),
            chunk_z: read_i32_le(key, 4),
            dimension,
            kind,
            subchunk_index,
            has_suffix,
        })
    }

    /// True for 9/10-byte keys.
    pub fn is_overworld(&self) -> bool {
        self.dimension.is_none()
    }
}

/// Whether `key` contains at least one byte outside `[A-Za-z0-9_]`.
pub fn is_chunk_eligible(key: &[u8]) -> bool {
    key.iter().any(|&b| !(b.is_ascii_alphanumeric() || b == b'_'))
}

fn read_i32_le(key: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([key[at], key[at + 1], key[at + 2], key[at + 3]])
}

// ─── Key builders ───────────────────────────────────────────────────────────

/// Build an overworld record key: `[X:i32_le][Z:i32_le][tag]`.
pub fn chunk_key(cx: i32, cz: i32, tag: u8) -> Vec<u8> {
    chunk_key_dim(cx, cz, 0, tag)
}

/// Build a dimension-aware record key. Overworld (dim=0) has no dimension field.
pub fn chunk_key_dim(cx: i32, cz: i32, dim: i32, tag: u8) -> Vec<u8> {
    let cap = if dim == 0 { 9 } else { 13 };
    let mut key = Vec::with_capacity(cap);
    key.extend_from_slice(&cx.to_le_bytes());
    key.extend_from_slice(&cz.to_le_bytes());
    if dim != 0 {
        key.extend_from_slice(&dim.to_le_bytes());
    }
    key.push(tag);
    key
}

/// Build an overworld sub-chunk key: `[X:i32_le][Z:i32_le][0x2F][index]`.
pub fn sub_chunk_key(cx: i32, cz: i32, index: i8) -> Vec<u8> {
    sub_chunk_key_dim(cx, cz, 0, index)
}

/// Build a dimension-aware sub-chunk key.
pub fn sub_chunk_key_dim(cx: i32, cz: i32, dim: i32, index: i8) -> Vec<u8> {
    let mut key = chunk_key_dim(cx, cz, dim, TAG_SUB_CHUNK_PREFIX);
    key.push(index as u8);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_overworld_record() {
        let key = chunk_key(10, -5, TAG_CHUNK_VERSION);
        let parsed = ChunkKey::parse(&key).unwrap();
        assert_eq!(parsed.chunk_x, 10);
        assert_eq!(parsed.chunk_z, -5);
        assert_eq!(parsed.dimension, None);
        assert_eq!(parsed.kind, RecordKind::Version);
        assert_eq!(parsed.subchunk_index, None);
        assert!(!parsed.has_suffix);
        assert!(parsed.is_overworld());
    }

    #[test]
    fn trailing_byte_after_other_kind() {
        let mut key = chunk_key(0, 0, TAG_CHUNK_VERSION);
        key.push(7);
        let parsed = ChunkKey::parse(&key).unwrap();
        assert_eq!(parsed.kind, RecordKind::Version);
        assert_eq!(parsed.subchunk_index, None);
        assert!(parsed.has_suffix);

        let parsed = ChunkKey::parse(&sub_chunk_key_dim(1, 1, 1, 2)).unwrap();
        assert!(parsed.has_suffix);
        assert!(!ChunkKey::parse(&chunk_key_dim(1, 1, 1, TAG_DATA_2D)).unwrap().has_suffix);
    }

    #[test]
    fn parse_sub_chunk_bytes() {
        // chunk (10, -5) sub-chunk 3
        let key = [0x0A, 0, 0, 0, 0xFB, 0xFF, 0xFF, 0xFF, 0x2F, 3];
        let parsed = ChunkKey::parse(&key).unwrap();
        assert_eq!((parsed.chunk_x, parsed.chunk_z), (10, -5));
        assert_eq!(parsed.kind, RecordKind::SubChunkPrefix);
        assert_eq!(parsed.subchunk_index, Some(3));
    }

    #[test]
    fn parse_negative_sub_chunk_index() {
        let key = sub_chunk_key(0, 0, -4);
        assert_eq!(key[9], 0xFC);
        assert_eq!(ChunkKey::parse(&key).unwrap().subchunk_index, Some(-4));
    }

    #[test]
    fn parse_nether_and_end() {
        let nether = ChunkKey::parse(&chunk_key_dim(1, 2, 1, TAG_DATA_2D)).unwrap();
        assert_eq!(nether.dimension, Some(Dimension::Nether));
        assert_eq!(nether.kind, RecordKind::Data2D);
        assert!(!nether.is_overworld());

        let end = ChunkKey::parse(&sub_chunk_key_dim(-1, 2, 2, 7)).unwrap();
        assert_eq!(end.dimension, Some(Dimension::End));
        assert_eq!(end.subchunk_index, Some(7));
        assert_eq!((end.chunk_x, end.chunk_z), (-1, 2));
    }

    #[test]
    fn unknown_kind_is_kept() {
        let parsed = ChunkKey::parse(&chunk_key(0, 0, 0x99)).unwrap();
        assert_eq!(parsed.kind, RecordKind::Other(0x99));
        assert_eq!(RecordKind::from_u8(0x99).as_u8(), 0x99);
    }

    #[test]
    fn word_keys_are_not_chunk_keys() {
        assert!(ChunkKey::parse(b"Overworld").is_none());
        assert!(ChunkKey::parse(b"BiomeData_").is_none());
        assert!(ChunkKey::parse(b"scoreboard").is_none());
        assert!(ChunkKey::parse(b"mobevents").is_none());
    }

    #[test]
    fn unsupported_lengths() {
        assert!(ChunkKey::parse(&[0xFF; 8]).is_none());
        assert!(ChunkKey::parse(&[0xFF; 11]).is_none());
        assert!(ChunkKey::parse(&[0xFF; 15]).is_none());
    }

    #[test]
    fn local_player_reads_as_foreign_dimension() {
        // 13 bytes with a non-word byte, so it never lands in the overworld
        let parsed = ChunkKey::parse(b"~local_player").unwrap();
        assert!(!parsed.is_overworld());
        assert!(matches!(parsed.dimension, Some(Dimension::Other(_))));
    }

    #[test]
    fn eligibility() {
        assert!(!is_chunk_eligible(b"AutonomousEntities"));
        assert!(is_chunk_eligible(b"map_-12345"));
        assert!(is_chunk_eligible(&[0, 0, 0, 0, 0, 0, 0, 0, 0x2C]));
    }

    #[test]
    fn builders_match_layout() {
        let key = chunk_key_dim(10, -5, 1, TAG_CHUNK_VERSION);
        assert_eq!(key.len(), 13);
        assert_eq!(&key[8..12], &1i32.to_le_bytes());
        assert_eq!(key[12], TAG_CHUNK_VERSION);
        assert_eq!(sub_chunk_key_dim(5, 3, 2, 2).len(), 14);
        assert_eq!(sub_chunk_key(5, 3, 2).len(), 10);
    }
}
