//! Data2D records: height map (i16_le[256]) followed by biome ids (u8[256]).

/// Payload length of a Data2D record.
pub const DATA_2D_LEN: usize = 768;

/// Decoded height map and biomes of one chunk, indexed `z * 16 + x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data2D {
    pub heights: [i16; 256],
    pub biomes: [u8; 256],
}

impl Data2D {
    /// Decode a Data2D payload. Returns `None` if it is shorter than 768 bytes.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < DATA_2D_LEN {
            return None;
        }
        let mut heights = [0i16; 256];
        for (i, h) in heights.iter_mut().enumerate() {
            *h = i16::from_le_bytes([data[i * 2], data[i * 2 + 1]]);
        }
        let mut biomes = [0u8; 256];
        biomes.copy_from_slice(&data[512..DATA_2D_LEN]);
        Some(Self { heights, biomes })
    }

    pub fn height_at(&self, x: usize, z: usize) -> i16 {
        self.heights[(z & 0xF) * 16 + (x & 0xF)]
    }

    pub fn max_height(&self) -> i16 {
        self.heights.iter().copied().max().unwrap_or(0)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(DATA_2D_LEN);
        for h in &self.heights {
            buf.extend_from_slice(&h.to_le_bytes());
        }
        buf.extend_from_slice(&self.biomes);
        buf
    }
}
