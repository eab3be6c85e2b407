//! Height-map listing for the `chunks` command.

use mcbe_map_world::{Data2D, StoreError, WorldIndex, WorldStore};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data2DEntry {
    pub x: i32,
    pub z: i32,
    pub len: usize,
    /// `None` when the payload is not a full height map.
    pub max_height: Option<i16>,
}

#[derive(Debug, Default)]
pub struct ChunkReport {
    pub chunks: usize,
    pub entries: Vec<Data2DEntry>,
}

impl ChunkReport {
    pub fn with_data_2d(&self) -> usize {
        self.entries.len()
    }
}

/// Read the Data2D record of every indexed chunk that has one.
pub fn chunk_report(
    store: &mut dyn WorldStore,
    index: &WorldIndex,
) -> Result<ChunkReport, StoreError> {
    let mut report = ChunkReport {
        chunks: index.chunk_count(),
        entries: Vec::new(),
    };
    for record in index.chunks() {
        let Some(key) = &record.data_2d_key else {
            continue;
        };
        let Some(payload) = store.get(key)? else {
            warn!("Data2D of chunk {},{} vanished", record.x, record.z);
            continue;
        };
        let max_height = Data2D::parse(&payload).map(|d| d.max_height());
        info!(
            "Chunk {},{}: Data2D {} bytes, max height {}",
            record.x,
            record.z,
            payload.len(),
            max_height.map_or_else(|| "?".to_string(), |h| h.to_string())
        );
        report.entries.push(Data2DEntry {
            x: record.x,
            z: record.z,
            len: payload.len(),
            max_height,
        });
    }
    info!(
        "{} of {} chunks have Data2D",
        report.with_data_2d(),
        report.chunks
    );
    Ok(report)
}
