//! Two-phase render driver: the index is complete before any tile is drawn,
//! then chunks are decoded and drawn in parallel batches.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{info, warn};

use mcbe_map_world::{
    decode_chunk, fetch_subchunks, ChunkRecord, SubchunkPayloads, TransparentBlocks, WorldBounds,
    WorldIndex, WorldStore,
};

use crate::error::RenderError;
use crate::texture::TextureResolver;
use crate::tile::{tile_path, write_tile};

/// Knobs for one render run.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub output_dir: PathBuf,
    /// Worker threads, 0 for one per core.
    pub workers: usize,
    /// Chunks fetched from the store per parallel batch.
    pub batch_size: usize,
    /// Stop after the first batch that had a failed chunk.
    pub stop_on_error: bool,
    /// Render only this chunk.
    pub only_chunk: Option<(i32, i32)>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            workers: 0,
            batch_size: 64,
            stop_on_error: false,
            only_chunk: None,
        }
    }
}

/// Outcome of a render run.
#[derive(Debug, Default)]
pub struct RenderSummary {
    pub rendered: Vec<PathBuf>,
    /// Chunks with nothing visible.
    pub empty: usize,
    pub failed: Vec<RenderError>,
    pub stopped_early: bool,
}

impl RenderSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

enum ChunkOutcome {
    Rendered(PathBuf),
    Empty,
    Failed(RenderError),
}

/// Render every indexed chunk to its tile.
///
/// Store failures abort the run. Decode and write failures are collected
/// per chunk and the run carries on.
pub fn render_world(
    store: &mut dyn WorldStore,
    index: &WorldIndex,
    resolver: &TextureResolver,
    transparent: &TransparentBlocks,
    opts: &RenderOptions,
) -> Result<RenderSummary, RenderError> {
    let mut summary = RenderSummary::default();
    let Some(bounds) = index.bounds() else {
        warn!("Nothing to render");
        return Ok(summary);
    };
    let zoom = index.zoom_level_max();

    let records: Vec<&ChunkRecord> = index
        .chunks()
        .filter(|r| opts.only_chunk.map_or(true, |(x, z)| r.x == x && r.z == z))
        .collect();
    if let Some((x, z)) = opts.only_chunk {
        if records.is_empty() {
            warn!("Chunk {x},{z} is not in the world");
        } else {
            info!("Rendering single chunk {x},{z}");
        }
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.workers)
        .thread_name(|i| format!("render-{i}"))
        .build()?;

    let total = records.len();
    let mut done = 0;
    for batch in records.chunks(opts.batch_size.max(1)) {
        let mut work: Vec<(&ChunkRecord, SubchunkPayloads)> = Vec::with_capacity(batch.len());
        for &record in batch {
            work.push((record, fetch_subchunks(store, record)?));
        }

        let outcomes: Vec<ChunkOutcome> = pool.install(|| {
            work.par_iter()
                .map(|(record, payloads)| {
                    render_chunk(record, payloads, resolver, transparent, &bounds, zoom, opts)
                })
                .collect()
        });

        for outcome in outcomes {
            match outcome {
                ChunkOutcome::Rendered(path) => summary.rendered.push(path),
                ChunkOutcome::Empty => summary.empty += 1,
                ChunkOutcome::Failed(e) => {
                    warn!("Skipping {e}");
                    summary.failed.push(e);
                }
            }
        }
        done += batch.len();
        info!("Rendered {done}/{total} chunks");

        if opts.stop_on_error && summary.has_failures() {
            warn!("Stopping after first failed chunk");
            summary.stopped_early = true;
            break;
        }
    }

    info!(
        "Render finished: {} tiles, {} empty chunks, {} failed",
        summary.rendered.len(),
        summary.empty,
        summary.failed.len()
    );
    Ok(summary)
}

fn render_chunk(
    record: &ChunkRecord,
    payloads: &SubchunkPayloads,
    resolver: &TextureResolver,
    transparent: &TransparentBlocks,
    bounds: &WorldBounds,
    zoom: u32,
    opts: &RenderOptions,
) -> ChunkOutcome {
    let columns = match decode_chunk(record, payloads, transparent) {
        Ok(c) => c,
        Err(source) => {
            return ChunkOutcome::Failed(RenderError::Chunk {
                x: record.x,
                z: record.z,
                source,
            })
        }
    };
    let (map_x, map_z) = bounds.map_offset(record.x, record.z);
    let path = tile_path(&opts.output_dir, zoom, map_x, map_z);
    match write_tile(&columns, resolver, &path) {
        Ok(Some(path)) => ChunkOutcome::Rendered(path),
        Ok(None) => ChunkOutcome::Empty,
        Err(e) => ChunkOutcome::Failed(e),
    }
}
