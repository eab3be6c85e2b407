//! Chunk tile composition.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use mcbe_map_world::ChunkColumns;

use crate::error::RenderError;
use crate::image_ops::{self, FRAGMENT_SIZE, SEA_LEVEL};
use crate::texture::{TextureCache, TextureResolver};

/// Edge length of one chunk tile in pixels.
pub const TILE_SIZE: u32 = 256;

/// One fragment placed on the tile canvas.
#[derive(Debug, Clone)]
pub struct Fragment {
    pub image: Arc<RgbaImage>,
    pub x: u32,
    pub y: u32,
}

/// Resolve every visible block, x outer, z inner, bottom to top.
///
/// Columns without an opaque floor are shaded as if at sea level.
pub fn compose_chunk(
    columns: &ChunkColumns<'_>,
    resolver: &TextureResolver,
    cache: &mut TextureCache,
) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    for (x, z, column) in columns.iter() {
        let shade_y = column.base_y().unwrap_or(SEA_LEVEL);
        for (stack_index, block) in column.stack().enumerate() {
            if block.is_air() {
                continue;
            }
            fragments.push(Fragment {
                image: resolver.resolve(cache, block, x, stack_index, z, shade_y),
                x: FRAGMENT_SIZE * x as u32,
                y: FRAGMENT_SIZE * z as u32,
            });
        }
    }
    fragments
}

/// Draw fragments onto a transparent 256×256 canvas in order.
pub fn flatten(fragments: &[Fragment]) -> RgbaImage {
    let mut canvas = RgbaImage::new(TILE_SIZE, TILE_SIZE);
    for f in fragments {
        image_ops::draw_over(&mut canvas, &f.image, f.x, f.y);
    }
    canvas
}

/// `<out>/map/<zoom>/<map_x>/<map_z>.png`
pub fn tile_path(out_dir: &Path, zoom: u32, map_x: i64, map_z: i64) -> PathBuf {
    out_dir
        .join("map")
        .join(zoom.to_string())
        .join(map_x.to_string())
        .join(format!("{map_z}.png"))
}

/// Compose and write one chunk's tile. Returns `None` when nothing in the
/// chunk is visible, in which case no file is written.
pub fn write_tile(
    columns: &ChunkColumns<'_>,
    resolver: &TextureResolver,
    path: &Path,
) -> Result<Option<PathBuf>, RenderError> {
    let mut cache = TextureCache::new();
    let fragments = compose_chunk(columns, resolver, &mut cache);
    if fragments.is_empty() {
        return Ok(None);
    }
    let canvas = flatten(&fragments);
    image_ops::save_png_atomic(&canvas, path)?;
    Ok(Some(path.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetTables, MemoryTextures};
    use image::Rgba;
    use mcbe_map_world::{Block, TransparentBlocks};
    use serde_json::json;

    fn resolver() -> TextureResolver {
        let tables = AssetTables::new(
            json!({"stone": {"textures": "stone"}, "glass": {"textures": "glass"}}),
            json!({"texture_data": {
                "stone": {"textures": "textures/blocks/stone"},
                "glass": {"textures": "textures/blocks/glass"}
            }}),
            serde_json::Value::Null,
            serde_json::Value::Null,
        );
        let mut textures = MemoryTextures::new();
        textures.insert(
            "textures/blocks/stone",
            RgbaImage::from_pixel(16, 16, Rgba([128, 128, 128, 255])),
        );
        let mut glass = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 0]));
        glass.put_pixel(0, 0, Rgba([0, 0, 255, 255]));
        textures.insert("textures/blocks/glass", glass);
        TextureResolver::new(tables, Box::new(textures))
    }

    #[test]
    fn path_layout() {
        let p = tile_path(Path::new("out"), 3, 12, 0);
        assert_eq!(p, Path::new("out/map/3/12/0.png"));
    }

    #[test]
    fn fragments_follow_column_order() {
        let t = TransparentBlocks::new(["minecraft:glass"]);
        let mut cols = ChunkColumns::new(&t);
        cols.insert(2, 1, 64, Arc::new(Block::new("minecraft:stone", 0)));
        cols.insert(2, 1, 65, Arc::new(Block::new("minecraft:glass", 0)));
        cols.insert(0, 3, 64, Arc::new(Block::new("minecraft:stone", 0)));

        let r = resolver();
        let mut cache = TextureCache::new();
        let fragments = compose_chunk(&cols, &r, &mut cache);
        let placed: Vec<_> = fragments.iter().map(|f| (f.x, f.y)).collect();
        assert_eq!(placed, [(0, 48), (32, 16), (32, 16)]);
        assert_eq!(cache.len(), 2);

        let canvas = flatten(&fragments);
        assert_eq!(canvas.dimensions(), (TILE_SIZE, TILE_SIZE));
        // glass drawn over stone
        assert_eq!(canvas.get_pixel(32, 16).0, [0, 0, 255, 255]);
        assert_eq!(canvas.get_pixel(33, 16).0, [128, 128, 128, 255]);
        assert_eq!(canvas.get_pixel(100, 100).0, [0, 0, 0, 0]);
    }

    #[test]
    fn empty_chunk_writes_nothing() {
        let t = TransparentBlocks::builtin();
        let cols = ChunkColumns::new(&t);
        let dir = std::env::temp_dir().join(format!("mcbe_map_tile_{}", rand::random::<u64>()));
        let path = tile_path(&dir, 0, 0, 0);
        assert!(write_tile(&cols, &resolver(), &path).unwrap().is_none());
        assert!(!path.exists());
    }
}
