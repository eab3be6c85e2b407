//! Block to shaded fragment resolution.

use std::collections::HashMap;
use std::sync::Arc;

use image::RgbaImage;
use mcbe_map_world::{Block, WATER};
use tracing::{debug, warn};

use crate::assets::{AssetTables, TextureSource};
use crate::image_ops::{self, DEFAULT_TINT};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextureKey {
    name: String,
    value: i32,
    shade_y: i32,
}

/// Resolved fragments for one chunk render.
#[derive(Debug, Default)]
pub struct TextureCache {
    fragments: HashMap<TextureKey, Arc<RgbaImage>>,
    hits: usize,
}

impl TextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}

/// Turns blocks into 16×16 fragments through the asset tables.
pub struct TextureResolver {
    tables: AssetTables,
    source: Box<dyn TextureSource>,
    placeholder: Arc<RgbaImage>,
}

impl TextureResolver {
    pub fn new(tables: AssetTables, source: Box<dyn TextureSource>) -> Self {
        Self {
            tables,
            source,
            placeholder: Arc::new(image_ops::placeholder()),
        }
    }

    /// The fragment used for unresolvable blocks.
    pub fn placeholder(&self) -> &Arc<RgbaImage> {
        &self.placeholder
    }

    /// Fragment for `block` drawn at stack position `stack_index` of column
    /// (`x`, `z`), shaded for a floor at `shade_y`.
    pub fn resolve(
        &self,
        cache: &mut TextureCache,
        block: &Block,
        x: usize,
        stack_index: usize,
        z: usize,
        shade_y: i32,
    ) -> Arc<RgbaImage> {
        let key = TextureKey {
            name: block.name.clone(),
            value: block.value,
            shade_y,
        };
        if let Some(fragment) = cache.fragments.get(&key) {
            cache.hits += 1;
            return Arc::clone(fragment);
        }
        debug!(
            "Resolving {} value {} at {x},{z} layer {stack_index} (y {shade_y})",
            block.name, block.value
        );
        let fragment = self
            .build(block, shade_y)
            .map(Arc::new)
            .unwrap_or_else(|| Arc::clone(&self.placeholder));
        cache.fragments.insert(key, Arc::clone(&fragment));
        fragment
    }

    fn build(&self, block: &Block, shade_y: i32) -> Option<RgbaImage> {
        let Some(texture) = self.tables.face_texture(block.short_name()) else {
            warn!("No texture for {}", block.name);
            return None;
        };

        let path = match self.tables.patch_path(texture, block.value) {
            Some(path) => {
                debug!(
                    "Patching texture block: {}, value: {}, texture: {texture}, file: {path}",
                    block.name, block.value
                );
                path
            }
            None => match self.tables.atlas_path(texture, block.value) {
                Some(path) => path,
                None => {
                    warn!(
                        "Value not matching: {texture} ({} {})",
                        block.name, block.value
                    );
                    return None;
                }
            },
        };

        let Some(img) = self.source.load(path) else {
            warn!("Failed to load texture {path} for {} {}", block.name, block.value);
            return None;
        };

        let mut img = image_ops::normalize(img);
        if self.tables.is_monochrome(texture) {
            image_ops::multiply_tint(&mut img, DEFAULT_TINT);
        }
        if block.name != WATER {
            image_ops::shade(&mut img, shade_y);
        }
        Some(img)
    }
}
