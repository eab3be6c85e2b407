//! Resource-pack lookup tables and texture file access.
//!
//! Tables are plain JSON and only ever read, so they are kept as
//! `serde_json::Value` and walked on demand:
//!
//! * `blocks.json`: `{"stone": {"textures": "stone"}, "grass": {"textures": {"up": "grass_carried", ...}}}`
//! * `terrain_texture.json`: `{"texture_data": {"stone": {"textures": ["textures/blocks/stone", ...]}}}`
//! * patch table: `{"still_water_grey": {"textures": ["textures/blocks/water_placeholder"]}}`
//! * monochrome table: `{"grass_carried": true}`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbaImage};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::image_ops;

/// Where each table lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPaths {
    pub blocks: PathBuf,
    pub terrain: PathBuf,
    pub patch: Option<PathBuf>,
    pub monochrome: Option<PathBuf>,
}

impl AssetPaths {
    /// Default table locations inside a resource pack.
    pub fn in_pack(pack: &Path) -> Self {
        Self {
            blocks: pack.join("blocks.json"),
            terrain: pack.join("textures").join("terrain_texture.json"),
            patch: None,
            monochrome: None,
        }
    }
}

/// The lookup tables a texture is resolved through.
#[derive(Debug, Clone, Default)]
pub struct AssetTables {
    blocks: Value,
    terrain: Value,
    patch: Value,
    monochrome: Value,
}

impl AssetTables {
    pub fn new(blocks: Value, terrain: Value, patch: Value, monochrome: Value) -> Self {
        Self {
            blocks,
            terrain,
            patch,
            monochrome,
        }
    }

    /// Load every table. A table that is missing or malformed is logged and
    /// treated as empty, so its lookups miss.
    pub fn load(paths: &AssetPaths) -> Self {
        let tables = Self {
            blocks: load_table(&paths.blocks),
            terrain: load_table(&paths.terrain),
            patch: paths.patch.as_deref().map(load_table).unwrap_or(Value::Null),
            monochrome: paths
                .monochrome
                .as_deref()
                .map(load_table)
                .unwrap_or(Value::Null),
        };
        let block_count = tables.blocks.as_object().map_or(0, |m| m.len());
        let texture_count = tables
            .terrain
            .get("texture_data")
            .and_then(Value::as_object)
            .map_or(0, |m| m.len());
        info!("Loaded asset tables ({block_count} blocks, {texture_count} textures)");
        tables
    }

    /// Texture name for a block, preferring its top face.
    pub fn face_texture(&self, short_name: &str) -> Option<&str> {
        let textures = self.blocks.get(short_name)?.get("textures")?;
        match textures {
            Value::String(s) => Some(s.as_str()),
            Value::Object(faces) => faces
                .get("up")
                .and_then(Value::as_str)
                .or_else(|| faces.get("side").and_then(Value::as_str))
                .or_else(|| faces.values().find_map(Value::as_str)),
            _ => None,
        }
    }

    /// Per-value override path from the patch table.
    pub fn patch_path(&self, texture: &str, value: i32) -> Option<&str> {
        let textures = self.patch.get(texture)?.get("textures")?;
        indexed(textures, value).and_then(path_of)
    }

    /// Path from the terrain atlas for a texture name and data value.
    pub fn atlas_path(&self, texture: &str, value: i32) -> Option<&str> {
        let textures = self
            .terrain
            .get("texture_data")?
            .get(texture)?
            .get("textures")?;
        match textures {
            Value::Array(_) => indexed(textures, value).and_then(path_of),
            other => path_of(other),
        }
    }

    pub fn is_monochrome(&self, texture: &str) -> bool {
        match self.monochrome.get(texture) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => false,
            Some(_) => true,
        }
    }
}

fn load_table(path: &Path) -> Value {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            warn!("Failed to read {}: {e}", path.display());
            return Value::Null;
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => {
            warn!("Failed to parse {}: {e}", path.display());
            Value::Null
        }
    }
}

/// Element `value` of an array, or key `"value"` of an object.
fn indexed(textures: &Value, value: i32) -> Option<&Value> {
    match textures {
        Value::Array(items) => usize::try_from(value).ok().and_then(|i| items.get(i)),
        Value::Object(map) => map.get(&value.to_string()),
        _ => None,
    }
}

/// A texture path given as `"path"` or `{"path": "path", ...}`.
fn path_of(entry: &Value) -> Option<&str> {
    match entry {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get("path").and_then(Value::as_str),
        _ => None,
    }
}

// ─── Texture files ──────────────────────────────────────────────────────────

/// Loads texture images by pack-relative path without extension.
pub trait TextureSource: Send + Sync {
    fn load(&self, path: &str) -> Option<RgbaImage>;
}

/// Textures read from a resource pack directory, `.png` first, then `.tga`.
#[derive(Debug, Clone)]
pub struct ResourcePackDir {
    root: PathBuf,
}

impl ResourcePackDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TextureSource for ResourcePackDir {
    fn load(&self, path: &str) -> Option<RgbaImage> {
        for (ext, format) in [("png", ImageFormat::Png), ("tga", ImageFormat::Tga)] {
            let file = self.root.join(format!("{path}.{ext}"));
            let Ok(bytes) = std::fs::read(&file) else {
                continue;
            };
            match image_ops::decode(&bytes, format) {
                Ok(img) => {
                    debug!("Loaded texture {}", file.display());
                    return Some(img);
                }
                Err(e) => warn!("Failed to decode {}: {e}", file.display()),
            }
        }
        None
    }
}

/// Textures held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryTextures {
    images: HashMap<String, RgbaImage>,
}

impl MemoryTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, img: RgbaImage) {
        self.images.insert(path.into(), img);
    }
}

impl TextureSource for MemoryTextures {
    fn load(&self, path: &str) -> Option<RgbaImage> {
        self.images.get(path).cloned()
    }
}
