//! Block descriptors, palettes, and the transparency table.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use mcbe_map_nbt::{NbtCompound, NbtTag, TagStream};
use tracing::warn;

use crate::error::DecodeError;

/// Air. Never stored in a column.
pub const AIR: &str = "minecraft:air";

/// Water is drawn unshaded.
pub const WATER: &str = "minecraft:water";

/// One palette entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    /// Legacy data value (`val`), 0 when the entry has none.
    pub value: i32,
    /// Block state compound, empty when absent.
    pub states: NbtCompound,
}

impl Block {
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
            states: NbtCompound::new(),
        }
    }

    /// Build a block from a decoded palette tag stream. `entry` is the
    /// palette position, used for error reporting.
    pub fn from_palette_entry(stream: &TagStream, entry: usize) -> Result<Self, DecodeError> {
        let root = stream
            .root()
            .ok_or(DecodeError::MissingBlockName { entry })?;
        let name = root
            .get("name")
            .and_then(NbtTag::as_string)
            .ok_or(DecodeError::MissingBlockName { entry })?;
        let value = root.get("val").and_then(NbtTag::as_integer).unwrap_or(0);
        let states = root
            .get("states")
            .and_then(NbtTag::as_compound)
            .cloned()
            .unwrap_or_default();
        Ok(Self {
            name: name.to_string(),
            value,
            states,
        })
    }

    pub fn is_air(&self) -> bool {
        self.name == AIR
    }

    /// Name without the `minecraft:` namespace.
    pub fn short_name(&self) -> &str {
        self.name
            .strip_prefix("minecraft:")
            .unwrap_or(&self.name)
    }
}

/// Fixed-size table of blocks for one storage layer.
#[derive(Debug, Clone)]
pub struct Palette {
    entries: Vec<Arc<Block>>,
}

impl Palette {
    pub fn new(entries: Vec<Arc<Block>>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a packed index. Out of range is an error, never a default.
    pub fn get(&self, index: u32) -> Result<&Arc<Block>, DecodeError> {
        self.entries
            .get(index as usize)
            .ok_or(DecodeError::PaletteIndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }
}

// ─── Transparency table ─────────────────────────────────────────────────────

const DEFAULT_TRANSPARENT: &[&str] = &[
    "minecraft:glass",
    "minecraft:glass_pane",
    "minecraft:stained_glass",
    "minecraft:stained_glass_pane",
    "minecraft:water",
    "minecraft:flowing_water",
    "minecraft:ice",
    "minecraft:leaves",
    "minecraft:leaves2",
    "minecraft:azalea_leaves",
    "minecraft:azalea_leaves_flowered",
    "minecraft:tallgrass",
    "minecraft:double_plant",
    "minecraft:yellow_flower",
    "minecraft:red_flower",
    "minecraft:deadbush",
    "minecraft:sapling",
    "minecraft:reeds",
    "minecraft:vine",
    "minecraft:waterlily",
    "minecraft:snow_layer",
    "minecraft:torch",
    "minecraft:web",
    "minecraft:carpet",
    "minecraft:seagrass",
    "minecraft:kelp",
    "minecraft:brown_mushroom",
    "minecraft:red_mushroom",
    "minecraft:wheat",
    "minecraft:carrots",
    "minecraft:potatoes",
    "minecraft:beetroot",
];

/// Block names that stack on top of the opaque floor instead of replacing it.
#[derive(Debug, Clone, Default)]
pub struct TransparentBlocks {
    names: HashSet<String>,
}

impl TransparentBlocks {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        Self::new(DEFAULT_TRANSPARENT.iter().copied())
    }

    /// Parse a table given either as `{"minecraft:glass": true, ...}` (keys
    /// with a truthy value are transparent) or as `["minecraft:glass", ...]`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let names: Vec<String> = match value {
            serde_json::Value::Object(map) => map
                .into_iter()
                .filter(|(_, v)| is_truthy(v))
                .map(|(k, _)| k)
                .collect(),
            serde_json::Value::Array(items) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        };
        Ok(Self::new(names))
    }

    /// Load a table file, falling back to the built-in list if it cannot be
    /// read or parsed.
    pub fn load_or_builtin(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read transparency table {}: {e}", path.display());
                return Self::builtin();
            }
        };
        match Self::from_json(&text) {
            Ok(table) => table,
            Err(e) => {
                warn!("Failed to parse transparency table {}: {e}", path.display());
                Self::builtin()
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_transparent(&self, block: &Block) -> bool {
        self.contains(&block.name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn is_truthy(v: &serde_json::Value) -> bool {
    match v {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        _ => true,
    }
}
