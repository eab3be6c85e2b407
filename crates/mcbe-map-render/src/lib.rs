//! Top-down tile rendering of decoded chunks.
//!
//! Every chunk becomes one 256×256 PNG made of 16×16 block fragments,
//! shaded by the elevation of each column's floor.

pub mod assets;
pub mod error;
pub mod image_ops;
pub mod renderer;
pub mod texture;
pub mod tile;

pub use assets::{AssetPaths, AssetTables, MemoryTextures, ResourcePackDir, TextureSource};
pub use error::RenderError;
pub use renderer::{render_world, RenderOptions, RenderSummary};
pub use texture::{TextureCache, TextureResolver};
pub use tile::{compose_chunk, flatten, tile_path, write_tile, Fragment, TILE_SIZE};
