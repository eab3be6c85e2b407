use serde::Deserialize;
use std::path::{Path, PathBuf};

use mcbe_map_render::{AssetPaths, RenderOptions};

#[derive(Debug, Deserialize)]
pub struct MapConfig {
    pub world: WorldSection,
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub assets: AssetsSection,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    /// World directory holding `db/` and optionally `levelname.txt`.
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
}

fn default_output_directory() -> PathBuf {
    "output".into()
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AssetsSection {
    #[serde(default = "default_resource_pack")]
    pub resource_pack: PathBuf,
    #[serde(default)]
    pub blocks_table: Option<PathBuf>,
    #[serde(default)]
    pub terrain_table: Option<PathBuf>,
    #[serde(default)]
    pub patch_table: Option<PathBuf>,
    #[serde(default)]
    pub monochrome_table: Option<PathBuf>,
    #[serde(default)]
    pub transparent_table: Option<PathBuf>,
}

fn default_resource_pack() -> PathBuf {
    "resourcepacktemplate".into()
}

impl Default for AssetsSection {
    fn default() -> Self {
        Self {
            resource_pack: default_resource_pack(),
            blocks_table: None,
            terrain_table: None,
            patch_table: None,
            monochrome_table: None,
            transparent_table: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RenderSection {
    /// Worker threads. 0 = one per core.
    #[serde(default)]
    pub workers: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub stop_on_error: bool,
    /// Only render this chunk, written as `"x,z"`.
    #[serde(default)]
    pub chunk: Option<String>,
}

fn default_batch_size() -> usize {
    64
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            workers: 0,
            batch_size: default_batch_size(),
            stop_on_error: false,
            chunk: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl MapConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.only_chunk()?;
        Ok(config)
    }

    /// The `[render] chunk` filter, if set.
    pub fn only_chunk(&self) -> Result<Option<(i32, i32)>, Box<dyn std::error::Error>> {
        self.render.chunk.as_deref().map(parse_chunk).transpose()
    }

    /// Table locations, explicit entries overriding the resource pack defaults.
    pub fn asset_paths(&self) -> AssetPaths {
        let mut paths = AssetPaths::in_pack(&self.assets.resource_pack);
        if let Some(p) = &self.assets.blocks_table {
            paths.blocks = p.clone();
        }
        if let Some(p) = &self.assets.terrain_table {
            paths.terrain = p.clone();
        }
        paths.patch = self.assets.patch_table.clone();
        paths.monochrome = self.assets.monochrome_table.clone();
        paths
    }

    pub fn render_options(&self) -> Result<RenderOptions, Box<dyn std::error::Error>> {
        Ok(RenderOptions {
            output_dir: self.output.directory.clone(),
            workers: self.render.workers,
            batch_size: self.render.batch_size,
            stop_on_error: self.render.stop_on_error,
            only_chunk: self.only_chunk()?,
        })
    }
}

/// Parse `"x,z"` chunk coordinates.
pub fn parse_chunk(s: &str) -> Result<(i32, i32), Box<dyn std::error::Error>> {
    let (x, z) = s
        .split_once(',')
        .ok_or_else(|| format!("chunk must be \"x,z\", got {s:?}"))?;
    Ok((x.trim().parse()?, z.trim().parse()?))
}
