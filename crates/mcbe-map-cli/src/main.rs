mod config;
mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use config::MapConfig;
use mcbe_map_render::{
    render_world, AssetTables, RenderOptions, ResourcePackDir, TextureResolver,
};
use mcbe_map_world::{LevelDbStore, TransparentBlocks, WorldIndex};
use tracing::{error, info};

const DEFAULT_CONFIG: &str = "mcbe-map.toml";

#[derive(Parser, Debug)]
#[command(name = "mcbe-map", version, about = "Render a Bedrock world into top-down map tiles")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Render the map tiles
    Render {
        /// Config file
        #[arg(default_value = DEFAULT_CONFIG)]
        config: PathBuf,
        /// Tile output directory, overrides `[output] directory`
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Only render this chunk, written as "x,z"; overrides `[render] chunk`
        #[arg(long, short, value_parser = chunk_arg, allow_hyphen_values = true)]
        chunk: Option<(i32, i32)>,
    },
    /// List the chunks that carry a height map
    Chunks {
        /// Config file
        #[arg(default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

impl Command {
    fn config_path(&self) -> &Path {
        match self {
            Command::Render { config, .. } | Command::Chunks { config } => config,
        }
    }
}

fn chunk_arg(s: &str) -> Result<(i32, i32), String> {
    config::parse_chunk(s).map_err(|e| e.to_string())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            e.print().ok();
            return ExitCode::from(code);
        }
    };
    let config_path = cli.command.config_path();

    let config = match MapConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", config_path.display());
            return ExitCode::from(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        "mcbe-map v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config_path.display()
    );

    let result = match &cli.command {
        Command::Render { output, chunk, .. } => {
            render_options(&config, output.as_deref(), *chunk)
                .and_then(|opts| render(&config, &opts))
        }
        Command::Chunks { .. } => chunks(&config),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::from(1)
        }
    }
}

/// Config render options with the command-line overrides applied.
fn render_options(
    config: &MapConfig,
    output: Option<&Path>,
    chunk: Option<(i32, i32)>,
) -> Result<RenderOptions, Box<dyn std::error::Error>> {
    let mut opts = config.render_options()?;
    if let Some(dir) = output {
        opts.output_dir = dir.to_path_buf();
    }
    if chunk.is_some() {
        opts.only_chunk = chunk;
    }
    Ok(opts)
}

fn level_name(world: &Path) -> Option<String> {
    let name = std::fs::read_to_string(world.join("levelname.txt")).ok()?;
    Some(name.trim().to_string())
}

fn render(
    config: &MapConfig,
    opts: &RenderOptions,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match level_name(&config.world.path) {
        Some(name) => info!("World: {name} ({})", config.world.path.display()),
        None => info!("World: {}", config.world.path.display()),
    }

    let mut store = LevelDbStore::open(&config.world.path)?;
    let index = WorldIndex::build(&mut store)?;

    let tables = AssetTables::load(&config.asset_paths());
    let textures = ResourcePackDir::new(config.assets.resource_pack.clone());
    let resolver = TextureResolver::new(tables, Box::new(textures));
    let transparent = match &config.assets.transparent_table {
        Some(path) => TransparentBlocks::load_or_builtin(path),
        None => TransparentBlocks::builtin(),
    };
    info!("{} transparent block names", transparent.len());

    let summary = render_world(&mut store, &index, &resolver, &transparent, opts)?;
    if summary.has_failures() {
        error!(
            "{} chunks failed{}",
            summary.failed.len(),
            if summary.stopped_early {
                ", stopped early"
            } else {
                ""
            }
        );
        return Ok(ExitCode::from(2));
    }
    info!("Tiles written to {}", opts.output_dir.display());
    Ok(ExitCode::SUCCESS)
}

fn chunks(config: &MapConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut store = LevelDbStore::open(&config.world.path)?;
    let index = WorldIndex::build(&mut store)?;
    report::chunk_report(&mut store, &index)?;
    Ok(ExitCode::SUCCESS)
}
