use std::path::PathBuf;

use mcbe_map_world::{DecodeError, StoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("chunk {x},{z}: {source}")]
    Chunk {
        x: i32,
        z: i32,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
