use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write cached texture {path}: {source}")]
    CacheWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("offline mode: {url} is not in the texture cache")]
    Offline { url: String },
    #[error("failed to decode texture: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture has no pixels ({width}x{height})")]
    Empty { width: u32, height: u32 },
    #[error("failed to spawn texture loader thread: {0}")]
    Spawn(#[source] io::Error),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}
