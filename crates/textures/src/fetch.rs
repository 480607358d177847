use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Url;
use tracing::debug;

use crate::error::TextureError;
use crate::source::TextureSource;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Resolves texture sources to encoded bytes.
///
/// Remote images are downloaded once and kept under `cache_dir`; later
/// requests for the same URL are served from disk without a request.
#[derive(Debug, Clone)]
pub struct TextureFetcher {
    http: Option<Client>,
    cache_dir: PathBuf,
}

impl TextureFetcher {
    pub fn new(cache_dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self, TextureError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(TextureError::Client)?;
        Ok(Self {
            http: Some(http),
            cache_dir: cache_dir.into(),
        })
    }

    /// A fetcher that only reads local files and the cache.
    pub fn offline(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            http: None,
            cache_dir: cache_dir.into(),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.http.is_none()
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn fetch(&self, source: &TextureSource) -> Result<Vec<u8>, TextureError> {
        match source {
            TextureSource::Local(path) => read_file(path),
            TextureSource::Remote(url) => self.fetch_remote(url),
        }
    }

    /// Location of the cached copy of `url`.
    ///
    /// The file name carries a digest of the whole URL, so images that share
    /// a name under different paths or queries never alias.
    pub fn cache_path(&self, url: &Url) -> PathBuf {
        let host = url.host_str().and_then(sanitize_label).unwrap_or_else(|| "local".to_string());
        let name = format!("{:016x}-{}", url_digest(url), derive_filename(url, "texture"));
        self.cache_dir.join(host).join(name)
    }

    fn fetch_remote(&self, url: &Url) -> Result<Vec<u8>, TextureError> {
        let cached = self.cache_path(url);
        if cached.is_file() {
            debug!(%url, path = %cached.display(), "serving texture from cache");
            return read_file(&cached);
        }
        let Some(http) = &self.http else {
            return Err(TextureError::Offline {
                url: url.to_string(),
            });
        };

        debug!(%url, path = %cached.display(), "downloading texture");
        let http_error = |source| TextureError::Http {
            url: url.to_string(),
            source,
        };
        let bytes = http
            .get(url.clone())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(http_error)?;

        store(&cached, &bytes)?;
        Ok(bytes.to_vec())
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, TextureError> {
    fs::read(path).map_err(|source| TextureError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn store(path: &Path, bytes: &[u8]) -> Result<(), TextureError> {
    let write_error = |source| TextureError::CacheWrite {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    // Write beside the target and rename so a concurrent reader never sees a
    // partial file.
    let partial = path.with_extension("part");
    fs::write(&partial, bytes).map_err(write_error)?;
    fs::rename(&partial, path).map_err(write_error)
}

/// 64-bit FNV-1a over the serialized URL. Stable across builds, unlike
/// `DefaultHasher`, so cache entries survive upgrades.
fn url_digest(url: &Url) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    url.as_str().bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

/// Readable tail of the cache file name, ignoring the query string.
fn derive_filename(url: &Url, fallback: &str) -> String {
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let mut parts = name.rsplitn(2, '.');
    let (ext, stem) = match (parts.next(), parts.next()) {
        (Some(ext), Some(stem)) => (sanitize_label(ext), sanitize_label(stem)),
        (Some(stem), None) => (None, sanitize_label(stem)),
        _ => (None, None),
    };
    let stem = stem.unwrap_or_else(|| fallback.to_string());
    match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn sanitize_label(input: &str) -> Option<String> {
    let mut result = String::new();
    let mut prev_underscore = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            result.push(ch.to_ascii_lowercase());
            prev_underscore = false;
        } else if !result.is_empty() && !prev_underscore {
            result.push('_');
            prev_underscore = true;
        }
    }
    while result.ends_with('_') {
        result.pop();
    }
    (!result.is_empty()).then_some(result)
}
