use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model file not found: {0}")]
    Missing(PathBuf),
    #[error("model {name} is not cached and no download URL is configured")]
    Unavailable { name: String },
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Where a model file may come from.
#[derive(Clone, Debug, Default)]
pub struct ModelSource {
    /// File name looked up in the cache and bundled directories.
    pub name: String,
    /// Path given explicitly by the user; wins over every other location.
    pub explicit_path: Option<PathBuf>,
    /// Optional URL used when the file is not available locally.
    pub url: Option<String>,
}

impl ModelSource {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Resolve a model file, checking local locations before downloading.
///
/// Resolution order:
/// 1. Explicit path (must exist)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory
/// 4. Download from the configured URL into the cache
pub fn resolve(
    source: &ModelSource,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = model_cache_dir()?;
    resolve_in(&cache_dir, source, bundled_dir, progress)
}

fn resolve_in(
    cache_dir: &Path,
    source: &ModelSource,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = &source.explicit_path {
        return if path.exists() {
            Ok(path.clone())
        } else {
            Err(ModelResolveError::Missing(path.clone()))
        };
    }

    let cached_path = cache_dir.join(&source.name);
    if cached_path.exists() {
        return Ok(cached_path);
    }

    if let Some(dir) = bundled_dir {
        let bundled_path = dir.join(&source.name);
        if bundled_path.exists() {
            return Ok(bundled_path);
        }
    }

    let url = source
        .url
        .as_deref()
        .ok_or_else(|| ModelResolveError::Unavailable {
            name: source.name.clone(),
        })?;
    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {url}", source.name);
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/SpinePose/models/`
/// - Linux: `$XDG_CACHE_HOME/SpinePose/models/` or `~/.cache/SpinePose/models/`
/// - Windows: `%LOCALAPPDATA%/SpinePose/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("SpinePose").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("SpinePose").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");
    let result = download_to(url, dest, &temp_path, progress);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn download_to(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };
    let write_err = |path: &Path, source| ModelResolveError::Write {
        path: path.to_path_buf(),
        source,
    };

    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(download_err)?;

    // Written to a temp file first, then renamed into place.
    let mut file = fs::File::create(temp_path).map_err(|e| write_err(temp_path, e))?;
    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(|e| write_err(temp_path, e))?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(|e| write_err(temp_path, e))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| write_err(dest, e))
}
