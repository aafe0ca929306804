use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::errors::ModelLoadError;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("model weights not found at {0}")]
    NotFound(PathBuf),
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

impl From<ModelResolveError> for ModelLoadError {
    fn from(err: ModelResolveError) -> Self {
        match err {
            ModelResolveError::NotFound(path) => ModelLoadError::MissingWeights(path),
            other => ModelLoadError::Resolve(other.to_string()),
        }
    }
}

/// Locate the model weights, downloading them if needed.
///
/// Resolution order:
/// 1. The configured path
/// 2. A previously downloaded copy in the user cache directory
/// 3. Download from `url` to the cache (only when a URL is configured)
pub fn resolve_weights(path: &Path, url: Option<&str>) -> Result<PathBuf, ModelResolveError> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    match url {
        Some(url) => resolve_in_cache(path, url, &model_cache_dir()?),
        None => Err(ModelResolveError::NotFound(path.to_path_buf())),
    }
}

fn resolve_in_cache(
    path: &Path,
    url: &str,
    cache_dir: &Path,
) -> Result<PathBuf, ModelResolveError> {
    let name = path
        .file_name()
        .ok_or_else(|| ModelResolveError::NotFound(path.to_path_buf()))?;
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        log::info!("Using cached model weights at {}", cached_path.display());
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!(
        "Model weights missing at {}, downloading from {url}",
        path.display()
    );
    download(url, &cached_path)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Liveness/models/`
/// - Linux: `$XDG_CACHE_HOME/Liveness/models/` or `~/.cache/Liveness/models/`
/// - Windows: `%LOCALAPPDATA%/Liveness/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Liveness").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Liveness").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path) -> Result<(), ModelResolveError> {
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let bytes = response.bytes().map_err(|e| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    })?;
    log::debug!("Downloaded {} bytes", bytes.len());

    // Written beside the destination, then renamed into place.
    let temp_path = dest.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;
    file.write_all(&bytes)
        .and_then(|_| file.sync_all())
        .map_err(write_err(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(write_err(dest))?;
    log::info!("Model weights saved to {}", dest.display());
    Ok(())
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> ModelResolveError {
    let path = path.to_path_buf();
    move |source| ModelResolveError::Write { path, source }
}
