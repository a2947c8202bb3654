use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::APP_DIR_NAME;

#[derive(Error, Debug)]
pub enum ModelResolveError {
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
    #[error("model file {0} does not exist")]
    MissingOverride(PathBuf),
    #[error("model {0} is not cached and has no download location")]
    Unavailable(String),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Where a model file may come from.
#[derive(Clone, Debug)]
pub struct ModelSource<'a> {
    pub name: &'a str,
    /// Download location; `None` for models the user must supply.
    pub url: Option<&'a str>,
    /// Explicit path that bypasses every lookup.
    pub override_path: Option<&'a Path>,
}

/// Resolve a model file, checking cache locations before downloading.
///
/// Resolution order:
/// 1. Explicit override path (must exist)
/// 2. User cache directory (platform-specific)
/// 3. Bundled directory (development / pre-packaged installs)
/// 4. Download from URL into the cache
pub fn resolve(
    source: &ModelSource<'_>,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(path) = source.override_path {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(ModelResolveError::MissingOverride(path.to_path_buf()))
        };
    }

    let cache_dir = model_cache_dir()?;
    let cached_path = cache_dir.join(source.name);
    if cached_path.exists() {
        log::debug!("Model {} found in cache", source.name);
        return Ok(cached_path);
    }

    if let Some(path) = bundled_dir.map(|dir| dir.join(source.name)) {
        if path.exists() {
            log::debug!("Model {} found at {}", source.name, path.display());
            return Ok(path);
        }
    }

    let url = source
        .url
        .ok_or_else(|| ModelResolveError::Unavailable(source.name.to_string()))?;
    fs::create_dir_all(&cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading {} from {url}", source.name);
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/OptOut/models/`
/// - Linux: `$XDG_CACHE_HOME/OptOut/models/` or `~/.cache/OptOut/models/`
/// - Windows: `%LOCALAPPDATA%/OptOut/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    let root = dirs::data_dir();
    #[cfg(not(target_os = "macos"))]
    let root = dirs::cache_dir();

    root.map(|d| d.join(APP_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let download_err = |source| ModelResolveError::Download {
        url: url.to_string(),
        source,
    };
    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(download_err)?;
    let total = response.content_length().unwrap_or(0);

    // Stream into a sibling file, then rename so a failed download never
    // leaves a truncated model behind.
    let temp_path = dest.with_extension("part");
    let write_err = |path: &Path, source| ModelResolveError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = fs::File::create(&temp_path).map_err(|e| write_err(&temp_path, e))?;

    let mut buf = vec![0u8; 1024 * 1024];
    let mut downloaded: u64 = 0;
    loop {
        let n = match response.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = fs::remove_file(&temp_path);
                return Err(write_err(&temp_path, e));
            }
        };
        file.write_all(&buf[..n])
            .map_err(|e| write_err(&temp_path, e))?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| write_err(&temp_path, e))?;
    drop(file);
    fs::rename(&temp_path, dest).map_err(|e| write_err(dest, e))?;
    Ok(())
}
