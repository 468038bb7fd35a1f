use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{DEFAULT_MODEL_NAME, DEFAULT_MODEL_URL};

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
    #[error("model file not found: {0}")]
    MissingFile(PathBuf),
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Where the detection weights come from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelSource {
    /// The bundled default model, downloaded on first use.
    #[default]
    Default,
    /// Weights downloaded from a URL and cached under its file name.
    Url(String),
    /// Weights already on disk.
    Path(PathBuf),
}

impl ModelSource {
    /// Parses a user override: `http(s)://` means a URL, anything else a path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            ModelSource::Url(value.to_string())
        } else {
            ModelSource::Path(PathBuf::from(value))
        }
    }

    /// Cache file name for downloadable sources.
    fn cache_name(&self) -> Option<String> {
        match self {
            ModelSource::Default => Some(DEFAULT_MODEL_NAME.to_string()),
            ModelSource::Url(url) => {
                let name = url
                    .split(['?', '#'])
                    .next()
                    .and_then(|u| u.rsplit('/').next())
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_MODEL_NAME);
                Some(name.to_string())
            }
            ModelSource::Path(_) => None,
        }
    }
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Resolve a model source to a local file, downloading into the cache if needed.
pub fn resolve(source: &ModelSource, progress: Option<ProgressFn>) -> Result<PathBuf, ModelResolveError> {
    match source {
        ModelSource::Path(path) => {
            if path.exists() {
                Ok(path.clone())
            } else {
                Err(ModelResolveError::MissingFile(path.clone()))
            }
        }
        ModelSource::Default | ModelSource::Url(_) => {
            let url = match source {
                ModelSource::Url(url) => url.as_str(),
                _ => DEFAULT_MODEL_URL,
            };
            let name = source.cache_name().unwrap_or_else(|| DEFAULT_MODEL_NAME.to_string());
            resolve_cached(&model_cache_dir()?, &name, url, progress)
        }
    }
}

/// Returns the cached copy of `name` in `cache_dir`, downloading it first if absent.
pub fn resolve_cached(
    cache_dir: &Path,
    name: &str,
    url: &str,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(name);
    if cached_path.exists() {
        log::debug!("Using cached model {}", cached_path.display());
        return Ok(cached_path);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    log::info!("Downloading model from {url}");
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Lookout/models/`
/// - Linux: `$XDG_CACHE_HOME/Lookout/models/` or `~/.cache/Lookout/models/`
/// - Windows: `%LOCALAPPDATA%/Lookout/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Lookout").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Lookout").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let temp_path = dest.with_extension("part");

    let result = download_inner(url, dest, &temp_path, progress);
    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn download_inner(
    url: &str,
    dest: &Path,
    temp_path: &Path,
    progress: Option<ProgressFn>,
) -> Result<(), ModelResolveError> {
    let write_err = |path: &Path, source: std::io::Error| ModelResolveError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(|e| ModelResolveError::Download {
            url: url.to_string(),
            source: e,
        })?;

    let total = response.content_length().unwrap_or(0);
    let mut downloaded: u64 = 0;
    let mut file = fs::File::create(temp_path).map_err(|e| write_err(temp_path, e))?;

    let mut buf = vec![0u8; 1024 * 1024];
    loop {
        let n = response
            .read(&mut buf)
            .map_err(|e| write_err(temp_path, e))?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])
            .map_err(|e| write_err(temp_path, e))?;
        downloaded += n as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }

    file.flush().map_err(|e| write_err(temp_path, e))?;
    drop(file);

    fs::rename(temp_path, dest).map_err(|e| write_err(dest, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("https://example.com/models/yolo.onnx", ModelSource::Url("https://example.com/models/yolo.onnx".into()))]
    #[case("http://host/m.onnx", ModelSource::Url("http://host/m.onnx".into()))]
    #[case("/opt/models/yolo.onnx", ModelSource::Path(PathBuf::from("/opt/models/yolo.onnx")))]
    #[case("yolo.onnx", ModelSource::Path(PathBuf::from("yolo.onnx")))]
    fn test_parse(#[case] input: &str, #[case] expected: ModelSource) {
        assert_eq!(ModelSource::parse(input), expected);
    }

    #[rstest]
    #[case(ModelSource::Default, Some("yolov8n.onnx"))]
    #[case(ModelSource::Url("https://h/a/b/custom.onnx?download=1".into()), Some("custom.onnx"))]
    #[case(ModelSource::Url("https://h/".into()), Some("yolov8n.onnx"))]
    #[case(ModelSource::Path(PathBuf::from("x.onnx")), None)]
    fn test_cache_name(#[case] source: ModelSource, #[case] expected: Option<&str>) {
        assert_eq!(source.cache_name().as_deref(), expected);
    }

    #[test]
    fn test_resolve_existing_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("local.onnx");
        fs::write(&path, b"weights").unwrap();

        let resolved = resolve(&ModelSource::Path(path.clone()), None).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_resolve_missing_path_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("absent.onnx");
        let result = resolve(&ModelSource::Path(path), None);
        assert!(matches!(result, Err(ModelResolveError::MissingFile(_))));
    }

    #[test]
    fn test_resolve_cached_skips_download() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("m.onnx"), b"cached").unwrap();

        let resolved =
            resolve_cached(tmp.path(), "m.onnx", "http://invalid.nonexistent.example.com/m", None)
                .unwrap();
        assert_eq!(fs::read(resolved).unwrap(), b"cached");
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Lookout"));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_atomic_no_partial_on_failure() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
