//! # Disk Cache Policy

use anyhow::Context;
use burn::config::Config;
use burn::data::network::downloader;
use std::fs::{File, remove_file, rename};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Disk cache policy.
///
/// Resources live under ``~/.cache/{root_cache_key}/...``.
#[derive(Config, Debug)]
pub struct DiskCacheConfig {
    /// Key for the root cache directory.
    #[config(default = "\"imfold\".to_string()")]
    pub root_cache_key: String,

    /// Override for the cache parent directory; defaults to ``~/.cache``.
    #[config(default = "None")]
    pub cache_home: Option<PathBuf>,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl DiskCacheConfig {
    /// Fetch the base cache directory.
    ///
    /// If the cache directory does not exist, does not create it.
    pub fn base_cache_dir(&self) -> anyhow::Result<PathBuf> {
        let home = match &self.cache_home {
            Some(home) => home.clone(),
            None => dirs::home_dir()
                .context("Should be able to get home directory")?
                .join(".cache"),
        };
        Ok(home.join(&self.root_cache_key))
    }

    /// Map a resource key to a cache path.
    ///
    /// Does not ensure that the path (or any of the parents) exist.
    pub fn resource_to_path(
        &self,
        resource_key: &[String],
    ) -> anyhow::Result<PathBuf> {
        let path = self.base_cache_dir()?;
        Ok(resource_key.iter().fold(path, |acc, s| acc.join(s)))
    }

    /// Map a resource key to a cache path and ensure the parent directory exists.
    pub fn ensure_resource_parent_dir(
        &self,
        resource_key: &[String],
    ) -> anyhow::Result<PathBuf> {
        let path = self.resource_to_path(resource_key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Fetch a Resource to the Cache.
    pub fn fetch_resource(
        &self,
        url: &str,
        resource: &[String],
    ) -> anyhow::Result<PathBuf> {
        let cache_file_path = self.ensure_resource_parent_dir(resource)?;
        try_cache_download_to_path(url, cache_file_path)
    }
}

/// The ``<name>.part`` sibling a cache file is written through.
pub fn partial_path(path: &Path) -> anyhow::Result<PathBuf> {
    let mut name = path
        .file_name()
        .with_context(|| format!("cache path has no file name: {}", path.display()))?
        .to_os_string();
    name.push(".part");
    Ok(path.with_file_name(name))
}

/// Fill `path` through `write`, atomically.
///
/// The data goes to [`partial_path`] first and is renamed into place once
/// `write` succeeds; on any failure the partial file is removed and `path`
/// is left untouched.
pub fn write_via_partial<F>(
    path: &Path,
    write: F,
) -> anyhow::Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let partial = partial_path(path)?;

    let result = File::create(&partial)
        .and_then(|mut file| {
            write(&mut file)?;
            file.sync_all()
        })
        .and_then(|()| rename(&partial, path));

    if let Err(err) = result {
        if partial.exists() {
            if let Err(remove_err) = remove_file(&partial) {
                tracing::warn!(path = %partial.display(), error = %remove_err, "failed to remove partial file");
            }
        }
        return Err(err).with_context(|| format!("Failed to write the whole file: {}", path.display()));
    }
    Ok(())
}

/// Write `bytes` to `path`; a failed write leaves no file behind.
pub fn write_all_or_remove(
    path: &Path,
    bytes: &[u8],
) -> anyhow::Result<()> {
    write_via_partial(path, |file| file.write_all(bytes))
}

/// Download a URL resource to a given path.
///
/// If the path already exists, does nothing.
///
/// # Returns
///
/// The cache path.
pub fn try_cache_download_to_path(
    url: &str,
    cache_file_path: PathBuf,
) -> anyhow::Result<PathBuf> {
    if cache_file_path.exists() {
        tracing::debug!(path = %cache_file_path.display(), "cache hit");
        return Ok(cache_file_path);
    }

    let file_name = cache_file_path
        .file_name()
        .with_context(|| format!("cache path has no file name: {}", cache_file_path.display()))?
        .to_string_lossy()
        .to_string();

    tracing::info!(%url, path = %cache_file_path.display(), "downloading");

    // TODO: download-to-file instead of download-to-memory.
    let bytes = downloader::download_file_as_bytes(url, &file_name);
    write_all_or_remove(&cache_file_path, &bytes)?;

    Ok(cache_file_path)
}
