//! Cache directory and JSON file helpers shared by the background workers.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

pub const ENV_CACHE_DIR: &str = "TCHAT_CACHE_DIR";

/// Get the cache directory (`$XDG_CACHE_HOME/tchat` on Linux).
pub fn cache_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(ENV_CACHE_DIR) {
        return Ok(PathBuf::from(dir));
    }
    dirs::cache_dir()
        .map(|p| p.join("tchat"))
        .context("Could not determine cache directory")
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Whether a timestamp is older than `interval_ms` relative to `now`.
pub fn is_stale(last: u64, now: u64, interval_ms: u64) -> bool {
    now.saturating_sub(last) > interval_ms
}

/// Read a cache file. Missing or corrupt files read as `None`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Ignoring corrupt cache {}: {}", path.display(), e);
            None
        }
    }
}

/// Write a cache file, creating the cache directory if needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory: {}", parent.display()))?;
    }
    let contents = serde_json::to_string(value)?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write cache file: {}", path.display()))?;
    Ok(())
}
