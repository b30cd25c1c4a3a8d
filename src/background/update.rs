//! Self-update notice.
//!
//! The latest published version is looked up on crates.io by a detached
//! worker at most every 12 hours; the foreground only reads the cached answer.

use super::cache;
use super::remote::Remote;
use crate::launcher::Spawn;
use anyhow::{anyhow, Context, Result};
use crossterm::style::Stylize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const REGISTRY_URL: &str = "https://crates.io/api/v1/crates/tchat";
const CHECK_INTERVAL_MS: u64 = 12 * 60 * 60 * 1000;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const UPDATE_FILE: &str = "update.json";

/// Result of the last successful registry lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInfo {
    pub last_check: u64,
    pub latest_version: String,
}

#[derive(Deserialize)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
}

#[derive(Deserialize)]
struct CrateInfo {
    max_stable_version: Option<String>,
    max_version: Option<String>,
}

fn update_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(UPDATE_FILE)
}

/// Major, minor and patch. Each component contributes its leading digits;
/// missing or non-numeric components count as zero.
fn version_parts(version: &str) -> [u64; 3] {
    let mut parts = [0u64; 3];
    for (slot, component) in parts.iter_mut().zip(version.trim().split('.')) {
        let digits: String = component.chars().take_while(char::is_ascii_digit).collect();
        *slot = digits.parse().unwrap_or(0);
    }
    parts
}

/// Whether version `a` is strictly newer than `b`.
pub fn is_newer(a: &str, b: &str) -> bool {
    version_parts(a) > version_parts(b)
}

/// Banner to show when the cache knows of a newer release.
pub fn banner(cache_dir: &Path, current: &str) -> Option<String> {
    let info: UpdateInfo = cache::read_json(&update_path(cache_dir))?;
    if !is_newer(&info.latest_version, current) {
        return None;
    }
    Some(format!(
        "{}\nRun {} to update.\n",
        format!("Update available: {} -> {}", current, info.latest_version).yellow(),
        "cargo install tchat".cyan()
    ))
}

/// Start the update worker unless the last check is recent.
/// Returns whether a worker was started.
pub async fn trigger_if_stale(cache_dir: &Path, now: u64, spawner: &dyn Spawn) -> Result<bool> {
    let last_check = cache::read_json::<UpdateInfo>(&update_path(cache_dir))
        .map(|info| info.last_check)
        .unwrap_or(0);
    if !cache::is_stale(last_check, now, CHECK_INTERVAL_MS) {
        return Ok(false);
    }
    super::spawn_worker(spawner, super::CHECK_UPDATE_FLAG).await?;
    Ok(true)
}

/// Worker body: look up the latest version and cache it.
/// Nothing is written when the lookup fails.
pub async fn perform_check(remote: &dyn Remote, cache_dir: &Path, now: u64) -> Result<()> {
    let body = remote.get_text(REGISTRY_URL, REQUEST_TIMEOUT).await?;
    let response: CrateResponse =
        serde_json::from_str(&body).context("Failed to parse registry response")?;
    let latest_version = response
        .krate
        .max_stable_version
        .or(response.krate.max_version)
        .ok_or_else(|| anyhow!("Registry response has no version"))?;

    debug!("Latest published version: {}", latest_version);
    cache::write_json(
        &update_path(cache_dir),
        &UpdateInfo {
            last_check: now,
            latest_version,
        },
    )
}
