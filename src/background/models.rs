//! Model catalog for the setup menu.
//!
//! The list lives as a markdown table in the project repository. It is cached
//! locally and refreshed by a detached worker once the cache is an hour old.

use super::cache;
use super::remote::Remote;
use crate::launcher::Spawn;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const MODELS_URL: &str = "https://raw.githubusercontent.com/varo6/tchat-cli/main/docs/models.md";
const REFRESH_INTERVAL_MS: u64 = 60 * 60 * 1000;
const WORKER_TIMEOUT: Duration = Duration::from_secs(10);
const FIRST_RUN_TIMEOUT: Duration = Duration::from_secs(5);
const MODELS_FILE: &str = "models.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsCache {
    pub models: Vec<Model>,
    pub last_fetch: u64,
    pub hash: String,
}

fn models_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join(MODELS_FILE)
}

/// Parse one ``| Name | `model-id` |`` table row.
fn parse_row(line: &str) -> Option<Model> {
    let inner = line.strip_prefix('|')?.strip_suffix('|')?;
    let (name, id_cell) = inner.rsplit_once('|')?;

    let id = id_cell.trim().strip_prefix('`')?.strip_suffix('`')?;
    if id.is_empty() || id.contains('`') {
        return None;
    }

    let name = name.trim();
    if name.is_empty() || name == ":---" {
        return None;
    }

    Some(Model {
        name: name.to_string(),
        id: id.to_string(),
    })
}

/// Extract every model row from a markdown document.
pub fn parse_models_markdown(content: &str) -> Vec<Model> {
    content.lines().filter_map(parse_row).collect()
}

/// Cheap fingerprint used to tell whether a fetched list changed.
pub fn quick_hash(models: &[Model]) -> String {
    match (models.first(), models.last()) {
        (Some(first), Some(last)) => format!("{}:{}:{}", models.len(), first.id, last.id),
        _ => "empty".to_string(),
    }
}

fn save_models(cache_dir: &Path, models: Vec<Model>, now: u64) -> Result<()> {
    let hash = quick_hash(&models);
    cache::write_json(
        &models_path(cache_dir),
        &ModelsCache {
            models,
            last_fetch: now,
            hash,
        },
    )
}

async fn fetch_models(remote: &dyn Remote, timeout: Duration) -> Result<Vec<Model>> {
    let content = remote.get_text(MODELS_URL, timeout).await?;
    let models = parse_models_markdown(&content);
    if models.is_empty() {
        return Err(anyhow!("No models in {}", MODELS_URL));
    }
    Ok(models)
}

/// Models for the menu: cached ones immediately, refreshing in the background
/// when stale. Without a cache the list is fetched inline once.
pub async fn load_models(
    remote: &dyn Remote,
    spawner: &dyn Spawn,
    cache_dir: &Path,
    now: u64,
) -> Vec<Model> {
    let cached: Option<ModelsCache> = cache::read_json(&models_path(cache_dir));

    let stale = cached
        .as_ref()
        .map_or(true, |c| cache::is_stale(c.last_fetch, now, REFRESH_INTERVAL_MS));
    if stale {
        if let Err(e) = super::spawn_worker(spawner, super::FETCH_MODELS_FLAG).await {
            debug!("{:#}", e);
        }
    }

    if let Some(cached) = cached {
        if !cached.models.is_empty() {
            return cached.models;
        }
    }

    match fetch_models(remote, FIRST_RUN_TIMEOUT).await {
        Ok(models) => {
            if let Err(e) = save_models(cache_dir, models.clone(), now) {
                debug!("{:#}", e);
            }
            models
        }
        Err(e) => {
            debug!("Model list unavailable: {:#}", e);
            Vec::new()
        }
    }
}

/// Worker body: refresh the cache. An unchanged list only bumps the timestamp.
pub async fn refresh_cache(remote: &dyn Remote, cache_dir: &Path, now: u64) -> Result<()> {
    let models = fetch_models(remote, WORKER_TIMEOUT).await?;
    let path = models_path(cache_dir);

    match cache::read_json::<ModelsCache>(&path) {
        Some(mut cached) if cached.hash == quick_hash(&models) => {
            cached.last_fetch = now;
            cache::write_json(&path, &cached)
        }
        _ => save_models(cache_dir, models, now),
    }
}
