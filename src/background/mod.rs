//! Best-effort background work.
//!
//! The foreground invocation only reads cache files and, when they are stale,
//! re-executes this binary with a hidden worker flag. The worker refreshes the
//! cache and exits; nothing waits on it.

pub mod cache;
pub mod models;
pub mod remote;
pub mod update;

use crate::launcher::{CommandLine, Spawn};
use anyhow::{Context, Result};
use tracing::debug;

/// Hidden flag that runs the update check worker.
pub const CHECK_UPDATE_FLAG: &str = "--internal-check-update";
/// Hidden flag that runs the model list refresh worker.
pub const FETCH_MODELS_FLAG: &str = "--internal-fetch-models";

/// Re-run the current executable detached with a worker flag.
pub async fn spawn_worker(spawner: &dyn Spawn, flag: &str) -> Result<()> {
    let exe = std::env::current_exe().context("Failed to get current executable path")?;
    let command = CommandLine {
        program: exe.to_string_lossy().into_owned(),
        args: vec![flag.to_string()],
    };
    debug!("Starting background worker {}", flag);
    spawner
        .spawn_detached(&command)
        .await
        .with_context(|| format!("Failed to start background worker {}", flag))
}
