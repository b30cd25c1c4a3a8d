//! Interactive `--setup` flow.
//!
//! Picks the default provider, optionally a t3.chat model and the Omarchy
//! opener, then merges the choice into the config file.

pub mod menu;
pub mod tui;

use crate::background::{models, remote::Remote};
use crate::config;
use crate::launcher::Spawn;
use anyhow::Result;
use menu::{
    CurrentChoice, ModelMode, ModelModeMenu, ModelSearch, ModelUpdate, ProviderMenu, Selection,
    PROVIDERS,
};
use std::path::Path;
use tracing::info;
use tui::TerminalSession;

/// How the setup flow ended.
#[derive(Debug)]
pub enum SetupOutcome {
    Saved(Selection),
    Cancelled,
    NoModels,
}

/// Where the setup flow reads its model catalog from.
pub struct Catalog<'a> {
    pub remote: &'a dyn Remote,
    pub spawner: &'a dyn Spawn,
    pub cache_dir: &'a Path,
    pub now: u64,
}

/// Run the menus and save the result to `config_path`.
pub async fn run(config_path: &Path, catalog: Catalog<'_>) -> Result<SetupOutcome> {
    let mut doc = config::load_document(config_path);
    let current = CurrentChoice::from_document(&doc);

    let mut session = TerminalSession::start()?;

    let Some(choice) = session.run(&mut ProviderMenu::new(current))? else {
        return Ok(SetupOutcome::Cancelled);
    };

    let model = if PROVIDERS[choice.provider].offers_models() {
        match session.run(&mut ModelModeMenu::default())? {
            None => return Ok(SetupOutcome::Cancelled),
            Some(ModelMode::LastUsed) => ModelUpdate::Clear,
            Some(ModelMode::Pick) => {
                let models = models::load_models(
                    catalog.remote,
                    catalog.spawner,
                    catalog.cache_dir,
                    catalog.now,
                )
                .await;
                if models.is_empty() {
                    return Ok(SetupOutcome::NoModels);
                }
                match session.run(&mut ModelSearch::new(models))? {
                    Some(id) => ModelUpdate::Set(id),
                    None => return Ok(SetupOutcome::Cancelled),
                }
            }
        }
    } else {
        ModelUpdate::Keep
    };
    drop(session);

    let selection = Selection {
        provider: choice.provider,
        omarchy: choice.omarchy,
        model,
    };
    selection.apply(&mut doc);
    config::save_document(config_path, &doc)?;
    info!("Saved setup to {}", config_path.display());

    Ok(SetupOutcome::Saved(selection))
}
