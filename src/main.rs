//! tchat - open a chat provider with a prompt from the command line.
//!
//! Joins query words, fenced file contents and piped stdin into one prompt,
//! puts it in the provider URL and opens it in the browser (or prints it).

mod background;
mod config;
mod content;
mod error;
mod launcher;
mod query_url;
mod resolve;
mod setup;

use background::{cache, models, remote::HttpRemote, update};
use clap::builder::NonEmptyStringValueParser;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use config::Settings;
use error::Error;
use launcher::{SystemSpawner, LAUNCH_GRACE};
use resolve::{OpenMode, StdinMode};
use setup::{Catalog, SetupOutcome};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const ENV_LOG: &str = "TCHAT_LOG";
const ENV_NO_UPDATE_CHECK: &str = "TCHAT_NO_UPDATE_CHECK";

const AFTER_HELP: &str = "\
Examples:
  tchat explain borrow checking
  git diff | tchat review this change
  tchat -f src/main.rs -- -why does this panic

Config file: ~/.config/tchat/config.json (env: TCHAT_CONFIG)
  {
    \"model\": \"model-id\",
    \"baseUrl\": \"https://t3.chat/new\",
    \"openCmd\": \"firefox\"
  }

Priority: CLI flags > env vars > config file > defaults

Notes:
  Use -- to pass a query that starts with '-'.
  With --stdin, end input with Ctrl+D.";

#[derive(Parser)]
#[command(name = "tchat")]
#[command(author, version, about = "Open a chat provider with a prompt from text, files and stdin")]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Query words
    #[arg(value_name = "QUERY")]
    query: Vec<String>,

    /// Model id (env: TCHAT_MODEL)
    #[arg(short = 'm', long, value_name = "MODEL", value_parser = NonEmptyStringValueParser::new())]
    model: Option<String>,

    /// Read content from file(s), can be used multiple times
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    files: Vec<PathBuf>,

    /// Base URL (env: TCHAT_BASE_URL)
    #[arg(long = "base", value_name = "URL", value_parser = NonEmptyStringValueParser::new())]
    base_url: Option<String>,

    /// Override opener command (env: TCHAT_OPEN_CMD)
    #[arg(long, value_name = "CMD", value_parser = NonEmptyStringValueParser::new())]
    open_cmd: Option<String>,

    /// Print the URL instead of opening
    #[arg(long)]
    print: bool,

    /// Read stdin even if it is a terminal
    #[arg(long, overrides_with = "no_stdin")]
    stdin: bool,

    /// Ignore stdin
    #[arg(long, overrides_with = "stdin")]
    no_stdin: bool,

    /// Choose the default provider, model and opener interactively
    #[arg(long)]
    setup: bool,

    #[arg(long, hide = true)]
    internal_check_update: bool,

    #[arg(long, hide = true)]
    internal_fetch_models: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            model: self.model.clone(),
            base_url: self.base_url.clone(),
            open_cmd: self.open_cmd.clone(),
        }
    }

    fn open_mode(&self) -> OpenMode {
        if self.print {
            OpenMode::Print
        } else {
            OpenMode::Open
        }
    }

    fn stdin_mode(&self) -> StdinMode {
        if self.no_stdin {
            StdinMode::Disabled
        } else if self.stdin {
            StdinMode::Force
        } else {
            StdinMode::Auto
        }
    }

    fn query_text(&self) -> String {
        self.query.join(" ").trim().to_string()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => return report(Error::Usage(e.render().to_string())),
    };

    if cli.internal_check_update {
        if let Err(e) = check_update_worker().await {
            debug!("Update check failed: {:#}", e);
        }
        return ExitCode::SUCCESS;
    }
    if cli.internal_fetch_models {
        if let Err(e) = fetch_models_worker().await {
            debug!("Model refresh failed: {:#}", e);
        }
        return ExitCode::SUCCESS;
    }

    update_notices().await;

    if cli.setup {
        return match handle_setup().await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    match handle_query(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(e),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("tchat=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Print an invocation error (plus help where it helps) and pick the exit code.
fn report(err: Error) -> ExitCode {
    eprintln!("{}", err.to_string().trim_end());
    if err.wants_usage() {
        eprintln!();
        eprintln!("{}", Cli::command().render_help());
    }
    ExitCode::FAILURE
}

/// Compose the prompt, build the URL and hand it off.
async fn handle_query(cli: &Cli) -> error::Result<()> {
    let file_settings = match config::config_path() {
        Ok(path) => Settings::load(&path),
        Err(e) => {
            debug!("{:#}", e);
            Settings::default()
        }
    };
    let resolved = resolve::resolve(
        &cli.settings(),
        &Settings::from_env(),
        &file_settings,
        cli.open_mode(),
        cli.stdin_mode(),
    )?;
    debug!("Resolved config: {:?}", resolved);

    let file_blocks = content::read_file_blocks(&cli.files)?;
    let piped = content::read_stdin(
        resolved.stdin_mode,
        content::stdin_is_interactive(),
        io::stdin().lock(),
    )?;
    let query = content::assemble(&cli.query_text(), &file_blocks, &piped)?;

    let url = query_url::build_url(&resolved.base_url, &resolved.model, &query)?;
    if let Some(warning) = query_url::length_warning(url.as_str()) {
        eprintln!("{}", warning);
    }

    let spawner = SystemSpawner::with_grace(LAUNCH_GRACE);
    launcher::launch(
        url.as_str(),
        resolved.open_mode,
        resolved.open_command.as_deref(),
        &spawner,
        &mut io::stdout().lock(),
    )
    .await?;
    Ok(())
}

/// Show the cached update banner and refresh the cache when stale.
async fn update_notices() {
    if std::env::var_os(ENV_NO_UPDATE_CHECK).is_some() {
        return;
    }
    let cache_dir = match cache::cache_dir() {
        Ok(dir) => dir,
        Err(e) => {
            debug!("{:#}", e);
            return;
        }
    };

    if let Some(banner) = update::banner(&cache_dir, update::CURRENT_VERSION) {
        eprintln!("{}", banner);
    }
    let spawner = SystemSpawner::immediate();
    if let Err(e) = update::trigger_if_stale(&cache_dir, cache::now_millis(), &spawner).await {
        debug!("{:#}", e);
    }
}

/// Handle `--setup`.
async fn handle_setup() -> anyhow::Result<()> {
    let config_path = config::config_path()?;
    let cache_dir = cache::cache_dir()?;
    let remote = HttpRemote::new()?;
    let spawner = SystemSpawner::immediate();

    let catalog = Catalog {
        remote: &remote,
        spawner: &spawner,
        cache_dir: &cache_dir,
        now: cache::now_millis(),
    };

    match setup::run(&config_path, catalog).await? {
        SetupOutcome::Saved(selection) => {
            println!("{}", selection.summary());
            println!("Saved to: {}", config_path.display());
        }
        SetupOutcome::Cancelled => println!("Cancelled."),
        SetupOutcome::NoModels => println!("No models found."),
    }
    Ok(())
}

/// Body of `--internal-check-update`.
async fn check_update_worker() -> anyhow::Result<()> {
    let cache_dir = cache::cache_dir()?;
    let remote = HttpRemote::new()?;
    update::perform_check(&remote, &cache_dir, cache::now_millis()).await
}

/// Body of `--internal-fetch-models`.
async fn fetch_models_worker() -> anyhow::Result<()> {
    let cache_dir = cache::cache_dir()?;
    let remote = HttpRemote::new()?;
    models::refresh_cache(&remote, &cache_dir, cache::now_millis()).await
}
