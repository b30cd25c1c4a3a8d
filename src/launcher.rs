//! Hands the finished URL to the user: printed, or opened in a browser.
//!
//! All process creation goes through the [`Spawn`] trait so the launch path
//! and the background workers can be exercised without starting real
//! processes.

use crate::error::{Error, Result};
use crate::resolve::OpenMode;
use async_trait::async_trait;
use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;

/// How long an opener gets to fail before it is considered launched.
pub const LAUNCH_GRACE: Duration = Duration::from_millis(100);

/// A program plus arguments, as handed to a [`Spawn`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

/// Platforms with a distinct default opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Other
        }
    }
}

impl CommandLine {
    /// The command that opens `url`: the user's override split on whitespace
    /// with the URL appended, or the platform default.
    pub fn for_url(url: &str, override_cmd: Option<&str>, platform: Platform) -> Self {
        if let Some(cmd) = override_cmd {
            let mut words = cmd.split_whitespace().map(str::to_string);
            if let Some(program) = words.next() {
                let mut args: Vec<String> = words.collect();
                args.push(url.to_string());
                return Self { program, args };
            }
        }

        match platform {
            Platform::MacOs => Self {
                program: "open".to_string(),
                args: vec![url.to_string()],
            },
            // `start` treats the first quoted argument as a window title
            Platform::Windows => Self {
                program: "cmd".to_string(),
                args: vec![
                    "/c".to_string(),
                    "start".to_string(),
                    String::new(),
                    url.to_string(),
                ],
            },
            Platform::Other => Self {
                program: "xdg-open".to_string(),
                args: vec![url.to_string()],
            },
        }
    }
}

/// Starts processes that outlive this one.
#[async_trait]
pub trait Spawn: Send + Sync {
    /// Start `command` detached with all stdio discarded.
    async fn spawn_detached(&self, command: &CommandLine) -> std::io::Result<()>;
}

/// Spawner backed by real OS processes.
pub struct SystemSpawner {
    grace: Option<Duration>,
}

impl SystemSpawner {
    /// Spawner that waits `grace` and reports a child that already failed.
    pub fn with_grace(grace: Duration) -> Self {
        Self { grace: Some(grace) }
    }

    /// Fire-and-forget spawner for background workers.
    pub fn immediate() -> Self {
        Self { grace: None }
    }
}

#[async_trait]
impl Spawn for SystemSpawner {
    async fn spawn_detached(&self, command: &CommandLine) -> std::io::Result<()> {
        let mut process = Command::new(&command.program);
        process
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        detach(&mut process);

        debug!("Spawning {} {:?}", command.program, command.args);
        let mut child = process.spawn()?;

        if let Some(grace) = self.grace {
            tokio::time::sleep(grace).await;
            if let Some(status) = child.try_wait()? {
                if !status.success() {
                    return Err(std::io::Error::other(format!(
                        "{} exited with {}",
                        command.program, status
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Put the child in its own session so it survives our exit and terminal hangups.
#[cfg(unix)]
fn detach(process: &mut Command) {
    use std::os::unix::process::CommandExt;

    // SAFETY: setsid is async-signal-safe and touches no parent state.
    unsafe {
        process.pre_exec(|| {
            if libc::setsid() == -1 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
fn detach(_process: &mut Command) {}

/// Print the URL or open it, depending on `mode`.
pub async fn launch<W: Write>(
    url: &str,
    mode: OpenMode,
    open_cmd: Option<&str>,
    spawner: &dyn Spawn,
    out: &mut W,
) -> Result<()> {
    match mode {
        OpenMode::Print => writeln!(out, "{}", url).map_err(Error::Output),
        OpenMode::Open => {
            let command = CommandLine::for_url(url, open_cmd, Platform::current());
            spawner
                .spawn_detached(&command)
                .await
                .map_err(|e| Error::Launch(e.to_string()))
        }
    }
}
