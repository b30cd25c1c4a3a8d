//! Merge flags, environment, config file and defaults into one configuration.

use crate::config::Settings;
use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "";
pub const DEFAULT_BASE_URL: &str = "https://t3.chat/new";

/// What to do with the finished URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    #[default]
    Open,
    Print,
}

/// When to read standard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StdinMode {
    /// Read only when stdin is not a terminal.
    #[default]
    Auto,
    Force,
    Disabled,
}

/// Fully resolved configuration for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub model: String,
    pub open_command: Option<String>,
    pub open_mode: OpenMode,
    pub stdin_mode: StdinMode,
}

/// Resolve each setting as flag > env > config file > default.
pub fn resolve(
    flags: &Settings,
    env: &Settings,
    file: &Settings,
    open_mode: OpenMode,
    stdin_mode: StdinMode,
) -> Result<ResolvedConfig> {
    let layers = [flags, env, file];
    let resolved = ResolvedConfig {
        base_url: first_set(&layers, |s| s.base_url.as_ref())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        model: first_set(&layers, |s| s.model.as_ref())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        open_command: first_set(&layers, |s| s.open_cmd.as_ref()),
        open_mode,
        stdin_mode,
    };

    if resolved.open_mode == OpenMode::Open {
        if let Some(cmd) = &resolved.open_command {
            if cmd.trim().is_empty() {
                return Err(Error::EmptyOpenCommand);
            }
        }
    }

    Ok(resolved)
}

/// First layer, in precedence order, that sets the selected key.
fn first_set<F>(layers: &[&Settings], select: F) -> Option<String>
where
    F: Fn(&Settings) -> Option<&String>,
{
    layers.iter().find_map(|&layer| select(layer).cloned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(model: Option<&str>, base_url: Option<&str>, open_cmd: Option<&str>) -> Settings {
        Settings {
            model: model.map(String::from),
            base_url: base_url.map(String::from),
            open_cmd: open_cmd.map(String::from),
        }
    }

    fn resolve_layers(flags: &Settings, env: &Settings, file: &Settings) -> ResolvedConfig {
        resolve(flags, env, file, OpenMode::Print, StdinMode::Auto).unwrap()
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let none = Settings::default();
        let resolved = resolve_layers(&none, &none, &none);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.model, "");
        assert_eq!(resolved.open_command, None);
    }

    #[test]
    fn test_flag_beats_env_and_file() {
        let flags = layer(Some("flag-model"), Some("https://flag/"), Some("flag-open"));
        let env = layer(Some("env-model"), Some("https://env/"), Some("env-open"));
        let file = layer(Some("file-model"), Some("https://file/"), Some("file-open"));
        let resolved = resolve_layers(&flags, &env, &file);
        assert_eq!(resolved.model, "flag-model");
        assert_eq!(resolved.base_url, "https://flag/");
        assert_eq!(resolved.open_command.as_deref(), Some("flag-open"));
    }

    #[test]
    fn test_env_beats_file() {
        let env = layer(Some("env-model"), Some("https://env/"), Some("env-open"));
        let file = layer(Some("file-model"), Some("https://file/"), Some("file-open"));
        let resolved = resolve_layers(&Settings::default(), &env, &file);
        assert_eq!(resolved.model, "env-model");
        assert_eq!(resolved.base_url, "https://env/");
        assert_eq!(resolved.open_command.as_deref(), Some("env-open"));
    }

    #[test]
    fn test_file_beats_default() {
        let file = layer(Some("file-model"), Some("https://file/"), Some("file-open"));
        let none = Settings::default();
        let resolved = resolve_layers(&none, &none, &file);
        assert_eq!(resolved.model, "file-model");
        assert_eq!(resolved.base_url, "https://file/");
        assert_eq!(resolved.open_command.as_deref(), Some("file-open"));
    }

    #[test]
    fn test_layers_resolve_independently_per_key() {
        let flags = layer(Some("flag-model"), None, None);
        let env = layer(None, Some("https://env/"), None);
        let file = layer(Some("file-model"), Some("https://file/"), Some("file-open"));
        let resolved = resolve_layers(&flags, &env, &file);
        assert_eq!(resolved.model, "flag-model");
        assert_eq!(resolved.base_url, "https://env/");
        assert_eq!(resolved.open_command.as_deref(), Some("file-open"));
    }

    #[test]
    fn test_empty_env_value_still_wins() {
        let env = layer(Some(""), None, None);
        let file = layer(Some("file-model"), None, None);
        let resolved = resolve_layers(&Settings::default(), &env, &file);
        assert_eq!(resolved.model, "");
    }

    #[test]
    fn test_blank_open_command_rejected_in_open_mode() {
        let flags = layer(None, None, Some("   "));
        let none = Settings::default();
        let err = resolve(&flags, &none, &none, OpenMode::Open, StdinMode::Auto).unwrap_err();
        assert!(matches!(err, Error::EmptyOpenCommand));
    }

    #[test]
    fn test_blank_open_command_allowed_when_printing() {
        let flags = layer(None, None, Some(""));
        let none = Settings::default();
        assert!(resolve(&flags, &none, &none, OpenMode::Print, StdinMode::Disabled).is_ok());
    }
}
