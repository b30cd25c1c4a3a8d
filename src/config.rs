//! Configuration management for tchat.
//!
//! Configuration is loaded from `~/.config/tchat/config.json` (or the path in
//! `TCHAT_CONFIG`). Every key is optional and sits below environment variables
//! and command line flags in precedence.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_MODEL: &str = "TCHAT_MODEL";
pub const ENV_BASE_URL: &str = "TCHAT_BASE_URL";
pub const ENV_OPEN_CMD: &str = "TCHAT_OPEN_CMD";
pub const ENV_CONFIG_PATH: &str = "TCHAT_CONFIG";

/// One layer of overrides. Flags, environment and config file each produce one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub open_cmd: Option<String>,
}

impl Settings {
    /// Read the `TCHAT_*` overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. A variable that is set counts
    /// as present even when empty.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            model: lookup(ENV_MODEL),
            base_url: lookup(ENV_BASE_URL),
            open_cmd: lookup(ENV_OPEN_CMD),
        }
    }

    /// Pick the string-valued keys out of a parsed config document.
    /// Keys holding anything other than a string are ignored.
    pub fn from_document(doc: &Map<String, Value>) -> Self {
        let string_at = |key: &str| doc.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            model: string_at("model"),
            base_url: string_at("baseUrl"),
            open_cmd: string_at("openCmd"),
        }
    }

    /// Load the config file layer. Missing or unreadable files yield an empty layer.
    pub fn load(path: &Path) -> Self {
        Self::from_document(&load_document(path))
    }
}

/// Get the config file path.
pub fn config_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(ENV_CONFIG_PATH) {
        return Ok(PathBuf::from(path));
    }
    dirs::config_dir()
        .map(|p| p.join("tchat").join("config.json"))
        .context("Could not determine config directory")
}

/// Read the raw config document, keeping unknown keys so a later save
/// round-trips them.
pub fn load_document(path: &Path) -> Map<String, Value> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!("No config at {}: {}", path.display(), e);
            return Map::new();
        }
    };

    match serde_json::from_str::<Value>(&contents) {
        Ok(Value::Object(doc)) => doc,
        Ok(_) => {
            debug!("Config at {} is not a JSON object, ignoring", path.display());
            Map::new()
        }
        Err(e) => {
            debug!("Failed to parse config at {}: {}", path.display(), e);
            Map::new()
        }
    }
}

/// Save the config document as pretty JSON with a trailing newline.
pub fn save_document(path: &Path, doc: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
    }
    let mut contents = serde_json::to_string_pretty(doc)?;
    contents.push('\n');
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_document_reads_string_keys() {
        let doc = object(json!({
            "model": "gpt-4o",
            "baseUrl": "https://chatgpt.com/",
            "openCmd": "firefox"
        }));
        let settings = Settings::from_document(&doc);
        assert_eq!(settings.model.as_deref(), Some("gpt-4o"));
        assert_eq!(settings.base_url.as_deref(), Some("https://chatgpt.com/"));
        assert_eq!(settings.open_cmd.as_deref(), Some("firefox"));
    }

    #[test]
    fn test_from_document_ignores_non_strings() {
        let doc = object(json!({ "model": 42, "baseUrl": null, "openCmd": ["x"] }));
        assert_eq!(Settings::from_document(&doc), Settings::default());
    }

    #[test]
    fn test_from_lookup_keeps_empty_values() {
        let settings = Settings::from_lookup(|key| match key {
            ENV_MODEL => Some(String::new()),
            ENV_OPEN_CMD => Some("open -a Safari".to_string()),
            _ => None,
        });
        assert_eq!(settings.model.as_deref(), Some(""));
        assert_eq!(settings.base_url, None);
        assert_eq!(settings.open_cmd.as_deref(), Some("open -a Safari"));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_invalid_json_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());

        std::fs::write(&path, "[1, 2, 3]").unwrap();
        assert_eq!(Settings::load(&path), Settings::default());
    }

    #[test]
    fn test_save_document_roundtrips_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let doc = object(json!({ "baseUrl": "https://claude.ai/new", "theme": "dark" }));

        save_document(&path, &doc).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.ends_with("}\n"));
        let loaded = load_document(&path);
        assert_eq!(loaded.get("theme"), Some(&json!("dark")));
        assert_eq!(
            Settings::from_document(&loaded).base_url.as_deref(),
            Some("https://claude.ai/new")
        );
    }
}
