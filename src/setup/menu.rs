//! Menu state for `tchat --setup`.
//!
//! Every screen is a small state machine fed with key events; drawing lives in
//! the `tui` module.

use crate::background::models::Model;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use serde_json::{Map, Value};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Opener that launches URLs as Omarchy webapps.
pub const OMARCHY_CMD: &str = "omarchy-launch-webapp";

/// Upper bound on rows shown in the model list.
pub const MAX_VISIBLE_MODELS: usize = 15;

pub struct Provider {
    pub label: &'static str,
    pub base_url: &'static str,
}

impl Provider {
    /// Only t3.chat takes a model id in the URL.
    pub fn offers_models(&self) -> bool {
        self.base_url.contains("t3.chat")
    }
}

pub const PROVIDERS: [Provider; 3] = [
    Provider {
        label: "t3.chat",
        base_url: "https://t3.chat/new",
    },
    Provider {
        label: "ChatGPT",
        base_url: "https://chatgpt.com/",
    },
    Provider {
        label: "Claude",
        base_url: "https://claude.ai/new",
    },
];

/// Outcome of feeding one key to a screen.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<T> {
    Continue,
    Done(T),
    Cancel,
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn wrap_prev(cursor: usize, len: usize) -> usize {
    (cursor + len - 1) % len
}

fn wrap_next(cursor: usize, len: usize) -> usize {
    (cursor + 1) % len
}

/// Provider and opener currently stored in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentChoice {
    pub provider: usize,
    pub omarchy: bool,
}

impl CurrentChoice {
    pub fn from_document(doc: &Map<String, Value>) -> Self {
        let base_url = doc.get("baseUrl").and_then(Value::as_str);
        let provider = PROVIDERS
            .iter()
            .position(|p| Some(p.base_url) == base_url)
            .unwrap_or(0);
        let omarchy = doc.get("openCmd").and_then(Value::as_str) == Some(OMARCHY_CMD);
        Self { provider, omarchy }
    }
}

/// First screen: provider radio list plus the Omarchy checkbox row.
pub struct ProviderMenu {
    pub cursor: usize,
    pub omarchy: bool,
    current: usize,
}

impl ProviderMenu {
    pub fn new(current: CurrentChoice) -> Self {
        Self {
            cursor: current.provider,
            omarchy: current.omarchy,
            current: current.provider,
        }
    }

    /// Index of the checkbox row, just past the providers.
    pub fn omarchy_row() -> usize {
        PROVIDERS.len()
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Step<CurrentChoice> {
        let rows = PROVIDERS.len() + 1;
        match key.code {
            _ if is_ctrl_c(&key) => Step::Cancel,
            KeyCode::Char('q') | KeyCode::Esc => Step::Cancel,
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = wrap_prev(self.cursor, rows);
                Step::Continue
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = wrap_next(self.cursor, rows);
                Step::Continue
            }
            KeyCode::Char(' ') if self.cursor == Self::omarchy_row() => {
                self.omarchy = !self.omarchy;
                Step::Continue
            }
            KeyCode::Enter => {
                // confirming on the checkbox row keeps the stored provider
                let provider = if self.cursor < PROVIDERS.len() {
                    self.cursor
                } else {
                    self.current
                };
                Step::Done(CurrentChoice {
                    provider,
                    omarchy: self.omarchy,
                })
            }
            _ => Step::Continue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelMode {
    /// Let t3.chat reuse whatever model was used last.
    LastUsed,
    Pick,
}

pub const MODEL_MODE_OPTIONS: [&str; 2] = [
    "Use last model from t3.chat (no custom model)",
    "Select a model from the list",
];

/// Second screen for t3.chat.
#[derive(Default)]
pub struct ModelModeMenu {
    pub cursor: usize,
}

impl ModelModeMenu {
    pub fn handle_key(&mut self, key: KeyEvent) -> Step<ModelMode> {
        match key.code {
            _ if is_ctrl_c(&key) => Step::Cancel,
            KeyCode::Char('q') | KeyCode::Esc => Step::Cancel,
            KeyCode::Up | KeyCode::Char('k') | KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = 1 - self.cursor;
                Step::Continue
            }
            KeyCode::Enter if self.cursor == 0 => Step::Done(ModelMode::LastUsed),
            KeyCode::Enter => Step::Done(ModelMode::Pick),
            _ => Step::Continue,
        }
    }
}

/// Filterable, scrolling model list.
pub struct ModelSearch {
    models: Vec<Model>,
    pub input: Input,
    filtered: Vec<usize>,
    pub cursor: usize,
    pub scroll: usize,
    max_visible: usize,
}

impl ModelSearch {
    pub fn new(models: Vec<Model>) -> Self {
        let filtered = (0..models.len()).collect();
        Self {
            models,
            input: Input::default(),
            filtered,
            cursor: 0,
            scroll: 0,
            max_visible: MAX_VISIBLE_MODELS,
        }
    }

    /// Fit the list to a viewport of `rows` lines.
    pub fn set_max_visible(&mut self, rows: usize) {
        self.max_visible = rows.clamp(1, MAX_VISIBLE_MODELS);
        self.ensure_cursor_visible();
    }

    pub fn max_visible(&self) -> usize {
        self.max_visible
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    /// Rows currently on screen, with their position in the filtered list.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &Model)> + '_ {
        self.filtered
            .iter()
            .enumerate()
            .skip(self.scroll)
            .take(self.max_visible)
            .map(|(pos, &idx)| (pos, &self.models[idx]))
    }

    fn refilter(&mut self) {
        let needle = self.input.value().to_lowercase();
        self.filtered = self
            .models
            .iter()
            .enumerate()
            .filter(|(_, m)| {
                m.name.to_lowercase().contains(&needle) || m.id.to_lowercase().contains(&needle)
            })
            .map(|(idx, _)| idx)
            .collect();
        self.cursor = 0;
        self.scroll = 0;
    }

    fn ensure_cursor_visible(&mut self) {
        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + self.max_visible {
            self.scroll = self.cursor + 1 - self.max_visible;
        }
    }

    fn move_cursor(&mut self, down: bool) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        self.cursor = if down {
            wrap_next(self.cursor, len)
        } else {
            wrap_prev(self.cursor, len)
        };
        self.ensure_cursor_visible();
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Step<String> {
        let searching = !self.input.value().is_empty();
        match key.code {
            _ if is_ctrl_c(&key) => Step::Cancel,
            KeyCode::Esc => Step::Cancel,
            KeyCode::Char('q') if !searching => Step::Cancel,
            KeyCode::Enter => match self.filtered.get(self.cursor) {
                Some(&idx) => Step::Done(self.models[idx].id.clone()),
                None => Step::Continue,
            },
            KeyCode::Up => {
                self.move_cursor(false);
                Step::Continue
            }
            KeyCode::Down => {
                self.move_cursor(true);
                Step::Continue
            }
            KeyCode::Char('k') if !searching => {
                self.move_cursor(false);
                Step::Continue
            }
            KeyCode::Char('j') if !searching => {
                self.move_cursor(true);
                Step::Continue
            }
            _ => {
                let before = self.input.value().to_string();
                self.input.handle_event(&Event::Key(key));
                if self.input.value() != before {
                    self.refilter();
                }
                Step::Continue
            }
        }
    }
}

/// What to do with the `model` key when saving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelUpdate {
    Keep,
    Clear,
    Set(String),
}

/// Everything the menu decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub provider: usize,
    pub omarchy: bool,
    pub model: ModelUpdate,
}

impl Selection {
    /// Merge the selection into the config document, leaving unrelated keys alone.
    pub fn apply(&self, doc: &mut Map<String, Value>) {
        doc.insert(
            "baseUrl".to_string(),
            Value::from(PROVIDERS[self.provider].base_url),
        );

        if self.omarchy {
            doc.insert("openCmd".to_string(), Value::from(OMARCHY_CMD));
        } else if doc.get("openCmd").and_then(Value::as_str) == Some(OMARCHY_CMD) {
            doc.remove("openCmd");
        }

        match &self.model {
            ModelUpdate::Keep => {}
            ModelUpdate::Clear => {
                doc.remove("model");
            }
            ModelUpdate::Set(id) => {
                doc.insert("model".to_string(), Value::from(id.as_str()));
            }
        }
    }

    /// One-line confirmation shown after saving.
    pub fn summary(&self) -> String {
        let mut line = format!("Set to: {}", PROVIDERS[self.provider].label);
        if let ModelUpdate::Set(id) = &self.model {
            line.push_str(&format!(" with model: {}", id));
        }
        if self.omarchy {
            line.push_str(" (Omarchy webapp)");
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl_c() -> KeyEvent {
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn models() -> Vec<Model> {
        ["GPT-4o:gpt-4o", "Claude 4 Sonnet:claude-4-sonnet", "Gemini Pro:gemini-pro"]
            .iter()
            .map(|s| {
                let (name, id) = s.split_once(':').unwrap();
                Model {
                    name: name.to_string(),
                    id: id.to_string(),
                }
            })
            .collect()
    }

    #[test]
    fn test_current_choice_from_document() {
        let doc = object(json!({ "baseUrl": "https://claude.ai/new", "openCmd": OMARCHY_CMD }));
        assert_eq!(
            CurrentChoice::from_document(&doc),
            CurrentChoice {
                provider: 2,
                omarchy: true
            }
        );

        let doc = object(json!({ "baseUrl": "https://example.com/", "openCmd": "firefox" }));
        assert_eq!(
            CurrentChoice::from_document(&doc),
            CurrentChoice {
                provider: 0,
                omarchy: false
            }
        );
    }

    #[test]
    fn test_provider_menu_navigation_wraps() {
        let mut menu = ProviderMenu::new(CurrentChoice {
            provider: 0,
            omarchy: false,
        });
        assert_eq!(menu.handle_key(key(KeyCode::Up)), Step::Continue);
        assert_eq!(menu.cursor, ProviderMenu::omarchy_row());
        menu.handle_key(key(KeyCode::Char('j')));
        assert_eq!(menu.cursor, 0);
        menu.handle_key(key(KeyCode::Down));
        assert_eq!(
            menu.handle_key(key(KeyCode::Enter)),
            Step::Done(CurrentChoice {
                provider: 1,
                omarchy: false
            })
        );
    }

    #[test]
    fn test_provider_menu_toggle_only_on_checkbox_row() {
        let mut menu = ProviderMenu::new(CurrentChoice {
            provider: 2,
            omarchy: false,
        });
        menu.handle_key(key(KeyCode::Char(' ')));
        assert!(!menu.omarchy);

        menu.handle_key(key(KeyCode::Down));
        menu.handle_key(key(KeyCode::Char(' ')));
        assert!(menu.omarchy);

        // Enter on the checkbox row keeps the stored provider
        assert_eq!(
            menu.handle_key(key(KeyCode::Enter)),
            Step::Done(CurrentChoice {
                provider: 2,
                omarchy: true
            })
        );
    }

    #[test]
    fn test_provider_menu_cancel() {
        let current = CurrentChoice {
            provider: 0,
            omarchy: false,
        };
        assert_eq!(ProviderMenu::new(current).handle_key(key(KeyCode::Char('q'))), Step::Cancel);
        assert_eq!(ProviderMenu::new(current).handle_key(ctrl_c()), Step::Cancel);
    }

    #[test]
    fn test_model_mode_menu() {
        let mut menu = ModelModeMenu::default();
        assert_eq!(menu.handle_key(key(KeyCode::Enter)), Step::Done(ModelMode::LastUsed));
        menu.handle_key(key(KeyCode::Down));
        assert_eq!(menu.handle_key(key(KeyCode::Enter)), Step::Done(ModelMode::Pick));
        menu.handle_key(key(KeyCode::Up));
        assert_eq!(menu.cursor, 0);
        assert_eq!(menu.handle_key(key(KeyCode::Esc)), Step::Cancel);
    }

    #[test]
    fn test_model_search_filters_by_name_and_id() {
        let mut search = ModelSearch::new(models());
        for c in "CLAUDE".chars() {
            search.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(search.filtered_len(), 1);
        assert_eq!(
            search.handle_key(key(KeyCode::Enter)),
            Step::Done("claude-4-sonnet".to_string())
        );

        let mut search = ModelSearch::new(models());
        for c in "gem".chars() {
            search.handle_key(key(KeyCode::Char(c)));
        }
        assert_eq!(search.filtered_len(), 1);
    }

    #[test]
    fn test_model_search_letters_type_while_searching() {
        let mut search = ModelSearch::new(models());
        // with an empty filter, j moves and q cancels
        search.handle_key(key(KeyCode::Char('j')));
        assert_eq!(search.cursor, 1);

        search.handle_key(key(KeyCode::Char('g')));
        assert_eq!(search.cursor, 0);
        assert_eq!(search.handle_key(key(KeyCode::Char('q'))), Step::Continue);
        assert_eq!(search.input.value(), "gq");
        assert_eq!(search.filtered_len(), 0);
        assert_eq!(search.handle_key(key(KeyCode::Enter)), Step::Continue);

        search.handle_key(key(KeyCode::Backspace));
        search.handle_key(key(KeyCode::Backspace));
        assert_eq!(search.filtered_len(), 3);
        assert_eq!(search.handle_key(key(KeyCode::Char('q'))), Step::Cancel);
    }

    #[test]
    fn test_model_search_scrolls_with_cursor() {
        let many: Vec<Model> = (0..40)
            .map(|i| Model {
                name: format!("Model {i}"),
                id: format!("m-{i}"),
            })
            .collect();
        let mut search = ModelSearch::new(many);
        search.set_max_visible(5);

        for _ in 0..6 {
            search.handle_key(key(KeyCode::Down));
        }
        assert_eq!(search.cursor, 6);
        assert_eq!(search.scroll, 2);
        let first_visible = search.visible().next().unwrap();
        assert_eq!(first_visible.0, 2);

        // wrap to the end
        let mut search = ModelSearch::new(search.models.clone());
        search.set_max_visible(5);
        search.handle_key(key(KeyCode::Up));
        assert_eq!(search.cursor, 39);
        assert_eq!(search.scroll, 35);
        assert_eq!(search.visible().count(), 5);
    }

    #[test]
    fn test_selection_apply_sets_and_clears() {
        let mut doc = object(json!({ "model": "old", "openCmd": OMARCHY_CMD, "extra": true }));
        let selection = Selection {
            provider: 1,
            omarchy: false,
            model: ModelUpdate::Keep,
        };
        selection.apply(&mut doc);
        assert_eq!(doc.get("baseUrl"), Some(&json!("https://chatgpt.com/")));
        assert_eq!(doc.get("openCmd"), None);
        assert_eq!(doc.get("model"), Some(&json!("old")));
        assert_eq!(doc.get("extra"), Some(&json!(true)));

        let selection = Selection {
            provider: 0,
            omarchy: true,
            model: ModelUpdate::Set("gpt-4o".to_string()),
        };
        selection.apply(&mut doc);
        assert_eq!(doc.get("openCmd"), Some(&json!(OMARCHY_CMD)));
        assert_eq!(doc.get("model"), Some(&json!("gpt-4o")));

        Selection {
            provider: 0,
            omarchy: true,
            model: ModelUpdate::Clear,
        }
        .apply(&mut doc);
        assert_eq!(doc.get("model"), None);
    }

    #[test]
    fn test_selection_keeps_custom_open_command() {
        let mut doc = object(json!({ "openCmd": "firefox" }));
        Selection {
            provider: 2,
            omarchy: false,
            model: ModelUpdate::Keep,
        }
        .apply(&mut doc);
        assert_eq!(doc.get("openCmd"), Some(&json!("firefox")));
    }

    #[test]
    fn test_selection_summary() {
        let selection = Selection {
            provider: 0,
            omarchy: true,
            model: ModelUpdate::Set("gpt-4o".to_string()),
        };
        assert_eq!(
            selection.summary(),
            "Set to: t3.chat with model: gpt-4o (Omarchy webapp)"
        );
        let selection = Selection {
            provider: 2,
            omarchy: false,
            model: ModelUpdate::Keep,
        };
        assert_eq!(selection.summary(), "Set to: Claude");
    }
}
