//! Terminal rendering for the setup screens.

use super::menu::{
    ModelModeMenu, ModelSearch, ProviderMenu, Step, MODEL_MODE_OPTIONS, PROVIDERS,
};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use std::io::{self, Stdout};

/// Lines used by the title, search box and hints around the model list.
const MODEL_LIST_CHROME: u16 = 8;

/// A screen that can be drawn and driven by key presses.
pub trait Screen {
    type Output;

    fn handle_key(&mut self, key: KeyEvent) -> Step<Self::Output>;

    fn draw(&self, frame: &mut Frame);

    /// Called with the terminal area before every draw.
    fn fit(&mut self, _area: Rect) {}
}

/// Raw-mode alternate screen, restored on drop.
pub struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub fn start() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }

    /// Drive `screen` until it finishes. `None` means the user cancelled.
    pub fn run<S: Screen>(&mut self, screen: &mut S) -> Result<Option<S::Output>> {
        loop {
            let size = self.terminal.size()?;
            screen.fit(Rect::new(0, 0, size.width, size.height));
            self.terminal.draw(|frame| screen.draw(frame))?;

            if let Event::Key(key) = event::read()? {
                // Only handle key press events (not release)
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match screen.handle_key(key) {
                    Step::Continue => {}
                    Step::Done(output) => return Ok(Some(output)),
                    Step::Cancel => return Ok(None),
                }
            }
        }
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

fn accent() -> Style {
    Style::default().fg(Color::Cyan)
}

fn dim() -> Style {
    Style::default().fg(Color::DarkGray)
}

/// `> ● label` for the selected row, `  ○ label` otherwise.
fn radio_row(label: &str, selected: bool) -> Line<'static> {
    if selected {
        Line::from(vec![
            Span::styled("> ", accent()),
            Span::styled("● ", accent()),
            Span::raw(label.to_string()),
        ])
    } else {
        Line::from(format!("  ○ {}", label))
    }
}

/// Title, body and a hint line at the bottom.
fn split_screen(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

fn title(text: &str) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(
        text.to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )))
}

fn hint(text: &str) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(text.to_string(), dim())))
}

impl Screen for ProviderMenu {
    type Output = super::menu::CurrentChoice;

    fn handle_key(&mut self, key: KeyEvent) -> Step<Self::Output> {
        ProviderMenu::handle_key(self, key)
    }

    fn draw(&self, frame: &mut Frame) {
        let [top, body, bottom] = split_screen(frame.area());

        let mut lines: Vec<Line> = PROVIDERS
            .iter()
            .enumerate()
            .map(|(i, provider)| radio_row(provider.label, self.cursor == i))
            .collect();

        lines.push(Line::default());
        let arrow = if self.cursor == Self::omarchy_row() {
            Span::styled("> ", accent())
        } else {
            Span::raw("  ")
        };
        let check = if self.omarchy {
            Span::styled("[x]", accent())
        } else {
            Span::raw("[ ]")
        };
        lines.push(Line::from(vec![arrow, check, Span::raw(" Omarchy webapp")]));

        frame.render_widget(title("Select default chat provider:"), top);
        frame.render_widget(Paragraph::new(lines), body);
        frame.render_widget(
            hint("↑/↓ move, Space select, Enter confirm, q cancel"),
            bottom,
        );
    }
}

impl Screen for ModelModeMenu {
    type Output = super::menu::ModelMode;

    fn handle_key(&mut self, key: KeyEvent) -> Step<Self::Output> {
        ModelModeMenu::handle_key(self, key)
    }

    fn draw(&self, frame: &mut Frame) {
        let [top, body, bottom] = split_screen(frame.area());

        let lines: Vec<Line> = MODEL_MODE_OPTIONS
            .iter()
            .enumerate()
            .map(|(i, label)| radio_row(label, self.cursor == i))
            .collect();

        frame.render_widget(title("t3.chat model configuration:"), top);
        frame.render_widget(Paragraph::new(lines), body);
        frame.render_widget(hint("↑/↓ move, Enter confirm, q cancel"), bottom);
    }
}

impl Screen for ModelSearch {
    type Output = String;

    fn handle_key(&mut self, key: KeyEvent) -> Step<Self::Output> {
        ModelSearch::handle_key(self, key)
    }

    fn fit(&mut self, area: Rect) {
        self.set_max_visible(area.height.saturating_sub(MODEL_LIST_CHROME) as usize);
    }

    fn draw(&self, frame: &mut Frame) {
        let [top, body, bottom] = split_screen(frame.area());
        let [search_area, list_area] = {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(2), Constraint::Min(1)])
                .split(body);
            [chunks[0], chunks[1]]
        };

        let search = Line::from(vec![
            Span::raw("Search: "),
            Span::raw(self.input.value().to_string()),
        ]);
        frame.render_widget(Paragraph::new(search), search_area);
        let cursor_x = search_area.x + "Search: ".len() as u16 + self.input.visual_cursor() as u16;
        frame.set_cursor_position((cursor_x.min(search_area.right().saturating_sub(1)), search_area.y));

        let mut lines: Vec<Line> = Vec::new();
        if self.filtered_len() == 0 {
            lines.push(Line::from(Span::styled("No models match your search", dim())));
        } else {
            for (pos, model) in self.visible() {
                let selected = pos == self.cursor;
                let (arrow, name_style) = if selected {
                    (Span::styled("> ", accent()), accent())
                } else {
                    (Span::raw("  "), Style::default())
                };
                lines.push(Line::from(vec![
                    arrow,
                    Span::styled(model.name.clone(), name_style),
                    Span::styled(format!(" ({})", model.id), dim()),
                ]));
            }
            let hidden = self.filtered_len().saturating_sub(self.max_visible());
            if hidden > 0 {
                lines.push(Line::default());
                lines.push(Line::from(Span::styled(
                    format!("... {} more (scroll with ↑/↓)", hidden),
                    dim(),
                )));
            }
        }

        frame.render_widget(title("Select a model (type to search):"), top);
        frame.render_widget(Paragraph::new(lines), list_area);
        frame.render_widget(
            hint("↑/↓ move, Enter confirm, Esc/q cancel, type to filter"),
            bottom,
        );
    }
}
