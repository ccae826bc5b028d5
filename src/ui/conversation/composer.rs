use crate::ui::conversation::commands::{
    CommandEntry, ParsedCommand, command_entries, parse_slash_command,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Widget},
};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted,
    Command(ParsedCommand),
    None,
}

/// Single-line input for questions and slash commands.
///
/// The text itself lives with the caller (the controller's input buffer);
/// the composer only keeps the cursor and the command palette.
pub struct ConversationComposer {
    /// Cursor position in chars
    cursor: usize,
    placeholder: String,
    has_focus: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            cursor: 0,
            placeholder: placeholder.into(),
            has_focus: true,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
        }
    }

    /// Handle key input, editing `text` in place
    pub fn handle_key(&mut self, key: KeyEvent, text: &mut String) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }
        self.cursor = self.cursor.min(text.chars().count());

        match key.code {
            KeyCode::Enter => {
                if self.show_command_palette && self.apply_selected_command(text) {
                    return ComposerResult::None;
                }
                if text.trim().is_empty() {
                    return ComposerResult::None;
                }
                self.close_command_palette();
                if let Some(command) = parse_slash_command(text) {
                    text.clear();
                    self.cursor = 0;
                    return ComposerResult::Command(command);
                }
                return ComposerResult::Submitted;
            }
            KeyCode::Up if self.show_command_palette => self.move_command_selection(-1),
            KeyCode::Down if self.show_command_palette => self.move_command_selection(1),
            KeyCode::Esc if self.show_command_palette => self.close_command_palette(),
            KeyCode::Tab if self.show_command_palette => {
                self.apply_selected_command(text);
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_str(text, &c.to_string());
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    let at = byte_index(text, self.cursor);
                    text.remove(at);
                    self.sync_command_palette(text);
                }
            }
            KeyCode::Delete => {
                if self.cursor < text.chars().count() {
                    let at = byte_index(text, self.cursor);
                    text.remove(at);
                    self.sync_command_palette(text);
                }
            }
            KeyCode::Left => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Right => self.cursor = (self.cursor + 1).min(text.chars().count()),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = text.chars().count(),
            _ => {}
        }

        ComposerResult::None
    }

    /// Insert pasted text at the cursor. Newlines collapse to spaces.
    pub fn paste(&mut self, text: &mut String, pasted: &str) {
        self.cursor = self.cursor.min(text.chars().count());
        let flattened: String = pasted
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        self.insert_str(text, &flattened);
    }

    fn insert_str(&mut self, text: &mut String, inserted: &str) {
        let at = byte_index(text, self.cursor);
        text.insert_str(at, inserted);
        self.cursor += inserted.chars().count();
        self.sync_command_palette(text);
    }

    fn sync_command_palette(&mut self, text: &str) {
        let is_command = text.starts_with('/') && !text.contains(char::is_whitespace);
        if is_command {
            if !self.show_command_palette {
                self.show_command_palette = true;
                self.selected_command = Some(0);
            }
            self.refresh_command_palette(text);
        } else if self.show_command_palette {
            self.close_command_palette();
        }
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self, text: &str) {
        let query = text.trim_start_matches('/').to_lowercase();
        self.filtered_commands = self
            .command_entries
            .iter()
            .filter(|entry| query.is_empty() || entry.keyword.starts_with(&query))
            .copied()
            .collect();

        if self.filtered_commands.is_empty() {
            self.selected_command = None;
        } else {
            let index = self.selected_command.unwrap_or(0);
            self.selected_command = Some(index.min(self.filtered_commands.len() - 1));
        }
    }

    fn move_command_selection(&mut self, delta: isize) {
        if self.filtered_commands.is_empty() {
            self.selected_command = None;
            return;
        }

        let len = self.filtered_commands.len() as isize;
        let current = self.selected_command.unwrap_or(0) as isize;
        self.selected_command = Some((current + delta).rem_euclid(len) as usize);
    }

    fn apply_selected_command(&mut self, text: &mut String) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index))
            .copied()
        else {
            return false;
        };

        // An already complete command name falls through to submission
        let completed = format!("/{} ", entry.keyword);
        if text.trim_end() == completed.trim_end() {
            return false;
        }
        *text = completed;
        self.cursor = text.chars().count();
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Put the cursor at the end of `text`
    pub fn move_to_end(&mut self, text: &str) {
        self.cursor = text.chars().count();
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette
    }

    /// Borrowing widget for the current frame
    pub fn view<'a>(&'a self, text: &'a str, enabled: bool) -> ComposerView<'a> {
        ComposerView {
            composer: self,
            text,
            enabled,
        }
    }
}

fn byte_index(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Renders the composer with the text it is editing
pub struct ComposerView<'a> {
    composer: &'a ConversationComposer,
    text: &'a str,
    enabled: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let composer = self.composer;
        let title = if self.enabled {
            "❓ Ask a question"
        } else {
            "⏳ Waiting for the answer..."
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .style(if composer.has_focus && self.enabled {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.text.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                composer.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = self.text.to_string();
            if composer.has_focus && self.enabled {
                let at = byte_index(&content, composer.cursor);
                content.insert(at, '▌');
            }

            // Keep the cursor visible on long input
            let width = inner_area.width as usize;
            let chars: Vec<char> = content.chars().collect();
            let start = (composer.cursor + 1).saturating_sub(width);
            let visible: String = chars.iter().skip(start).take(width).collect();
            let line = Line::from(vec![Span::raw(visible)]);
            buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
        }

        if composer.show_command_palette && !composer.filtered_commands.is_empty() {
            let palette_height = (composer.filtered_commands.len().min(5) + 2) as u16;
            let palette_area = Rect {
                x: area.x,
                y: area.y.saturating_sub(palette_height),
                width: area.width,
                height: palette_height.min(area.y),
            };
            if palette_area.height < 3 {
                return;
            }

            Clear.render(palette_area, buf);
            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            for (index, entry) in composer.filtered_commands.iter().enumerate() {
                if index >= inner.height as usize {
                    break;
                }

                let style = if composer.selected_command == Some(index) {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + index as u16, &line, inner.width);
            }
        }
    }
}
