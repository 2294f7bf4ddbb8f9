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

pub const PLACEHOLDER: &str = "Type your message...";

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// State for the text input within the composer.
///
/// `cursor` counts chars, not bytes.
#[derive(Debug, Clone, Default)]
pub struct TextInputState {
    pub content: String,
    pub cursor: usize,
}

impl TextInputState {
    fn byte_index(&self, cursor: usize) -> usize {
        self.content
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.content.insert(at, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    /// Delete character at cursor
    fn delete(&mut self) -> bool {
        if self.cursor >= self.char_len() {
            return false;
        }
        let at = self.byte_index(self.cursor);
        self.content.remove(at);
        true
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }
}

/// Single-line message input with a slash-command palette
#[derive(Clone)]
pub struct ConversationComposer {
    state: TextInputState,
    placeholder: String,
    enabled: bool,
    accent: Color,
    command_entries: Vec<CommandEntry>,
    filtered_commands: Vec<CommandEntry>,
    show_command_palette: bool,
    selected_command: Option<usize>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>, accent: Color) -> Self {
        Self {
            state: TextInputState::default(),
            placeholder: placeholder.into(),
            enabled: true,
            accent,
            command_entries: command_entries(),
            filtered_commands: Vec::new(),
            show_command_palette: false,
            selected_command: None,
        }
    }

    /// Handle key input.
    ///
    /// While disabled the text stays editable and slash commands still run,
    /// but chat text is not submitted.
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        match key.code {
            KeyCode::Enter => {
                // A complete command runs; a partial one is completed first
                if self.show_command_palette
                    && parse_slash_command(&self.state.content).is_none()
                    && self.apply_selected_command()
                {
                    return ComposerResult::None;
                }
                if self.state.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                if let Some(command) = parse_slash_command(&self.state.content) {
                    self.state.take();
                    self.close_command_palette();
                    return ComposerResult::Command(command);
                }
                if !self.enabled {
                    return ComposerResult::None;
                }
                let content = self.state.take();
                self.close_command_palette();
                return ComposerResult::Submitted(content);
            }
            KeyCode::Up => {
                if self.show_command_palette {
                    self.move_command_selection(-1);
                }
            }
            KeyCode::Down => {
                if self.show_command_palette {
                    self.move_command_selection(1);
                }
            }
            KeyCode::Esc => {
                self.close_command_palette();
            }
            KeyCode::Tab => {
                if self.show_command_palette {
                    self.apply_selected_command();
                }
            }
            KeyCode::Char(c) => {
                if key.modifiers.contains(KeyModifiers::CONTROL) {
                    return ComposerResult::None;
                }

                self.state.insert_char(c);

                if self.state.content == "/" {
                    self.open_command_palette();
                } else if self.show_command_palette {
                    self.sync_command_palette(c.is_whitespace());
                }
            }
            KeyCode::Backspace => {
                if self.state.backspace() && self.show_command_palette {
                    self.sync_command_palette(false);
                }
            }
            KeyCode::Delete => {
                if self.state.delete() && self.show_command_palette {
                    self.sync_command_palette(false);
                }
            }
            KeyCode::Left => {
                self.state.cursor = self.state.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.state.cursor < self.state.char_len() {
                    self.state.cursor += 1;
                }
            }
            KeyCode::Home => {
                self.state.cursor = 0;
            }
            KeyCode::End => {
                self.state.cursor = self.state.char_len();
            }
            _ => {}
        }

        ComposerResult::None
    }

    fn sync_command_palette(&mut self, typed_whitespace: bool) {
        if self.state.content.starts_with('/') && !typed_whitespace {
            self.refresh_command_palette();
        } else {
            self.close_command_palette();
        }
    }

    fn open_command_palette(&mut self) {
        self.show_command_palette = true;
        self.selected_command = Some(0);
        self.refresh_command_palette();
    }

    fn close_command_palette(&mut self) {
        self.show_command_palette = false;
        self.filtered_commands.clear();
        self.selected_command = None;
    }

    fn refresh_command_palette(&mut self) {
        let query = self.state.content.trim_start_matches('/').to_lowercase();
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
        let next = (current + delta).rem_euclid(len);
        self.selected_command = Some(next as usize);
    }

    fn apply_selected_command(&mut self) -> bool {
        let Some(entry) = self
            .selected_command
            .and_then(|index| self.filtered_commands.get(index).copied())
        else {
            return false;
        };

        self.state.content = format!("/{} ", entry.keyword);
        self.state.cursor = self.state.char_len();
        self.close_command_palette();
        true
    }

    /// Enable or disable submission
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_accent(&mut self, accent: Color) {
        self.accent = accent;
    }

    pub fn is_palette_open(&self) -> bool {
        self.show_command_palette
    }

    pub fn content(&self) -> &str {
        &self.state.content
    }

    /// Height the palette needs above the composer, borders included
    pub fn palette_height(&self) -> u16 {
        if self.show_command_palette && !self.filtered_commands.is_empty() {
            (self.filtered_commands.len().min(5) + 2) as u16
        } else {
            0
        }
    }

    /// Draw the command palette into `area`
    pub fn render_palette(&self, area: Rect, buf: &mut Buffer) {
        if self.palette_height() == 0 {
            return;
        }

        Clear.render(area, buf);
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Commands")
            .style(Style::default().fg(self.accent));
        let inner = block.inner(area);
        block.render(area, buf);

        for (index, entry) in self.filtered_commands.iter().enumerate() {
            if index >= inner.height as usize {
                break;
            }

            let style = if self.selected_command == Some(index) {
                Style::default()
                    .fg(Color::Black)
                    .bg(self.accent)
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

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (border, title) = if self.enabled {
            (Style::default().fg(self.accent), " Message ")
        } else {
            (Style::default().fg(Color::DarkGray), " Waiting for reply ")
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border);
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.state.content.is_empty() {
            let placeholder = Line::from(Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            ));
            buf.set_line(inner.x, inner.y, &placeholder, inner.width);
            return;
        }

        let text_style = if self.enabled {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::Gray)
        };

        // Keep the cursor visible by scrolling the line horizontally
        let width = inner.width as usize;
        let skip = (self.state.cursor + 1).saturating_sub(width);
        let mut content: String = self.state.content.chars().skip(skip).collect();
        let cursor_at = self.state.cursor - skip;
        let byte_at = content
            .char_indices()
            .nth(cursor_at)
            .map(|(i, _)| i)
            .unwrap_or(content.len());
        content.insert(byte_at, '▌');

        let line = Line::from(Span::styled(content, text_style));
        buf.set_line(inner.x, inner.y, &line, inner.width);
    }
}
